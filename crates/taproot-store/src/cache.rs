//! Content-hash-keyed incremental analysis cache
//!
//! Derived analyses (control-flow summaries, complexity metrics) are keyed
//! by the node's content hash: changing one symbol changes only that
//! symbol's hash, so siblings keep their cached rows. Entries are not
//! removed when a node goes away, because another node may share the hash.

use rusqlite::{OptionalExtension, params};

use crate::error::StoreError;
use crate::records::AnalysisEntry;
use crate::store::Store;

impl Store {
    /// Whether a derived analysis exists for the given hex content hash.
    pub fn is_cached(&self, content_hash: &str) -> Result<bool, StoreError> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM analysis_cache WHERE node_hash = ?1)",
            params![content_hash],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn get_analysis(&self, content_hash: &str) -> Result<Option<AnalysisEntry>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT cfg_data, complexity_metrics, timestamp
                 FROM analysis_cache WHERE node_hash = ?1",
                params![content_hash],
                |row| {
                    Ok(AnalysisEntry {
                        cfg_data: row.get::<_, Option<Vec<u8>>>(0)?.unwrap_or_default(),
                        complexity_metrics: row.get::<_, Option<Vec<u8>>>(1)?.unwrap_or_default(),
                        computed_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Stores a derived analysis. Idempotent: an existing entry is
    /// overwritten and its `computed_at` refreshed.
    pub fn put_analysis(
        &mut self,
        content_hash: &str,
        entry: &AnalysisEntry,
    ) -> Result<(), StoreError> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "INSERT INTO analysis_cache (node_hash, cfg_data, complexity_metrics, timestamp)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (node_hash) DO UPDATE SET
                 cfg_data = excluded.cfg_data,
                 complexity_metrics = excluded.complexity_metrics,
                 timestamp = excluded.timestamp",
            params![
                content_hash,
                entry.cfg_data,
                entry.complexity_metrics,
                entry.computed_at,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Removes all cached analyses computed before `cutoff` (Unix seconds).
    /// Returns how many rows were dropped.
    pub fn invalidate_before(&mut self, cutoff: i64) -> Result<usize, StoreError> {
        let tx = self.conn_mut().transaction()?;
        let dropped = tx.execute(
            "DELETE FROM analysis_cache WHERE timestamp < ?1",
            params![cutoff],
        )?;
        tx.commit()?;
        tracing::debug!(dropped, cutoff, "analysis cache invalidated");
        Ok(dropped)
    }

    /// Node ids in `file_path` whose current content hash has no cached
    /// analysis, i.e. the nodes a caller needs to recompute.
    pub fn affected_nodes(&self, file_path: &str) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT n.id FROM intel_nodes n
             LEFT JOIN analysis_cache a ON n.content_hash = a.node_hash
             WHERE n.file_path = ?1 AND a.node_hash IS NULL
             ORDER BY n.id",
        )?;
        let rows = stmt.query_map(params![file_path], |row| row.get::<_, i64>(0))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}
