//! SQLite-backed persistence for nodes, edges, and derived analyses
//!
//! Every write is wrapped in a transaction; batch inserts commit all rows
//! or none. Enum variants are stored as stable TEXT tags and edge metadata
//! as a JSON column.

use rusqlite::{Connection, OptionalExtension, params};
use taproot_core::{DependKind, EdgeMetadata, SymbolKind};

use crate::error::StoreError;
use crate::records::{EdgeRecord, NodeRecord};
use crate::schema::{self, StoreOptions, Synchronous};

/// Durable store for one database file (one per project root).
pub struct Store {
    conn: Connection,
    options: StoreOptions,
}

impl Store {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: &str, options: StoreOptions) -> Result<Self, StoreError> {
        let conn = schema::open_database(path, &options)?;
        Ok(Store { conn, options })
    }

    /// Opens an in-memory database (for tests).
    pub fn in_memory() -> Result<Self, StoreError> {
        let options = StoreOptions::default();
        let conn = schema::open_in_memory(&options)?;
        Ok(Store { conn, options })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Relaxes the synchronous level to the configured bulk setting.
    /// Callers pair this with [`Store::end_bulk`].
    pub fn begin_bulk(&self) -> Result<(), StoreError> {
        self.conn
            .pragma_update(None, "synchronous", self.options.synchronous_bulk.as_str())?;
        Ok(())
    }

    /// Restores the steady-state synchronous level after a bulk load.
    pub fn end_bulk(&self) -> Result<(), StoreError> {
        self.conn
            .pragma_update(None, "synchronous", Synchronous::Normal.as_str())?;
        Ok(())
    }

    // ── Node CRUD ───────────────────────────────────────────

    /// Inserts a single node row, returning its database id.
    pub fn insert_node(&mut self, record: &NodeRecord) -> Result<i64, StoreError> {
        let tx = self.conn.transaction()?;
        let id = insert_node_tx(&tx, record)?;
        tx.commit()?;
        Ok(id)
    }

    /// Inserts a batch of node rows in one transaction. On any failure the
    /// whole batch rolls back and no row is visible.
    pub fn batch_insert_nodes(&mut self, records: &[NodeRecord]) -> Result<Vec<i64>, StoreError> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(insert_node_tx(&tx, record)?);
        }
        tx.commit()?;
        Ok(ids)
    }

    pub fn get_node(&self, id: i64) -> Result<NodeRecord, StoreError> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {NODE_COLUMNS} FROM intel_nodes WHERE id = ?1"
        ))?;
        stmt.query_row(params![id], node_from_row)
            .optional()?
            .ok_or(StoreError::NodeNotFound(id))
    }

    /// All node rows carrying the given hex content hash.
    pub fn find_by_hash(&self, content_hash: &str) -> Result<Vec<NodeRecord>, StoreError> {
        self.query_nodes(
            &format!("SELECT {NODE_COLUMNS} FROM intel_nodes WHERE content_hash = ?1 ORDER BY id"),
            params![content_hash],
        )
    }

    /// All node rows located in `file_path`.
    pub fn nodes_in_file(&self, file_path: &str) -> Result<Vec<NodeRecord>, StoreError> {
        self.query_nodes(
            &format!("SELECT {NODE_COLUMNS} FROM intel_nodes WHERE file_path = ?1 ORDER BY id"),
            params![file_path],
        )
    }

    /// All node rows belonging to `project_id`, in insertion order.
    pub fn nodes_in_project(&self, project_id: &str) -> Result<Vec<NodeRecord>, StoreError> {
        self.query_nodes(
            &format!("SELECT {NODE_COLUMNS} FROM intel_nodes WHERE project_id = ?1 ORDER BY id"),
            params![project_id],
        )
    }

    fn query_nodes(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<NodeRecord>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, node_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // ── Edge CRUD ───────────────────────────────────────────

    /// Inserts an edge row, upserting metadata on the composite key.
    /// Fails when either endpoint id does not exist.
    pub fn insert_edge(&mut self, record: &EdgeRecord) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        insert_edge_tx(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// Inserts a batch of edge rows in one transaction; all or none.
    pub fn batch_insert_edges(&mut self, records: &[EdgeRecord]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for record in records {
            insert_edge_tx(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn edges_by_caller(&self, caller_id: i64) -> Result<Vec<EdgeRecord>, StoreError> {
        self.query_edges(
            "SELECT caller_id, callee_id, edge_type, metadata FROM intel_edges
             WHERE caller_id = ?1 ORDER BY callee_id, edge_type",
            params![caller_id],
        )
    }

    pub fn edges_by_callee(&self, callee_id: i64) -> Result<Vec<EdgeRecord>, StoreError> {
        self.query_edges(
            "SELECT caller_id, callee_id, edge_type, metadata FROM intel_edges
             WHERE callee_id = ?1 ORDER BY caller_id, edge_type",
            params![callee_id],
        )
    }

    pub fn edges_by_type(&self, kind: DependKind) -> Result<Vec<EdgeRecord>, StoreError> {
        self.query_edges(
            "SELECT caller_id, callee_id, edge_type, metadata FROM intel_edges
             WHERE edge_type = ?1 ORDER BY caller_id, callee_id",
            params![kind.as_str()],
        )
    }

    fn query_edges(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<EdgeRecord>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;
        let mut result = Vec::new();
        for row in rows {
            let (caller_id, callee_id, kind_tag, metadata_json) = row?;
            let kind = DependKind::from_str_name(&kind_tag)
                .ok_or_else(|| StoreError::CorruptStore(format!("unknown edge type: {kind_tag}")))?;
            let metadata = match metadata_json.as_deref() {
                Some(json) => serde_json::from_str(json)?,
                None => EdgeMetadata::default(),
            };
            result.push(EdgeRecord {
                caller_id,
                callee_id,
                kind,
                metadata,
            });
        }
        Ok(result)
    }

    // ── Project scope ───────────────────────────────────────

    pub fn project_exists(&self, project_id: &str) -> Result<bool, StoreError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM intel_nodes WHERE project_id = ?1)",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Removes every node and edge of a project in one transaction.
    pub fn delete_project(&mut self, project_id: &str) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        // Edges first, to keep the delete order FK-clean.
        tx.execute(
            "DELETE FROM intel_edges WHERE caller_id IN
                 (SELECT id FROM intel_nodes WHERE project_id = ?1)
             OR callee_id IN
                 (SELECT id FROM intel_nodes WHERE project_id = ?1)",
            params![project_id],
        )?;
        tx.execute(
            "DELETE FROM intel_nodes WHERE project_id = ?1",
            params![project_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn node_count(&self, project_id: &str) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM intel_nodes WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn edge_count(&self, project_id: &str) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM intel_edges e
             JOIN intel_nodes n ON e.caller_id = n.id
             WHERE n.project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

const NODE_COLUMNS: &str = "id, project_id, file_path, symbol_name, qualified_name, node_type, \
     signature, byte_start, byte_end, complexity, content_hash, embedding, created_at, updated_at";

fn node_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NodeRecord> {
    let kind_tag: String = row.get(5)?;
    let kind = SymbolKind::from_str_name(&kind_tag).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown node type: {kind_tag}").into(),
        )
    })?;
    Ok(NodeRecord {
        id: Some(row.get(0)?),
        project_id: row.get(1)?,
        file_path: row.get(2)?,
        symbol_name: row.get(3)?,
        qualified_name: row.get(4)?,
        kind,
        signature: row.get(6)?,
        byte_start: row.get::<_, i64>(7)? as u64,
        byte_end: row.get::<_, i64>(8)? as u64,
        complexity: row.get::<_, i64>(9)? as u32,
        content_hash: row.get(10)?,
        embedding: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(crate) fn insert_node_tx(
    tx: &rusqlite::Transaction<'_>,
    record: &NodeRecord,
) -> Result<i64, StoreError> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO intel_nodes (project_id, file_path, symbol_name, qualified_name, node_type,
             signature, byte_start, byte_end, complexity, content_hash, embedding,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )?;
    stmt.execute(params![
        record.project_id,
        record.file_path,
        record.symbol_name,
        record.qualified_name,
        record.kind.as_str(),
        record.signature,
        record.byte_start as i64,
        record.byte_end as i64,
        record.complexity as i64,
        record.content_hash,
        record.embedding.as_deref(),
        record.created_at,
        record.updated_at,
    ])?;
    Ok(tx.last_insert_rowid())
}

pub(crate) fn insert_edge_tx(
    tx: &rusqlite::Transaction<'_>,
    record: &EdgeRecord,
) -> Result<(), StoreError> {
    let metadata_json = serde_json::to_string(&record.metadata)?;
    let mut stmt = tx.prepare_cached(
        "INSERT INTO intel_edges (caller_id, callee_id, edge_type, metadata)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (caller_id, callee_id, edge_type)
             DO UPDATE SET metadata = excluded.metadata",
    )?;
    stmt.execute(params![
        record.caller_id,
        record.callee_id,
        record.kind.as_str(),
        metadata_json,
    ])?;
    Ok(())
}
