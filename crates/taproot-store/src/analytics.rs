//! Read-only analytics over persisted graphs
//!
//! These queries are non-transactional and take a plain connection, so
//! they run equally well on the writer or on one of the pool's reader
//! connections.

use std::collections::BTreeMap;

use rusqlite::{Connection, params};

use crate::error::StoreError;
use crate::store::Store;

/// Complexity distribution over a project's nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplexityHistogram {
    /// complexity < 5
    pub simple: u64,
    /// 5 <= complexity < 15
    pub moderate: u64,
    /// 15 <= complexity < 30
    pub complex: u64,
    /// complexity >= 30
    pub very_complex: u64,
}

/// A node with both high fanout and high complexity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotspot {
    pub node_id: i64,
    pub symbol_name: String,
    pub complexity: u32,
    /// Outgoing edge count.
    pub fanout: u64,
}

/// Node counts per node type, keyed by the stable TEXT tag.
pub fn node_type_counts(
    conn: &Connection,
    project_id: &str,
) -> Result<BTreeMap<String, u64>, StoreError> {
    counts(
        conn,
        "SELECT node_type, COUNT(*) FROM intel_nodes
         WHERE project_id = ?1 GROUP BY node_type",
        project_id,
    )
}

/// Edge counts per edge type, scoped to edges whose caller belongs to the
/// project.
pub fn edge_type_counts(
    conn: &Connection,
    project_id: &str,
) -> Result<BTreeMap<String, u64>, StoreError> {
    counts(
        conn,
        "SELECT e.edge_type, COUNT(*) FROM intel_edges e
         JOIN intel_nodes n ON e.caller_id = n.id
         WHERE n.project_id = ?1 GROUP BY e.edge_type",
        project_id,
    )
}

fn counts(
    conn: &Connection,
    sql: &str,
    project_id: &str,
) -> Result<BTreeMap<String, u64>, StoreError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params![project_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
    })?;
    let mut result = BTreeMap::new();
    for row in rows {
        let (tag, count) = row?;
        result.insert(tag, count);
    }
    Ok(result)
}

pub fn complexity_histogram(
    conn: &Connection,
    project_id: &str,
) -> Result<ComplexityHistogram, StoreError> {
    let mut stmt =
        conn.prepare_cached("SELECT complexity FROM intel_nodes WHERE project_id = ?1")?;
    let rows = stmt.query_map(params![project_id], |row| row.get::<_, i64>(0))?;
    let mut histogram = ComplexityHistogram::default();
    for row in rows {
        match row? {
            c if c < 5 => histogram.simple += 1,
            c if c < 15 => histogram.moderate += 1,
            c if c < 30 => histogram.complex += 1,
            _ => histogram.very_complex += 1,
        }
    }
    Ok(histogram)
}

/// Nodes whose outgoing fanout and complexity both clear the given
/// thresholds, ordered by fanout then complexity, descending.
pub fn hotspots(
    conn: &Connection,
    project_id: &str,
    min_fanout: u64,
    min_complexity: u32,
) -> Result<Vec<Hotspot>, StoreError> {
    // LEFT JOIN so edge-less nodes count as fanout 0 instead of vanishing
    // before the threshold is applied.
    let mut stmt = conn.prepare_cached(
        "SELECT n.id, n.symbol_name, n.complexity, COUNT(e.caller_id) AS fanout
         FROM intel_nodes n
         LEFT JOIN intel_edges e ON e.caller_id = n.id
         WHERE n.project_id = ?1 AND n.complexity >= ?3
         GROUP BY n.id
         HAVING fanout >= ?2
         ORDER BY fanout DESC, n.complexity DESC, n.id",
    )?;
    let rows = stmt.query_map(
        params![project_id, min_fanout as i64, min_complexity as i64],
        |row| {
            Ok(Hotspot {
                node_id: row.get(0)?,
                symbol_name: row.get(1)?,
                complexity: row.get::<_, i64>(2)? as u32,
                fanout: row.get::<_, i64>(3)? as u64,
            })
        },
    )?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// `(node_count, edge_count)` for one project.
pub fn project_counts(conn: &Connection, project_id: &str) -> Result<(u64, u64), StoreError> {
    let nodes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM intel_nodes WHERE project_id = ?1",
        params![project_id],
        |row| row.get(0),
    )?;
    let edges: i64 = conn.query_row(
        "SELECT COUNT(*) FROM intel_edges e
         JOIN intel_nodes n ON e.caller_id = n.id
         WHERE n.project_id = ?1",
        params![project_id],
        |row| row.get(0),
    )?;
    Ok((nodes as u64, edges as u64))
}

impl Store {
    pub fn node_type_counts(
        &self,
        project_id: &str,
    ) -> Result<BTreeMap<String, u64>, StoreError> {
        node_type_counts(self.conn(), project_id)
    }

    pub fn edge_type_counts(
        &self,
        project_id: &str,
    ) -> Result<BTreeMap<String, u64>, StoreError> {
        edge_type_counts(self.conn(), project_id)
    }

    pub fn complexity_histogram(
        &self,
        project_id: &str,
    ) -> Result<ComplexityHistogram, StoreError> {
        complexity_histogram(self.conn(), project_id)
    }

    pub fn hotspots(
        &self,
        project_id: &str,
        min_fanout: u64,
        min_complexity: u32,
    ) -> Result<Vec<Hotspot>, StoreError> {
        hotspots(self.conn(), project_id, min_fanout, min_complexity)
    }
}
