//! Row types for the node and edge tables.

use taproot_core::{DependKind, EdgeMetadata, SymbolKind};

/// One row of `intel_nodes`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Database id; `None` until inserted.
    pub id: Option<i64>,
    pub project_id: String,
    pub file_path: String,
    pub symbol_name: String,
    pub qualified_name: Option<String>,
    pub kind: SymbolKind,
    pub signature: String,
    pub byte_start: u64,
    pub byte_end: u64,
    pub complexity: u32,
    /// Hex-encoded 256-bit content hash.
    pub content_hash: String,
    /// Little-endian f32 blob, or `None` when no embedding is attached.
    pub embedding: Option<Vec<u8>>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One row of `intel_edges`. `(caller_id, callee_id, kind)` is the
/// composite primary key; inserts upsert the metadata column.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub caller_id: i64,
    pub callee_id: i64,
    pub kind: DependKind,
    pub metadata: EdgeMetadata,
}

/// One row of `analysis_cache`: derived analyses keyed by content hash.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisEntry {
    /// Opaque control-flow summary blob.
    pub cfg_data: Vec<u8>,
    /// Opaque complexity metrics blob.
    pub complexity_metrics: Vec<u8>,
    /// Unix seconds at computation time.
    pub computed_at: i64,
}
