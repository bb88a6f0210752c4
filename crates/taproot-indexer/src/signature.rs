//! Parsed signature records handed over by language-specific parsers.

use serde::{Deserialize, Serialize};
use taproot_core::{ByteRange, ContentHash, SymbolKind};

/// One extracted symbol signature, the unit of ingest.
///
/// Produced by an external parser; the indexer only lifts these into graph
/// nodes and coarse edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub project_id: String,
    pub file_path: String,
    pub symbol_name: String,
    pub qualified_name: Option<String>,
    pub kind: SymbolKind,
    pub signature: String,
    pub byte_range: ByteRange,
    pub complexity: u32,
    /// Digest of the normalized symbol content, computed by the parser.
    pub content_hash: ContentHash,
    /// Parameter type names, fuel for the data-dependency heuristic.
    pub parameter_types: Vec<String>,
}
