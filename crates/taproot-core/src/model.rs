//! Core data structures for the dependence graph

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique, stable identifier for a node.
///
/// Assigned monotonically at insertion and never reused within one graph
/// instance, even after the node is removed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Discriminates what kind of code symbol a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Variable,
    Module,
}

impl SymbolKind {
    /// Stable TEXT form used at the store boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
            SymbolKind::Module => "module",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "function" => Some(SymbolKind::Function),
            "class" => Some(SymbolKind::Class),
            "method" => Some(SymbolKind::Method),
            "variable" => Some(SymbolKind::Variable),
            "module" => Some(SymbolKind::Module),
            _ => None,
        }
    }
}

/// What kind of dependence relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependKind {
    /// Function call. Supplied by an external AST-level extractor.
    Call,
    /// Heuristic data dependency (shared parameter types).
    DataDependency,
    /// Inheritance / class-cluster membership.
    Inheritance,
    /// Import / module dependency.
    Import,
}

impl DependKind {
    /// Stable TEXT form used at the store boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            DependKind::Call => "call",
            DependKind::DataDependency => "data_dependency",
            DependKind::Inheritance => "inheritance",
            DependKind::Import => "import",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "call" => Some(DependKind::Call),
            "data_dependency" => Some(DependKind::DataDependency),
            "inheritance" => Some(DependKind::Inheritance),
            "import" => Some(DependKind::Import),
            _ => None,
        }
    }
}

/// Half-open `[start, end)` byte span in the source file.
///
/// Drives token estimation during traversal: one token per four bytes,
/// rounded up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        ByteRange { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Estimated token cost at ~4 bytes per token, rounded up.
    pub fn token_cost(&self) -> u64 {
        self.len().div_ceil(4)
    }
}

/// 256-bit content digest of a node's normalized content.
///
/// A pure function of the content: two nodes with the same hash share
/// derived analysis-cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Hex form used as the analysis-cache key in the store.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use fmt::Write;
            let _ = write!(s, "{:02x}", b);
        }
        s
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut out = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            out[i] = ((hi << 4) | lo) as u8;
        }
        Some(ContentHash(out))
    }
}

impl Default for ContentHash {
    fn default() -> Self {
        ContentHash([0u8; 32])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A single symbol node in the dependence graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolNode {
    /// Graph-assigned id; `NodeId::default()` until insertion.
    pub id: NodeId,
    /// Scoping tag: equal qualified names in different projects are distinct.
    pub project_id: String,
    pub file_path: String,
    /// Local name, e.g. `foo`.
    pub symbol_name: String,
    /// Optional qualified name, e.g. `A::foo`.
    pub qualified_name: Option<String>,
    pub kind: SymbolKind,
    /// Textual signature.
    pub signature: String,
    pub byte_range: ByteRange,
    /// Cyclomatic-like score; the extractor is the source of truth.
    pub complexity: u32,
    pub content_hash: ContentHash,
    /// Optional fixed-dimension vector attached by the embedding layer.
    pub embedding: Option<Vec<f32>>,
    /// Unix seconds.
    pub created_at: i64,
    pub updated_at: i64,
}

impl SymbolNode {
    /// Name used for symbol-index lookups and cluster heuristics.
    pub fn display_name(&self) -> &str {
        self.qualified_name.as_deref().unwrap_or(&self.symbol_name)
    }
}

/// A value in the open-ended metadata map. Explicitly typed: integers and
/// floats are distinct and never coerced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Text(v.to_string())
    }
}

/// Metadata carried on an edge: known keys plus a fallback map.
///
/// The whole bag round-trips through the store as one JSON column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EdgeMetadata {
    /// Call frequency, for `Call` edges. Merges additively.
    #[serde(default)]
    pub call_count: Option<u64>,
    /// Variable or type name, for `DataDependency` edges.
    #[serde(default)]
    pub variable_name: Option<String>,
    /// Open-ended string-keyed values; last writer wins per key.
    #[serde(default)]
    pub extra: BTreeMap<String, MetaValue>,
}

impl EdgeMetadata {
    /// Merges `other` into `self` under the documented policy:
    /// `call_count` adds, every other field is last-writer-wins.
    pub fn merge(&mut self, other: EdgeMetadata) {
        self.call_count = match (self.call_count, other.call_count) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => b.or(a),
        };
        if other.variable_name.is_some() {
            self.variable_name = other.variable_name;
        }
        for (k, v) in other.extra {
            self.extra.insert(k, v);
        }
    }
}

/// A directed, typed edge in the dependence graph.
///
/// `(source, target, kind)` is the composite identity: parallel edges of
/// the same kind between the same ordered pair collapse into one, merging
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependEdge {
    pub kind: DependKind,
    pub metadata: EdgeMetadata,
}

impl DependEdge {
    pub fn new(kind: DependKind) -> Self {
        DependEdge {
            kind,
            metadata: EdgeMetadata::default(),
        }
    }

    pub fn with_metadata(kind: DependKind, metadata: EdgeMetadata) -> Self {
        DependEdge { kind, metadata }
    }
}

/// Which edge directions `neighbors` follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborDirection {
    Out,
    In,
    Both,
}
