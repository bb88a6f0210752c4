//! Error types for graph construction and traversal.

use thiserror::Error;

use crate::model::NodeId;

/// Errors produced by graph operations.
///
/// Every operation fails locally: on error the graph is unchanged.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An edge referenced a node that is not in the graph.
    #[error("dangling endpoint: {src} -> {target}")]
    DanglingEndpoint { src: NodeId, target: NodeId },

    /// A node id was looked up that is not (or no longer) in the graph.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A serialized graph violated its invariants.
    #[error("corrupt graph: {0}")]
    CorruptGraph(String),

    /// Cooperative cancellation was requested.
    #[error("operation cancelled")]
    Cancelled,
}
