//! Engine error type, folding the per-layer errors together.

use thiserror::Error;

/// Errors surfaced by [`crate::CoreContext`] operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] taproot_core::GraphError),

    #[error(transparent)]
    Store(#[from] taproot_store::StoreError),

    #[error(transparent)]
    Embed(#[from] taproot_embed::EmbedError),

    /// Sidecar snapshot I/O failed.
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    /// The sidecar file exists but cannot be decoded.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// No graph is loaded (or indexed) for the requested project.
    #[error("project not loaded: {0}")]
    ProjectNotLoaded(String),

    /// Caller-supplied embeddings do not line up with the signatures.
    #[error("embedding count mismatch: {expected} signatures, {got} embeddings")]
    MismatchedEmbeddings { expected: usize, got: usize },
}

impl EngineError {
    /// Whether this error is a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            EngineError::Graph(taproot_core::GraphError::Cancelled)
                | EngineError::Store(taproot_store::StoreError::Cancelled)
        )
    }
}
