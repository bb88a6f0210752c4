//! Embedding error types.

use thiserror::Error;

/// Errors produced by the embedding layer.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The upstream embedding backend failed or is unreachable.
    #[error("embedder unavailable: {0}")]
    Unavailable(String),

    /// Vectors of different dimensions were combined where the caller
    /// asked for the mismatch to be surfaced. Plain similarity scores
    /// mismatches as 0.0 instead.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
