//! Node embeddings and cosine similarity

use serde::{Deserialize, Serialize};
use taproot_core::NodeId;

use crate::error::EmbedError;

/// Default embedding dimension. Any positive dimension is legal per
/// embedding; mixed dimensions simply never match in similarity scans.
pub const DEFAULT_DIMENSION: usize = 768;

/// A fixed-dimension vector attached to one graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEmbedding {
    pub node_id: NodeId,
    pub vector: Vec<f32>,
    /// Which model produced the vector.
    pub model_id: String,
}

impl NodeEmbedding {
    pub fn new(node_id: NodeId, vector: Vec<f32>, model_id: impl Into<String>) -> Self {
        NodeEmbedding {
            node_id,
            vector,
            model_id: model_id.into(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Cosine similarity between two vectors.
///
/// Never fails: mismatched dimensions, empty vectors, and zero-magnitude
/// vectors all score `0.0`. Use [`similarity_checked`] when the caller
/// wants the mismatch surfaced instead.
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Cosine similarity that surfaces a dimension mismatch as an error
/// instead of silently scoring zero.
pub fn similarity_checked(a: &[f32], b: &[f32]) -> Result<f32, EmbedError> {
    if a.len() != b.len() {
        return Err(EmbedError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(similarity(a, b))
}

/// Encodes a vector as a little-endian f32 byte blob, the form embeddings
/// take in store columns and snapshot files.
pub fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Decodes a little-endian f32 byte blob. A blob whose length is not a
/// multiple of four decodes to `None` rather than an error.
pub fn blob_to_vector(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    let mut vector = Vec::with_capacity(blob.len() / 4);
    for chunk in blob.chunks_exact(4) {
        vector.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Some(vector)
}
