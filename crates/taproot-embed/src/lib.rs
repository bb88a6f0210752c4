//! Taproot Embed — node embeddings, similarity, and the embedder boundary

pub mod cache;
pub mod embedder;
pub mod embedding;
pub mod error;

#[cfg(test)]
mod tests;

pub use cache::EmbeddingCache;
pub use embedder::Embedder;
pub use embedding::{
    DEFAULT_DIMENSION, NodeEmbedding, blob_to_vector, similarity, similarity_checked,
    vector_to_blob,
};
pub use error::EmbedError;
