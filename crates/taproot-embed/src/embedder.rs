//! Embedder boundary trait
//!
//! Embedding generation is an external collaborator: hardware-accelerated
//! model inference lives behind this async trait and the core never blocks
//! on it directly.

use async_trait::async_trait;

use crate::error::EmbedError;

/// Produces fixed-dimension vectors for batches of texts.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds each text; all output vectors share [`Embedder::dimension`].
    /// Collaborator failures surface as [`EmbedError::Unavailable`].
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn dimension(&self) -> usize;

    /// Identifier recorded on embeddings this backend produces.
    fn model_id(&self) -> &str;
}
