//! Engine configuration
//!
//! A plain typed value: loading it from files or flags is the embedding
//! application's business, not the core's.

use taproot_core::GravityWeights;
use taproot_embed::DEFAULT_DIMENSION;
use taproot_store::StoreOptions;

/// Embedding layer knobs.
#[derive(Debug, Clone)]
pub struct EmbeddingOptions {
    pub dimension: usize,
    /// Capacity of the shared FIFO embedding cache.
    pub cache_size: usize,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        EmbeddingOptions {
            dimension: DEFAULT_DIMENSION,
            cache_size: 10_000,
        }
    }
}

/// All recognized configuration, with the documented defaults.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Token budget used when a caller does not pass one.
    pub token_budget_default: u64,
    pub traversal: GravityWeights,
    pub embedding: EmbeddingOptions,
    pub store: StoreOptions,
    /// Reader connections in the store pool.
    pub store_readers: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            token_budget_default: 2_000,
            traversal: GravityWeights::default(),
            embedding: EmbeddingOptions::default(),
            store: StoreOptions::default(),
            store_readers: taproot_store::DEFAULT_READERS,
        }
    }
}
