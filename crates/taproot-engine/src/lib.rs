//! Taproot Engine — the caller-facing context over graph, embeddings,
//! traversal, and store

pub mod config;
pub mod context;
pub mod error;
pub mod snapshot;

pub use config::{CoreConfig, EmbeddingOptions};
pub use context::{CoreContext, Diagnostics, IndexReport};
pub use error::EngineError;
pub use snapshot::{clear_snapshot, load_snapshot, save_snapshot};
