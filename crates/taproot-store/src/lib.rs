//! Taproot Store — durable persistence for dependence graphs, the
//! incremental analysis cache, and read-only analytics

pub mod analytics;
pub mod bridge;
pub mod cache;
pub mod error;
pub mod pool;
pub mod records;
pub mod schema;
pub mod store;


pub use analytics::{ComplexityHistogram, Hotspot};
pub use error::StoreError;
pub use pool::{DEFAULT_READERS, StorePool};
pub use records::{AnalysisEntry, EdgeRecord, NodeRecord};
pub use schema::{StoreOptions, Synchronous};
pub use store::Store;
