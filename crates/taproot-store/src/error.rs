//! Storage error types.

use thiserror::Error;

/// Errors produced by store operations.
///
/// Batch operations roll the entire batch back on any failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),

    /// The database could not be opened at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Another writer holds the database.
    #[error("concurrent writer detected: {0}")]
    Conflict(rusqlite::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// JSON (de)serialization of a metadata column failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A node row was not found.
    #[error("node not found: {0}")]
    NodeNotFound(i64),

    /// Persisted rows violate graph invariants (dangling references,
    /// unknown enum tags, broken checksums).
    #[error("corrupt store: {0}")]
    CorruptStore(String),

    /// Cooperative cancellation. Already-committed transactions remain
    /// visible; the in-flight one was rolled back.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                StoreError::Conflict(e)
            }
            _ => StoreError::Sqlite(e),
        }
    }
}

impl From<taproot_core::GraphError> for StoreError {
    fn from(e: taproot_core::GraphError) -> Self {
        match e {
            taproot_core::GraphError::Cancelled => StoreError::Cancelled,
            other => StoreError::CorruptStore(other.to_string()),
        }
    }
}
