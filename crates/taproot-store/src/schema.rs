//! SQL schema constants and migration setup
//!
//! Uses `rusqlite_migration` to manage the schema via SQLite's
//! `user_version` pragma. Migrations are embedded at compile time.

use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

use crate::error::StoreError;

/// Synchronous durability level, relaxable during bulk load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Synchronous {
    Off,
    #[default]
    Normal,
    Full,
}

impl Synchronous {
    pub fn as_str(&self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
        }
    }
}

/// Connection-level store configuration.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Write-ahead logging: concurrent readers alongside a single writer.
    pub wal: bool,
    /// Page cache size, in pages.
    pub cache_pages: u32,
    /// Synchronous level applied while a bulk load is in progress;
    /// `NORMAL` is restored afterwards.
    pub synchronous_bulk: Synchronous,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            wal: true,
            cache_pages: 10_000,
            synchronous_bulk: Synchronous::Normal,
        }
    }
}

/// All schema migrations, applied in order via `user_version` tracking.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!(
        "migrations/001_initial_schema.sql"
    ))])
}

/// Opens (or creates) a database at `path` with the configured pragmas and
/// all pending migrations applied.
pub fn open_database(path: &str, options: &StoreOptions) -> Result<Connection, StoreError> {
    let mut conn =
        Connection::open(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;
    configure_and_migrate(&mut conn, options)?;
    Ok(conn)
}

/// Opens an in-memory database (for tests).
pub fn open_in_memory(options: &StoreOptions) -> Result<Connection, StoreError> {
    let mut conn = Connection::open_in_memory()?;
    configure_and_migrate(&mut conn, options)?;
    Ok(conn)
}

fn configure_and_migrate(
    conn: &mut Connection,
    options: &StoreOptions,
) -> Result<(), StoreError> {
    let journal = if options.wal { "WAL" } else { "DELETE" };
    conn.pragma_update(None, "journal_mode", journal)?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "cache_size", options.cache_pages as i64)?;
    // Foreign keys are off by default in SQLite.
    conn.pragma_update(None, "foreign_keys", "ON")?;

    migrations()
        .to_latest(conn)
        .map_err(|e| StoreError::Migration(e.to_string()))?;
    Ok(())
}
