//! Connection pool: one writer, `k` readers
//!
//! WAL mode lets readers proceed concurrently with the single writer.
//! Readers are plain connections handed out round-robin; the writer is the
//! only connection that runs transactions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::StoreError;
use crate::schema::{self, StoreOptions};
use crate::store::Store;

/// Default number of reader connections.
pub const DEFAULT_READERS: usize = 2;

/// Owns the project database's connections.
pub struct StorePool {
    writer: Mutex<Store>,
    readers: Vec<Mutex<Connection>>,
    cursor: AtomicUsize,
}

impl StorePool {
    /// Opens the database at `path` with one writer and `readers` reader
    /// connections (clamped to at least one).
    pub fn open(path: &str, options: StoreOptions, readers: usize) -> Result<Self, StoreError> {
        let writer = Store::open(path, options.clone())?;
        let mut reader_conns = Vec::new();
        for _ in 0..readers.max(1) {
            reader_conns.push(Mutex::new(schema::open_database(path, &options)?));
        }
        Ok(StorePool {
            writer: Mutex::new(writer),
            readers: reader_conns,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Exclusive access to the single writer.
    pub fn writer(&self) -> MutexGuard<'_, Store> {
        self.writer.lock().expect("store writer poisoned")
    }

    /// Round-robin access to a reader connection.
    pub fn reader(&self) -> MutexGuard<'_, Connection> {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        self.readers[slot].lock().expect("store reader poisoned")
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }
}
