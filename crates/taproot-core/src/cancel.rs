//! Cooperative cancellation and progress-based timeouts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::GraphError;

/// Clonable cancellation flag checked at loop boundaries of long-running
/// operations. Cancellation is always a clean error return, never a panic.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Returns `Err(GraphError::Cancelled)` once cancellation was requested.
    pub fn checkpoint(&self) -> Result<(), GraphError> {
        if self.is_cancelled() {
            Err(GraphError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Idle timeout: trips when no progress is reported for the configured
/// duration, rather than after a fixed wall-clock deadline.
#[derive(Debug)]
pub struct IdleTimer {
    limit: Duration,
    last_progress: Instant,
}

impl IdleTimer {
    pub fn new(limit: Duration) -> Self {
        IdleTimer {
            limit,
            last_progress: Instant::now(),
        }
    }

    /// Records progress, resetting the idle window.
    pub fn tick(&mut self) {
        self.last_progress = Instant::now();
    }

    pub fn expired(&self) -> bool {
        self.last_progress.elapsed() > self.limit
    }

    /// Treats an expired idle window as cancellation.
    pub fn checkpoint(&self) -> Result<(), GraphError> {
        if self.expired() {
            Err(GraphError::Cancelled)
        } else {
            Ok(())
        }
    }
}
