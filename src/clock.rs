//! Time source abstraction.
//!
//! The store reads the clock through [`TimeSource`] so that time-triggered
//! consolidation can be exercised deterministically in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Supplies the current time in Unix epoch seconds.
pub trait TimeSource: Send + Sync {
    /// Returns the current time in seconds since the Unix epoch.
    fn now(&self) -> u64;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        crate::current_timestamp()
    }
}

/// Manually driven time source.
///
/// Clones share the same underlying clock.
#[derive(Debug, Clone)]
pub struct FakeTimeSource {
    time: Arc<AtomicU64>,
}

impl Default for FakeTimeSource {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

impl FakeTimeSource {
    /// Creates a fake clock at the given timestamp.
    #[must_use]
    pub fn new(initial: u64) -> Self {
        Self {
            time: Arc::new(AtomicU64::new(initial)),
        }
    }

    /// Moves the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.time.fetch_add(secs, Ordering::SeqCst);
    }

    /// Sets the clock to `secs`.
    pub fn set(&self, secs: u64) {
        self.time.store(secs, Ordering::SeqCst);
    }
}

impl TimeSource for FakeTimeSource {
    fn now(&self) -> u64 {
        self.time.load(Ordering::SeqCst)
    }
}
