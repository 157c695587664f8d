//! # Cogmem
//!
//! Per-agent memory for LLM agents.
//!
//! Cogmem keeps three kinds of memory for each agent: a bounded log of
//! episodic events, semantic patterns distilled from recurring topics, and
//! identity trait strengths corroborated by those patterns. Collaborating
//! components (attention, tone, value alignment) can nudge how new memories
//! are scored through collaboration hints.
//!
//! ## Features
//!
//! - Heuristic importance and lexical relevance scoring behind a trait seam
//! - Capacity-bounded episodic log with importance-based eviction
//! - Time and volume triggered consolidation into patterns and traits
//! - Per-agent registry with independent locking
//! - JSON snapshots for persistence across process runs
//!
//! ## Example
//!
//! ```rust
//! use cogmem::{MemoryConfig, MemoryStore, RetrieveQuery, StoreRequest};
//!
//! let mut store = MemoryStore::new(MemoryConfig::default())?;
//! store.store(StoreRequest::new("Met Alice to discuss the budget").with_entity("alice"))?;
//!
//! let hits = store.retrieve(&RetrieveQuery::new("alice budget"))?;
//! assert_eq!(hits.len(), 1);
//! # Ok::<(), cogmem::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod clock;
pub mod config;
pub mod models;
pub mod observability;
pub mod scoring;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use clock::{FakeTimeSource, SystemTimeSource, TimeSource};
pub use config::{CogmemConfig, MemoryConfig};
pub use models::{
    CollaborationHint, ConsolidationStats, MemoryHit, MemoryId, MemoryKind, MemoryRecord,
    MemorySummary, RetrieveQuery, SharedContext, StoreRequest, Valence,
};
pub use scoring::{HeuristicScorer, MemoryScorer};
pub use services::{MemoryRegistry, MemoryStore};
pub use storage::{MemoryCollection, SnapshotStore};

/// Error type for cogmem operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty content, unknown kind or valence, out-of-range hints or thresholds, bad agent IDs |
/// | `OperationFailed` | Snapshot or config I/O fails, parsing fails, locks are poisoned |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - Content to store is empty
    /// - A kind or valence string is not recognised
    /// - A hint value or `min_confidence` lies outside `0.0..=1.0`
    /// - The memory configuration is invalid
    /// - An agent ID is empty or unsafe for use as a file name
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Snapshot files cannot be read, written, or parsed
    /// - The config file cannot be read or parsed
    /// - Logging or the metrics recorder cannot be installed
    /// - A registry or store lock is poisoned
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for cogmem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use cogmem::current_timestamp;
///
/// let ts = current_timestamp();
/// assert!(ts > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
