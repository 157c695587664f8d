//! Data models for cogmem.
//!
//! This module contains the core data structures shared by the store, the
//! scoring functions, and the CLI.

mod capture;
mod consolidation;
mod hints;
mod memory;

pub use capture::{DEFAULT_MIN_CONFIDENCE, DEFAULT_RETRIEVE_LIMIT, RetrieveQuery, StoreRequest};
pub use consolidation::{ConsolidationStats, MemorySummary, SharedContext};
pub use hints::CollaborationHint;
pub use memory::{MemoryHit, MemoryId, MemoryKind, MemoryRecord, Valence, normalize_tags};
