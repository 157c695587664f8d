//! Business logic services.
//!
//! Services own a collection (or a set of them) and provide the high-level
//! memory operations.

mod consolidation;
mod registry;
mod store;

pub use consolidation::{ConsolidationService, TRAIT_NUDGE};
pub use registry::{MemoryRegistry, SharedStore, lock_store};
pub use store::MemoryStore;
