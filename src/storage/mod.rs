//! Memory storage: the in-memory collection and its on-disk snapshots.

mod collection;
mod snapshot;

pub use collection::MemoryCollection;
pub use snapshot::{SNAPSHOT_VERSION, SnapshotStore, validate_agent_id};
