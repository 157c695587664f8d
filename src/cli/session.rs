//! Snapshot-backed agent session used by CLI commands.

use crate::clock::{SystemTimeSource, TimeSource};
use crate::config::CogmemConfig;
use crate::services::MemoryStore;
use crate::Result;
use crate::storage::{MemoryCollection, SnapshotStore};
use std::path::PathBuf;
use std::sync::Arc;

/// One agent's store loaded from its snapshot.
///
/// Mutating commands go through [`AgentSession::store_mut`], which marks the
/// session dirty; [`AgentSession::finish`] only writes when something changed.
pub struct AgentSession {
    agent_id: String,
    snapshots: SnapshotStore,
    store: MemoryStore,
    dirty: bool,
}

impl AgentSession {
    /// Opens the session for `agent_id` using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent ID is invalid or the snapshot cannot be
    /// loaded.
    pub fn open(config: &CogmemConfig, agent_id: &str) -> Result<Self> {
        Self::open_with_clock(config, agent_id, Arc::new(SystemTimeSource))
    }

    /// Opens the session for `agent_id` reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent ID is invalid or the snapshot cannot be
    /// loaded.
    pub fn open_with_clock(
        config: &CogmemConfig,
        agent_id: &str,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        let snapshots = SnapshotStore::new(&config.data_dir);
        let collection = snapshots
            .load(agent_id)?
            .unwrap_or_else(|| MemoryCollection::new(clock.now()));
        let store = MemoryStore::from_collection(config.memory.clone(), collection, clock)?;

        Ok(Self {
            agent_id: agent_id.to_string(),
            snapshots,
            store,
            dirty: false,
        })
    }

    /// The agent this session belongs to.
    #[must_use]
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Read access to the store.
    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Write access to the store; the snapshot will be saved on finish.
    pub const fn store_mut(&mut self) -> &mut MemoryStore {
        self.dirty = true;
        &mut self.store
    }

    /// Saves the snapshot if the store was modified.
    ///
    /// Returns the snapshot path when a write happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn finish(self) -> Result<Option<PathBuf>> {
        if !self.dirty {
            return Ok(None);
        }
        let path = self.snapshots.save(&self.agent_id, self.store.collection())?;
        Ok(Some(path))
    }
}
