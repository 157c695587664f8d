//! Per-agent store registry.
//!
//! Holds one [`MemoryStore`] per agent. The map is guarded by an `RwLock` and
//! each store by its own `Mutex`, so different agents never contend.

use super::MemoryStore;
use crate::clock::{SystemTimeSource, TimeSource};
use crate::config::MemoryConfig;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// A store shared between callers.
pub type SharedStore = Arc<Mutex<MemoryStore>>;

/// Repository of memory stores keyed by agent ID.
pub struct MemoryRegistry {
    config: MemoryConfig,
    clock: Arc<dyn TimeSource>,
    stores: RwLock<HashMap<String, SharedStore>>,
}

impl MemoryRegistry {
    /// Creates an empty registry whose stores use `config` and the system
    /// clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the configuration is invalid.
    pub fn new(config: MemoryConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Creates an empty registry whose stores read time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the configuration is invalid.
    pub fn with_clock(config: MemoryConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            stores: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the agent's store, creating an empty one on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty agent ID and
    /// [`Error::OperationFailed`] if the registry lock is poisoned.
    pub fn get_or_create(&self, agent_id: &str) -> Result<SharedStore> {
        check_agent_id(agent_id)?;
        if let Some(store) = self.read("get_or_create")?.get(agent_id) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.write("get_or_create")?;
        // Another caller may have created it between the two locks.
        if let Some(store) = stores.get(agent_id) {
            return Ok(Arc::clone(store));
        }
        let store = MemoryStore::with_clock(self.config.clone(), Arc::clone(&self.clock))?;
        let shared = Arc::new(Mutex::new(store));
        stores.insert(agent_id.to_string(), Arc::clone(&shared));
        tracing::debug!(agent_id, "created memory store");
        Ok(shared)
    }

    /// Returns the agent's store if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the registry lock is poisoned.
    pub fn get(&self, agent_id: &str) -> Result<Option<SharedStore>> {
        Ok(self.read("get")?.get(agent_id).map(Arc::clone))
    }

    /// Registers an existing store (e.g. one restored from a snapshot),
    /// replacing any store already held for the agent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty agent ID and
    /// [`Error::OperationFailed`] if the registry lock is poisoned.
    pub fn insert(&self, agent_id: &str, store: MemoryStore) -> Result<SharedStore> {
        check_agent_id(agent_id)?;
        let shared = Arc::new(Mutex::new(store));
        self.write("insert")?
            .insert(agent_id.to_string(), Arc::clone(&shared));
        Ok(shared)
    }

    /// Drops the agent's store. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the registry lock is poisoned.
    pub fn remove(&self, agent_id: &str) -> Result<bool> {
        Ok(self.write("remove")?.remove(agent_id).is_some())
    }

    /// Agent IDs with a store, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the registry lock is poisoned.
    pub fn agent_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.read("agent_ids")?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn read(
        &self,
        operation: &str,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, SharedStore>>> {
        self.stores.read().map_err(|_| poisoned(operation))
    }

    fn write(
        &self,
        operation: &str,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, SharedStore>>> {
        self.stores.write().map_err(|_| poisoned(operation))
    }
}

/// Locks a shared store, mapping poisoning to [`Error::OperationFailed`].
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if a previous holder panicked.
pub fn lock_store(store: &SharedStore) -> Result<std::sync::MutexGuard<'_, MemoryStore>> {
    store.lock().map_err(|_| poisoned("lock_store"))
}

fn check_agent_id(agent_id: &str) -> Result<()> {
    if agent_id.trim().is_empty() {
        return Err(Error::InvalidInput("agent id cannot be empty".to_string()));
    }
    Ok(())
}

fn poisoned(operation: &str) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: "Lock poisoned".to_string(),
    }
}
