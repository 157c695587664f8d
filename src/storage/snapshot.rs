//! JSON snapshots of per-agent collections.
//!
//! Each agent's collection lives in `<data_dir>/<agent_id>.json`. Writes go to
//! a temporary file that is renamed into place, so a crash mid-write leaves
//! the previous snapshot intact.
//!
//! # Security
//!
//! - **Path traversal**: agent IDs are restricted to `[A-Za-z0-9_-]`
//! - **File size limits**: snapshots larger than 16 MiB are refused

use super::MemoryCollection;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Maximum snapshot size accepted on load.
const MAX_SNAPSHOT_BYTES: u64 = 16 * 1024 * 1024;

/// Maximum agent ID length.
const MAX_AGENT_ID_LEN: usize = 128;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    agent_id: String,
    saved_at: u64,
    collection: MemoryCollection,
}

/// Reads and writes agent snapshots under a data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a snapshot store rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the snapshot for `agent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unsafe agent IDs.
    pub fn path_for(&self, agent_id: &str) -> Result<PathBuf> {
        validate_agent_id(agent_id)?;
        Ok(self.data_dir.join(format!("{agent_id}.json")))
    }

    /// Loads the collection for `agent_id`, or `None` if no snapshot exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, too large, malformed, or
    /// written by a newer format version.
    pub fn load(&self, agent_id: &str) -> Result<Option<MemoryCollection>> {
        let path = self.path_for(agent_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let size = fs::metadata(&path)
            .map_err(|e| io_error("stat_snapshot", &path, &e))?
            .len();
        if size > MAX_SNAPSHOT_BYTES {
            return Err(Error::OperationFailed {
                operation: "load_snapshot".to_string(),
                cause: format!(
                    "{} is {size} bytes, limit is {MAX_SNAPSHOT_BYTES}",
                    path.display()
                ),
            });
        }

        let contents =
            fs::read_to_string(&path).map_err(|e| io_error("read_snapshot", &path, &e))?;
        let snapshot: Snapshot =
            serde_json::from_str(&contents).map_err(|e| Error::OperationFailed {
                operation: "parse_snapshot".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(Error::OperationFailed {
                operation: "load_snapshot".to_string(),
                cause: format!(
                    "snapshot version {} is newer than supported version {SNAPSHOT_VERSION}",
                    snapshot.version
                ),
            });
        }

        tracing::debug!(
            agent_id,
            episodic = snapshot.collection.episodic().len(),
            "loaded snapshot"
        );
        Ok(Some(snapshot.collection))
    }

    /// Writes the collection for `agent_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, agent_id: &str, collection: &MemoryCollection) -> Result<PathBuf> {
        let path = self.path_for(agent_id)?;
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| io_error("create_data_dir", &self.data_dir, &e))?;

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            agent_id: agent_id.to_string(),
            saved_at: crate::current_timestamp(),
            collection: collection.clone(),
        };
        let json =
            serde_json::to_string_pretty(&snapshot).map_err(|e| Error::OperationFailed {
                operation: "serialize_snapshot".to_string(),
                cause: e.to_string(),
            })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| io_error("write_snapshot", &tmp, &e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error("rename_snapshot", &path, &e))?;

        tracing::debug!(agent_id, path = %path.display(), "saved snapshot");
        Ok(path)
    }

    /// Deletes the snapshot for `agent_id`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn remove(&self, agent_id: &str) -> Result<bool> {
        let path = self.path_for(agent_id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| io_error("remove_snapshot", &path, &e))?;
        Ok(true)
    }
}

/// Rejects agent IDs that are empty, too long, or not filesystem-safe.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] describing the problem.
pub fn validate_agent_id(agent_id: &str) -> Result<()> {
    if agent_id.is_empty() {
        return Err(Error::InvalidInput("agent id cannot be empty".to_string()));
    }
    if agent_id.len() > MAX_AGENT_ID_LEN {
        return Err(Error::InvalidInput(format!(
            "agent id exceeds {MAX_AGENT_ID_LEN} characters"
        )));
    }
    if !agent_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::InvalidInput(format!(
            "agent id '{agent_id}' may only contain ASCII letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}

fn io_error(operation: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("{}: {e}", path.display()),
    }
}
