//! Consolidation statistics and diagnostic snapshots.

use super::{MemoryRecord, Valence};
use serde::Serialize;
use std::collections::BTreeMap;

/// Statistics from a consolidation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidationStats {
    /// Episodic records scanned.
    pub scanned: usize,
    /// Topics that met the pattern threshold.
    pub patterns_found: usize,
    /// Semantic records created or overwritten.
    pub semantic_written: usize,
    /// Identity trait nudges applied.
    pub identity_updates: usize,
    /// Records archived. Archival is not performed, so this is always 0.
    pub archived: usize,
}

impl ConsolidationStats {
    /// Returns true if the pass changed nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.semantic_written == 0 && self.identity_updates == 0 && self.archived == 0
    }

    /// Returns a human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.scanned == 0 {
            "No memories to consolidate".to_string()
        } else {
            format!(
                "Scanned: {}, Patterns: {}, Semantic written: {}, Identity updates: {}, Archived: {}",
                self.scanned,
                self.patterns_found,
                self.semantic_written,
                self.identity_updates,
                self.archived
            )
        }
    }
}

/// Read-only diagnostic view of a memory collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemorySummary {
    /// Episodic records currently held.
    pub episodic: usize,
    /// Semantic patterns held.
    pub semantic: usize,
    /// Identity traits held.
    pub identity: usize,
    /// Successful store calls over the collection's lifetime.
    pub total_memories: u64,
    /// Configured episodic capacity.
    pub capacity: usize,
    /// Last consolidation (Unix epoch seconds).
    pub last_consolidation: u64,
    /// Consolidation efficiency in [0, 1].
    pub efficiency: f32,
    /// Identity trait strengths.
    pub traits: BTreeMap<String, f32>,
    /// Components that have contributed collaboration hints.
    pub partners: Vec<String>,
}

/// Context handed to collaborating components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedContext {
    /// Most recent episodic records, newest first.
    pub recent: Vec<MemoryRecord>,
    /// Dominant valence across episodic memory.
    pub dominant_valence: Valence,
    /// Identity traits ordered by strength, strongest first.
    pub top_traits: Vec<(String, f32)>,
    /// Semantic pattern keys.
    pub patterns: Vec<String>,
}
