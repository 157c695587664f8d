//! Per-agent memory collection.

use crate::models::{MemoryId, MemoryKind, MemoryRecord, Valence};
use crate::scoring::clamp_unit;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// All memory held for one agent.
///
/// The episodic log is insertion ordered; index 0 is the oldest record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryCollection {
    /// Raw events, oldest first.
    pub(crate) episodic: Vec<MemoryRecord>,
    /// Derived patterns keyed by pattern key.
    pub(crate) semantic: BTreeMap<String, MemoryRecord>,
    /// Trait strengths in [0, 1].
    pub(crate) identity: BTreeMap<String, f32>,
    /// Occurrence count each pattern had when last promoted.
    #[serde(default)]
    pub(crate) consolidated_counts: BTreeMap<String, usize>,
    /// Collaboration partners seen.
    #[serde(default)]
    pub(crate) partners: BTreeSet<String>,
    /// Last consolidation (Unix epoch seconds).
    pub(crate) last_consolidation: u64,
    /// Episodic records stored since the last consolidation.
    #[serde(default)]
    pub(crate) stored_since_consolidation: usize,
    /// Successful store calls.
    pub(crate) total_memories: u64,
    /// Consolidation efficiency in [0, 1].
    pub(crate) efficiency: f32,
}

impl MemoryCollection {
    /// Creates an empty collection whose consolidation clock starts at `now`.
    #[must_use]
    pub fn new(now: u64) -> Self {
        Self {
            last_consolidation: now,
            ..Self::default()
        }
    }

    /// Episodic records, oldest first.
    #[must_use]
    pub fn episodic(&self) -> &[MemoryRecord] {
        &self.episodic
    }

    /// Semantic patterns keyed by pattern key.
    #[must_use]
    pub const fn semantic(&self) -> &BTreeMap<String, MemoryRecord> {
        &self.semantic
    }

    /// Identity trait strengths.
    #[must_use]
    pub const fn identity(&self) -> &BTreeMap<String, f32> {
        &self.identity
    }

    /// Collaboration partners seen.
    #[must_use]
    pub const fn partners(&self) -> &BTreeSet<String> {
        &self.partners
    }

    /// Last consolidation timestamp.
    #[must_use]
    pub const fn last_consolidation(&self) -> u64 {
        self.last_consolidation
    }

    /// Successful store calls over the collection's lifetime.
    #[must_use]
    pub const fn total_memories(&self) -> u64 {
        self.total_memories
    }

    /// Consolidation efficiency.
    #[must_use]
    pub const fn efficiency(&self) -> f32 {
        self.efficiency
    }

    /// Number of records or traits held for `kind`.
    #[must_use]
    pub fn count(&self, kind: MemoryKind) -> usize {
        match kind {
            MemoryKind::Episodic => self.episodic.len(),
            MemoryKind::Semantic => self.semantic.len(),
            MemoryKind::Identity => self.identity.len(),
        }
    }

    /// Looks up an episodic record by ID.
    #[must_use]
    pub fn get(&self, id: &MemoryId) -> Option<&MemoryRecord> {
        self.episodic.iter().find(|r| &r.id == id)
    }

    /// Appends an episodic record.
    pub(crate) fn push_episodic(&mut self, record: MemoryRecord) {
        self.episodic.push(record);
        self.stored_since_consolidation += 1;
    }

    /// Inserts or replaces a semantic record under `key`.
    pub(crate) fn upsert_semantic(&mut self, key: String, record: MemoryRecord) {
        self.semantic.insert(key, record);
    }

    /// Sets a trait strength, clamped to [0, 1].
    pub(crate) fn set_trait(&mut self, name: String, strength: f32) {
        self.identity.insert(name, clamp_unit(strength));
    }

    /// Adds `delta` to a trait strength, clamped to [0, 1].
    pub(crate) fn nudge_trait(&mut self, name: &str, delta: f32) {
        let strength = self.identity.entry(name.to_string()).or_insert(0.0);
        *strength = clamp_unit(*strength + delta);
    }

    /// Removes an episodic record by ID.
    pub(crate) fn remove(&mut self, id: &MemoryId) -> Option<MemoryRecord> {
        let idx = self.episodic.iter().position(|r| &r.id == id)?;
        Some(self.episodic.remove(idx))
    }

    /// Evicts episodic records until at most `capacity` remain.
    ///
    /// The victim is always the lowest-importance record, the oldest among
    /// equal importance. Returns the evicted records, first evicted first.
    pub(crate) fn evict_to(&mut self, capacity: usize) -> Vec<MemoryRecord> {
        let mut evicted = Vec::new();
        while self.episodic.len() > capacity {
            let Some(idx) = self.eviction_candidate() else {
                break;
            };
            evicted.push(self.episodic.remove(idx));
        }
        evicted
    }

    fn eviction_candidate(&self) -> Option<usize> {
        // min_by returns the first minimum, which is the oldest on ties.
        self.episodic
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.importance.total_cmp(&b.importance))
            .map(|(idx, _)| idx)
    }

    /// Tallies the valence of episodic records.
    #[must_use]
    pub fn dominant_valence(&self) -> Valence {
        let mut counts = [0usize; 4];
        for record in &self.episodic {
            let slot = match record.valence {
                Valence::Positive => 0,
                Valence::Negative => 1,
                Valence::Neutral => 2,
                Valence::Mixed => 3,
            };
            counts[slot] += 1;
        }
        Valence::dominant(counts[0], counts[1], counts[2], counts[3])
    }

    /// Records that consolidation finished at `now`.
    pub(crate) const fn mark_consolidated(&mut self, now: u64, efficiency: f32) {
        self.last_consolidation = now;
        self.stored_since_consolidation = 0;
        self.efficiency = efficiency;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn record(id: &str, importance: f32) -> MemoryRecord {
        MemoryRecord {
            id: MemoryId::new(id),
            kind: MemoryKind::Episodic,
            content: id.to_string(),
            created_at: 0,
            confidence: 1.0,
            importance,
            valence: Valence::Neutral,
            entities: BTreeSet::new(),
            topics: BTreeSet::new(),
            collaboration: Vec::new(),
        }
    }

    #[test]
    fn test_evict_lowest_importance_oldest_first() {
        let mut collection = MemoryCollection::new(0);
        collection.push_episodic(record("a", 0.5));
        collection.push_episodic(record("b", 0.9));
        collection.push_episodic(record("c", 0.5));
        collection.push_episodic(record("d", 0.7));

        let evicted = collection.evict_to(2);
        let ids: Vec<_> = evicted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        let kept: Vec<_> = collection.episodic().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(kept, vec!["b", "d"]);
    }

    #[test]
    fn test_evict_noop_under_capacity() {
        let mut collection = MemoryCollection::new(0);
        collection.push_episodic(record("a", 0.5));
        assert!(collection.evict_to(5).is_empty());
        assert_eq!(collection.count(MemoryKind::Episodic), 1);
    }

    #[test]
    fn test_remove() {
        let mut collection = MemoryCollection::new(0);
        collection.push_episodic(record("a", 0.5));
        assert!(collection.remove(&MemoryId::new("missing")).is_none());
        assert!(collection.remove(&MemoryId::new("a")).is_some());
        assert!(collection.episodic().is_empty());
    }

    #[test]
    fn test_nudge_trait_clamps() {
        let mut collection = MemoryCollection::new(0);
        for _ in 0..15 {
            collection.nudge_trait("creative", 0.1);
        }
        let strength = collection.identity().get("creative").copied();
        assert_eq!(strength, Some(1.0));
    }

    #[test]
    fn test_dominant_valence() {
        let mut collection = MemoryCollection::new(0);
        assert_eq!(collection.dominant_valence(), Valence::Neutral);
        let mut happy = record("h", 0.5);
        happy.valence = Valence::Positive;
        collection.push_episodic(happy);
        assert_eq!(collection.dominant_valence(), Valence::Positive);
    }
}
