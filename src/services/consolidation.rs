//! Memory consolidation service.
//!
//! Promotes recurring episodic topics into semantic patterns and nudges the
//! identity traits those patterns corroborate.

use crate::models::{ConsolidationStats, MemoryId, MemoryKind, MemoryRecord, Valence};
use crate::scoring::{ImportanceInput, MemoryScorer, clamp_unit};
use crate::storage::MemoryCollection;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Strength added to a trait each time a pattern corroborates it.
pub const TRAIT_NUDGE: f32 = 0.1;

/// Occurrences at which a pattern reaches full confidence.
const FULL_CONFIDENCE_OCCURRENCES: f32 = 10.0;

/// Per-topic tally gathered from the episodic log.
#[derive(Debug, Default)]
struct TopicTally {
    count: usize,
    valence: [usize; 4],
}

impl TopicTally {
    const fn add(&mut self, valence: Valence) {
        self.count += 1;
        let slot = match valence {
            Valence::Positive => 0,
            Valence::Negative => 1,
            Valence::Neutral => 2,
            Valence::Mixed => 3,
        };
        self.valence[slot] += 1;
    }

    fn dominant_valence(&self) -> Valence {
        Valence::dominant(
            self.valence[0],
            self.valence[1],
            self.valence[2],
            self.valence[3],
        )
    }
}

/// Service for consolidating a memory collection.
pub struct ConsolidationService {
    /// Minimum occurrences of a topic to become a pattern.
    pattern_threshold: usize,
    /// Scorer used for pattern importance and trait matching.
    scorer: Arc<dyn MemoryScorer>,
}

impl ConsolidationService {
    /// Creates a new consolidation service.
    #[must_use]
    pub fn new(pattern_threshold: usize, scorer: Arc<dyn MemoryScorer>) -> Self {
        Self {
            pattern_threshold: pattern_threshold.max(1),
            scorer,
        }
    }

    /// Runs one consolidation pass over `collection` at time `now`.
    ///
    /// Patterns whose occurrence count has not changed since they were last
    /// promoted are left untouched, so repeated passes without new episodic
    /// input leave the semantic and identity maps unchanged. A pattern whose
    /// count dropped (after deletion or eviction) is refreshed without
    /// nudging any trait.
    pub fn run(&self, collection: &mut MemoryCollection, now: u64) -> ConsolidationStats {
        let mut stats = ConsolidationStats {
            scanned: collection.episodic.len(),
            ..ConsolidationStats::default()
        };

        let mut tallies: BTreeMap<String, TopicTally> = BTreeMap::new();
        for record in &collection.episodic {
            for topic in &record.topics {
                tallies
                    .entry(topic.clone())
                    .or_default()
                    .add(record.valence);
            }
        }

        for (topic, tally) in tallies
            .into_iter()
            .filter(|(_, t)| t.count >= self.pattern_threshold)
        {
            stats.patterns_found += 1;

            let previous = collection
                .consolidated_counts
                .get(&topic)
                .copied()
                .filter(|_| collection.semantic.contains_key(&topic));
            if previous == Some(tally.count) {
                continue;
            }

            let record = self.pattern_record(collection, &topic, &tally, now);
            // Traits only gain strength from new evidence, never from a shrinking log.
            let grew = previous.is_none_or(|count| tally.count > count);
            if grew {
                for name in self.scorer.traits_for(&record.content) {
                    collection.nudge_trait(name, TRAIT_NUDGE);
                    stats.identity_updates += 1;
                }
            }

            tracing::debug!(
                topic = %topic,
                occurrences = tally.count,
                confidence = record.confidence,
                grew,
                "promoted semantic pattern"
            );
            collection.upsert_semantic(topic.clone(), record);
            collection.consolidated_counts.insert(topic, tally.count);
            stats.semantic_written += 1;
        }

        let efficiency = efficiency(
            collection.semantic.len() + collection.identity.len(),
            collection.total_memories,
        );
        collection.mark_consolidated(now, efficiency);

        stats
    }

    /// Builds the semantic record for a pattern, reusing the ID of any record
    /// already stored under the same key.
    #[allow(clippy::cast_precision_loss)]
    fn pattern_record(
        &self,
        collection: &MemoryCollection,
        topic: &str,
        tally: &TopicTally,
        now: u64,
    ) -> MemoryRecord {
        let content = format!(
            "Recurring topic '{topic}' observed in {} episodic memories",
            tally.count
        );
        let topics: BTreeSet<String> = std::iter::once(topic.to_string()).collect();
        let entities = BTreeSet::new();
        let importance = self.scorer.importance(&ImportanceInput {
            content: &content,
            entities: &entities,
            topics: &topics,
        });
        let id = collection
            .semantic
            .get(topic)
            .map_or_else(|| MemoryId::generate(MemoryKind::Semantic), |r| r.id.clone());

        MemoryRecord {
            id,
            kind: MemoryKind::Semantic,
            content,
            created_at: now,
            confidence: clamp_unit(tally.count as f32 / FULL_CONFIDENCE_OCCURRENCES),
            importance,
            valence: tally.dominant_valence(),
            entities,
            topics,
            collaboration: Vec::new(),
        }
    }
}

/// `min(1, 2 * derived / total)`, or 0 when nothing has been stored.
#[allow(clippy::cast_precision_loss)]
fn efficiency(derived: usize, total_memories: u64) -> f32 {
    if total_memories == 0 {
        return 0.0;
    }
    clamp_unit(2.0 * derived as f32 / total_memories as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::normalize_tags;
    use crate::scoring::HeuristicScorer;

    fn episodic(id: &str, topics: &[&str], valence: Valence) -> MemoryRecord {
        MemoryRecord {
            id: MemoryId::new(id),
            kind: MemoryKind::Episodic,
            content: format!("event {id}"),
            created_at: 0,
            confidence: 1.0,
            importance: 0.5,
            valence,
            entities: BTreeSet::new(),
            topics: normalize_tags(topics),
            collaboration: Vec::new(),
        }
    }

    fn collection_with(records: Vec<MemoryRecord>) -> MemoryCollection {
        let mut collection = MemoryCollection::new(0);
        for record in records {
            collection.push_episodic(record);
            collection.total_memories += 1;
        }
        collection
    }

    fn service() -> ConsolidationService {
        ConsolidationService::new(3, Arc::new(HeuristicScorer))
    }

    #[test]
    fn test_consolidate_empty() {
        let mut collection = MemoryCollection::new(0);
        let stats = service().run(&mut collection, 10);
        assert_eq!(stats, ConsolidationStats::default());
        assert_eq!(collection.last_consolidation(), 10);
        assert!(collection.efficiency().abs() < f32::EPSILON);
    }

    #[test]
    fn test_below_threshold_not_promoted() {
        let mut collection = collection_with(vec![
            episodic("a", &["billing"], Valence::Neutral),
            episodic("b", &["billing"], Valence::Neutral),
        ]);
        let stats = service().run(&mut collection, 1);
        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.patterns_found, 0);
        assert!(collection.semantic().is_empty());
    }

    #[test]
    fn test_pattern_confidence_and_valence() {
        let mut collection = collection_with(vec![
            episodic("a", &["billing"], Valence::Negative),
            episodic("b", &["billing"], Valence::Negative),
            episodic("c", &["billing"], Valence::Neutral),
            episodic("d", &["billing"], Valence::Negative),
        ]);
        let stats = service().run(&mut collection, 1);
        assert_eq!(stats.patterns_found, 1);
        assert_eq!(stats.semantic_written, 1);
        let pattern = collection.semantic().get("billing");
        assert!(pattern.is_some_and(|p| (p.confidence - 0.4).abs() < 1e-6));
        assert!(pattern.is_some_and(|p| p.valence == Valence::Negative));
        assert!(pattern.is_some_and(|p| p.kind == MemoryKind::Semantic));
    }

    #[test]
    fn test_trait_nudged_by_pattern() {
        let mut collection = collection_with(vec![
            episodic("a", &["design"], Valence::Positive),
            episodic("b", &["design"], Valence::Positive),
            episodic("c", &["design"], Valence::Positive),
        ]);
        let stats = service().run(&mut collection, 1);
        assert_eq!(stats.identity_updates, 1);
        let strength = collection.identity().get("creative").copied();
        assert!(strength.is_some_and(|s| (s - TRAIT_NUDGE).abs() < 1e-6));
        // (1 semantic + 1 identity) * 2 / 3 stored, clamped
        assert!((collection.efficiency() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let mut collection = collection_with(vec![
            episodic("a", &["team", "design"], Valence::Positive),
            episodic("b", &["team", "design"], Valence::Neutral),
            episodic("c", &["team", "design"], Valence::Positive),
        ]);
        let svc = service();
        let first = svc.run(&mut collection, 1);
        let semantic = collection.semantic().clone();
        let identity = collection.identity().clone();
        let efficiency = collection.efficiency();

        let second = svc.run(&mut collection, 2);
        assert_eq!(first.patterns_found, second.patterns_found);
        assert!(second.is_noop());
        assert_eq!(collection.semantic(), &semantic);
        assert_eq!(collection.identity(), &identity);
        assert!((collection.efficiency() - efficiency).abs() < f32::EPSILON);
    }

    #[test]
    fn test_growth_overwrites_with_same_id() {
        let mut collection = collection_with(vec![
            episodic("a", &["billing"], Valence::Neutral),
            episodic("b", &["billing"], Valence::Neutral),
            episodic("c", &["billing"], Valence::Neutral),
        ]);
        let svc = service();
        svc.run(&mut collection, 1);
        let first_id = collection.semantic().get("billing").map(|r| r.id.clone());

        collection.push_episodic(episodic("d", &["billing"], Valence::Neutral));
        let stats = svc.run(&mut collection, 2);
        assert_eq!(stats.semantic_written, 1);
        assert_eq!(collection.semantic().len(), 1);
        let pattern = collection.semantic().get("billing");
        assert_eq!(pattern.map(|r| r.id.clone()), first_id);
        assert!(pattern.is_some_and(|p| p.content.contains("4 episodic")));
    }

    #[test]
    fn test_shrinking_pattern_does_not_nudge_traits() {
        let mut collection = collection_with(vec![
            episodic("a", &["design"], Valence::Positive),
            episodic("b", &["design"], Valence::Positive),
            episodic("c", &["design"], Valence::Positive),
            episodic("d", &["design"], Valence::Positive),
        ]);
        let svc = service();
        svc.run(&mut collection, 1);
        let before = collection.identity().get("creative").copied();
        assert!(before.is_some_and(|s| (s - TRAIT_NUDGE).abs() < 1e-6));

        assert!(collection.remove(&MemoryId::new("d")).is_some());
        let stats = svc.run(&mut collection, 2);
        assert_eq!(stats.semantic_written, 1);
        assert_eq!(stats.identity_updates, 0);
        assert_eq!(collection.identity().get("creative").copied(), before);
        let pattern = collection.semantic().get("design");
        assert!(pattern.is_some_and(|p| (p.confidence - 0.3).abs() < 1e-6));
        assert!(pattern.is_some_and(|p| p.content.contains("3 episodic")));

        // Regaining the deleted occurrence counts as new evidence again.
        collection.push_episodic(episodic("e", &["design"], Valence::Positive));
        let stats = svc.run(&mut collection, 3);
        assert_eq!(stats.identity_updates, 1);
    }

    #[test]
    fn test_efficiency() {
        assert!(efficiency(0, 0).abs() < f32::EPSILON);
        assert!((efficiency(1, 10) - 0.2).abs() < 1e-6);
        assert!((efficiency(30, 10) - 1.0).abs() < f32::EPSILON);
    }
}
