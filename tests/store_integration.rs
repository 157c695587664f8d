//! Integration tests for the memory store.
//!
//! Exercises the public API end to end: storing, retrieval, consolidation
//! triggers, capacity eviction, deletion, and snapshot persistence.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use cogmem::{
    CollaborationHint, FakeTimeSource, MemoryConfig, MemoryId, MemoryKind, MemoryRegistry,
    MemoryStore, RetrieveQuery, SnapshotStore, StoreRequest, Valence,
};
use std::collections::HashSet;
use std::sync::Arc;

fn store_with(config: MemoryConfig) -> (MemoryStore, FakeTimeSource) {
    let clock = FakeTimeSource::default();
    let store = MemoryStore::with_clock(config, Arc::new(clock.clone())).expect("valid config");
    (store, clock)
}

fn default_store() -> MemoryStore {
    store_with(MemoryConfig::default()).0
}

#[test]
fn test_recurring_topic_becomes_pattern() {
    let mut store = default_store();
    for content in [
        "Customer asked about a refund",
        "Invoice was sent twice",
        "Card was declined at checkout",
    ] {
        store
            .store(StoreRequest::new(content).with_topic("billing"))
            .unwrap();
    }

    let stats = store.consolidate();
    assert_eq!(stats.scanned, 3);
    assert_eq!(stats.patterns_found, 1);
    assert_eq!(stats.archived, 0);

    let pattern = store.collection().semantic().get("billing").unwrap();
    assert!((pattern.confidence - 0.3).abs() < 1e-6);
    assert_eq!(pattern.kind, MemoryKind::Semantic);
    assert!(pattern.content.contains("'billing'"));
    // Episodic records survive consolidation.
    assert_eq!(store.collection().episodic().len(), 3);
}

#[test]
fn test_emphatic_content_keeps_neutral_valence() {
    let mut store = default_store();
    let record = store
        .store(StoreRequest::new("I love this, it's amazing and wonderful"))
        .unwrap();
    assert!(record.importance >= 0.6 - 1e-6);
    assert_eq!(record.valence, Valence::Neutral);

    let warm = store
        .store(
            StoreRequest::new("I love this, it's amazing and wonderful")
                .with_hint(CollaborationHint::Tone { warmth: 0.8 }),
        )
        .unwrap();
    assert_eq!(warm.valence, Valence::Positive);
}

#[test]
fn test_capacity_keeps_most_important() {
    let (mut store, _clock) = store_with(MemoryConfig::default());
    let mut stored = Vec::new();

    for i in 0..1100usize {
        let bucket = i / 100;
        let mut request = StoreRequest::new(format!("event number {i}"));
        for e in 0..bucket.min(4) {
            request = request.with_entity(format!("entity{e}"));
        }
        for t in 0..bucket.saturating_sub(4) {
            request = request.with_topic(format!("topic{t}"));
        }
        let record = store.store(request).unwrap();
        stored.push((i, record.id, record.importance));
        assert!(store.collection().episodic().len() <= 1000);
    }

    assert_eq!(store.collection().episodic().len(), 1000);

    // Highest importance first, newest first among ties.
    let mut expected = stored.clone();
    expected.sort_by(|a, b| b.2.total_cmp(&a.2).then(b.0.cmp(&a.0)));
    let expected: HashSet<MemoryId> = expected.into_iter().take(1000).map(|e| e.1).collect();
    let retained: HashSet<MemoryId> = store
        .collection()
        .episodic()
        .iter()
        .map(|r| r.id.clone())
        .collect();
    assert_eq!(retained, expected);
}

#[test]
fn test_delete_unknown_id() {
    let mut store = default_store();
    store.store(StoreRequest::new("something real")).unwrap();
    let before = store.summary();

    assert!(!store.delete_memory(&MemoryId::new("episodic_never_stored")));
    assert_eq!(store.summary(), before);
}

#[test]
fn test_retrieve_own_content_ranks_first() {
    let mut store = default_store();
    store
        .store(StoreRequest::new("Planning the quarterly budget review"))
        .unwrap();
    let target = store
        .store(StoreRequest::new("Alice prefers tea over coffee").with_entity("alice"))
        .unwrap();
    store
        .store(StoreRequest::new("Coffee machine is broken again"))
        .unwrap();

    let hits = store
        .retrieve(&RetrieveQuery::new("Alice prefers tea over coffee"))
        .unwrap();
    assert_eq!(hits.first().map(|h| &h.record.id), Some(&target.id));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_retrieve_never_returns_identity() {
    let mut store = default_store();
    store
        .store(StoreRequest::new("curious").with_kind(MemoryKind::Identity))
        .unwrap();
    let hits = store
        .retrieve(&RetrieveQuery::new("curious").with_min_confidence(0.0))
        .unwrap();
    assert!(hits.is_empty());
    assert_eq!(store.summary().identity, 1);
}

#[test]
fn test_time_triggers_consolidation() {
    let (mut store, clock) = store_with(MemoryConfig::default());
    for _ in 0..3 {
        store
            .store(StoreRequest::new("sprint planning").with_topic("planning"))
            .unwrap();
    }
    assert!(store.collection().semantic().is_empty());

    clock.advance(24 * 60 * 60);
    store
        .store(StoreRequest::new("retro notes").with_topic("retro"))
        .unwrap();

    assert!(store.collection().semantic().contains_key("planning"));
    assert_eq!(store.collection().last_consolidation(), clock_now(&clock));
    // "plan" is not a whole word in the pattern, so no trait is nudged.
    assert!(store.collection().identity().is_empty());
}

fn clock_now(clock: &FakeTimeSource) -> u64 {
    use cogmem::TimeSource;
    clock.now()
}

#[test]
fn test_volume_triggers_consolidation() {
    let config = MemoryConfig::default().with_consolidation_volume_threshold(5);
    let (mut store, _clock) = store_with(config);

    for i in 0..5 {
        store
            .store(StoreRequest::new(format!("team sync {i}")).with_topic("team"))
            .unwrap();
    }
    assert!(store.collection().semantic().is_empty());

    store
        .store(StoreRequest::new("team sync 5").with_topic("team"))
        .unwrap();
    let pattern = store.collection().semantic().get("team").unwrap();
    assert!((pattern.confidence - 0.6).abs() < 1e-6);
    let social = store.collection().identity().get("social").copied();
    assert!(social.is_some_and(|s| (s - 0.1).abs() < 1e-6));
}

#[test]
fn test_consolidation_twice_is_stable() {
    let mut store = default_store();
    for i in 0..4 {
        store
            .store(
                StoreRequest::new(format!("research session {i}"))
                    .with_topic("research")
                    .with_valence(if i % 2 == 0 {
                        Valence::Positive
                    } else {
                        Valence::Negative
                    }),
            )
            .unwrap();
    }
    store.consolidate();
    let first = store.summary();
    let semantic = store.collection().semantic().clone();

    let stats = store.consolidate();
    assert!(stats.is_noop());
    let second = store.summary();
    assert_eq!(first.traits, second.traits);
    assert!((first.efficiency - second.efficiency).abs() < f32::EPSILON);
    assert_eq!(&semantic, store.collection().semantic());
    assert_eq!(
        semantic.get("research").map(|r| r.valence),
        Some(Valence::Mixed)
    );
}

#[test]
fn test_delete_then_consolidate_keeps_trait_strength() {
    let mut store = default_store();
    let mut ids = Vec::new();
    for i in 0..4 {
        let record = store
            .store(StoreRequest::new(format!("design critique {i}")).with_topic("design"))
            .unwrap();
        ids.push(record.id);
    }
    store.consolidate();
    let before = store.collection().identity().get("creative").copied();
    assert!(before.is_some_and(|s| (s - 0.1).abs() < 1e-6));

    assert!(store.delete_memory(&ids[0]));
    store.consolidate();
    assert_eq!(store.collection().identity().get("creative").copied(), before);
    let pattern = store.collection().semantic().get("design").unwrap();
    assert!((pattern.confidence - 0.3).abs() < 1e-6);

    let stats = store.consolidate();
    assert!(stats.is_noop());
}

#[test]
fn test_summary_counts() {
    let mut store = default_store();
    store.store(StoreRequest::new("episode one")).unwrap();
    store
        .store(
            StoreRequest::new("facts about billing")
                .with_kind(MemoryKind::Semantic)
                .with_topic("billing"),
        )
        .unwrap();
    store
        .store(StoreRequest::new("diligent").with_kind(MemoryKind::Identity))
        .unwrap();

    let summary = store.summary();
    assert_eq!(summary.episodic, 1);
    assert_eq!(summary.semantic, 1);
    assert_eq!(summary.identity, 1);
    assert_eq!(summary.total_memories, 3);
    assert_eq!(summary.capacity, 1000);
}

#[test]
fn test_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = SnapshotStore::new(dir.path());
    let clock = FakeTimeSource::default();

    let mut store =
        MemoryStore::with_clock(MemoryConfig::default(), Arc::new(clock.clone())).unwrap();
    for i in 0..3 {
        store
            .store(
                StoreRequest::new(format!("design critique {i}"))
                    .with_topic("design")
                    .with_hint(CollaborationHint::Attention { salience: 0.9 }),
            )
            .unwrap();
    }
    store.consolidate();
    snapshots.save("designer", store.collection()).unwrap();

    let collection = snapshots.load("designer").unwrap().unwrap();
    let restored =
        MemoryStore::from_collection(MemoryConfig::default(), collection, Arc::new(clock)).unwrap();
    assert_eq!(restored.summary(), store.summary());
    assert_eq!(restored.collection(), store.collection());
}

#[test]
fn test_registry_shares_stores_across_threads() {
    let registry = Arc::new(MemoryRegistry::new(MemoryConfig::default()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let agent = format!("agent{}", t % 2);
                let store = registry.get_or_create(&agent).unwrap();
                for i in 0..10 {
                    let mut guard = cogmem::services::lock_store(&store).unwrap();
                    guard
                        .store(StoreRequest::new(format!("thread {t} event {i}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.agent_ids().unwrap(), vec!["agent0", "agent1"]);
    for agent in ["agent0", "agent1"] {
        let store = registry.get(agent).unwrap().unwrap();
        let guard = cogmem::services::lock_store(&store).unwrap();
        assert_eq!(guard.collection().episodic().len(), 20);
    }
}
