//! Per-agent memory store.
//!
//! [`MemoryStore`] owns one agent's [`MemoryCollection`] and implements
//! store, retrieve, consolidate, and forget on top of it. All operations are
//! synchronous and O(n) in the (bounded) collection size.

use crate::clock::{SystemTimeSource, TimeSource};
use crate::config::MemoryConfig;
use crate::models::{
    ConsolidationStats, MemoryHit, MemoryId, MemoryKind, MemoryRecord, MemorySummary,
    RetrieveQuery, SharedContext, StoreRequest, normalize_tags,
};
use crate::scoring::{HeuristicScorer, ImportanceInput, MemoryScorer, QueryTerms};
use crate::services::ConsolidationService;
use crate::storage::MemoryCollection;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Confidence assigned to directly stored records.
const INITIAL_CONFIDENCE: f32 = 1.0;

/// Memory store for a single agent.
pub struct MemoryStore {
    config: MemoryConfig,
    collection: MemoryCollection,
    scorer: Arc<dyn MemoryScorer>,
    clock: Arc<dyn TimeSource>,
    consolidation: ConsolidationService,
}

impl MemoryStore {
    /// Creates an empty store using the system clock and heuristic scorer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the configuration is invalid.
    pub fn new(config: MemoryConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Creates an empty store reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the configuration is invalid.
    pub fn with_clock(config: MemoryConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        let collection = MemoryCollection::new(clock.now());
        Self::from_collection(config, collection, clock)
    }

    /// Restores a store around an existing collection (e.g. from a snapshot).
    ///
    /// Records beyond the configured capacity are evicted immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the configuration is invalid.
    pub fn from_collection(
        config: MemoryConfig,
        collection: MemoryCollection,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        config.validate()?;
        let scorer: Arc<dyn MemoryScorer> = Arc::new(HeuristicScorer);
        let mut store = Self {
            consolidation: ConsolidationService::new(config.pattern_threshold, Arc::clone(&scorer)),
            config,
            collection,
            scorer,
            clock,
        };
        store.enforce_capacity();
        Ok(store)
    }

    /// Replaces the scorer used for importance, relevance, and traits.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn MemoryScorer>) -> Self {
        self.consolidation =
            ConsolidationService::new(self.config.pattern_threshold, Arc::clone(&scorer));
        self.scorer = scorer;
        self
    }

    /// The store's configuration.
    #[must_use]
    pub const fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Read access to the underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &MemoryCollection {
        &self.collection
    }

    /// Consumes the store, returning its collection.
    #[must_use]
    pub fn into_collection(self) -> MemoryCollection {
        self.collection
    }

    /// Looks up an episodic record by ID.
    #[must_use]
    pub fn get(&self, id: &MemoryId) -> Option<&MemoryRecord> {
        self.collection.get(id)
    }

    /// Stores a new memory and returns the created record.
    ///
    /// Episodic records are appended to the log (evicting the lowest-importance
    /// record if capacity is exceeded); semantic records are upserted by their
    /// first topic, or by their normalized content when untagged; identity
    /// records set the strength of the trait named by their first topic (or
    /// content) to the record's importance. Consolidation runs afterwards when
    /// the time or volume threshold has been crossed.
    ///
    /// The returned record reflects the computed fields even if capacity
    /// eviction removed it straight away.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the content is empty or a hint value
    /// is outside `0.0..=1.0`.
    #[instrument(
        name = "cogmem.memory.store",
        skip(self, request),
        fields(
            component = "memory",
            operation = "store",
            kind = %request.kind,
            content_length = request.content.len()
        )
    )]
    pub fn store(&mut self, request: StoreRequest) -> Result<MemoryRecord> {
        let start = Instant::now();
        let result = self.store_inner(request);
        record_operation("store", result.is_ok(), start);
        result
    }

    fn store_inner(&mut self, request: StoreRequest) -> Result<MemoryRecord> {
        if request.content.trim().is_empty() {
            return Err(Error::InvalidInput("Content cannot be empty".to_string()));
        }
        for hint in &request.hints {
            hint.validate()?;
        }

        let entities = normalize_tags(&request.entities);
        let topics = normalize_tags(&request.topics);
        let base = self.scorer.importance(&ImportanceInput {
            content: &request.content,
            entities: &entities,
            topics: &topics,
        });
        let adjusted = self
            .scorer
            .adjust_for_hints(base, request.valence, &request.hints);

        let now = self.clock.now();
        let record = MemoryRecord {
            id: MemoryId::generate(request.kind),
            kind: request.kind,
            content: request.content,
            created_at: now,
            confidence: INITIAL_CONFIDENCE,
            importance: adjusted.importance,
            valence: adjusted.valence,
            entities,
            topics,
            collaboration: request.hints,
        };

        self.collection.partners.extend(
            record
                .collaboration
                .iter()
                .map(|h| h.source().to_string()),
        );

        match record.kind {
            MemoryKind::Episodic => self.collection.push_episodic(record.clone()),
            MemoryKind::Semantic => {
                let key = derived_key(&record);
                self.collection.upsert_semantic(key, record.clone());
            },
            MemoryKind::Identity => {
                let name = derived_key(&record);
                self.collection.set_trait(name, record.importance);
            },
        }
        self.collection.total_memories += 1;

        tracing::debug!(
            memory_id = %record.id,
            importance = record.importance,
            valence = %record.valence,
            "stored memory"
        );

        if record.kind == MemoryKind::Episodic {
            self.enforce_capacity();
        }
        if self.consolidation_due(now) {
            self.consolidate();
        }

        Ok(record)
    }

    /// Retrieves the records most relevant to a free-text query.
    ///
    /// Episodic and semantic records are searched. Identity traits carry no
    /// content and are never returned. Each call recomputes scores from
    /// scratch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `min_confidence` is outside
    /// `0.0..=1.0`.
    #[instrument(
        name = "cogmem.memory.retrieve",
        skip(self, query),
        fields(
            component = "memory",
            operation = "retrieve",
            limit = query.limit,
            min_confidence = query.min_confidence
        )
    )]
    pub fn retrieve(&self, query: &RetrieveQuery) -> Result<Vec<MemoryHit>> {
        let start = Instant::now();
        let result = self.retrieve_inner(query);
        record_operation("retrieve", result.is_ok(), start);
        result
    }

    fn retrieve_inner(&self, query: &RetrieveQuery) -> Result<Vec<MemoryHit>> {
        if !query.min_confidence.is_finite() || !(0.0..=1.0).contains(&query.min_confidence) {
            return Err(Error::InvalidInput(format!(
                "min_confidence must be within 0.0..=1.0, got {}",
                query.min_confidence
            )));
        }

        let terms = QueryTerms::new(&query.text);
        if terms.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let episodic = self
            .collection
            .episodic
            .iter()
            .filter(|_| query.includes(MemoryKind::Episodic));
        let semantic = self
            .collection
            .semantic
            .values()
            .filter(|_| query.includes(MemoryKind::Semantic));

        let mut hits: Vec<MemoryHit> = episodic
            .chain(semantic)
            .filter_map(|record| {
                let score = self.scorer.relevance(&terms, record);
                (score >= query.min_confidence).then(|| MemoryHit {
                    record: record.clone(),
                    score,
                })
            })
            .collect();

        // Stable: equal scores keep collection order.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.limit);

        tracing::debug!(hits = hits.len(), "retrieved memories");
        Ok(hits)
    }

    /// Runs a consolidation pass now.
    #[instrument(
        name = "cogmem.memory.consolidate",
        skip(self),
        fields(component = "memory", operation = "consolidate")
    )]
    pub fn consolidate(&mut self) -> ConsolidationStats {
        let start = Instant::now();
        let stats = self.consolidation.run(&mut self.collection, self.clock.now());
        record_operation("consolidate", true, start);
        tracing::info!(
            scanned = stats.scanned,
            patterns = stats.patterns_found,
            semantic_written = stats.semantic_written,
            identity_updates = stats.identity_updates,
            efficiency = self.collection.efficiency,
            "consolidated memory"
        );
        stats
    }

    /// Deletes an episodic record. Returns whether it was present.
    #[instrument(
        name = "cogmem.memory.delete",
        skip(self),
        fields(component = "memory", operation = "delete")
    )]
    pub fn delete_memory(&mut self, id: &MemoryId) -> bool {
        let start = Instant::now();
        let found = self.collection.remove(id).is_some();
        record_operation("delete", true, start);
        record_episodic_count(self.collection.episodic.len());
        if !found {
            tracing::debug!(memory_id = %id, "delete of unknown memory");
        }
        found
    }

    /// Returns a diagnostic snapshot. Pure read.
    #[must_use]
    pub fn summary(&self) -> MemorySummary {
        MemorySummary {
            episodic: self.collection.count(MemoryKind::Episodic),
            semantic: self.collection.count(MemoryKind::Semantic),
            identity: self.collection.count(MemoryKind::Identity),
            total_memories: self.collection.total_memories,
            capacity: self.config.max_episodic,
            last_consolidation: self.collection.last_consolidation,
            efficiency: self.collection.efficiency,
            traits: self.collection.identity.clone(),
            partners: self.collection.partners.iter().cloned().collect(),
        }
    }

    /// Builds the context shared with collaborating components. Pure read.
    ///
    /// `recent` holds at most `limit` episodic records, newest first.
    #[must_use]
    pub fn share_context(&self, limit: usize) -> SharedContext {
        let recent = self
            .collection
            .episodic
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect();

        let mut top_traits: Vec<(String, f32)> = self
            .collection
            .identity
            .iter()
            .map(|(name, strength)| (name.clone(), *strength))
            .collect();
        top_traits.sort_by(|a, b| b.1.total_cmp(&a.1));

        SharedContext {
            recent,
            dominant_valence: self.collection.dominant_valence(),
            top_traits,
            patterns: self.collection.semantic.keys().cloned().collect(),
        }
    }

    /// Discards every record, pattern, and trait.
    pub fn reset(&mut self) {
        let dropped = self.collection.episodic.len();
        self.collection = MemoryCollection::new(self.clock.now());
        record_episodic_count(0);
        tracing::info!(dropped, "reset memory collection");
    }

    fn consolidation_due(&self, now: u64) -> bool {
        let elapsed = now.saturating_sub(self.collection.last_consolidation);
        elapsed >= self.config.consolidation_interval_secs
            || self.collection.stored_since_consolidation
                > self.config.consolidation_volume_threshold
    }

    fn enforce_capacity(&mut self) {
        let evicted = self.collection.evict_to(self.config.max_episodic);
        if !evicted.is_empty() {
            metrics::counter!("memory_evictions_total").increment(evicted.len() as u64);
            for record in &evicted {
                tracing::debug!(
                    memory_id = %record.id,
                    importance = record.importance,
                    "evicted memory for capacity"
                );
            }
        }
        record_episodic_count(self.collection.episodic.len());
    }
}

/// Key for a directly stored semantic or identity record.
fn derived_key(record: &MemoryRecord) -> String {
    record.primary_topic().map_or_else(
        || record.content.trim().to_lowercase(),
        ToString::to_string,
    )
}

#[allow(clippy::cast_precision_loss)]
fn record_episodic_count(len: usize) {
    metrics::gauge!("memory_episodic_count").set(len as f64);
}

fn record_operation(operation: &'static str, ok: bool, start: Instant) {
    let status = if ok { "success" } else { "error" };
    metrics::counter!(
        "memory_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "memory_operation_duration_ms",
        "operation" => operation
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}
