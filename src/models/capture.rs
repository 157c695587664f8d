//! Store requests and retrieval queries.

use super::{CollaborationHint, MemoryKind, Valence};

/// Default maximum number of retrieval results.
pub const DEFAULT_RETRIEVE_LIMIT: usize = 10;

/// Default score floor for retrieval.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;

/// Request to store a new memory.
#[derive(Debug, Clone, Default)]
pub struct StoreRequest {
    /// The content to store.
    pub content: String,
    /// Kind of record to create.
    pub kind: MemoryKind,
    /// Entity tags.
    pub entities: Vec<String>,
    /// Topic tags.
    pub topics: Vec<String>,
    /// Requested emotional valence.
    pub valence: Valence,
    /// Collaboration hints from other components.
    pub hints: Vec<CollaborationHint>,
}

impl StoreRequest {
    /// Creates a new episodic request with the given content.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: MemoryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds an entity tag.
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entities.push(entity.into());
        self
    }

    /// Adds a topic tag.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.push(topic.into());
        self
    }

    /// Sets the valence.
    #[must_use]
    pub const fn with_valence(mut self, valence: Valence) -> Self {
        self.valence = valence;
        self
    }

    /// Adds a collaboration hint.
    #[must_use]
    pub fn with_hint(mut self, hint: CollaborationHint) -> Self {
        self.hints.push(hint);
        self
    }
}

/// Free-text retrieval query.
#[derive(Debug, Clone)]
pub struct RetrieveQuery {
    /// Query text.
    pub text: String,
    /// Kinds to search; empty means all.
    pub kinds: Vec<MemoryKind>,
    /// Maximum number of hits.
    pub limit: usize,
    /// Hits scoring below this are dropped.
    pub min_confidence: f32,
}

impl Default for RetrieveQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            kinds: Vec::new(),
            limit: DEFAULT_RETRIEVE_LIMIT,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl RetrieveQuery {
    /// Creates a query with default limit and confidence floor.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Restricts the search to a kind (may be called repeatedly).
    #[must_use]
    pub fn with_kind(mut self, kind: MemoryKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Sets the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the score floor.
    #[must_use]
    pub const fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Returns true if records of `kind` are eligible.
    #[must_use]
    pub fn includes(&self, kind: MemoryKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_request_builder() {
        let request = StoreRequest::new("met Alice at the cafe")
            .with_entity("alice")
            .with_topic("social")
            .with_valence(Valence::Positive)
            .with_hint(CollaborationHint::Attention { salience: 0.8 });
        assert_eq!(request.kind, MemoryKind::Episodic);
        assert_eq!(request.entities, vec!["alice".to_string()]);
        assert_eq!(request.topics, vec!["social".to_string()]);
        assert_eq!(request.hints.len(), 1);
    }

    #[test]
    fn test_query_defaults_include_all_kinds() {
        let query = RetrieveQuery::new("billing");
        assert_eq!(query.limit, DEFAULT_RETRIEVE_LIMIT);
        assert!((query.min_confidence - DEFAULT_MIN_CONFIDENCE).abs() < f32::EPSILON);
        for kind in MemoryKind::all() {
            assert!(query.includes(*kind));
        }
    }

    #[test]
    fn test_query_kind_filter_dedupes() {
        let query = RetrieveQuery::new("x")
            .with_kind(MemoryKind::Semantic)
            .with_kind(MemoryKind::Semantic);
        assert_eq!(query.kinds.len(), 1);
        assert!(query.includes(MemoryKind::Semantic));
        assert!(!query.includes(MemoryKind::Episodic));
    }
}
