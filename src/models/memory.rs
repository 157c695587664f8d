//! Memory records and identifiers.

use super::CollaborationHint;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for a memory record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(String);

impl MemoryId {
    /// Creates a memory ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh ID for a record of the given kind.
    #[must_use]
    pub fn generate(kind: MemoryKind) -> Self {
        Self(format!("{}_{}", kind.as_str(), uuid::Uuid::new_v4()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MemoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MemoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The three kinds of memory an agent keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// A raw, timestamped event.
    #[default]
    Episodic,
    /// A pattern derived from several episodic records.
    Semantic,
    /// A persistent trait strength.
    Identity,
}

impl MemoryKind {
    /// Returns all kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Episodic, Self::Semantic, Self::Identity]
    }

    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Identity => "identity",
        }
    }

    /// Parses a kind, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown kinds.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "episodic" => Ok(Self::Episodic),
            "semantic" => Ok(Self::Semantic),
            "identity" => Ok(Self::Identity),
            other => Err(Error::InvalidInput(format!("unknown memory kind: {other}"))),
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emotional valence attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Valence {
    /// Pleasant or approving.
    Positive,
    /// Unpleasant or disapproving.
    Negative,
    /// No emotional colour.
    #[default]
    Neutral,
    /// Both positive and negative.
    Mixed,
}

impl Valence {
    /// Returns the valence as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Mixed => "mixed",
        }
    }

    /// Parses a valence, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown valences.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            "mixed" => Ok(Self::Mixed),
            other => Err(Error::InvalidInput(format!("unknown valence: {other}"))),
        }
    }

    /// Picks the dominant valence from per-valence tallies.
    ///
    /// Equal non-zero positive and negative counts yield [`Valence::Mixed`].
    #[must_use]
    pub fn dominant(positive: usize, negative: usize, neutral: usize, mixed: usize) -> Self {
        if positive > 0 && positive == negative && positive >= neutral {
            return Self::Mixed;
        }
        [
            (Self::Positive, positive),
            (Self::Negative, negative),
            (Self::Mixed, mixed),
            (Self::Neutral, neutral),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .max_by_key(|(_, n)| *n)
        .map_or(Self::Neutral, |(v, _)| v)
    }
}

impl fmt::Display for Valence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single memory record.
///
/// Serializes to a flat key/value shape: `id`, `kind`, `content`,
/// `timestamp`, `confidence`, `importance`, `valence`, `entities`, `topics`,
/// and `collaboration` when hints were supplied.
///
/// Entity and topic tags are stored in canonical form: trimmed, lowercased,
/// and deduplicated by [`normalize_tags`] when the record is created. A tag
/// supplied as `"Alice"` is therefore read back as `"alice"`. The canonical
/// form is what round-trips through snapshots and what matching compares
/// against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique identifier.
    pub id: MemoryId,
    /// Memory kind.
    pub kind: MemoryKind,
    /// Free text content.
    pub content: String,
    /// Creation timestamp (Unix epoch seconds).
    #[serde(rename = "timestamp")]
    pub created_at: u64,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Importance in [0, 1], fixed at creation.
    pub importance: f32,
    /// Emotional valence.
    pub valence: Valence,
    /// Entity tags, normalized.
    #[serde(default)]
    pub entities: BTreeSet<String>,
    /// Topic tags, normalized.
    #[serde(default)]
    pub topics: BTreeSet<String>,
    /// Collaboration hints supplied at creation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collaboration: Vec<CollaborationHint>,
}

impl MemoryRecord {
    /// Returns the first topic in sort order, if any.
    #[must_use]
    pub fn primary_topic(&self) -> Option<&str> {
        self.topics.iter().next().map(String::as_str)
    }
}

/// A record returned from retrieval together with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryHit {
    /// The matching record.
    pub record: MemoryRecord,
    /// Final score in [0, 1].
    pub score: f32,
}

/// Normalizes a tag list into a set: trimmed, lowercased, empties dropped.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("episodic", MemoryKind::Episodic; "lower")]
    #[test_case("SEMANTIC", MemoryKind::Semantic; "upper")]
    #[test_case(" Identity ", MemoryKind::Identity; "padded")]
    fn test_kind_parse(input: &str, expected: MemoryKind) {
        assert_eq!(MemoryKind::parse(input).ok(), Some(expected));
    }

    #[test]
    fn test_kind_parse_unknown() {
        let err = MemoryKind::parse("procedural");
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_valence_parse() {
        assert_eq!(Valence::parse("Mixed").ok(), Some(Valence::Mixed));
        assert!(Valence::parse("ecstatic").is_err());
    }

    #[test]
    fn test_valence_dominant() {
        assert_eq!(Valence::dominant(3, 1, 0, 0), Valence::Positive);
        assert_eq!(Valence::dominant(0, 2, 1, 0), Valence::Negative);
        assert_eq!(Valence::dominant(2, 2, 0, 0), Valence::Mixed);
        assert_eq!(Valence::dominant(0, 0, 0, 0), Valence::Neutral);
        assert_eq!(Valence::dominant(1, 0, 4, 0), Valence::Neutral);
    }

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let a = MemoryId::generate(MemoryKind::Episodic);
        let b = MemoryId::generate(MemoryKind::Episodic);
        assert!(a.as_str().starts_with("episodic_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(["Billing", " billing ", "", "Refunds"]);
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("billing"));
        assert!(tags.contains("refunds"));
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = MemoryRecord {
            id: MemoryId::new("episodic_1"),
            kind: MemoryKind::Episodic,
            content: "hello".to_string(),
            created_at: 42,
            confidence: 1.0,
            importance: 0.5,
            valence: Valence::Neutral,
            entities: normalize_tags(["alice"]),
            topics: BTreeSet::new(),
            collaboration: Vec::new(),
        };
        let json = serde_json::to_value(&record).unwrap_or_default();
        assert_eq!(json["id"], "episodic_1");
        assert_eq!(json["kind"], "episodic");
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["valence"], "neutral");
        assert!(json.get("collaboration").is_none());

        let back: Option<MemoryRecord> = serde_json::from_value(json).ok();
        assert_eq!(back, Some(record));
    }
}
