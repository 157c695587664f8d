//! Importance and relevance scoring.
//!
//! Everything here is a pure function of its inputs. The store talks to the
//! scorer only through [`MemoryScorer`], so the keyword heuristics can be
//! replaced (for example by an embedding-based scorer) without touching
//! store or retrieval control flow.
//!
//! # Importance
//!
//! | Signal | Adjustment |
//! |--------|------------|
//! | base | 0.5 |
//! | content longer than 200 chars | +0.1 |
//! | distinct entities | +0.05 each, at most +0.2 |
//! | distinct topics | +0.03 each, at most +0.15 |
//! | emphasis keyword | +0.1 |
//! | attention salience > 0.7 | +0.1 |
//! | value alignment > 0.8 | +0.15 |
//!
//! # Relevance
//!
//! `(jaccard + entity_bonus + topic_bonus) * confidence * (0.5 + 0.5 * importance)`,
//! clamped to `[0, 1]`.

mod keywords;

pub use keywords::{EMPHASIS_KEYWORDS, TRAIT_KEYWORDS, contains_emphasis, matching_traits};

use crate::models::{CollaborationHint, MemoryRecord, Valence};
use std::collections::{BTreeSet, HashSet};

const BASE_IMPORTANCE: f32 = 0.5;
const LONG_CONTENT_CHARS: usize = 200;
const LONG_CONTENT_BONUS: f32 = 0.1;
const ENTITY_STEP: f32 = 0.05;
const ENTITY_CAP: f32 = 0.2;
const TOPIC_STEP: f32 = 0.03;
const TOPIC_CAP: f32 = 0.15;
const EMPHASIS_BONUS: f32 = 0.1;

const SALIENCE_THRESHOLD: f32 = 0.7;
const SALIENCE_BONUS: f32 = 0.1;
const ALIGNMENT_THRESHOLD: f32 = 0.8;
const ALIGNMENT_BONUS: f32 = 0.15;
const WARM_THRESHOLD: f32 = 0.6;
const COLD_THRESHOLD: f32 = 0.4;

const ENTITY_MATCH_BONUS: f32 = 0.2;
const TOPIC_MATCH_BONUS: f32 = 0.15;

/// Clamps a score into `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Splits text into a set of lowercased words with edge punctuation removed.
#[must_use]
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Jaccard similarity of two sets; 0 when both are empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f32 / union as f32
}

/// Inputs to the importance heuristic.
#[derive(Debug, Clone, Copy)]
pub struct ImportanceInput<'a> {
    /// Record content.
    pub content: &'a str,
    /// Normalized entity tags.
    pub entities: &'a BTreeSet<String>,
    /// Normalized topic tags.
    pub topics: &'a BTreeSet<String>,
}

/// Importance and valence after collaboration hints are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HintOutcome {
    /// Adjusted importance.
    pub importance: f32,
    /// Adjusted valence.
    pub valence: Valence,
}

/// Pre-processed query text.
#[derive(Debug, Clone)]
pub struct QueryTerms {
    lowered: String,
    words: HashSet<String>,
}

impl QueryTerms {
    /// Prepares a query for scoring.
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            lowered: query.to_lowercase(),
            words: tokenize(query),
        }
    }

    /// Returns true if the query has no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Heuristic content importance, clamped to `[0, 1]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_importance(input: &ImportanceInput<'_>) -> f32 {
    let mut importance = BASE_IMPORTANCE;
    if input.content.chars().count() > LONG_CONTENT_CHARS {
        importance += LONG_CONTENT_BONUS;
    }
    importance += (input.entities.len() as f32 * ENTITY_STEP).min(ENTITY_CAP);
    importance += (input.topics.len() as f32 * TOPIC_STEP).min(TOPIC_CAP);
    if contains_emphasis(input.content) {
        importance += EMPHASIS_BONUS;
    }
    clamp_unit(importance)
}

/// Applies collaboration hints to a freshly scored record.
///
/// Each boost applies at most once however many hints qualify. Only the first
/// tone hint is consulted, and only when `valence` is neutral.
#[must_use]
pub fn apply_hints(importance: f32, valence: Valence, hints: &[CollaborationHint]) -> HintOutcome {
    let mut importance = importance;
    let salient = hints.iter().any(|h| {
        matches!(h, CollaborationHint::Attention { salience } if *salience > SALIENCE_THRESHOLD)
    });
    if salient {
        importance = clamp_unit(importance + SALIENCE_BONUS);
    }
    let aligned = hints.iter().any(|h| {
        matches!(h, CollaborationHint::ValueAlignment { alignment } if *alignment > ALIGNMENT_THRESHOLD)
    });
    if aligned {
        importance = clamp_unit(importance + ALIGNMENT_BONUS);
    }

    let valence = if valence == Valence::Neutral {
        hints
            .iter()
            .find_map(|h| match h {
                CollaborationHint::Tone { warmth } => Some(*warmth),
                _ => None,
            })
            .map_or(valence, |warmth| {
                if warmth > WARM_THRESHOLD {
                    Valence::Positive
                } else if warmth < COLD_THRESHOLD {
                    Valence::Negative
                } else {
                    Valence::Neutral
                }
            })
    } else {
        valence
    };

    HintOutcome {
        importance,
        valence,
    }
}

/// Lexical relevance of `record` to `query`, weighted by the record's
/// confidence and importance and clamped to `[0, 1]`.
#[must_use]
pub fn score_relevance(query: &QueryTerms, record: &MemoryRecord) -> f32 {
    let mut record_terms = tokenize(&record.content);
    record_terms.extend(record.entities.iter().cloned());
    record_terms.extend(record.topics.iter().cloned());

    let mut relevance = jaccard(&query.words, &record_terms);
    if record
        .entities
        .iter()
        .any(|e| query.lowered.contains(e.as_str()))
    {
        relevance += ENTITY_MATCH_BONUS;
    }
    if record
        .topics
        .iter()
        .any(|t| query.lowered.contains(t.as_str()))
    {
        relevance += TOPIC_MATCH_BONUS;
    }

    clamp_unit(relevance * record.confidence * 0.5f32.mul_add(record.importance, 0.5))
}

/// Scoring seam used by the memory store.
pub trait MemoryScorer: Send + Sync {
    /// Importance of new content before hints are applied.
    fn importance(&self, input: &ImportanceInput<'_>) -> f32;

    /// Applies collaboration hints to importance and valence.
    fn adjust_for_hints(
        &self,
        importance: f32,
        valence: Valence,
        hints: &[CollaborationHint],
    ) -> HintOutcome;

    /// Relevance of a record to a prepared query.
    fn relevance(&self, query: &QueryTerms, record: &MemoryRecord) -> f32;

    /// Identity traits corroborated by a pattern's content.
    fn traits_for(&self, content: &str) -> Vec<&'static str>;
}

/// Keyword-table scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl MemoryScorer for HeuristicScorer {
    fn importance(&self, input: &ImportanceInput<'_>) -> f32 {
        score_importance(input)
    }

    fn adjust_for_hints(
        &self,
        importance: f32,
        valence: Valence,
        hints: &[CollaborationHint],
    ) -> HintOutcome {
        apply_hints(importance, valence, hints)
    }

    fn relevance(&self, query: &QueryTerms, record: &MemoryRecord) -> f32 {
        score_relevance(query, record)
    }

    fn traits_for(&self, content: &str) -> Vec<&'static str> {
        matching_traits(content)
    }
}
