//! Keyword tables used by the heuristic scorer.

/// Words that mark content as worth remembering.
pub const EMPHASIS_KEYWORDS: &[&str] = &["important", "remember", "always", "never", "love", "hate"];

/// Identity traits and the keywords that corroborate them.
pub const TRAIT_KEYWORDS: &[(&str, &[&str])] = &[
    ("creative", &["creative", "art", "design", "innovative"]),
    ("analytical", &["analysis", "analyze", "data", "logic", "research"]),
    ("empathetic", &["empathy", "feel", "support", "care", "help"]),
    ("curious", &["learn", "explore", "discover", "question", "curious"]),
    ("social", &["friend", "team", "together", "community", "social"]),
    ("diligent", &["plan", "organize", "schedule", "deadline", "task"]),
];

/// Returns true if `content` contains any emphasis keyword (case-insensitive).
#[must_use]
pub fn contains_emphasis(content: &str) -> bool {
    let lowered = content.to_lowercase();
    EMPHASIS_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Returns the traits whose keywords appear as words in `content`.
///
/// Matching is word-based so that "art" does not fire on "start".
#[must_use]
pub fn matching_traits(content: &str) -> Vec<&'static str> {
    let words = super::tokenize(content);
    TRAIT_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| words.contains(*kw)))
        .map(|(name, _)| *name)
        .collect()
}
