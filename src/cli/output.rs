//! Text and JSON renderers for CLI output.
//!
//! Every renderer writes to a caller-supplied writer so output can be
//! captured in tests.

use crate::config::CogmemConfig;
use crate::models::{
    ConsolidationStats, MemoryHit, MemoryId, MemoryRecord, MemorySummary, SharedContext,
};
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

/// Maximum characters of content shown in table rows.
const PREVIEW_CHARS: usize = 100;

/// Output format for commands that print records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default).
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Table,
        })
    }
}

/// Formats epoch seconds as a UTC date-time, falling back to the raw number.
#[must_use]
pub fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map_or_else(
            || secs.to_string(),
            |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}

/// Writes any serializable value as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    writer: &mut W,
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Writes a newly stored record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_stored<W: Write>(writer: &mut W, record: &MemoryRecord) -> io::Result<()> {
    writeln!(writer, "Memory stored:")?;
    writeln!(writer, "  ID: {}", record.id)?;
    writeln!(writer, "  Kind: {}", record.kind)?;
    writeln!(writer, "  Importance: {:.2}", record.importance)?;
    writeln!(writer, "  Valence: {}", record.valence)?;
    if !record.collaboration.is_empty() {
        let hints: Vec<String> = record.collaboration.iter().map(ToString::to_string).collect();
        writeln!(writer, "  Hints: {}", hints.join(", "))?;
    }
    Ok(())
}

/// Writes the outcome of a delete. An unknown ID is reported, not an error.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_deleted<W: Write>(
    writer: &mut W,
    agent: &str,
    id: &MemoryId,
    found: bool,
) -> io::Result<()> {
    if found {
        writeln!(writer, "Deleted memory {id}")
    } else {
        writeln!(writer, "Memory {id} not found for agent '{agent}'")
    }
}

/// Writes retrieval hits as a table.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_hits_table<W: Write>(writer: &mut W, hits: &[MemoryHit]) -> io::Result<()> {
    writeln!(writer, "Found {} memories:", hits.len())?;
    for hit in hits {
        writeln!(writer)?;
        writeln!(
            writer,
            "  [{:.2}] {} ({}, {})",
            hit.score, hit.record.id, hit.record.kind, hit.record.valence
        )?;
        writeln!(writer, "       {}", preview(&hit.record.content))?;
    }
    Ok(())
}

/// Writes consolidation results.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_stats<W: Write>(writer: &mut W, stats: &ConsolidationStats) -> io::Result<()> {
    writeln!(writer, "Consolidation complete: {}", stats.summary())
}

/// Writes the memory summary.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_summary<W: Write>(
    writer: &mut W,
    agent_id: &str,
    summary: &MemorySummary,
) -> io::Result<()> {
    writeln!(writer, "Memory status for agent '{agent_id}'")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "  Episodic:   {} / {}",
        summary.episodic, summary.capacity
    )?;
    writeln!(writer, "  Semantic:   {}", summary.semantic)?;
    writeln!(writer, "  Identity:   {}", summary.identity)?;
    writeln!(writer, "  Stored:     {}", summary.total_memories)?;
    writeln!(writer, "  Efficiency: {:.2}", summary.efficiency)?;
    writeln!(
        writer,
        "  Last consolidation: {}",
        format_timestamp(summary.last_consolidation)
    )?;
    if !summary.traits.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "  Traits:")?;
        for (name, strength) in &summary.traits {
            writeln!(writer, "    {name:<12} {strength:.2}")?;
        }
    }
    if !summary.partners.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "  Partners: {}", summary.partners.join(", "))?;
    }
    Ok(())
}

/// Writes the shared context.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_context<W: Write>(writer: &mut W, context: &SharedContext) -> io::Result<()> {
    writeln!(writer, "Dominant valence: {}", context.dominant_valence)?;
    if !context.top_traits.is_empty() {
        let traits: Vec<String> = context
            .top_traits
            .iter()
            .map(|(name, strength)| format!("{name} ({strength:.2})"))
            .collect();
        writeln!(writer, "Top traits: {}", traits.join(", "))?;
    }
    if !context.patterns.is_empty() {
        writeln!(writer, "Patterns: {}", context.patterns.join(", "))?;
    }
    writeln!(writer, "Recent memories:")?;
    for record in &context.recent {
        writeln!(
            writer,
            "  {} {} {}",
            format_timestamp(record.created_at),
            record.id,
            preview(&record.content)
        )?;
    }
    Ok(())
}

/// Writes the effective configuration.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_config<W: Write>(writer: &mut W, config: &CogmemConfig) -> io::Result<()> {
    let memory = &config.memory;
    writeln!(writer, "Configuration")?;
    writeln!(writer, "=============")?;
    writeln!(writer, "data_dir = {}", config.data_dir.display())?;
    writeln!(writer)?;
    writeln!(writer, "[memory]")?;
    writeln!(writer, "max_episodic = {}", memory.max_episodic)?;
    writeln!(
        writer,
        "consolidation_interval_secs = {}",
        memory.consolidation_interval_secs
    )?;
    writeln!(
        writer,
        "consolidation_volume_threshold = {}",
        memory.consolidation_volume_threshold
    )?;
    writeln!(writer, "pattern_threshold = {}", memory.pattern_threshold)?;
    writeln!(writer, "default_limit = {}", memory.default_limit)?;
    writeln!(
        writer,
        "default_min_confidence = {}",
        memory.default_min_confidence
    )?;
    writeln!(writer, "share_limit = {}", memory.share_limit)?;
    Ok(())
}
