//! CLI support.
//!
//! The `cogmem` binary parses arguments and dispatches; the pieces that touch
//! storage or produce output live here so they can be tested.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `store` | Store a memory for the agent |
//! | `recall` | Retrieve memories relevant to a query |
//! | `consolidate` | Promote recurring topics into patterns and traits |
//! | `delete` | Delete an episodic memory by ID |
//! | `status` | Show counts, traits, and consolidation state |
//! | `context` | Show the context shared with collaborators |
//! | `reset` | Discard all of the agent's memory |
//! | `config` | Show the effective configuration |
//!
//! # Example Usage
//!
//! ```bash
//! cogmem store "Reviewed the new logo design" --topics design
//! cogmem recall "logo design" --limit 5
//! cogmem --agent planner status --format json
//! ```

mod output;
mod session;

pub use output::{
    OutputFormat, format_timestamp, write_config, write_context, write_deleted, write_hits_table,
    write_json, write_stats, write_stored, write_summary,
};
pub use session::AgentSession;

/// Splits a comma-separated list, dropping empty items.
#[must_use]
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}
