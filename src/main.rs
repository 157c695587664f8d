//! Binary entry point for cogmem.
//!
//! This binary provides the CLI interface for the cogmem memory store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use cogmem::cli::{self, AgentSession, OutputFormat};
use cogmem::config::CogmemConfig;
use cogmem::observability::{self, InitOptions};
use cogmem::{CollaborationHint, MemoryId, MemoryKind, RetrieveQuery, StoreRequest, Valence};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Environment variable naming a config file.
const CONFIG_PATH_ENV: &str = "COGMEM_CONFIG_PATH";

/// Cogmem - per-agent episodic, semantic and identity memory.
#[derive(Parser)]
#[command(name = "cogmem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Agent whose memory to operate on.
    #[arg(short, long, global = true, default_value = "default")]
    agent: String,

    /// Directory holding agent snapshots.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print Prometheus metrics after the command.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Store a memory.
    Store {
        /// The content to store.
        content: String,

        /// Memory kind: episodic, semantic, or identity.
        #[arg(short, long, default_value = "episodic")]
        kind: String,

        /// Entity tags (comma-separated).
        #[arg(short, long)]
        entities: Option<String>,

        /// Topic tags (comma-separated).
        #[arg(short, long)]
        topics: Option<String>,

        /// Valence: positive, negative, neutral, or mixed.
        #[arg(long, default_value = "neutral")]
        valence: String,

        /// Attention salience hint in [0, 1].
        #[arg(long)]
        salience: Option<f32>,

        /// Tone warmth hint in [0, 1].
        #[arg(long)]
        warmth: Option<f32>,

        /// Value alignment hint in [0, 1].
        #[arg(long)]
        alignment: Option<f32>,
    },

    /// Retrieve memories relevant to a query.
    Recall {
        /// The search query.
        query: String,

        /// Restrict to a memory kind (repeatable).
        #[arg(short, long)]
        kind: Vec<String>,

        /// Maximum number of results.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum score in [0, 1].
        #[arg(long)]
        min_confidence: Option<f32>,

        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Run consolidation.
    Consolidate,

    /// Delete an episodic memory. An unknown ID is reported and exits 0.
    Delete {
        /// Memory ID.
        id: String,
    },

    /// Show status.
    Status {
        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show the context shared with collaborating components.
    Context {
        /// Number of recent memories to include.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Discard all memory for the agent.
    Reset,

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), cli.data_dir.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let observability = match observability::init_from_config(
        &config.observability,
        InitOptions {
            verbose: cli.verbose,
            force_metrics: cli.metrics,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    let print_metrics = cli.metrics;
    let result = run_command(cli, &config);

    if print_metrics {
        if let Some(metrics) = observability.metrics() {
            println!();
            print!("{}", metrics.render());
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &CogmemConfig) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Store {
            content,
            kind,
            entities,
            topics,
            valence,
            salience,
            warmth,
            alignment,
        } => {
            let mut request = StoreRequest::new(content)
                .with_kind(MemoryKind::parse(&kind)?)
                .with_valence(Valence::parse(&valence)?);
            request.entities = cli::split_list(entities.as_deref());
            request.topics = cli::split_list(topics.as_deref());
            request.hints = [
                salience.map(|salience| CollaborationHint::Attention { salience }),
                warmth.map(|warmth| CollaborationHint::Tone { warmth }),
                alignment.map(|alignment| CollaborationHint::ValueAlignment { alignment }),
            ]
            .into_iter()
            .flatten()
            .collect();
            cmd_store(config, &cli.agent, request, &mut out)
        },

        Commands::Recall {
            query,
            kind,
            limit,
            min_confidence,
            format,
        } => {
            let mut retrieve = RetrieveQuery::new(query)
                .with_limit(limit.unwrap_or(config.memory.default_limit))
                .with_min_confidence(
                    min_confidence.unwrap_or(config.memory.default_min_confidence),
                );
            for k in &kind {
                retrieve = retrieve.with_kind(MemoryKind::parse(k)?);
            }
            cmd_recall(config, &cli.agent, &retrieve, parse_format(&format), &mut out)
        },

        Commands::Consolidate => cmd_consolidate(config, &cli.agent, &mut out),

        Commands::Delete { id } => cmd_delete(config, &cli.agent, &MemoryId::new(id), &mut out),

        Commands::Status { format } => {
            cmd_status(config, &cli.agent, parse_format(&format), &mut out)
        },

        Commands::Context { limit, format } => cmd_context(
            config,
            &cli.agent,
            limit.unwrap_or(config.memory.share_limit),
            parse_format(&format),
            &mut out,
        ),

        Commands::Reset => cmd_reset(config, &cli.agent, &mut out),

        Commands::Config { show } => cmd_config(config, show, &mut out),
    }
}

/// Loads configuration.
fn load_config(path: Option<&str>, data_dir: Option<&Path>) -> anyhow::Result<CogmemConfig> {
    let config = if let Some(config_path) = path {
        CogmemConfig::load_from_file(Path::new(config_path))
            .with_context(|| format!("loading {config_path}"))?
    } else {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(config_path) if !config_path.trim().is_empty() => {
                CogmemConfig::load_from_file(Path::new(&config_path))
                    .with_context(|| format!("loading {config_path} from {CONFIG_PATH_ENV}"))?
            },
            _ => CogmemConfig::load_default(),
        }
    };

    Ok(match data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

fn parse_format(s: &str) -> OutputFormat {
    s.parse().unwrap_or_default()
}

/// Store command.
fn cmd_store(
    config: &CogmemConfig,
    agent: &str,
    request: StoreRequest,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut session = AgentSession::open(config, agent)?;
    let record = session.store_mut().store(request)?;
    session.finish().context("saving snapshot")?;
    cli::write_stored(out, &record)?;
    Ok(())
}

/// Recall command.
fn cmd_recall(
    config: &CogmemConfig,
    agent: &str,
    query: &RetrieveQuery,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let session = AgentSession::open(config, agent)?;
    let hits = session.store().retrieve(query)?;
    match format {
        OutputFormat::Table => cli::write_hits_table(out, &hits)?,
        OutputFormat::Json => cli::write_json(out, &hits).map_err(|e| anyhow::anyhow!("{e}"))?,
    }
    Ok(())
}

/// Consolidate command.
fn cmd_consolidate(config: &CogmemConfig, agent: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let mut session = AgentSession::open(config, agent)?;
    let stats = session.store_mut().consolidate();
    session.finish().context("saving snapshot")?;
    cli::write_stats(out, &stats)?;
    Ok(())
}

/// Delete command.
fn cmd_delete(
    config: &CogmemConfig,
    agent: &str,
    id: &MemoryId,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut session = AgentSession::open(config, agent)?;
    let found = session.store_mut().delete_memory(id);
    if found {
        session.finish().context("saving snapshot")?;
    }
    cli::write_deleted(out, agent, id, found)?;
    Ok(())
}

/// Status command.
fn cmd_status(
    config: &CogmemConfig,
    agent: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let session = AgentSession::open(config, agent)?;
    let summary = session.store().summary();
    match format {
        OutputFormat::Table => cli::write_summary(out, session.agent_id(), &summary)?,
        OutputFormat::Json => {
            cli::write_json(out, &summary).map_err(|e| anyhow::anyhow!("{e}"))?;
        },
    }
    Ok(())
}

/// Context command.
fn cmd_context(
    config: &CogmemConfig,
    agent: &str,
    limit: usize,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let session = AgentSession::open(config, agent)?;
    let context = session.store().share_context(limit);
    match format {
        OutputFormat::Table => cli::write_context(out, &context)?,
        OutputFormat::Json => {
            cli::write_json(out, &context).map_err(|e| anyhow::anyhow!("{e}"))?;
        },
    }
    Ok(())
}

/// Reset command.
fn cmd_reset(config: &CogmemConfig, agent: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let mut session = AgentSession::open(config, agent)?;
    session.store_mut().reset();
    session.finish().context("saving snapshot")?;
    writeln!(out, "Reset memory for agent '{agent}'")?;
    Ok(())
}

/// Config command.
fn cmd_config(config: &CogmemConfig, show: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if show {
        cli::write_config(out, config)?;
    } else {
        writeln!(out, "Use --show to display the current configuration")?;
    }
    Ok(())
}
