//! Structured logging configuration.

use crate::config::{EnvLookup, LoggingSettings, parse_var, process_env};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "COGMEM_LOG_FORMAT";
/// Environment variable selecting the log filter.
pub const LOG_LEVEL_ENV: &str = "COGMEM_LOG_LEVEL";
/// Environment variable selecting a log file.
pub const LOG_FILE_ENV: &str = "COGMEM_LOG_FILE";

const DEFAULT_LEVEL: &str = "warn";
const VERBOSE_LEVEL: &str = "debug";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything but `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter directive string.
    pub level: String,
    /// Optional file to append to instead of stderr.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// `RUST_LOG` wins over both the config file and `COGMEM_LOG_LEVEL`;
    /// `verbose` raises the default level to `debug`.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::from_settings_with(settings, verbose, &process_env)
    }

    /// Like [`LoggingConfig::from_settings`], reading overrides through `env`.
    #[must_use]
    pub fn from_settings_with(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        env: &EnvLookup<'_>,
    ) -> Self {
        let mut format = settings
            .and_then(|s| s.format.as_deref())
            .map(LogFormat::parse)
            .unwrap_or_default();
        let mut level = settings
            .and_then(|s| s.level.clone())
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
        let mut file = settings.and_then(|s| s.file.clone()).map(PathBuf::from);

        if let Some(f) = parse_var::<String>(env, LOG_FORMAT_ENV) {
            format = LogFormat::parse(&f);
        }
        if let Some(l) = parse_var::<String>(env, LOG_LEVEL_ENV) {
            level = l;
        }
        if let Some(path) = parse_var::<String>(env, LOG_FILE_ENV) {
            file = Some(PathBuf::from(path));
        }
        if verbose {
            level = VERBOSE_LEVEL.to_string();
        }

        Self {
            format,
            level,
            file,
        }
    }

    /// Builds the subscriber filter, preferring `RUST_LOG` when set.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    }
}
