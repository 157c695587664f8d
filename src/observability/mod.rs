//! Observability: structured logging and metrics.

mod logging;
mod metrics;

pub use logging::{LOG_FILE_ENV, LOG_FORMAT_ENV, LOG_LEVEL_ENV, LogFormat, LoggingConfig};
pub use metrics::{METRICS_ENABLED_ENV, MetricsConfig, MetricsHandle};

use crate::config::ObservabilitySettings;
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

/// Full observability configuration.
#[derive(Debug)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

/// Options supplied by the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Whether verbose output was requested.
    pub verbose: bool,
    /// Whether metrics must be recorded regardless of configuration.
    pub force_metrics: bool,
}

/// Handle for observability runtime components.
#[derive(Debug)]
pub struct ObservabilityHandle {
    metrics: Option<MetricsHandle>,
}

impl ObservabilityHandle {
    /// Returns the metrics handle when metrics are enabled.
    #[must_use]
    pub const fn metrics(&self) -> Option<&MetricsHandle> {
        self.metrics.as_ref()
    }
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes observability from config settings with env overrides.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if the
/// subscriber, log file, or metrics recorder cannot be set up.
pub fn init_from_config(
    settings: &ObservabilitySettings,
    options: InitOptions,
) -> Result<ObservabilityHandle> {
    init(ObservabilityConfig {
        logging: LoggingConfig::from_settings(settings.logging.as_ref(), options.verbose),
        metrics: MetricsConfig::from_settings(settings.metrics.as_ref(), options.force_metrics),
    })
}

/// Initializes logging and metrics for the process.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// component fails to initialize.
pub fn init(config: ObservabilityConfig) -> Result<ObservabilityHandle> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "observability already initialized".to_string(),
        });
    }

    let metrics = metrics::install_prometheus(config.metrics)?;
    let logging = &config.logging;

    let writer = match &logging.file {
        Some(path) => BoxMakeWriter::new(Mutex::new(open_log_file(path)?)),
        None => BoxMakeWriter::new(io::stderr),
    };
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_ansi(logging.file.is_none())
            .with_target(true)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(logging.filter())
        .try_init()
        .map_err(|e| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: e.to_string(),
        })?;

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "failed to mark observability initialized".to_string(),
        })?;

    Ok(ObservabilityHandle { metrics })
}

/// Opens the log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_log_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::OperationFailed {
            operation: "open_log_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = tempfile::tempdir().ok();
        let Some(dir) = dir else { return };
        let path = dir.path().join("nested").join("cogmem.log");
        let file = open_log_file(&path);
        assert!(file.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_open_log_file_appends() {
        use std::io::Write;

        let dir = tempfile::tempdir().ok();
        let Some(dir) = dir else { return };
        let path = dir.path().join("cogmem.log");
        for line in ["first\n", "second\n"] {
            let file = open_log_file(&path);
            assert!(file.is_ok_and(|mut f| f.write_all(line.as_bytes()).is_ok()));
        }
        let contents = std::fs::read_to_string(&path).unwrap_or_default();
        assert_eq!(contents, "first\nsecond\n");
    }
}
