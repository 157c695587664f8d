//! Prometheus metrics.
//!
//! The store emits through the `metrics` facade unconditionally; without an
//! installed recorder those calls are no-ops. When enabled, a Prometheus
//! recorder is installed and its exposition text can be rendered on demand.

use crate::config::{EnvLookup, MetricsSettings, parse_var, process_env};
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Environment variable enabling metrics.
pub const METRICS_ENABLED_ENV: &str = "COGMEM_METRICS_ENABLED";

/// Metrics configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsConfig {
    /// Whether metrics are recorded.
    pub enabled: bool,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: Option<&MetricsSettings>, force: bool) -> Self {
        Self::from_settings_with(settings, force, &process_env)
    }

    /// Like [`MetricsConfig::from_settings`], reading overrides through `env`.
    #[must_use]
    pub fn from_settings_with(
        settings: Option<&MetricsSettings>,
        force: bool,
        env: &EnvLookup<'_>,
    ) -> Self {
        let mut enabled = settings.and_then(|s| s.enabled).unwrap_or(false);
        if let Some(v) = parse_var::<bool>(env, METRICS_ENABLED_ENV) {
            enabled = v;
        }
        Self {
            enabled: enabled || force,
        }
    }
}

/// Handle to the installed Prometheus recorder.
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
}

impl MetricsHandle {
    /// Renders the current metrics in Prometheus text exposition format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }
}

/// Installs the global Prometheus recorder if metrics are enabled.
pub(crate) fn install_prometheus(config: MetricsConfig) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }
    let prometheus =
        PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| Error::OperationFailed {
                operation: "metrics_init".to_string(),
                cause: e.to_string(),
            })?;
    describe_metrics();
    Ok(Some(MetricsHandle { prometheus }))
}

fn describe_metrics() {
    metrics::describe_counter!(
        "memory_operations_total",
        "Memory store operations by operation and status"
    );
    metrics::describe_histogram!(
        "memory_operation_duration_ms",
        "Memory store operation latency in milliseconds"
    );
    metrics::describe_counter!(
        "memory_evictions_total",
        "Episodic records evicted for capacity"
    );
    metrics::describe_gauge!("memory_episodic_count", "Episodic records currently held");
}
