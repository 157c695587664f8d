//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `COGMEM_*` environment variables.
//!
//! ```toml
//! data_dir = "/var/lib/cogmem"
//!
//! [memory]
//! max_episodic = 1000
//! consolidation_interval_secs = 86400
//! consolidation_volume_threshold = 100
//! pattern_threshold = 3
//!
//! [observability.logging]
//! format = "json"
//! level = "info"
//!
//! [observability.metrics]
//! enabled = true
//! ```

use crate::models::{DEFAULT_MIN_CONFIDENCE, DEFAULT_RETRIEVE_LIMIT};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the episodic capacity.
pub const MAX_EPISODIC_ENV: &str = "COGMEM_MAX_EPISODIC";
/// Environment variable overriding the consolidation interval (seconds).
pub const CONSOLIDATION_INTERVAL_ENV: &str = "COGMEM_CONSOLIDATION_INTERVAL_SECS";
/// Environment variable overriding the consolidation volume threshold.
pub const CONSOLIDATION_VOLUME_ENV: &str = "COGMEM_CONSOLIDATION_VOLUME";
/// Environment variable overriding the pattern threshold.
pub const PATTERN_THRESHOLD_ENV: &str = "COGMEM_PATTERN_THRESHOLD";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "COGMEM_DATA_DIR";

/// Default episodic capacity.
pub const DEFAULT_MAX_EPISODIC: usize = 1000;
/// Default time between automatic consolidations (24 hours).
pub const DEFAULT_CONSOLIDATION_INTERVAL_SECS: u64 = 24 * 60 * 60;
/// Default number of new episodic records that triggers consolidation.
pub const DEFAULT_CONSOLIDATION_VOLUME: usize = 100;
/// Default minimum topic occurrences for a semantic pattern.
pub const DEFAULT_PATTERN_THRESHOLD: usize = 3;
/// Default number of recent records shared with collaborators.
pub const DEFAULT_SHARE_LIMIT: usize = 5;

/// Tunables for a single agent's memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConfig {
    /// Maximum episodic records before eviction.
    pub max_episodic: usize,
    /// Seconds between time-triggered consolidations.
    pub consolidation_interval_secs: u64,
    /// Episodic records stored since the last pass that trigger consolidation
    /// once exceeded.
    pub consolidation_volume_threshold: usize,
    /// Minimum occurrences of a topic to become a semantic pattern.
    pub pattern_threshold: usize,
    /// Default retrieval limit.
    pub default_limit: usize,
    /// Default retrieval score floor.
    pub default_min_confidence: f32,
    /// Default number of recent records in shared context.
    pub share_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_episodic: DEFAULT_MAX_EPISODIC,
            consolidation_interval_secs: DEFAULT_CONSOLIDATION_INTERVAL_SECS,
            consolidation_volume_threshold: DEFAULT_CONSOLIDATION_VOLUME,
            pattern_threshold: DEFAULT_PATTERN_THRESHOLD,
            default_limit: DEFAULT_RETRIEVE_LIMIT,
            default_min_confidence: DEFAULT_MIN_CONFIDENCE,
            share_limit: DEFAULT_SHARE_LIMIT,
        }
    }
}

impl MemoryConfig {
    /// Sets the episodic capacity.
    #[must_use]
    pub const fn with_max_episodic(mut self, max: usize) -> Self {
        self.max_episodic = max;
        self
    }

    /// Sets the consolidation interval.
    #[must_use]
    pub const fn with_consolidation_interval_secs(mut self, secs: u64) -> Self {
        self.consolidation_interval_secs = secs;
        self
    }

    /// Sets the consolidation volume threshold.
    #[must_use]
    pub const fn with_consolidation_volume_threshold(mut self, threshold: usize) -> Self {
        self.consolidation_volume_threshold = threshold;
        self
    }

    /// Sets the pattern threshold.
    #[must_use]
    pub const fn with_pattern_threshold(mut self, threshold: usize) -> Self {
        self.pattern_threshold = threshold;
        self
    }

    /// Checks the configuration for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_episodic == 0 {
            return Err(Error::InvalidInput(
                "memory.max_episodic must be at least 1".to_string(),
            ));
        }
        if self.pattern_threshold == 0 {
            return Err(Error::InvalidInput(
                "memory.pattern_threshold must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_min_confidence) {
            return Err(Error::InvalidInput(format!(
                "memory.default_min_confidence must be within 0.0..=1.0, got {}",
                self.default_min_confidence
            )));
        }
        Ok(())
    }

    /// Applies `COGMEM_*` overrides from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(&process_env);
    }

    /// Applies `COGMEM_*` overrides read through `env`.
    ///
    /// Unparsable values are ignored and leave the field unchanged.
    pub fn apply_overrides_from(&mut self, env: &EnvLookup<'_>) {
        if let Some(v) = parse_var(env, MAX_EPISODIC_ENV) {
            self.max_episodic = v;
        }
        if let Some(v) = parse_var(env, CONSOLIDATION_INTERVAL_ENV) {
            self.consolidation_interval_secs = v;
        }
        if let Some(v) = parse_var(env, CONSOLIDATION_VOLUME_ENV) {
            self.consolidation_volume_threshold = v;
        }
        if let Some(v) = parse_var(env, PATTERN_THRESHOLD_ENV) {
            self.pattern_threshold = v;
        }
    }
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive, e.g. `info` or `cogmem=debug`.
    pub level: Option<String>,
    /// Optional log file path.
    pub file: Option<String>,
}

/// Metrics settings as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Whether to install the Prometheus recorder.
    pub enabled: Option<bool>,
}

/// Observability settings section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservabilitySettings {
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

/// Main configuration for cogmem.
#[derive(Debug, Clone)]
pub struct CogmemConfig {
    /// Directory holding per-agent snapshots.
    pub data_dir: PathBuf,
    /// Memory tunables.
    pub memory: MemoryConfig,
    /// Observability settings.
    pub observability: ObservabilitySettings,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Memory section.
    pub memory: Option<ConfigFileMemory>,
    /// Observability section.
    pub observability: Option<ObservabilitySettings>,
}

/// Memory section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMemory {
    /// Episodic capacity.
    pub max_episodic: Option<usize>,
    /// Consolidation interval in seconds.
    pub consolidation_interval_secs: Option<u64>,
    /// Consolidation volume threshold.
    pub consolidation_volume_threshold: Option<usize>,
    /// Pattern threshold.
    pub pattern_threshold: Option<usize>,
    /// Default retrieval limit.
    pub default_limit: Option<usize>,
    /// Default retrieval score floor.
    pub default_min_confidence: Option<f32>,
    /// Default shared-context size.
    pub share_limit: Option<usize>,
}

impl Default for CogmemConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            memory: MemoryConfig::default(),
            observability: ObservabilitySettings::default(),
        }
    }
}

impl CogmemConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path, then applies env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting memory configuration is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        let mut config = Self::from_toml(&contents)?;
        config.apply_env_overrides();
        config.memory.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without consulting the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`<config_dir>/cogmem/config.toml`)
    /// 2. XDG-style `~/.config/cogmem/config.toml`
    ///
    /// Falls back to defaults (plus env overrides) if no file loads.
    #[must_use]
    pub fn load_default() -> Self {
        let candidates = directories::BaseDirs::new()
            .map(|base| {
                vec![
                    base.config_dir().join("cogmem").join("config.toml"),
                    base.home_dir()
                        .join(".config")
                        .join("cogmem")
                        .join("config.toml"),
                ]
            })
            .unwrap_or_default();

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring config file"),
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Applies `COGMEM_*` overrides from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(&process_env);
    }

    /// Applies `COGMEM_*` overrides read through `env`.
    pub fn apply_overrides_from(&mut self, env: &EnvLookup<'_>) {
        if let Some(dir) = env(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self.memory.apply_overrides_from(env);
    }

    /// Converts a `ConfigFile` to `CogmemConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(memory) = file.memory {
            let m = &mut config.memory;
            if let Some(v) = memory.max_episodic {
                m.max_episodic = v;
            }
            if let Some(v) = memory.consolidation_interval_secs {
                m.consolidation_interval_secs = v;
            }
            if let Some(v) = memory.consolidation_volume_threshold {
                m.consolidation_volume_threshold = v;
            }
            if let Some(v) = memory.pattern_threshold {
                m.pattern_threshold = v;
            }
            if let Some(v) = memory.default_limit {
                m.default_limit = v;
            }
            if let Some(v) = memory.default_min_confidence {
                m.default_min_confidence = v;
            }
            if let Some(v) = memory.share_limit {
                m.share_limit = v;
            }
        }
        if let Some(observability) = file.observability {
            config.observability = observability;
        }

        config
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }
}

/// Platform data directory for snapshots, or `.cogmem` if none is known.
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".cogmem"),
        |base| base.data_dir().join("cogmem"),
    )
}

/// Variable lookup used for overrides; [`process_env`] in production.
pub type EnvLookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Reads a variable from the process environment.
#[must_use]
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Reads and parses a variable, ignoring unparsable values.
pub(crate) fn parse_var<T: std::str::FromStr>(env: &EnvLookup<'_>, key: &str) -> Option<T> {
    env(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults_are_valid() {
        let config = MemoryConfig::default();
        assert_eq!(config.max_episodic, 1000);
        assert_eq!(config.consolidation_interval_secs, 86_400);
        assert_eq!(config.consolidation_volume_threshold, 100);
        assert_eq!(config.pattern_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = MemoryConfig::default().with_max_episodic(0);
        assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_bad_confidence() {
        let config = MemoryConfig {
            default_min_confidence: 1.5,
            ..MemoryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            data_dir = "/tmp/cogmem-test"

            [memory]
            max_episodic = 50
            pattern_threshold = 5

            [observability.logging]
            format = "json"

            [observability.metrics]
            enabled = true
        "#;
        let config = CogmemConfig::from_toml(toml).unwrap_or_default();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cogmem-test"));
        assert_eq!(config.memory.max_episodic, 50);
        assert_eq!(config.memory.pattern_threshold, 5);
        assert_eq!(config.memory.consolidation_volume_threshold, 100);
        let format = config
            .observability
            .logging
            .as_ref()
            .and_then(|l| l.format.clone());
        assert_eq!(format.as_deref(), Some("json"));
        assert_eq!(
            config.observability.metrics.and_then(|m| m.enabled),
            Some(true)
        );
    }

    #[test]
    fn test_from_toml_invalid() {
        let result = CogmemConfig::from_toml("memory = 3");
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().ok();
        let Some(dir) = dir else { return };
        let path = dir.path().join("config.toml");
        let written = std::fs::write(&path, "[memory]\nshare_limit = 9\n");
        assert!(written.is_ok());
        let config = CogmemConfig::load_from_file(&path);
        assert_eq!(config.map(|c| c.memory.share_limit).ok(), Some(9));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_memory_overrides() {
        let mut config = MemoryConfig::default();
        config.apply_overrides_from(&vars(&[
            (MAX_EPISODIC_ENV, "250"),
            (CONSOLIDATION_INTERVAL_ENV, " 3600 "),
            (CONSOLIDATION_VOLUME_ENV, "20"),
            (PATTERN_THRESHOLD_ENV, "4"),
        ]));
        assert_eq!(config.max_episodic, 250);
        assert_eq!(config.consolidation_interval_secs, 3600);
        assert_eq!(config.consolidation_volume_threshold, 20);
        assert_eq!(config.pattern_threshold, 4);
    }

    #[test_case(MAX_EPISODIC_ENV, "lots"; "not a number")]
    #[test_case(MAX_EPISODIC_ENV, "-5"; "negative")]
    #[test_case(MAX_EPISODIC_ENV, ""; "empty")]
    fn test_unparsable_override_ignored(key: &str, value: &str) {
        let mut config = MemoryConfig::default();
        config.apply_overrides_from(&vars(&[(key, value)]));
        assert_eq!(config, MemoryConfig::default());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let toml = "data_dir = \"/from/file\"\n[memory]\nmax_episodic = 50\n";
        let mut config = CogmemConfig::from_toml(toml).unwrap_or_default();
        config.apply_overrides_from(&vars(&[
            (DATA_DIR_ENV, "/from/env"),
            (MAX_EPISODIC_ENV, "75"),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/from/env"));
        assert_eq!(config.memory.max_episodic, 75);
    }

    #[test]
    fn test_blank_data_dir_override_ignored() {
        let mut config = CogmemConfig::new().with_data_dir("/kept");
        config.apply_overrides_from(&vars(&[(DATA_DIR_ENV, "  ")]));
        assert_eq!(config.data_dir, PathBuf::from("/kept"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = CogmemConfig::load_from_file(Path::new("/nonexistent/cogmem.toml"));
        assert!(result.is_err());
    }
}
