use std::path::{
    Path,
    PathBuf,
};

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_SMOOTHING_FACTOR: f64 = 1.0;
const DEFAULT_MAX_CONCURRENT_BATTLES: usize = 64;

#[derive(Debug, Deserialize)]
struct RawWorkerConfig {
    socket_address_id: Option<String>,
    worker_routing_id: Option<String>,
    usage_stats_dataset_path: Option<PathBuf>,
    smoothing_factor: Option<f64>,
    log_directory: Option<PathBuf>,
    max_concurrent_battles: Option<usize>,
}

/// Errors produced while validating a [`WorkerConfig`]. All of these are fatal before any
/// socket is opened.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required configuration field `{0}`")]
    MissingField(&'static str),
    #[error("smoothing factor must be positive, got {0}")]
    InvalidSmoothingFactor(f64),
}

/// Validated configuration for a battle worker, loaded from a TOML file or an in-memory string.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Identifies the pair of local-domain sockets this worker listens on.
    pub socket_address_id: String,
    /// The routing id this worker presents to the agent bridge's server.
    pub worker_routing_id: String,
    /// Where to persist usage-stats samples, if at all.
    pub usage_stats_dataset_path: Option<PathBuf>,
    /// Smoothing factor applied by the external encoder when updating usage statistics.
    pub smoothing_factor: f64,
    /// Directory battle logs are realized into, if logging is eager.
    pub log_directory: Option<PathBuf>,
    /// Upper bound on battles dispatched concurrently by one worker.
    pub max_concurrent_battles: usize,
}

impl WorkerConfig {
    /// Parses and validates configuration from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawWorkerConfig = toml::from_str(contents)?;
        Self::from_raw(raw)
    }

    /// Reads, parses, and validates configuration from a file on disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path).with_context(|| {
            format!("failed to read configuration file at {}", path.display())
        })?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid configuration at {}", path.display()))
    }

    fn from_raw(raw: RawWorkerConfig) -> Result<Self, ConfigError> {
        let socket_address_id = raw
            .socket_address_id
            .ok_or(ConfigError::MissingField("socket_address_id"))?;
        let worker_routing_id = raw
            .worker_routing_id
            .ok_or(ConfigError::MissingField("worker_routing_id"))?;

        let smoothing_factor = raw.smoothing_factor.unwrap_or(DEFAULT_SMOOTHING_FACTOR);
        if smoothing_factor <= 0.0 {
            return Err(ConfigError::InvalidSmoothingFactor(smoothing_factor));
        }

        Ok(Self {
            socket_address_id,
            worker_routing_id,
            usage_stats_dataset_path: raw.usage_stats_dataset_path,
            smoothing_factor,
            log_directory: raw.log_directory,
            max_concurrent_battles: raw
                .max_concurrent_battles
                .unwrap_or(DEFAULT_MAX_CONCURRENT_BATTLES),
        })
    }
}

#[cfg(test)]
mod worker_config_test {
    use assert_matches::assert_matches;

    use super::{
        ConfigError,
        WorkerConfig,
    };

    #[test]
    fn applies_defaults_for_optional_fields() {
        let config = WorkerConfig::from_toml_str(
            r#"
            socket_address_id = "worker-1"
            worker_routing_id = "route-1"
            "#,
        )
        .unwrap();

        assert_eq!(config.socket_address_id, "worker-1");
        assert_eq!(config.worker_routing_id, "route-1");
        assert_eq!(config.smoothing_factor, 1.0);
        assert_eq!(config.max_concurrent_battles, 64);
        assert_eq!(config.usage_stats_dataset_path, None);
        assert_eq!(config.log_directory, None);
    }

    #[test]
    fn reads_every_field_when_present() {
        let config = WorkerConfig::from_toml_str(
            r#"
            socket_address_id = "worker-1"
            worker_routing_id = "route-1"
            usage_stats_dataset_path = "/data/usage.bin"
            smoothing_factor = 0.25
            log_directory = "/var/log/battles"
            max_concurrent_battles = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.smoothing_factor, 0.25);
        assert_eq!(config.max_concurrent_battles, 8);
        assert_eq!(
            config.usage_stats_dataset_path,
            Some("/data/usage.bin".into())
        );
        assert_eq!(config.log_directory, Some("/var/log/battles".into()));
    }

    #[test]
    fn missing_required_field_is_fatal() {
        let result = WorkerConfig::from_toml_str(r#"worker_routing_id = "route-1""#);
        assert_matches!(
            result,
            Err(ConfigError::MissingField("socket_address_id"))
        );
    }

    #[test]
    fn non_positive_smoothing_factor_is_rejected() {
        let result = WorkerConfig::from_toml_str(
            r#"
            socket_address_id = "worker-1"
            worker_routing_id = "route-1"
            smoothing_factor = 0.0
            "#,
        );
        assert_matches!(result, Err(ConfigError::InvalidSmoothingFactor(_)));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let result = WorkerConfig::from_toml_str("not valid toml {{{");
        assert_matches!(result, Err(ConfigError::Parse(_)));
    }
}
