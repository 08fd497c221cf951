use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{aggregator::AggregatorConfig, batch_submitter::BatchSubmitterConfig};

/// Default value for `thread_pool_size` in [`StorageConfig`].
const DEFAULT_DB_THREADS: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Threads serving blocking database calls.
    #[serde(default = "default_thread_pool_size")]
    pub thread_pool_size: usize,
}

fn default_thread_pool_size() -> usize {
    DEFAULT_DB_THREADS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            thread_pool_size: default_thread_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// OpenTelemetry collector endpoint. Falls back to `ORU_OTLP_URL`.
    pub otlp_url: Option<String>,

    /// Label appended to the service name in logs. Falls back to `ORU_SVC_LABEL`.
    pub service_label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub batch_submitter: BatchSubmitterConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.aggregator.max_transactions_per_block == 0 {
            return Err(ConfigError::Invalid("max_transactions_per_block must be positive"));
        }
        if self.batch_submitter.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive"));
        }
        if self.batch_submitter.finality_confirmations == 0 {
            return Err(ConfigError::Invalid("finality_confirmations must be positive"));
        }
        if self.storage.thread_pool_size == 0 {
            return Err(ConfigError::Invalid("thread_pool_size must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_load() {
        let config_string = r#"
            [aggregator]
            max_transactions_per_block = 20
            max_block_delay_ms = 3000

            [batch_submitter]
            poll_interval_ms = 1000
            finality_confirmations = 6

            [storage]
            thread_pool_size = 8

            [logging]
            otlp_url = "http://localhost:4317"
        "#;

        let config = Config::from_toml_str(config_string);
        assert!(
            config.is_ok(),
            "should be able to load TOML config but got: {:?}",
            config.err()
        );

        let config = config.unwrap();
        assert_eq!(config.aggregator.max_transactions_per_block, 20);
        assert_eq!(config.aggregator.block_flush_poll_ms, 1_000);
        assert_eq!(config.batch_submitter.finality_confirmations, 6);
        assert_eq!(config.storage.thread_pool_size, 8);
        assert_eq!(config.logging.otlp_url.as_deref(), Some("http://localhost:4317"));
        assert_eq!(config.logging.service_label, None);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.batch_submitter.finality_confirmations, 1);
        assert_eq!(config.batch_submitter.poll_interval_ms, 5_000);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let res = Config::from_toml_str("[aggregator]\nmax_transactions_per_block = 0\n");
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let res = Config::from_toml_str("[batch_submitter]\npoll_interval_ms = \"fast\"\n");
        assert!(matches!(res, Err(ConfigError::Parse(_))));
    }
}
