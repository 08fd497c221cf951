mod aggregator;
mod batch_submitter;
mod config;

pub use aggregator::AggregatorConfig;
pub use batch_submitter::BatchSubmitterConfig;
pub use config::{Config, ConfigError, LoggingConfig, StorageConfig};
