use serde::{Deserialize, Serialize};

/// Configuration for the aggregator and the default block builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatorConfig {
    /// A block is sealed as soon as it holds this many transactions.
    #[serde(default = "default_max_transactions_per_block")]
    pub max_transactions_per_block: usize,

    /// A non-empty block is sealed once its first transaction is this old, in ms.
    #[serde(default = "default_max_block_delay_ms")]
    pub max_block_delay_ms: u64,

    /// How often the delay check runs, in ms.
    #[serde(default = "default_block_flush_poll_ms")]
    pub block_flush_poll_ms: u64,
}

fn default_max_transactions_per_block() -> usize {
    100
}

fn default_max_block_delay_ms() -> u64 {
    10_000
}

fn default_block_flush_poll_ms() -> u64 {
    1_000
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_transactions_per_block: default_max_transactions_per_block(),
            max_block_delay_ms: default_max_block_delay_ms(),
            block_flush_poll_ms: default_block_flush_poll_ms(),
        }
    }
}
