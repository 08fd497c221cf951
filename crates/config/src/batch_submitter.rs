use serde::{Deserialize, Serialize};

/// Configuration shared by the per-kind batch submitters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSubmitterConfig {
    /// How often to invoke the submitter, in ms.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Confirmations after which a batch counts as final. With 1, a batch is
    /// final on its first confirmation.
    #[serde(default = "default_finality_confirmations")]
    pub finality_confirmations: u64,
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_finality_confirmations() -> u64 {
    1
}

impl Default for BatchSubmitterConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            finality_confirmations: default_finality_confirmations(),
        }
    }
}
