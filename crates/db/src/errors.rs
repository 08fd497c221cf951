use oru_primitives::batch::{BatchKind, BatchStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("tried to insert into {0} out-of-order index {1}")]
    OooInsert(&'static str, u64),

    #[error("missing {0} batch {1}")]
    MissingBatch(BatchKind, u64),

    #[error("batch {batch_number} cannot move from {from:?} to {to:?}")]
    InvalidStatusTransition {
        batch_number: u64,
        from: BatchStatus,
        to: BatchStatus,
    },

    #[error("codec: {0}")]
    Codec(String),

    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Codec(value.to_string())
    }
}
