use oru_primitives::batch::{BatchKind, BatchStatus};
use thiserror::Error;

/// Data integrity failures. These end the submitter task.
#[derive(Debug, Error)]
pub enum SubmitterError {
    #[error("{kind} batch {batch_number} returned for submission with status {status:?}")]
    UnexpectedBatchStatus {
        kind: BatchKind,
        batch_number: u64,
        status: BatchStatus,
    },

    #[error("{kind} batch {batch_number} is submitting without a transaction hash")]
    MissingSubmissionHash { kind: BatchKind, batch_number: u64 },
}
