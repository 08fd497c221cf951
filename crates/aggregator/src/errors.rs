use oru_db::DbError;
use oru_primitives::{errors::CryptoError, tx::Address};
use thiserror::Error;

pub type AggregatorResult<T> = Result<T, AggregatorError>;

/// Rejection of a single transaction's signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("malformed signature: {0}")]
    Malformed(#[from] CryptoError),

    #[error("signed by {recovered} but sender is {declared}")]
    SignerMismatch { declared: Address, recovered: Address },
}

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("aggregator used before init")]
    NotInitialized,

    #[error("signature: {0}")]
    Signature(#[from] SignatureError),

    #[error("state machine: {0}")]
    StateMachine(#[source] anyhow::Error),

    #[error("block builder: {0}")]
    BlockBuilder(#[source] anyhow::Error),

    #[error("db: {0}")]
    Db(#[from] DbError),
}
