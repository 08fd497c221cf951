//! Errors during parsing/handling/conversion of primitives.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("invalid length (expected {expected}, got {got})")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Errors from signing or recovering transaction signatures.
#[derive(Debug, Clone, Error)]
pub enum CryptoError {
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("could not recover signer: {0}")]
    Recovery(String),

    #[error("encoding transaction body: {0}")]
    Encoding(String),
}

/// Failure reported by a settlement-chain contract handle.
#[derive(Debug, Clone, Error)]
pub enum ContractError {
    /// The call was mined but reverted.
    #[error("call reverted: {0}")]
    Reverted(String),

    /// The call never reached the chain (connection, timeout, nonce issues).
    #[error("transport: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}
