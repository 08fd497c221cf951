use alloy_primitives::B256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrieError {
    /// The path runs through a node none of the supplied proofs contained.
    #[error("node {0} not covered by the supplied proofs")]
    MissingNode(B256),

    #[error("rlp: {0}")]
    Rlp(#[from] alloy_rlp::Error),

    #[error("malformed node: {0}")]
    MalformedNode(&'static str),
}
