use oru_merkle::InclusionProof;
use oru_primitives::{buf::Buf32, tx::SignedTransaction};

/// Everything the fraud verifier needs to open and settle a dispute about one
/// state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisputeContext {
    /// Index of the disputed pre-state root in the state root log.
    pub transition_index: u64,

    pub pre_state_root: Buf32,
    /// Proof of `pre_state_root` against its state root batch.
    pub pre_state_proof: InclusionProof,

    pub post_state_root: Buf32,
    /// Proof of `post_state_root` against its state root batch.
    pub post_state_proof: InclusionProof,

    /// Transaction executed between the two roots.
    pub transaction: SignedTransaction,
    /// Proof of `transaction` against its transaction batch.
    pub transaction_proof: InclusionProof,
}
