//! Batches committed to the settlement layer.

use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::buf::Buf32;

/// Which settlement-chain log a batch is appended to.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    /// Ordered rollup transactions, one batch per sealed block.
    Transactions,
    /// Post-transaction state roots.
    StateRoots,
}

impl BatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchKind::Transactions => "transactions",
            BatchKind::StateRoots => "state_roots",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission status of a batch. Only ever moves forward.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Waiting to be appended.
    Queued,
    /// Append transaction sent, not yet confirmed.
    Submitting,
    /// Append transaction confirmed, not yet deep enough to be final.
    Submitted,
    /// Append transaction is final. Terminal.
    Finalized,
}

impl BatchStatus {
    /// Whether moving from `self` to `next` keeps the status monotonic.
    ///
    /// `Submitting -> Submitting` is allowed so a resent append can replace the
    /// stored hash.
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        use BatchStatus::*;
        matches!(
            (self, next),
            (Queued, Submitting)
                | (Submitting, Submitting)
                | (Submitting, Submitted)
                | (Submitting, Finalized)
                | (Submitted, Finalized)
        )
    }
}

#[derive(
    Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct BatchEntry {
    pub batch_number: u64,
    pub kind: BatchKind,
    /// Encoded elements, transactions or 32-byte state roots depending on kind.
    pub elements: Vec<Vec<u8>>,
    /// Accumulator root over `elements`.
    pub root: Buf32,
    pub status: BatchStatus,
    pub submission_tx_hash: Option<Buf32>,
}

impl BatchEntry {
    /// Creates a fresh `Queued` entry.
    pub fn new_queued(batch_number: u64, kind: BatchKind, elements: Vec<Vec<u8>>, root: Buf32) -> Self {
        Self {
            batch_number,
            kind,
            elements,
            root,
            status: BatchStatus::Queued,
            submission_tx_hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_never_regresses() {
        use BatchStatus::*;
        assert!(Queued.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Submitted));
        assert!(Submitting.can_transition_to(Finalized));
        assert!(Submitted.can_transition_to(Finalized));
        assert!(Submitting.can_transition_to(Submitting));

        assert!(!Submitting.can_transition_to(Queued));
        assert!(!Submitted.can_transition_to(Submitting));
        assert!(!Finalized.can_transition_to(Finalized));
        assert!(!Queued.can_transition_to(Queued));
        assert!(!Queued.can_transition_to(Finalized));
    }
}
