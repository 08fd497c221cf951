//! Types persisted through the storage traits.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use oru_primitives::tx::TransactionResult;

/// Keys of the singleton values kept in the key-value store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Next transaction number the aggregator will hand to the block builder.
    Watermark,
    /// Block currently being filled by the block builder.
    PendingBlock,
}

impl StoreKey {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            StoreKey::Watermark => b"aggregator/watermark",
            StoreKey::PendingBlock => b"block-builder/pending",
        }
    }
}

/// Block that has not been sealed yet.
#[derive(Clone, Debug, PartialEq, Eq, Arbitrary, BorshSerialize, BorshDeserialize)]
pub struct PendingBlockEntry {
    pub block_number: u64,
    pub results: Vec<TransactionResult>,

    /// Highest transaction number the builder ever accepted, carried over
    /// from sealed blocks.
    pub last_accepted: Option<u64>,
}

impl PendingBlockEntry {
    pub fn new_empty(block_number: u64, last_accepted: Option<u64>) -> Self {
        Self {
            block_number,
            results: Vec::new(),
            last_accepted,
        }
    }

    /// Block that follows this one once it is sealed.
    pub fn successor(&self) -> Self {
        Self::new_empty(self.block_number + 1, self.last_accepted)
    }

    pub fn last_transaction_number(&self) -> Option<u64> {
        self.last_accepted
    }

    /// Whether `txn` was already accepted into this or an earlier block.
    pub fn has_accepted(&self, txn: u64) -> bool {
        self.last_accepted.is_some_and(|last| txn <= last)
    }

    pub fn push(&mut self, result: TransactionResult) {
        self.last_accepted = Some(result.transaction_number);
        self.results.push(result);
    }
}
