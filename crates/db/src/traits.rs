//! Trait definitions for low level database interfaces.

#[cfg(feature = "mocks")]
use mockall::automock;
use oru_primitives::batch::{BatchEntry, BatchKind};
use oru_primitives::buf::Buf32;

use crate::types::StoreKey;
use crate::DbResult;

/// Durable key-value store holding small singleton values.
#[cfg_attr(feature = "mocks", automock)]
pub trait KeyValueStore {
    fn get(&self, key: StoreKey) -> DbResult<Option<Vec<u8>>>;

    fn put(&self, key: StoreKey, value: Vec<u8>) -> DbResult<()>;
}

/// Batch persistence and status bookkeeping, one independent log per
/// [`BatchKind`].
///
/// Implementations must reject status changes that would move a batch
/// backwards, see [`BatchStatus::can_transition_to`].
///
/// [`BatchStatus::can_transition_to`]: oru_primitives::batch::BatchStatus::can_transition_to
#[cfg_attr(feature = "mocks", automock)]
pub trait BatchDatabase {
    /// Stores a new batch. Its number must directly follow the last one of
    /// its kind, starting at 1.
    fn put_batch(&self, entry: BatchEntry) -> DbResult<()>;

    fn get_batch(&self, kind: BatchKind, batch_number: u64) -> DbResult<Option<BatchEntry>>;

    fn get_last_batch_number(&self, kind: BatchKind) -> DbResult<Option<u64>>;

    /// Oldest batch that is queued or submitting.
    fn get_next_batch_to_submit(&self, kind: BatchKind) -> DbResult<Option<BatchEntry>>;

    /// Oldest batch that is submitted but not final yet.
    fn get_next_batch_to_finalize(&self, kind: BatchKind) -> DbResult<Option<BatchEntry>>;

    fn mark_submitting(&self, kind: BatchKind, batch_number: u64, tx_hash: Buf32) -> DbResult<()>;

    fn mark_submitted(&self, kind: BatchKind, batch_number: u64, tx_hash: Buf32) -> DbResult<()>;

    fn mark_final(&self, kind: BatchKind, batch_number: u64, tx_hash: Buf32) -> DbResult<()>;
}
