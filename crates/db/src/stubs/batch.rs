use std::collections::BTreeMap;

use oru_primitives::batch::{BatchEntry, BatchKind, BatchStatus};
use oru_primitives::buf::Buf32;
use parking_lot::Mutex;

use crate::errors::DbError;
use crate::traits::BatchDatabase;
use crate::DbResult;

/// Batches of all kinds in one ordered table.
#[derive(Debug, Default)]
pub struct StubBatchDb {
    batches: Mutex<BTreeMap<(BatchKind, u64), BatchEntry>>,
}

impl StubBatchDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn oldest_with(&self, kind: BatchKind, pred: impl Fn(BatchStatus) -> bool) -> Option<BatchEntry> {
        self.batches
            .lock()
            .range((kind, 0)..=(kind, u64::MAX))
            .map(|(_, e)| e)
            .find(|e| pred(e.status))
            .cloned()
    }

    fn set_status(
        &self,
        kind: BatchKind,
        batch_number: u64,
        tx_hash: Buf32,
        status: BatchStatus,
    ) -> DbResult<()> {
        let mut tbl = self.batches.lock();
        let entry = tbl
            .get_mut(&(kind, batch_number))
            .ok_or(DbError::MissingBatch(kind, batch_number))?;

        if !entry.status.can_transition_to(status) {
            return Err(DbError::InvalidStatusTransition {
                batch_number,
                from: entry.status,
                to: status,
            });
        }

        entry.status = status;
        entry.submission_tx_hash = Some(tx_hash);
        Ok(())
    }
}

impl BatchDatabase for StubBatchDb {
    fn put_batch(&self, entry: BatchEntry) -> DbResult<()> {
        let mut tbl = self.batches.lock();
        let kind = entry.kind;
        let last = tbl
            .range((kind, 0)..=(kind, u64::MAX))
            .next_back()
            .map(|((_, n), _)| *n)
            .unwrap_or(0);

        if entry.batch_number != last + 1 {
            return Err(DbError::OooInsert("batches", entry.batch_number));
        }

        tbl.insert((kind, entry.batch_number), entry);
        Ok(())
    }

    fn get_batch(&self, kind: BatchKind, batch_number: u64) -> DbResult<Option<BatchEntry>> {
        Ok(self.batches.lock().get(&(kind, batch_number)).cloned())
    }

    fn get_last_batch_number(&self, kind: BatchKind) -> DbResult<Option<u64>> {
        Ok(self
            .batches
            .lock()
            .range((kind, 0)..=(kind, u64::MAX))
            .next_back()
            .map(|((_, n), _)| *n))
    }

    fn get_next_batch_to_submit(&self, kind: BatchKind) -> DbResult<Option<BatchEntry>> {
        Ok(self.oldest_with(kind, |s| {
            matches!(s, BatchStatus::Queued | BatchStatus::Submitting)
        }))
    }

    fn get_next_batch_to_finalize(&self, kind: BatchKind) -> DbResult<Option<BatchEntry>> {
        Ok(self.oldest_with(kind, |s| s == BatchStatus::Submitted))
    }

    fn mark_submitting(&self, kind: BatchKind, batch_number: u64, tx_hash: Buf32) -> DbResult<()> {
        self.set_status(kind, batch_number, tx_hash, BatchStatus::Submitting)
    }

    fn mark_submitted(&self, kind: BatchKind, batch_number: u64, tx_hash: Buf32) -> DbResult<()> {
        self.set_status(kind, batch_number, tx_hash, BatchStatus::Submitted)
    }

    fn mark_final(&self, kind: BatchKind, batch_number: u64, tx_hash: Buf32) -> DbResult<()> {
        self.set_status(kind, batch_number, tx_hash, BatchStatus::Finalized)
    }
}
