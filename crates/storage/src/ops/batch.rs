//! Operations for reading/writing batches and their submission status.

use std::sync::Arc;

use oru_db::{traits::BatchDatabase, DbResult};
use oru_primitives::{
    batch::{BatchEntry, BatchKind},
    buf::Buf32,
};
use threadpool::ThreadPool;

use crate::exec::*;

/// Database context for an database operation interface.
pub struct Context<D: BatchDatabase + Sync + Send + 'static> {
    db: Arc<D>,
}

impl<D: BatchDatabase + Sync + Send + 'static> Context<D> {
    /// Create a `Context` for [`BatchDataOps`]
    pub fn new(db: Arc<D>) -> Self {
        Self { db }
    }

    /// Convert to [`BatchDataOps`] using a [`ThreadPool`]
    pub fn into_ops(self, pool: ThreadPool) -> BatchDataOps {
        BatchDataOps::new(pool, Arc::new(self))
    }
}

inst_ops! {
    (BatchDataOps, Context<D: BatchDatabase>) {
        get_batch(kind: BatchKind, batch_number: u64) => Option<BatchEntry>;
        enqueue_batch(kind: BatchKind, elements: Vec<Vec<u8>>, root: Buf32) => u64;
        enqueue_batch_at(kind: BatchKind, batch_number: u64, elements: Vec<Vec<u8>>, root: Buf32) => bool;
        get_next_batch_to_submit(kind: BatchKind) => Option<BatchEntry>;
        get_next_batch_to_finalize(kind: BatchKind) => Option<BatchEntry>;
        mark_submitting(kind: BatchKind, batch_number: u64, tx_hash: Buf32) => ();
        mark_submitted(kind: BatchKind, batch_number: u64, tx_hash: Buf32) => ();
        mark_final(kind: BatchKind, batch_number: u64, tx_hash: Buf32) => ();
    }
}

fn get_batch<D: BatchDatabase + Sync + Send + 'static>(
    ctx: &Context<D>,
    kind: BatchKind,
    batch_number: u64,
) -> DbResult<Option<BatchEntry>> {
    ctx.db.get_batch(kind, batch_number)
}

/// Appends a new queued batch and returns its number.
fn enqueue_batch<D: BatchDatabase + Sync + Send + 'static>(
    ctx: &Context<D>,
    kind: BatchKind,
    elements: Vec<Vec<u8>>,
    root: Buf32,
) -> DbResult<u64> {
    let batch_number = ctx
        .db
        .get_last_batch_number(kind)?
        .map(|n| n + 1)
        .unwrap_or(1);
    ctx.db
        .put_batch(BatchEntry::new_queued(batch_number, kind, elements, root))?;
    Ok(batch_number)
}

/// Stores a queued batch under a caller-chosen number. Returns `false` if a
/// batch with that number already exists, which is left untouched.
fn enqueue_batch_at<D: BatchDatabase + Sync + Send + 'static>(
    ctx: &Context<D>,
    kind: BatchKind,
    batch_number: u64,
    elements: Vec<Vec<u8>>,
    root: Buf32,
) -> DbResult<bool> {
    if ctx.db.get_batch(kind, batch_number)?.is_some() {
        return Ok(false);
    }
    ctx.db
        .put_batch(BatchEntry::new_queued(batch_number, kind, elements, root))?;
    Ok(true)
}

fn get_next_batch_to_submit<D: BatchDatabase + Sync + Send + 'static>(
    ctx: &Context<D>,
    kind: BatchKind,
) -> DbResult<Option<BatchEntry>> {
    ctx.db.get_next_batch_to_submit(kind)
}

fn get_next_batch_to_finalize<D: BatchDatabase + Sync + Send + 'static>(
    ctx: &Context<D>,
    kind: BatchKind,
) -> DbResult<Option<BatchEntry>> {
    ctx.db.get_next_batch_to_finalize(kind)
}

fn mark_submitting<D: BatchDatabase + Sync + Send + 'static>(
    ctx: &Context<D>,
    kind: BatchKind,
    batch_number: u64,
    tx_hash: Buf32,
) -> DbResult<()> {
    ctx.db.mark_submitting(kind, batch_number, tx_hash)
}

fn mark_submitted<D: BatchDatabase + Sync + Send + 'static>(
    ctx: &Context<D>,
    kind: BatchKind,
    batch_number: u64,
    tx_hash: Buf32,
) -> DbResult<()> {
    ctx.db.mark_submitted(kind, batch_number, tx_hash)
}

fn mark_final<D: BatchDatabase + Sync + Send + 'static>(
    ctx: &Context<D>,
    kind: BatchKind,
    batch_number: u64,
    tx_hash: Buf32,
) -> DbResult<()> {
    ctx.db.mark_final(kind, batch_number, tx_hash)
}

#[cfg(test)]
mod tests {
    use oru_db::stubs::StubBatchDb;
    use oru_primitives::batch::BatchStatus;

    use super::*;

    #[tokio::test]
    async fn test_enqueue_assigns_numbers_per_kind() {
        let ops = Context::new(Arc::new(StubBatchDb::new())).into_ops(ThreadPool::new(2));

        let a = ops
            .enqueue_batch_async(BatchKind::Transactions, vec![vec![1]], Buf32::zero())
            .await
            .unwrap();
        let b = ops
            .enqueue_batch_async(BatchKind::Transactions, vec![vec![2]], Buf32::zero())
            .await
            .unwrap();
        let c = ops
            .enqueue_batch_async(BatchKind::StateRoots, vec![vec![3; 32]], Buf32::zero())
            .await
            .unwrap();
        assert_eq!((a, b, c), (1, 2, 1));

        let next = ops
            .get_next_batch_to_submit_async(BatchKind::Transactions)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.batch_number, 1);
        assert_eq!(next.status, BatchStatus::Queued);
    }

    #[tokio::test]
    async fn test_enqueue_at_is_idempotent() {
        let ops = Context::new(Arc::new(StubBatchDb::new())).into_ops(ThreadPool::new(2));

        let first = ops
            .enqueue_batch_at_async(BatchKind::Transactions, 1, vec![vec![1]], Buf32::zero())
            .await
            .unwrap();
        let again = ops
            .enqueue_batch_at_async(BatchKind::Transactions, 1, vec![vec![9]], Buf32::zero())
            .await
            .unwrap();
        assert!(first);
        assert!(!again);

        let batch = ops
            .get_batch_async(BatchKind::Transactions, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(batch.elements, vec![vec![1]]);

        // Gaps are still rejected by the database.
        assert!(ops
            .enqueue_batch_at_async(BatchKind::Transactions, 3, vec![], Buf32::zero())
            .await
            .is_err());
    }
}
