//! Default block builder: fills a pending block and seals it into a queued
//! transaction batch.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use oru_config::AggregatorConfig;
use oru_db::{types::PendingBlockEntry, DbResult};
use oru_merkle::{SumLeaf, SumTree};
use oru_primitives::{
    batch::BatchKind,
    buf::Buf32,
    tx::TransactionResult,
};
use oru_storage::{BatchDataOps, PendingBlockOps};
use oru_tasks::ScheduledTask;
use tokio::sync::Mutex;
use tracing::*;

use crate::traits::BlockBuilder;

#[derive(Debug)]
struct BuilderState {
    block: PendingBlockEntry,

    /// When the first result of the current block arrived.
    opened_at: Option<Instant>,
}

/// Block `n` is enqueued as transaction batch `n`.
pub struct DefaultBlockBuilder {
    pending_ops: Arc<PendingBlockOps>,
    batch_ops: Arc<BatchDataOps>,
    max_transactions: usize,
    max_delay: Duration,
    state: Mutex<BuilderState>,
}

impl DefaultBlockBuilder {
    /// Resumes from the persisted pending block, or starts block 1.
    pub async fn load(
        pending_ops: Arc<PendingBlockOps>,
        batch_ops: Arc<BatchDataOps>,
        config: &AggregatorConfig,
    ) -> DbResult<Self> {
        let block = pending_ops
            .get_pending_block_async()
            .await?
            .unwrap_or_else(|| PendingBlockEntry::new_empty(1, None));

        // The delay restarts on resume, we don't persist wall clock time.
        let opened_at = (!block.results.is_empty()).then(Instant::now);
        debug!(block = %block.block_number, txs = block.results.len(), "loaded pending block");

        Ok(Self {
            pending_ops,
            batch_ops,
            max_transactions: config.max_transactions_per_block.max(1),
            max_delay: Duration::from_millis(config.max_block_delay_ms),
            state: Mutex::new(BuilderState { block, opened_at }),
        })
    }

    /// Number of the block currently being filled.
    pub async fn current_block_number(&self) -> u64 {
        self.state.lock().await.block.block_number
    }

    /// Results in the block currently being filled.
    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.block.results.len()
    }

    /// Appends a result, sealing the block if it became full.
    ///
    /// Results numbered at or below the highest one ever accepted are
    /// ignored, including those that went out in an already sealed block.
    pub async fn add(&self, result: TransactionResult) -> DbResult<()> {
        let mut state = self.state.lock().await;

        // A full block is left behind when an earlier seal failed.
        if state.block.results.len() >= self.max_transactions {
            self.seal_current(&mut state).await?;
        }

        let txn = result.transaction_number;
        if state.block.has_accepted(txn) {
            debug!(%txn, "ignoring redelivered result");
            return Ok(());
        }

        let mut block = state.block.clone();
        block.push(result);
        self.pending_ops
            .put_pending_block_async(block.clone())
            .await?;
        state.block = block;
        if state.opened_at.is_none() {
            state.opened_at = Some(Instant::now());
        }

        if state.block.results.len() >= self.max_transactions {
            self.seal_current(&mut state).await?;
        }

        Ok(())
    }

    /// Seals the pending block if it is non-empty and older than the
    /// configured delay. Returns whether a block was sealed.
    pub async fn flush_if_expired(&self) -> DbResult<bool> {
        let mut state = self.state.lock().await;

        let expired = state
            .opened_at
            .is_some_and(|t| t.elapsed() >= self.max_delay);
        if !expired || state.block.results.is_empty() {
            return Ok(false);
        }

        self.seal_current(&mut state).await?;
        Ok(true)
    }

    /// Seals the block in `state` and moves on to its successor.
    async fn seal_current(&self, state: &mut BuilderState) -> DbResult<()> {
        let next = self.seal(&state.block).await?;
        state.block = next;
        state.opened_at = None;
        Ok(())
    }

    /// Enqueues `block` as transaction batch number `block.block_number` and
    /// persists the next empty block, which is returned.
    ///
    /// The block must already be persisted. Sealing it again after a partial
    /// failure finds the batch in place and only persists the successor.
    async fn seal(&self, block: &PendingBlockEntry) -> DbResult<PendingBlockEntry> {
        let leaves = block
            .results
            .iter()
            .map(|r| {
                borsh::to_vec(&r.signed_transaction)
                    .map(|data| SumLeaf::new(r.transaction_number, data))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let tree: SumTree = SumTree::build(&leaves);
        let root = tree
            .root()
            .map(|n| Buf32::from(n.hash))
            .unwrap_or_else(Buf32::zero);
        let elements = leaves.into_iter().map(|l| l.data).collect();

        let batch_number = block.block_number;
        let created = self
            .batch_ops
            .enqueue_batch_at_async(BatchKind::Transactions, batch_number, elements, root)
            .await?;
        if created {
            info!(%batch_number, txs = block.results.len(), %root, "sealed block");
        } else {
            warn!(%batch_number, "block was already enqueued, skipping");
        }

        let next = block.successor();
        self.pending_ops.put_pending_block_async(next.clone()).await?;
        Ok(next)
    }
}

#[async_trait]
impl BlockBuilder for DefaultBlockBuilder {
    async fn add_transaction_result(&self, result: TransactionResult) -> anyhow::Result<()> {
        Ok(self.add(result).await?)
    }
}

/// Seals the pending block once it exceeds the configured delay.
pub struct BlockFlushTask {
    builder: Arc<DefaultBlockBuilder>,
}

impl BlockFlushTask {
    pub fn new(builder: Arc<DefaultBlockBuilder>) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl ScheduledTask for BlockFlushTask {
    async fn run_task(&self) -> anyhow::Result<bool> {
        match self.builder.flush_if_expired().await {
            Ok(sealed) => Ok(sealed),
            Err(e) => {
                warn!(err = %e, "failed to flush pending block");
                Ok(false)
            }
        }
    }
}

/// Enqueues a state root batch. Root `i` of the batch covers the sum tree
/// range ending at `first_index + i + 1`, so the leaf for global state root
/// index `k` ends at `k + 1`.
pub async fn enqueue_state_root_batch(
    batch_ops: &BatchDataOps,
    first_index: u64,
    roots: &[Buf32],
) -> DbResult<u64> {
    let leaves: Vec<_> = roots
        .iter()
        .enumerate()
        .map(|(i, r)| SumLeaf::new(first_index + i as u64 + 1, r.as_slice()))
        .collect();

    let tree: SumTree = SumTree::build(&leaves);
    let root = tree
        .root()
        .map(|n| Buf32::from(n.hash))
        .unwrap_or_else(Buf32::zero);
    let elements = leaves.into_iter().map(|l| l.data).collect();

    batch_ops
        .enqueue_batch_async(BatchKind::StateRoots, elements, root)
        .await
}
