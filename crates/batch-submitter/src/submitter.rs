use std::sync::Arc;

use async_trait::async_trait;
use oru_primitives::{
    batch::{BatchEntry, BatchKind, BatchStatus},
    buf::Buf32,
};
use oru_storage::BatchDataOps;
use oru_tasks::ScheduledTask;
use tracing::*;

use crate::{contract::BatchContract, errors::SubmitterError};

/// Moves batches of one kind through `Queued -> Submitting -> Submitted/Finalized`.
///
/// Chain failures are logged and retried on the next tick. Only data
/// integrity violations are returned as errors.
pub struct BatchSubmitter {
    kind: BatchKind,
    ops: Arc<BatchDataOps>,
    contract: Arc<dyn BatchContract>,
    finality_confirmations: u64,
}

impl BatchSubmitter {
    pub fn new(
        kind: BatchKind,
        ops: Arc<BatchDataOps>,
        contract: Arc<dyn BatchContract>,
        finality_confirmations: u64,
    ) -> Self {
        Self {
            kind,
            ops,
            contract,
            finality_confirmations: finality_confirmations.max(1),
        }
    }

    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    /// Runs one submission round. Returns whether any batch advanced.
    pub async fn tick(&self) -> Result<bool, SubmitterError> {
        let kind = self.kind;
        let finalized = self.finalize_next().await;

        let batch = match self.ops.get_next_batch_to_submit_async(kind).await {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                trace!(%kind, "no batch to submit");
                return Ok(finalized);
            }
            Err(e) => {
                warn!(%kind, err = %e, "failed to fetch next batch");
                return Ok(finalized);
            }
        };

        let batch_number = batch.batch_number;
        let tx_hash = match batch.status {
            BatchStatus::Queued => match self.submit(&batch).await {
                Some(tx_hash) => tx_hash,
                None => return Ok(finalized),
            },
            BatchStatus::Submitting => {
                batch
                    .submission_tx_hash
                    .ok_or(SubmitterError::MissingSubmissionHash { kind, batch_number })?
            }
            status => {
                error!(%kind, %batch_number, ?status, "unexpected batch status");
                return Err(SubmitterError::UnexpectedBatchStatus {
                    kind,
                    batch_number,
                    status,
                });
            }
        };

        let confirmed = self.confirm(&batch, tx_hash).await;
        Ok(confirmed || finalized)
    }

    /// Sends the append transaction and records it. Returns `None` if the
    /// batch should stay queued.
    async fn submit(&self, batch: &BatchEntry) -> Option<Buf32> {
        let kind = self.kind;
        let batch_number = batch.batch_number;

        let tx_hash = match self.contract.append_batch(batch).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                warn!(%kind, %batch_number, err = %e, "failed to append batch");
                return None;
            }
        };
        info!(%kind, %batch_number, %tx_hash, "sent batch append");

        if let Err(e) = self
            .ops
            .mark_submitting_async(kind, batch_number, tx_hash)
            .await
        {
            warn!(%kind, %batch_number, err = %e, "failed to record submission, will resend");
            return None;
        }

        Some(tx_hash)
    }

    /// Waits for the first confirmation and records the outcome.
    async fn confirm(&self, batch: &BatchEntry, tx_hash: Buf32) -> bool {
        let kind = self.kind;
        let batch_number = batch.batch_number;

        let receipt = match self.contract.wait_for_transaction(tx_hash, 1).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(%kind, %batch_number, %tx_hash, err = %e, "failed waiting for batch append");
                return false;
            }
        };

        if !receipt.is_success() {
            warn!(%kind, %batch_number, %tx_hash, status = %receipt.status, "batch append failed on chain");
            return false;
        }

        let res = if self.finality_confirmations <= 1 {
            self.ops.mark_final_async(kind, batch_number, tx_hash).await
        } else {
            self.ops.mark_submitted_async(kind, batch_number, tx_hash).await
        };

        match res {
            Ok(()) => {
                info!(%kind, %batch_number, %tx_hash, "batch append confirmed");
                true
            }
            Err(e) => {
                warn!(%kind, %batch_number, err = %e, "failed to record confirmation");
                false
            }
        }
    }

    /// Finalizes the oldest submitted batch once it is deep enough.
    async fn finalize_next(&self) -> bool {
        let kind = self.kind;

        let batch = match self.ops.get_next_batch_to_finalize_async(kind).await {
            Ok(Some(batch)) => batch,
            Ok(None) => return false,
            Err(e) => {
                warn!(%kind, err = %e, "failed to fetch batch to finalize");
                return false;
            }
        };

        let batch_number = batch.batch_number;
        let Some(tx_hash) = batch.submission_tx_hash else {
            warn!(%kind, %batch_number, "submitted batch has no transaction hash");
            return false;
        };

        let confs = match self.contract.confirmations(tx_hash).await {
            Ok(confs) => confs,
            Err(e) => {
                warn!(%kind, %batch_number, err = %e, "failed to query confirmations");
                return false;
            }
        };

        if confs < self.finality_confirmations {
            trace!(%kind, %batch_number, %confs, "batch not final yet");
            return false;
        }

        match self.ops.mark_final_async(kind, batch_number, tx_hash).await {
            Ok(()) => {
                info!(%kind, %batch_number, %confs, "batch finalized");
                true
            }
            Err(e) => {
                warn!(%kind, %batch_number, err = %e, "failed to mark batch final");
                false
            }
        }
    }
}

#[async_trait]
impl ScheduledTask for BatchSubmitter {
    async fn run_task(&self) -> anyhow::Result<bool> {
        Ok(self.tick().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use oru_db::{
        stubs::StubBatchDb,
        traits::{BatchDatabase, MockBatchDatabase},
    };
    use oru_primitives::errors::ContractError;
    use oru_storage::ops::batch::Context;
    use threadpool::ThreadPool;

    use super::*;
    use crate::contract::{MockBatchContract, TxReceipt};

    const KIND: BatchKind = BatchKind::Transactions;

    fn hash(b: u8) -> Buf32 {
        Buf32::from([b; 32])
    }

    fn receipt(tx_hash: Buf32, status: u64) -> TxReceipt {
        TxReceipt { tx_hash, status }
    }

    fn stub_ops() -> (Arc<StubBatchDb>, Arc<BatchDataOps>) {
        let db = Arc::new(StubBatchDb::new());
        let ops = Arc::new(Context::new(db.clone()).into_ops(ThreadPool::new(2)));
        (db, ops)
    }

    fn queue_batch(db: &StubBatchDb, n: u64) {
        db.put_batch(BatchEntry::new_queued(n, KIND, vec![vec![n as u8]], hash(n as u8)))
            .unwrap();
    }

    fn status_of(db: &StubBatchDb, n: u64) -> BatchStatus {
        db.get_batch(KIND, n).unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_nothing_to_submit() {
        let (_, ops) = stub_ops();
        let mut contract = MockBatchContract::new();
        contract.expect_append_batch().never();

        let submitter = BatchSubmitter::new(KIND, ops, Arc::new(contract), 1);
        assert!(!submitter.run_task().await.unwrap());
    }

    #[tokio::test]
    async fn test_reverted_append_stays_queued() {
        let (db, ops) = stub_ops();
        queue_batch(&db, 1);

        let mut contract = MockBatchContract::new();
        contract
            .expect_append_batch()
            .times(1)
            .returning(|_| Err(ContractError::Reverted("duplicate".into())));
        contract.expect_wait_for_transaction().never();

        let submitter = BatchSubmitter::new(KIND, ops, Arc::new(contract), 1);
        assert!(!submitter.run_task().await.unwrap());
        assert_eq!(status_of(&db, 1), BatchStatus::Queued);
    }

    #[tokio::test]
    async fn test_submit_and_finalize() {
        let (db, ops) = stub_ops();
        queue_batch(&db, 1);

        let mut contract = MockBatchContract::new();
        contract
            .expect_append_batch()
            .withf(|b| b.batch_number == 1)
            .times(1)
            .returning(|_| Ok(hash(0xaa)));
        contract
            .expect_wait_for_transaction()
            .withf(|h, confs| *h == hash(0xaa) && *confs == 1)
            .times(1)
            .returning(|h, _| Ok(receipt(h, 1)));

        let submitter = BatchSubmitter::new(KIND, ops, Arc::new(contract), 1);
        assert!(submitter.run_task().await.unwrap());

        let batch = db.get_batch(KIND, 1).unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Finalized);
        assert_eq!(batch.submission_tx_hash, Some(hash(0xaa)));

        // Finalized batches are never picked up again.
        assert!(!submitter.run_task().await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_receipt_retries_without_resend() {
        let (db, ops) = stub_ops();
        queue_batch(&db, 1);

        let mut contract = MockBatchContract::new();
        contract
            .expect_append_batch()
            .times(1)
            .returning(|_| Ok(hash(0xbb)));
        let mut seq = mockall::Sequence::new();
        contract
            .expect_wait_for_transaction()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|h, _| Ok(receipt(h, 0)));
        contract
            .expect_wait_for_transaction()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ContractError::Transport("timeout".into())));
        contract
            .expect_wait_for_transaction()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|h, _| Ok(receipt(h, 1)));

        let submitter = BatchSubmitter::new(KIND, ops, Arc::new(contract), 1);
        assert!(!submitter.run_task().await.unwrap());
        assert_eq!(status_of(&db, 1), BatchStatus::Submitting);
        assert!(!submitter.run_task().await.unwrap());
        assert_eq!(status_of(&db, 1), BatchStatus::Submitting);
        assert!(submitter.run_task().await.unwrap());
        assert_eq!(status_of(&db, 1), BatchStatus::Finalized);
    }

    #[tokio::test]
    async fn test_submitting_batch_marked_final_once() {
        let submitting = BatchEntry {
            status: BatchStatus::Submitting,
            submission_tx_hash: Some(hash(0xcc)),
            ..BatchEntry::new_queued(7, KIND, vec![], hash(7))
        };
        let served = Arc::new(Mutex::new(false));

        let mut db = MockBatchDatabase::new();
        db.expect_get_next_batch_to_finalize().returning(|_| Ok(None));
        db.expect_get_next_batch_to_submit().returning({
            let served = served.clone();
            move |_| {
                let served = served.lock().unwrap();
                if *served {
                    Ok(None)
                } else {
                    Ok(Some(submitting.clone()))
                }
            }
        });
        db.expect_mark_final()
            .withf(|k, n, h| *k == KIND && *n == 7 && *h == hash(0xcc))
            .times(1)
            .returning(move |_, _, _| {
                *served.lock().unwrap() = true;
                Ok(())
            });
        db.expect_mark_submitting().never();

        let mut contract = MockBatchContract::new();
        contract.expect_append_batch().never();
        contract
            .expect_wait_for_transaction()
            .times(1)
            .returning(|h, _| Ok(receipt(h, 1)));

        let ops = Arc::new(Context::new(Arc::new(db)).into_ops(ThreadPool::new(1)));
        let submitter = BatchSubmitter::new(KIND, ops, Arc::new(contract), 1);

        assert!(submitter.run_task().await.unwrap());
        for _ in 0..3 {
            assert!(!submitter.run_task().await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_unexpected_status_is_fatal() {
        let finalized = BatchEntry {
            status: BatchStatus::Finalized,
            submission_tx_hash: Some(hash(1)),
            ..BatchEntry::new_queued(3, KIND, vec![], hash(3))
        };

        let mut db = MockBatchDatabase::new();
        db.expect_get_next_batch_to_finalize().returning(|_| Ok(None));
        db.expect_get_next_batch_to_submit()
            .returning(move |_| Ok(Some(finalized.clone())));

        let ops = Arc::new(Context::new(Arc::new(db)).into_ops(ThreadPool::new(1)));
        let submitter = BatchSubmitter::new(KIND, ops, Arc::new(MockBatchContract::new()), 1);

        let res = submitter.tick().await;
        assert!(matches!(
            res,
            Err(SubmitterError::UnexpectedBatchStatus {
                batch_number: 3,
                status: BatchStatus::Finalized,
                ..
            })
        ));
        assert!(submitter.run_task().await.is_err());
    }

    #[tokio::test]
    async fn test_finality_sweep() {
        let (db, ops) = stub_ops();
        queue_batch(&db, 1);

        let mut contract = MockBatchContract::new();
        contract
            .expect_append_batch()
            .returning(|_| Ok(hash(0xdd)));
        contract
            .expect_wait_for_transaction()
            .returning(|h, _| Ok(receipt(h, 1)));
        let mut seq = mockall::Sequence::new();
        contract
            .expect_confirmations()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(2));
        contract
            .expect_confirmations()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(6));

        let submitter = BatchSubmitter::new(KIND, ops, Arc::new(contract), 6);

        assert!(submitter.run_task().await.unwrap());
        assert_eq!(status_of(&db, 1), BatchStatus::Submitted);

        assert!(!submitter.run_task().await.unwrap());
        assert_eq!(status_of(&db, 1), BatchStatus::Submitted);

        assert!(submitter.run_task().await.unwrap());
        assert_eq!(status_of(&db, 1), BatchStatus::Finalized);
    }
}
