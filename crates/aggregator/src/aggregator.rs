use std::sync::Arc;

use oru_primitives::tx::SignedTransaction;
use oru_storage::WatermarkOps;
use tokio::sync::Mutex;
use tracing::*;

use crate::{
    errors::{AggregatorError, AggregatorResult, SignatureError},
    queue::ResultQueue,
    traits::{BlockBuilder, SignatureVerifier, StateMachine},
};

/// Delivery state guarded by the drain lock.
#[derive(Debug, Default)]
struct DeliveryState {
    queue: ResultQueue,

    /// Next transaction number to deliver, `None` until init has run.
    watermark: Option<u64>,
}

/// Accepts signed transactions, applies them and forwards the results to the
/// block builder in transaction number order, each exactly once.
pub struct Aggregator {
    state_machine: Arc<dyn StateMachine>,
    block_builder: Arc<dyn BlockBuilder>,
    verifier: Arc<dyn SignatureVerifier>,
    watermark_ops: Arc<WatermarkOps>,
    delivery: Mutex<DeliveryState>,
}

impl Aggregator {
    pub fn new(
        state_machine: Arc<dyn StateMachine>,
        block_builder: Arc<dyn BlockBuilder>,
        verifier: Arc<dyn SignatureVerifier>,
        watermark_ops: Arc<WatermarkOps>,
    ) -> Self {
        Self {
            state_machine,
            block_builder,
            verifier,
            watermark_ops,
            delivery: Mutex::new(DeliveryState::default()),
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.delivery.lock().await.watermark.is_some()
    }

    /// Current delivery watermark, if initialized.
    pub async fn watermark(&self) -> Option<u64> {
        self.delivery.lock().await.watermark
    }

    /// Loads the persisted watermark and delivers every result the state
    /// machine produced but the block builder never received. Safe to call
    /// more than once.
    pub async fn init(&self) -> AggregatorResult<()> {
        let mut state = self.delivery.lock().await;

        let watermark = match state.watermark {
            Some(w) => w,
            None => self.watermark_ops.get_watermark_async().await?,
        };

        let results = self
            .state_machine
            .get_transaction_results_since(watermark.saturating_sub(1))
            .await
            .map_err(AggregatorError::StateMachine)?;

        info!(%watermark, recovered = results.len(), "initializing aggregator");
        for result in results {
            state.queue.push(result);
        }
        state.watermark = Some(watermark);

        self.drain(&mut state).await
    }

    /// Verifies, applies and enqueues one transaction, then delivers whatever
    /// has become deliverable.
    pub async fn handle_transaction(&self, tx: SignedTransaction) -> AggregatorResult<()> {
        if !self.is_initialized().await {
            return Err(AggregatorError::NotInitialized);
        }

        self.check_signature(&tx)?;

        let result = self
            .state_machine
            .apply_transaction(tx)
            .await
            .map_err(AggregatorError::StateMachine)?;
        debug!(txn = %result.transaction_number, "applied transaction");

        let mut state = self.delivery.lock().await;
        state.queue.push(result);
        self.drain(&mut state).await
    }

    fn check_signature(&self, tx: &SignedTransaction) -> Result<(), SignatureError> {
        let recovered = self
            .verifier
            .verify_message(&tx.body.encode(), &tx.signature)?;

        if &recovered != tx.sender() {
            warn!(declared = %tx.sender(), %recovered, "dropping transaction with bad signature");
            return Err(SignatureError::SignerMismatch {
                declared: *tx.sender(),
                recovered,
            });
        }

        Ok(())
    }

    /// Forwards queued results while the minimum matches the watermark.
    ///
    /// The watermark only moves after both the hand-off and the persist
    /// succeed. On failure the result goes back into the queue.
    async fn drain(&self, state: &mut DeliveryState) -> AggregatorResult<()> {
        let Some(mut watermark) = state.watermark else {
            return Err(AggregatorError::NotInitialized);
        };

        loop {
            let (next, dropped) = state.queue.pop_next(watermark);
            if dropped > 0 {
                debug!(%watermark, %dropped, "discarded already delivered results");
            }

            let Some(result) = next else {
                break;
            };

            let txn = result.transaction_number;
            if let Err(e) = self
                .block_builder
                .add_transaction_result(result.clone())
                .await
            {
                error!(%txn, err = %e, "block builder rejected result");
                state.queue.push(result);
                return Err(AggregatorError::BlockBuilder(e));
            }

            if let Err(e) = self.watermark_ops.put_watermark_async(txn + 1).await {
                error!(%txn, err = %e, "failed to persist watermark");
                state.queue.push(result);
                return Err(e.into());
            }

            watermark = txn + 1;
            state.watermark = Some(watermark);
            trace!(%txn, "delivered result");
        }

        if state.queue.len() > 0 {
            trace!(%watermark, waiting = state.queue.len(), "waiting for predecessor");
        }

        Ok(())
    }
}
