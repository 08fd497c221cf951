use std::{sync::Arc, time::Duration};

use oru_aggregator::{
    default_signature_verifier, Aggregator, BlockFlushTask, DefaultBlockBuilder, SignatureVerifier,
    StateMachine,
};
use oru_batch_submitter::{start_batch_submitter, BatchContract, BatchSubmitter};
use oru_config::Config;
use oru_db::traits::{BatchDatabase, KeyValueStore};
use oru_fraud_prover::{ContractResolver, FraudProver, FraudVerifier};
use oru_primitives::batch::BatchKind;
use oru_storage::{
    ops::{batch, pending_block, watermark},
    BatchDataOps,
};
use oru_tasks::TaskExecutor;
use threadpool::ThreadPool;
use tracing::*;

/// External collaborators the node is built around.
pub struct Collaborators<K, B> {
    pub kv_store: Arc<K>,
    pub batch_db: Arc<B>,
    pub state_machine: Arc<dyn StateMachine>,
    pub tx_batch_contract: Arc<dyn BatchContract>,
    pub state_root_batch_contract: Arc<dyn BatchContract>,
    /// Uses [`default_signature_verifier`] if unset.
    pub signature_verifier: Option<Arc<dyn SignatureVerifier>>,
}

/// Services wired once at startup.
pub struct AppContext {
    config: Config,
    aggregator: Arc<Aggregator>,
    block_builder: Arc<DefaultBlockBuilder>,
    batch_ops: Arc<BatchDataOps>,
    tx_submitter: Arc<BatchSubmitter>,
    state_root_submitter: Arc<BatchSubmitter>,
}

impl AppContext {
    pub async fn build<K, B>(config: Config, deps: Collaborators<K, B>) -> anyhow::Result<Self>
    where
        K: KeyValueStore + Sync + Send + 'static,
        B: BatchDatabase + Sync + Send + 'static,
    {
        let pool = ThreadPool::with_name("oru-db".into(), config.storage.thread_pool_size);

        let watermark_ops =
            Arc::new(watermark::Context::new(deps.kv_store.clone()).into_ops(pool.clone()));
        let pending_ops =
            Arc::new(pending_block::Context::new(deps.kv_store).into_ops(pool.clone()));
        let batch_ops = Arc::new(batch::Context::new(deps.batch_db).into_ops(pool));

        let block_builder = Arc::new(
            DefaultBlockBuilder::load(pending_ops, batch_ops.clone(), &config.aggregator).await?,
        );

        let verifier = deps
            .signature_verifier
            .unwrap_or_else(default_signature_verifier);
        let aggregator = Arc::new(Aggregator::new(
            deps.state_machine,
            block_builder.clone(),
            verifier,
            watermark_ops,
        ));

        let finality = config.batch_submitter.finality_confirmations;
        let tx_submitter = Arc::new(BatchSubmitter::new(
            BatchKind::Transactions,
            batch_ops.clone(),
            deps.tx_batch_contract,
            finality,
        ));
        let state_root_submitter = Arc::new(BatchSubmitter::new(
            BatchKind::StateRoots,
            batch_ops.clone(),
            deps.state_root_batch_contract,
            finality,
        ));

        Ok(Self {
            config,
            aggregator,
            block_builder,
            batch_ops,
            tx_submitter,
            state_root_submitter,
        })
    }

    /// Recovers the aggregator, then starts the periodic tasks. Transactions
    /// can be handed to the aggregator once this returns.
    pub async fn start(&self, executor: &TaskExecutor) -> anyhow::Result<()> {
        self.aggregator.init().await?;
        info!("aggregator initialized");

        executor.spawn_scheduled(
            "block_flush",
            Arc::new(BlockFlushTask::new(self.block_builder.clone())),
            Duration::from_millis(self.config.aggregator.block_flush_poll_ms),
        );
        start_batch_submitter(executor, self.tx_submitter.clone(), &self.config.batch_submitter);
        start_batch_submitter(
            executor,
            self.state_root_submitter.clone(),
            &self.config.batch_submitter,
        );

        info!("started rollup services");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    pub fn block_builder(&self) -> &Arc<DefaultBlockBuilder> {
        &self.block_builder
    }

    pub fn batch_ops(&self) -> &Arc<BatchDataOps> {
        &self.batch_ops
    }

    /// Builds a prover for disputes against the given verifier contract.
    ///
    /// The prover holds no node state, so it can be built before or
    /// without an [`AppContext`].
    pub fn fraud_prover(
        verifier: Arc<dyn FraudVerifier>,
        resolver: Arc<dyn ContractResolver>,
    ) -> FraudProver {
        FraudProver::new(verifier, resolver)
    }
}
