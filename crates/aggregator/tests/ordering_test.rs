use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use oru_aggregator::{
    default_signature_verifier, Aggregator, AggregatorError, BlockBuilder, DefaultBlockBuilder,
    StateMachine,
};
use oru_config::AggregatorConfig;
use oru_db::{
    stubs::{StubBatchDb, StubKeyValueStore},
    traits::KeyValueStore,
    types::StoreKey,
    DbError, DbResult,
};
use oru_primitives::{
    batch::BatchKind,
    tx::{Address, SignedTransaction, TransactionResult},
};
use oru_storage::{
    ops::{batch, pending_block, watermark::Context},
    WatermarkOps,
};
use oru_test_utils::tx::{make_result, TestAccount};
use rand::seq::SliceRandom;
use threadpool::ThreadPool;
use tokio::sync::{oneshot, Mutex};

/// State machine numbering transactions by nonce. A transaction whose number
/// has a gate registered only completes once the gate is released.
#[derive(Default)]
struct GatedStateMachine {
    gates: Mutex<HashMap<u64, oneshot::Receiver<()>>>,
    applied: Mutex<Vec<TransactionResult>>,
}

impl GatedStateMachine {
    async fn gate(&self, txn: u64) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(txn, rx);
        tx
    }
}

#[async_trait]
impl StateMachine for GatedStateMachine {
    async fn apply_transaction(&self, tx: SignedTransaction) -> anyhow::Result<TransactionResult> {
        let txn = tx.body.nonce;
        let gate = self.gates.lock().await.remove(&txn);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let result = make_result(txn, tx);
        self.applied.lock().await.push(result.clone());
        Ok(result)
    }

    async fn get_transaction_results_since(
        &self,
        transaction_number: u64,
    ) -> anyhow::Result<Vec<TransactionResult>> {
        Ok(self
            .applied
            .lock()
            .await
            .iter()
            .filter(|r| r.transaction_number >= transaction_number)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct RecordingBuilder {
    delivered: Mutex<Vec<u64>>,
}

#[async_trait]
impl BlockBuilder for RecordingBuilder {
    async fn add_transaction_result(&self, result: TransactionResult) -> anyhow::Result<()> {
        self.delivered.lock().await.push(result.transaction_number);
        Ok(())
    }
}

fn watermark_ops(db: Arc<StubKeyValueStore>) -> Arc<WatermarkOps> {
    Arc::new(Context::new(db).into_ops(ThreadPool::new(2)))
}

async fn setup(
    db: Arc<StubKeyValueStore>,
    sm: Arc<GatedStateMachine>,
) -> (Arc<Aggregator>, Arc<RecordingBuilder>) {
    let builder = Arc::new(RecordingBuilder::default());
    let agg = Aggregator::new(
        sm,
        builder.clone(),
        default_signature_verifier(),
        watermark_ops(db),
    );
    agg.init().await.unwrap();
    (Arc::new(agg), builder)
}

#[tokio::test]
async fn test_later_result_waits_for_predecessor() {
    let acct = TestAccount::random();
    let sm = Arc::new(GatedStateMachine::default());
    let (agg, builder) = setup(Arc::new(StubKeyValueStore::new()), sm.clone()).await;

    let release_a = sm.gate(1).await;
    let tx_a = acct.sign(1, Address::zero(), vec![0xa]);
    let tx_b = acct.sign(2, Address::zero(), vec![0xb]);

    let handle_a = tokio::spawn({
        let agg = agg.clone();
        async move { agg.handle_transaction(tx_a).await }
    });

    // B is applied and queued but must not be delivered ahead of A.
    agg.handle_transaction(tx_b).await.unwrap();
    assert!(builder.delivered.lock().await.is_empty());

    release_a.send(()).unwrap();
    handle_a.await.unwrap().unwrap();

    assert_eq!(*builder.delivered.lock().await, vec![1, 2]);
    assert_eq!(agg.watermark().await, Some(3));
}

#[tokio::test]
async fn test_any_completion_order_delivers_ascending() {
    const N: u64 = 8;

    let acct = TestAccount::random();
    let sm = Arc::new(GatedStateMachine::default());
    let (agg, builder) = setup(Arc::new(StubKeyValueStore::new()), sm.clone()).await;

    let mut gates = Vec::new();
    for txn in 1..=N {
        gates.push(sm.gate(txn).await);
    }

    let mut handles = Vec::new();
    for txn in 1..=N {
        let agg = agg.clone();
        let tx = acct.sign(txn, Address::zero(), vec![]);
        handles.push(tokio::spawn(async move { agg.handle_transaction(tx).await }));
    }

    gates.shuffle(&mut rand::thread_rng());
    for gate in gates {
        gate.send(()).unwrap();
        tokio::task::yield_now().await;
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(*builder.delivered.lock().await, (1..=N).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_restart_never_redelivers_below_watermark() {
    let acct = TestAccount::random();
    let db = Arc::new(StubKeyValueStore::new());
    let sm = Arc::new(GatedStateMachine::default());

    {
        let (agg, builder) = setup(db.clone(), sm.clone()).await;
        for txn in 1..=3 {
            agg.handle_transaction(acct.sign(txn, Address::zero(), vec![]))
                .await
                .unwrap();
        }
        assert_eq!(*builder.delivered.lock().await, vec![1, 2, 3]);
    }

    // Restart on the same store with the same state machine history.
    let (agg, builder) = setup(db, sm).await;
    assert!(builder.delivered.lock().await.is_empty());
    assert_eq!(agg.watermark().await, Some(4));

    agg.handle_transaction(acct.sign(4, Address::zero(), vec![]))
        .await
        .unwrap();
    assert_eq!(*builder.delivered.lock().await, vec![4]);
}

/// Store that fails the `fail_at`-th watermark write (counting from 1).
struct FlakyWatermarkStore {
    inner: StubKeyValueStore,
    watermark_puts: AtomicUsize,
    fail_at: usize,
}

impl KeyValueStore for FlakyWatermarkStore {
    fn get(&self, key: StoreKey) -> DbResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: StoreKey, value: Vec<u8>) -> DbResult<()> {
        if key == StoreKey::Watermark
            && self.watermark_puts.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_at
        {
            return Err(DbError::Other("write failed".into()));
        }
        self.inner.put(key, value)
    }
}

#[tokio::test]
async fn test_watermark_failure_after_seal_batches_once() {
    let acct = TestAccount::random();
    let pool = ThreadPool::new(2);
    let store = Arc::new(FlakyWatermarkStore {
        inner: StubKeyValueStore::new(),
        watermark_puts: AtomicUsize::new(0),
        fail_at: 2,
    });
    let batch_ops = Arc::new(
        batch::Context::new(Arc::new(StubBatchDb::new())).into_ops(pool.clone()),
    );
    let pending_ops = Arc::new(pending_block::Context::new(store.clone()).into_ops(pool.clone()));
    let config = AggregatorConfig {
        max_transactions_per_block: 2,
        max_block_delay_ms: 60_000,
        ..Default::default()
    };
    let builder = DefaultBlockBuilder::load(pending_ops, batch_ops.clone(), &config)
        .await
        .unwrap();

    let agg = Aggregator::new(
        Arc::new(GatedStateMachine::default()),
        Arc::new(builder),
        default_signature_verifier(),
        Arc::new(Context::new(store).into_ops(pool)),
    );
    agg.init().await.unwrap();

    let txs: Vec<_> = (1..=4)
        .map(|n| acct.sign(n, Address::zero(), vec![n as u8]))
        .collect();

    agg.handle_transaction(txs[0].clone()).await.unwrap();
    // Seals block 1, then the watermark write for it fails.
    let res = agg.handle_transaction(txs[1].clone()).await;
    assert!(matches!(res, Err(AggregatorError::Db(_))));
    assert_eq!(agg.watermark().await, Some(2));

    // Result 2 is handed over again ahead of 3.
    agg.handle_transaction(txs[2].clone()).await.unwrap();
    agg.handle_transaction(txs[3].clone()).await.unwrap();
    assert_eq!(agg.watermark().await, Some(5));

    let mut batched = Vec::new();
    for n in 1..=2 {
        let batch = batch_ops
            .get_batch_async(BatchKind::Transactions, n)
            .await
            .unwrap()
            .expect("batch enqueued");
        batched.extend(batch.elements);
    }
    assert!(batch_ops
        .get_batch_async(BatchKind::Transactions, 3)
        .await
        .unwrap()
        .is_none());

    let expected: Vec<_> = txs.iter().map(|tx| borsh::to_vec(tx).unwrap()).collect();
    assert_eq!(batched, expected);
}
