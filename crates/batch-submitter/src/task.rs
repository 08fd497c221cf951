use std::{sync::Arc, time::Duration};

use oru_config::BatchSubmitterConfig;
use oru_primitives::batch::BatchKind;
use oru_tasks::TaskExecutor;
use tokio::task::JoinHandle;

use crate::submitter::BatchSubmitter;

fn task_name(kind: BatchKind) -> &'static str {
    match kind {
        BatchKind::Transactions => "tx_batch_submitter",
        BatchKind::StateRoots => "state_root_batch_submitter",
    }
}

/// Spawns the submitter as a critical task ticking every `poll_interval_ms`.
pub fn start_batch_submitter(
    executor: &TaskExecutor,
    submitter: Arc<BatchSubmitter>,
    config: &BatchSubmitterConfig,
) -> JoinHandle<()> {
    let name = task_name(submitter.kind());
    executor.spawn_scheduled(
        name,
        submitter,
        Duration::from_millis(config.poll_interval_ms),
    )
}
