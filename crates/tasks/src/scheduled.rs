//! Periodic tasks with strictly serialized ticks.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tracing::*;

use crate::{manager::TaskExecutor, shutdown::ShutdownGuard};

/// Unit of periodic work.
#[async_trait]
pub trait ScheduledTask: Send + Sync + 'static {
    /// Runs one tick, returning whether it made progress.
    ///
    /// An error is fatal for the task and is surfaced to the task manager.
    /// Recoverable failures should be logged and reported as `Ok(false)`.
    async fn run_task(&self) -> anyhow::Result<bool>;
}

/// Runs `task` every `period` until shutdown. A tick never starts while the
/// previous one is still running, late ticks are delayed rather than burst.
pub async fn run_periodically<T: ScheduledTask + ?Sized>(
    name: &str,
    task: &T,
    period: Duration,
    shutdown: &ShutdownGuard,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.wait_for_shutdown() => break,
        }

        let progress = task.run_task().await?;
        trace!(%name, %progress, "scheduled tick done");
    }

    info!(%name, "scheduled task stopping");
    Ok(())
}

impl TaskExecutor {
    /// Spawns `task` as a critical periodic task.
    pub fn spawn_scheduled<T: ScheduledTask>(
        &self,
        name: &'static str,
        task: Arc<T>,
        period: Duration,
    ) -> tokio::task::JoinHandle<()> {
        self.spawn_critical_async_with_shutdown(name, move |shutdown| async move {
            run_periodically(name, task.as_ref(), period, &shutdown).await
        })
    }
}
