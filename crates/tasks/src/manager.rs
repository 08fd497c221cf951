use std::{
    any::Any,
    future::Future,
    panic,
    pin::pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use futures_util::{future::select, FutureExt};
use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, error, info, warn};

use crate::shutdown::{Shutdown, ShutdownGuard, ShutdownSignal};

/// Why a critical task stopped the service.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("critical task `{task_name}` panicked: `{}`", .reason.as_deref().unwrap_or("<unknown>"))]
    Panicked {
        task_name: String,
        reason: Option<String>,
    },

    #[error("critical task `{task_name}` failed: {error:#}")]
    Failed {
        task_name: String,
        error: anyhow::Error,
    },
}

impl TaskError {
    fn panicked(task_name: &str, error: Box<dyn Any + Send>) -> Self {
        let reason = match error.downcast::<String>() {
            Ok(value) => Some(*value),
            Err(error) => match error.downcast::<&str>() {
                Ok(value) => Some(value.to_string()),
                Err(_) => None,
            },
        };

        Self::Panicked {
            task_name: task_name.to_string(),
            reason,
        }
    }

    fn failed(task_name: &str, error: anyhow::Error) -> Self {
        Self::Failed {
            task_name: task_name.to_string(),
            error,
        }
    }

    pub fn task_name(&self) -> &str {
        match self {
            TaskError::Panicked { task_name, .. } | TaskError::Failed { task_name, .. } => task_name,
        }
    }
}

/// [`TaskManager`] spawns and tracks long running tasks, watches for task
/// failures and manages graceful shutdown on critical task failures and
/// external signals.
pub struct TaskManager {
    /// Tokio's runtime [`Handle`].
    tokio_handle: Handle,
    /// Sender half for reporting failures from tasks
    failed_tasks_tx: mpsc::UnboundedSender<TaskError>,
    /// Receiver half for reporting failures from tasks
    failed_tasks_rx: mpsc::UnboundedReceiver<TaskError>,
    /// send shutdown signals to tasks
    shutdown_signal: ShutdownSignal,
    /// pending tasks count
    pending_tasks_counter: Arc<AtomicUsize>,
}

impl TaskManager {
    pub fn new(tokio_handle: Handle) -> Self {
        let (failed_tasks_tx, failed_tasks_rx) = mpsc::unbounded_channel();

        Self {
            tokio_handle,
            failed_tasks_tx,
            failed_tasks_rx,
            shutdown_signal: ShutdownSignal::new(),
            pending_tasks_counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn executor(&self) -> TaskExecutor {
        TaskExecutor {
            tokio_handle: self.tokio_handle.clone(),
            failed_tasks_tx: self.failed_tasks_tx.clone(),
            shutdown_signal: self.shutdown_signal.clone(),
            pending_tasks_counter: self.pending_tasks_counter.clone(),
        }
    }

    /// Get shutdown signal trigger
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown_signal.clone()
    }

    /// Waits until any task fails, returning `Err(first_failure)`.
    /// Returns `Ok(())` if a shutdown is signalled instead.
    fn wait_for_task_failure(&mut self, shutdown: Shutdown) -> Result<(), TaskError> {
        self.tokio_handle.block_on(async {
            tokio::select! {
                msg = self.failed_tasks_rx.recv() => {
                    match msg {
                        Some(error) => Err(error),
                        None => Ok(())
                    }
                }
                _ = shutdown.wait_for_shutdown() => {
                    Ok(())
                }
            }
        })
    }

    /// Wait for all tasks to drop their shutdown guards, returning true.
    /// Returns false if `timeout` elapses first.
    fn wait_for_graceful_shutdown(&self, timeout: Option<Duration>) -> bool {
        let when = timeout.map(|t| Instant::now() + t);
        while self.pending_tasks_counter.load(Ordering::Relaxed) > 0 {
            if when.is_some_and(|when| Instant::now() > when) {
                debug!("graceful shutdown timed out");
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        debug!("gracefully shut down");
        true
    }

    /// Add signal listeners and send shutdown
    pub fn start_signal_listeners(&self) {
        let shutdown_signal = self.shutdown_signal();

        self.tokio_handle.spawn(async move {
            let _ = tokio::signal::ctrl_c().await;

            warn!("Got INT. Initiating shutdown");
            shutdown_signal.send()
        });
    }

    /// Blocks until a critical task fails or shutdown is signalled, then shuts
    /// every task down. Must not be called from within the runtime.
    pub fn monitor(mut self, shutdown_timeout: Option<Duration>) -> Result<(), TaskError> {
        let res = self.wait_for_task_failure(self.shutdown_signal.subscribe());

        self.shutdown_signal.send();
        let shutdown_in_time = self.wait_for_graceful_shutdown(shutdown_timeout);

        if !shutdown_in_time {
            info!("Shutdown timeout expired; Forced shutdown");
        }

        res
    }
}

/// A type that can spawn new tasks
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    /// Handle to the tokio runtime.
    tokio_handle: Handle,
    /// Sender half for reporting failures from tasks
    failed_tasks_tx: mpsc::UnboundedSender<TaskError>,
    /// send shutdown signals to tasks
    shutdown_signal: ShutdownSignal,
    /// number of pending tasks
    pending_tasks_counter: Arc<AtomicUsize>,
}

impl TaskExecutor {
    fn report(&self, name: &'static str) -> impl Fn(TaskError) + Send + 'static {
        let failed_tasks_tx = self.failed_tasks_tx.clone();
        move |task_error| {
            error!(task = %name, "{task_error}");
            let _ = failed_tasks_tx.send(task_error);
        }
    }

    fn guard(&self) -> ShutdownGuard {
        ShutdownGuard::new(
            self.shutdown_signal.subscribe(),
            self.pending_tasks_counter.clone(),
        )
    }

    /// Runs a blocking critical task on its own thread.
    pub fn spawn_critical<F>(&self, name: &'static str, func: F) -> JoinHandle<()>
    where
        F: FnOnce(ShutdownGuard) -> anyhow::Result<()> + Send + 'static,
    {
        let report = self.report(name);
        let shutdown = self.guard();
        std::thread::spawn(move || {
            match panic::catch_unwind(panic::AssertUnwindSafe(|| func(shutdown))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => report(TaskError::failed(name, error)),
                Err(error) => report(TaskError::panicked(name, error)),
            }
        })
    }

    /// Runs a critical future that is dropped as soon as shutdown is signalled.
    pub fn spawn_critical_async(
        &self,
        name: &'static str,
        fut: impl Future<Output = anyhow::Result<()>> + Send + 'static,
    ) -> tokio::task::JoinHandle<()> {
        let report = self.report(name);
        let shutdown = self.shutdown_signal.subscribe();

        let task = catch_failures(name, fut, report);

        let task = async move {
            let task = pin!(task);
            let shutdown = pin!(shutdown.wait_for_shutdown());
            let _ = select(shutdown, task).await;
        };
        self.tokio_handle.spawn(task)
    }

    /// Runs a critical future that is handed a [`ShutdownGuard`] and is
    /// expected to wind down on its own.
    pub fn spawn_critical_async_with_shutdown<F>(
        &self,
        name: &'static str,
        async_func: impl FnOnce(ShutdownGuard) -> F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let report = self.report(name);
        let fut = async_func(self.guard());
        self.tokio_handle.spawn(catch_failures(name, fut, report))
    }
}

async fn catch_failures(
    name: &'static str,
    fut: impl Future<Output = anyhow::Result<()>> + Send + 'static,
    report: impl Fn(TaskError) + Send + 'static,
) {
    match panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => report(TaskError::failed(name, error)),
        Err(error) => report(TaskError::panicked(name, error)),
    }
}
