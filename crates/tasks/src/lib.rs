//! Supervision of the long running service tasks.
//!
//! Critical tasks that panic or return an error bring the whole service down
//! through [`TaskManager::monitor`]. Periodic work is expressed as a
//! [`ScheduledTask`].

mod manager;
mod scheduled;
mod shutdown;

pub use manager::{TaskError, TaskExecutor, TaskManager};
pub use scheduled::{run_periodically, ScheduledTask};
pub use shutdown::{ShutdownGuard, ShutdownSignal};
