//! Publishes queued batches to the settlement chain and tracks them until
//! they are final.

pub mod contract;
pub mod errors;
mod submitter;
mod task;

pub use contract::{BatchContract, TxReceipt};
pub use errors::SubmitterError;
pub use submitter::BatchSubmitter;
pub use task::start_batch_submitter;
