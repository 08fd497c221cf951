//! Async access to the rollup's storage traits.
//!
//! Every database call runs on a dedicated thread pool so the blocking
//! storage engine never stalls the async runtime.

mod exec;
pub mod ops;

pub use ops::batch::BatchDataOps;
pub use ops::pending_block::PendingBlockOps;
pub use ops::watermark::WatermarkOps;
