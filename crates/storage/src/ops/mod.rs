pub mod batch;
pub mod pending_block;
pub mod watermark;
