//! In-memory implementations of the storage traits.

mod batch;
mod kv;

pub use batch::StubBatchDb;
pub use kv::StubKeyValueStore;
