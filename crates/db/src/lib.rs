//! Storage interfaces for the rollup services.
//!
//! The storage engine itself is provided by the embedder. This crate only
//! defines the blocking traits the services are written against, plus
//! in-memory stubs for tests and small deployments.

pub mod errors;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "stubs"))]
pub mod stubs;

/// Wrapper result type for database operations.
pub type DbResult<T> = Result<T, errors::DbError>;

pub use errors::DbError;
