//! Orders concurrently applied transactions and hands them to the block
//! builder strictly by transaction number.

mod aggregator;
pub mod block_builder;
pub mod errors;
mod queue;
pub mod traits;
pub mod verifier;

pub use aggregator::Aggregator;
pub use block_builder::{BlockFlushTask, DefaultBlockBuilder};
pub use errors::{AggregatorError, AggregatorResult, SignatureError};
pub use traits::{BlockBuilder, SignatureVerifier, StateMachine};
pub use verifier::{default_signature_verifier, Secp256k1Verifier};
