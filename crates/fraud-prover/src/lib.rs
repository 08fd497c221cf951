//! Drives a single fraud proof dispute through the settlement chain's
//! dispute contracts.
//!
//! All dispute state lives on chain. The prover sequences calls and rebuilds
//! partial tries from the witnesses it published, so it can prove each
//! update the state manager asks for against the current roots.

mod cache;
pub mod context;
pub mod contracts;
pub mod errors;
mod prover;

pub use cache::WitnessCache;
pub use context::DisputeContext;
pub use contracts::{
    ContractResolver, FraudVerifier, StateManager, StateTransitioner, UpdatedContract,
    UpdatedStorageSlot,
};
pub use errors::{ProvePhase, ProverError};
pub use prover::{FraudProver, ProofOutcome};
