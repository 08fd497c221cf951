use std::fmt;

use oru_mpt::TrieError;
use oru_primitives::{buf::Buf32, errors::ContractError, tx::Address};
use thiserror::Error;

/// Stage of the dispute pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvePhase {
    Setup,
    WitnessPublication,
    Execution,
    RootConvergence,
    Completion,
}

impl fmt::Display for ProvePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProvePhase::Setup => "setup",
            ProvePhase::WitnessPublication => "witness publication",
            ProvePhase::Execution => "execution",
            ProvePhase::RootConvergence => "root convergence",
            ProvePhase::Completion => "completion",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum ProverError {
    #[error("{phase}: {source}")]
    Contract {
        phase: ProvePhase,
        #[source]
        source: ContractError,
    },

    #[error("no transitioner registered for transition {0} after init")]
    TransitionerMissing(u64),

    #[error("no witness for storage slot {key} of {contract}")]
    MissingSlotWitness { contract: Address, key: Buf32 },

    #[error("no witness for contract {0}")]
    MissingContractWitness(Address),

    #[error("witness trie: {0}")]
    Trie(#[from] TrieError),

    #[error("{counter} did not decrease (still {remaining})")]
    StalledCounter {
        counter: &'static str,
        remaining: u64,
    },
}

impl ProverError {
    pub fn phase(&self) -> ProvePhase {
        match self {
            ProverError::Contract { phase, .. } => *phase,
            ProverError::TransitionerMissing(_) => ProvePhase::Setup,
            ProverError::MissingSlotWitness { .. }
            | ProverError::MissingContractWitness(_)
            | ProverError::Trie(_)
            | ProverError::StalledCounter { .. } => ProvePhase::RootConvergence,
        }
    }
}

/// Attaches the phase to a failed contract call.
pub(crate) fn at(phase: ProvePhase) -> impl FnOnce(ContractError) -> ProverError {
    move |source| ProverError::Contract { phase, source }
}
