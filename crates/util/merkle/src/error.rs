use thiserror::Error;

/// Reasons a tree could not be built or a proof was rejected.
///
/// Any of these on the verification path means "proof rejected".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("tree has no leaves")]
    EmptyTree,

    #[error("leaf index {index} out of bounds (tree has {len} leaves)")]
    IndexOutOfBounds { index: u64, len: usize },

    #[error("proof of length {len} cannot address leaf index {index}")]
    InvalidProofLength { index: u64, len: usize },

    #[error("proof invalid: computed root does not match")]
    RootMismatch,

    #[error("proof invalid: sum bounds not monotonic ({left} > {right})")]
    MonotonicityViolation { left: u64, right: u64 },

    #[error("leaves overlap (leaf {first} and leaf {second})")]
    LeavesOverlap { first: usize, second: usize },

    #[error("potential intersection detected ({bound} exceeds {limit})")]
    PotentialIntersection { bound: u64, limit: u64 },

    #[error("invalid interval [{start}, {end})")]
    InvalidInterval { start: u64, end: u64 },
}
