//! Merkle sum trees and Merkle interval trees.
//!
//! Both trees pair nodes left to right and pad an odd trailing node with a
//! sentinel. Every node carries a numeric bound next to its hash: the
//! cumulative end for sum trees, the start index for interval trees.
//! Verification is a pure function of the leaf, the proof and the root, and
//! returns the range the leaf is proven to cover exclusively.

pub mod error;
pub mod hasher;
pub mod interval_tree;
mod levels;
pub mod node;
pub mod sum_tree;

pub use error::MerkleError;
pub use hasher::{MerkleHash, MerkleHasher};
pub use interval_tree::IntervalTree;
pub use node::{ImplicitRange, InclusionProof, IntervalLeaf, MerkleNode, SumLeaf, SENTINEL_HASH};
pub use sum_tree::SumTree;
