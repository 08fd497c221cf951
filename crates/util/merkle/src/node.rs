use borsh::{BorshDeserialize, BorshSerialize};

use crate::hasher::MerkleHash;

/// Hash used for padding nodes.
pub const SENTINEL_HASH: MerkleHash = [0; 32];

/// A tree node: a numeric bound plus a hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct MerkleNode {
    /// Cumulative end (sum tree) or start index (interval tree).
    pub bound: u64,
    pub hash: MerkleHash,
}

impl MerkleNode {
    pub fn new(bound: u64, hash: MerkleHash) -> Self {
        Self { bound, hash }
    }

    pub fn sentinel(bound: u64) -> Self {
        Self::new(bound, SENTINEL_HASH)
    }

    pub fn is_sentinel(&self) -> bool {
        self.hash == SENTINEL_HASH
    }
}

/// Sum tree leaf.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SumLeaf {
    /// Cumulative upper bound of this leaf.
    pub end: u64,
    pub data: Vec<u8>,
}

impl SumLeaf {
    pub fn new(end: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            end,
            data: data.into(),
        }
    }
}

/// Interval tree leaf covering `[start, end)`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct IntervalLeaf {
    pub start: u64,
    pub end: u64,
    pub data: Vec<u8>,
}

impl IntervalLeaf {
    pub fn new(start: u64, end: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            start,
            end,
            data: data.into(),
        }
    }

    /// Bytes hashed into the leaf node. The start is carried by the node bound,
    /// the end has to be committed here.
    pub(crate) fn hashed_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.data.len());
        buf.extend_from_slice(&self.end.to_be_bytes());
        buf.extend_from_slice(&self.data);
        buf
    }
}

/// Siblings from the leaf level up to (excluding) the root.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub siblings: Vec<MerkleNode>,
}

impl InclusionProof {
    pub fn new(leaf_index: u64, siblings: Vec<MerkleNode>) -> Self {
        Self {
            leaf_index,
            siblings,
        }
    }

    /// Whether `leaf_index` can be addressed by a path of this length.
    pub(crate) fn index_fits(&self) -> bool {
        u32::try_from(self.siblings.len())
            .ok()
            .and_then(|len| self.leaf_index.checked_shr(len))
            .map_or(true, |rest| rest == 0)
    }
}

/// The span a single leaf is proven to cover exclusively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImplicitRange {
    pub start: u64,
    pub end: u64,
}
