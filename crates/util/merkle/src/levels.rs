//! Level-by-level construction shared by both tree flavours.

use crate::error::MerkleError;
use crate::hasher::MerkleHasher;
use crate::node::{InclusionProof, MerkleNode};

/// How a tree flavour pads and combines nodes.
pub(crate) trait PairRule {
    /// Padding node placed to the right of an odd trailing `left`.
    fn sentinel(left: &MerkleNode) -> MerkleNode;

    /// Bound carried by the parent of `left` and `right`.
    fn parent_bound(left: &MerkleNode, right: &MerkleNode) -> u64;
}

pub(crate) fn parent<R: PairRule, H: MerkleHasher>(left: &MerkleNode, right: &MerkleNode) -> MerkleNode {
    MerkleNode::new(R::parent_bound(left, right), H::hash_node(left, right))
}

/// Builds every level bottom-up, the last level holds the root. Padding
/// sentinels are not stored.
pub(crate) fn build_levels<R: PairRule, H: MerkleHasher>(leaves: Vec<MerkleNode>) -> Vec<Vec<MerkleNode>> {
    let mut levels = vec![leaves];

    while let Some(cur) = levels.last().filter(|l| l.len() > 1) {
        let next: Vec<_> = cur
            .chunks(2)
            .map(|pair| {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or_else(|| R::sentinel(&left));
                parent::<R, H>(&left, &right)
            })
            .collect();
        levels.push(next);
    }

    levels
}

pub(crate) fn root(levels: &[Vec<MerkleNode>]) -> Option<&MerkleNode> {
    levels.last().and_then(|l| l.first())
}

pub(crate) fn inclusion_proof<R: PairRule>(
    levels: &[Vec<MerkleNode>],
    index: usize,
) -> Result<InclusionProof, MerkleError> {
    let len = levels.first().map_or(0, Vec::len);
    if len == 0 {
        return Err(MerkleError::EmptyTree);
    }
    if index >= len {
        return Err(MerkleError::IndexOutOfBounds {
            index: index as u64,
            len,
        });
    }

    let mut siblings = Vec::with_capacity(levels.len() - 1);
    let mut idx = index;
    for level in &levels[..levels.len() - 1] {
        let sibling = level
            .get(idx ^ 1)
            .copied()
            .unwrap_or_else(|| R::sentinel(&level[idx]));
        siblings.push(sibling);
        idx >>= 1;
    }

    Ok(InclusionProof::new(index as u64, siblings))
}
