use std::marker::PhantomData;

use sha2::Sha256;

use crate::error::MerkleError;
use crate::hasher::MerkleHasher;
use crate::levels::{self, PairRule};
use crate::node::{ImplicitRange, InclusionProof, MerkleNode, SumLeaf};

struct SumRule;

impl PairRule for SumRule {
    fn sentinel(left: &MerkleNode) -> MerkleNode {
        MerkleNode::sentinel(left.bound)
    }

    fn parent_bound(_left: &MerkleNode, right: &MerkleNode) -> u64 {
        right.bound
    }
}

/// Merkle sum tree over leaves with cumulative ends.
///
/// Construction does not check that ends are non-decreasing, a tree built
/// from unordered leaves produces proofs that fail verification.
#[derive(Clone, Debug)]
pub struct SumTree<H: MerkleHasher = Sha256> {
    levels: Vec<Vec<MerkleNode>>,
    max_end: u64,
    _hasher: PhantomData<H>,
}

impl<H: MerkleHasher> SumTree<H> {
    pub fn build(leaves: &[SumLeaf]) -> Self {
        Self::build_with_max_end(leaves, u64::MAX)
    }

    /// Builds a tree whose last leaf implicitly extends to `max_end`.
    pub fn build_with_max_end(leaves: &[SumLeaf], max_end: u64) -> Self {
        let nodes = leaves
            .iter()
            .map(|l| MerkleNode::new(l.end, H::hash_leaf(&l.data)))
            .collect();

        Self {
            levels: levels::build_levels::<SumRule, H>(nodes),
            max_end,
            _hasher: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_end(&self) -> u64 {
        self.max_end
    }

    /// Root node, `None` for an empty tree.
    pub fn root(&self) -> Option<&MerkleNode> {
        levels::root(&self.levels)
    }

    pub fn get_inclusion_proof(&self, index: usize) -> Result<InclusionProof, MerkleError> {
        levels::inclusion_proof::<SumRule>(&self.levels, index)
    }

    /// Verifies a proof against this tree's root and maximum.
    pub fn verify_leaf(&self, leaf: &SumLeaf, proof: &InclusionProof) -> Result<ImplicitRange, MerkleError> {
        Self::verify(leaf, proof, self.root(), self.max_end)
    }

    /// Checks that `leaf` sits at `proof.leaf_index` under `root` and returns
    /// the range it covers exclusively.
    ///
    /// Along the path the first left sibling's end becomes the implicit start
    /// and no later left sibling may exceed it. Every pair must satisfy
    /// `left.end <= right.end`.
    pub fn verify(
        leaf: &SumLeaf,
        proof: &InclusionProof,
        root: Option<&MerkleNode>,
        max_end: u64,
    ) -> Result<ImplicitRange, MerkleError> {
        let root = root.ok_or(MerkleError::EmptyTree)?;
        if !proof.index_fits() {
            return Err(MerkleError::InvalidProofLength {
                index: proof.leaf_index,
                len: proof.siblings.len(),
            });
        }

        let mut node = MerkleNode::new(leaf.end, H::hash_leaf(&leaf.data));
        let mut path = proof.leaf_index;
        let mut first_left_end: Option<u64> = None;
        // Stays set while every right sibling is padding, i.e. for the last leaf.
        let mut is_last = true;

        for sibling in &proof.siblings {
            let (left, right) = if path & 1 == 0 {
                if !sibling.is_sentinel() {
                    is_last = false;
                }
                (node, *sibling)
            } else {
                match first_left_end {
                    None => first_left_end = Some(sibling.bound),
                    Some(first) if sibling.bound > first => {
                        return Err(MerkleError::MonotonicityViolation {
                            left: sibling.bound,
                            right: first,
                        });
                    }
                    Some(_) => {}
                }
                (*sibling, node)
            };

            if left.bound > right.bound {
                return Err(MerkleError::MonotonicityViolation {
                    left: left.bound,
                    right: right.bound,
                });
            }

            node = levels::parent::<SumRule, H>(&left, &right);
            path >>= 1;
        }

        if node != *root {
            return Err(MerkleError::RootMismatch);
        }

        if proof.siblings.is_empty() {
            return Ok(ImplicitRange {
                start: 0,
                end: leaf.end,
            });
        }

        let start = first_left_end.unwrap_or(0);
        let end = if is_last {
            if max_end < leaf.end {
                return Err(MerkleError::MonotonicityViolation {
                    left: leaf.end,
                    right: max_end,
                });
            }
            max_end
        } else {
            leaf.end
        };

        Ok(ImplicitRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(ends: &[u64]) -> Vec<SumLeaf> {
        ends.iter()
            .map(|e| SumLeaf::new(*e, format!("leaf-{e}").into_bytes()))
            .collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree: SumTree = SumTree::build(&[]);
        assert!(tree.root().is_none());
        assert_eq!(tree.get_inclusion_proof(0), Err(MerkleError::EmptyTree));

        let proof = InclusionProof::new(0, vec![]);
        let res = tree.verify_leaf(&SumLeaf::new(1, b"x".to_vec()), &proof);
        assert_eq!(res, Err(MerkleError::EmptyTree));
    }

    #[test]
    fn test_root_end_is_last_end() {
        let tree: SumTree = SumTree::build(&leaves(&[3, 7, 9]));
        assert_eq!(tree.root().unwrap().bound, 9);
    }

    #[test]
    fn test_odd_level_padded_with_sentinel() {
        let tree: SumTree = SumTree::build(&leaves(&[3, 7, 9]));
        let proof = tree.get_inclusion_proof(2).unwrap();
        assert_eq!(proof.siblings.len(), 2);
        assert!(proof.siblings[0].is_sentinel());
        assert_eq!(proof.siblings[0].bound, 9);
    }

    #[test]
    fn test_middle_leaf_range() {
        let ls = leaves(&[3, 7, 9, 15]);
        let tree: SumTree = SumTree::build(&ls);
        let proof = tree.get_inclusion_proof(2).unwrap();
        let range = tree.verify_leaf(&ls[2], &proof).unwrap();
        assert_eq!(range, ImplicitRange { start: 7, end: 9 });
    }

    #[test]
    fn test_last_leaf_extends_to_max() {
        let ls = leaves(&[3, 7, 9]);
        let tree: SumTree = SumTree::build_with_max_end(&ls, 100);
        let proof = tree.get_inclusion_proof(2).unwrap();
        let range = tree.verify_leaf(&ls[2], &proof).unwrap();
        assert_eq!(range, ImplicitRange { start: 7, end: 100 });
    }

    #[test]
    fn test_leaf_is_not_mutated() {
        let ls = leaves(&[3, 7]);
        let tree: SumTree = SumTree::build(&ls);
        let leaf = ls[0].clone();
        let proof = tree.get_inclusion_proof(0).unwrap();
        tree.verify_leaf(&leaf, &proof).unwrap();
        tree.verify_leaf(&leaf, &proof).unwrap();
        assert_eq!(leaf, ls[0]);
    }
}
