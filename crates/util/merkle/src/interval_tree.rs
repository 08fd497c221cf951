use std::marker::PhantomData;

use sha2::Sha256;

use crate::error::MerkleError;
use crate::hasher::MerkleHasher;
use crate::levels::{self, PairRule};
use crate::node::{ImplicitRange, InclusionProof, IntervalLeaf, MerkleNode};

struct IntervalRule;

impl PairRule for IntervalRule {
    fn sentinel(_left: &MerkleNode) -> MerkleNode {
        MerkleNode::sentinel(u64::MAX)
    }

    fn parent_bound(left: &MerkleNode, _right: &MerkleNode) -> u64 {
        left.bound
    }
}

/// Merkle interval tree over pairwise disjoint `[start, end)` leaves.
#[derive(Clone, Debug)]
pub struct IntervalTree<H: MerkleHasher = Sha256> {
    levels: Vec<Vec<MerkleNode>>,
    _hasher: PhantomData<H>,
}

impl<H: MerkleHasher> IntervalTree<H> {
    /// Builds the tree, failing before any hashing if a leaf is malformed or
    /// two leaves overlap.
    pub fn build(leaves: &[IntervalLeaf]) -> Result<Self, MerkleError> {
        check_disjoint(leaves)?;

        let nodes = leaves
            .iter()
            .map(|l| MerkleNode::new(l.start, H::hash_leaf(&l.hashed_payload())))
            .collect();

        Ok(Self {
            levels: levels::build_levels::<IntervalRule, H>(nodes),
            _hasher: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn root(&self) -> Option<&MerkleNode> {
        levels::root(&self.levels)
    }

    pub fn get_inclusion_proof(&self, index: usize) -> Result<InclusionProof, MerkleError> {
        levels::inclusion_proof::<IntervalRule>(&self.levels, index)
    }

    pub fn verify_leaf(
        &self,
        leaf: &IntervalLeaf,
        proof: &InclusionProof,
    ) -> Result<ImplicitRange, MerkleError> {
        Self::verify(leaf, proof, self.root())
    }

    /// Checks that `leaf` sits at `proof.leaf_index` under `root` and returns
    /// `[leaf.start, implicit_end)`.
    ///
    /// The first right sibling bounds the implicit end, a later right sibling
    /// starting before it means the tree was not built in interval order.
    pub fn verify(
        leaf: &IntervalLeaf,
        proof: &InclusionProof,
        root: Option<&MerkleNode>,
    ) -> Result<ImplicitRange, MerkleError> {
        let root = root.ok_or(MerkleError::EmptyTree)?;
        if leaf.start > leaf.end {
            return Err(MerkleError::InvalidInterval {
                start: leaf.start,
                end: leaf.end,
            });
        }
        if !proof.index_fits() {
            return Err(MerkleError::InvalidProofLength {
                index: proof.leaf_index,
                len: proof.siblings.len(),
            });
        }

        let mut node = MerkleNode::new(leaf.start, H::hash_leaf(&leaf.hashed_payload()));
        let mut path = proof.leaf_index;
        let mut first_right_start: Option<u64> = None;

        for sibling in &proof.siblings {
            let (left, right) = if path & 1 == 0 {
                match first_right_start {
                    None => first_right_start = Some(sibling.bound),
                    Some(first) if sibling.bound < first => {
                        return Err(MerkleError::PotentialIntersection {
                            bound: first,
                            limit: sibling.bound,
                        });
                    }
                    Some(_) => {}
                }
                (node, *sibling)
            } else {
                (*sibling, node)
            };

            if left.bound > right.bound {
                return Err(MerkleError::PotentialIntersection {
                    bound: left.bound,
                    limit: right.bound,
                });
            }

            node = levels::parent::<IntervalRule, H>(&left, &right);
            path >>= 1;
        }

        if node != *root {
            return Err(MerkleError::RootMismatch);
        }

        if proof.siblings.is_empty() {
            return Ok(ImplicitRange {
                start: leaf.start,
                end: leaf.end,
            });
        }

        let end = first_right_start.unwrap_or(u64::MAX);
        if leaf.end > end {
            return Err(MerkleError::PotentialIntersection {
                bound: leaf.end,
                limit: end,
            });
        }

        Ok(ImplicitRange {
            start: leaf.start,
            end,
        })
    }
}

/// Rejects inverted intervals and any pair of overlapping leaves, by scanning
/// the leaves in start order.
fn check_disjoint(leaves: &[IntervalLeaf]) -> Result<(), MerkleError> {
    if let Some(bad) = leaves.iter().find(|l| l.start > l.end) {
        return Err(MerkleError::InvalidInterval {
            start: bad.start,
            end: bad.end,
        });
    }

    let mut order: Vec<usize> = (0..leaves.len()).collect();
    order.sort_by_key(|i| (leaves[*i].start, leaves[*i].end));

    for pair in order.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if leaves[a].end > leaves[b].start {
            return Err(MerkleError::LeavesOverlap {
                first: a.min(b),
                second: a.max(b),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_leaves_are_disjoint() {
        let leaves = vec![
            IntervalLeaf::new(0, 100, b"a".to_vec()),
            IntervalLeaf::new(100, 200, b"b".to_vec()),
        ];
        assert!(check_disjoint(&leaves).is_ok());
    }

    #[test]
    fn test_overlap_found_regardless_of_order() {
        let leaves = vec![
            IntervalLeaf::new(300, 400, b"c".to_vec()),
            IntervalLeaf::new(0, 100, b"a".to_vec()),
            IntervalLeaf::new(350, 360, b"d".to_vec()),
        ];
        assert_eq!(
            check_disjoint(&leaves),
            Err(MerkleError::LeavesOverlap { first: 0, second: 2 })
        );
    }

    #[test]
    fn test_inverted_interval() {
        let leaves = vec![IntervalLeaf::new(10, 5, b"x".to_vec())];
        assert_eq!(
            IntervalTree::<Sha256>::build(&leaves).unwrap_err(),
            MerkleError::InvalidInterval { start: 10, end: 5 }
        );
    }

    #[test]
    fn test_parent_carries_left_start() {
        let leaves = vec![
            IntervalLeaf::new(5, 10, b"a".to_vec()),
            IntervalLeaf::new(20, 30, b"b".to_vec()),
        ];
        let tree: IntervalTree = IntervalTree::build(&leaves).unwrap();
        assert_eq!(tree.root().unwrap().bound, 5);
    }
}
