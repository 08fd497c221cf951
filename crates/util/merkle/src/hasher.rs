use digest::consts::U32;
use digest::Digest;

use crate::node::MerkleNode;

pub type MerkleHash = [u8; 32];

pub trait MerkleHasher {
    /// Hashes a leaf payload.
    fn hash_leaf(data: &[u8]) -> MerkleHash;

    /// Combines two children, committing to both bounds:
    /// `H(left.bound || left.hash || right.bound || right.hash)` with the
    /// bounds as big-endian u64.
    fn hash_node(left: &MerkleNode, right: &MerkleNode) -> MerkleHash;
}

impl<D: Digest<OutputSize = U32>> MerkleHasher for D {
    fn hash_leaf(data: &[u8]) -> MerkleHash {
        D::digest(data).into()
    }

    fn hash_node(left: &MerkleNode, right: &MerkleNode) -> MerkleHash {
        let mut context = D::new();
        Digest::update(&mut context, left.bound.to_be_bytes());
        Digest::update(&mut context, left.hash);
        Digest::update(&mut context, right.bound.to_be_bytes());
        Digest::update(&mut context, right.hash);
        context.finalize().into()
    }
}
