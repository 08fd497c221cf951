use oru_merkle::{InclusionProof, MerkleError, SumLeaf, SumTree};
use rand::Rng;
use sha2::Sha256;

fn ascending_leaves(rng: &mut impl Rng, n: usize) -> Vec<SumLeaf> {
    let mut end = 0u64;
    (0..n)
        .map(|i| {
            end += rng.gen_range(0..1_000);
            SumLeaf::new(end, format!("payload-{i}").into_bytes())
        })
        .collect()
}

#[test]
fn test_every_leaf_of_ascending_tree_verifies() {
    let mut rng = rand::thread_rng();
    for n in 1..40 {
        let leaves = ascending_leaves(&mut rng, n);
        let tree = SumTree::<Sha256>::build(&leaves);

        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.get_inclusion_proof(i).unwrap();
            let range = SumTree::<Sha256>::verify(leaf, &proof, tree.root(), tree.max_end())
                .unwrap_or_else(|e| panic!("leaf {i} of {n} rejected: {e}"));
            assert!(range.start <= leaf.end, "leaf {i} of {n}: {range:?}");
            assert!(leaf.end <= range.end, "leaf {i} of {n}: {range:?}");
        }
    }
}

#[test]
fn test_neighbouring_ranges_tile() {
    let leaves: Vec<_> = [10, 20, 35, 50, 51]
        .iter()
        .map(|e| SumLeaf::new(*e, vec![*e as u8]))
        .collect();
    let tree = SumTree::<Sha256>::build_with_max_end(&leaves, 1_000);

    let mut prev_end = 0;
    for (i, leaf) in leaves.iter().enumerate() {
        let proof = tree.get_inclusion_proof(i).unwrap();
        let range = tree.verify_leaf(leaf, &proof).unwrap();
        assert_eq!(range.start, prev_end);
        prev_end = range.end;
    }
    assert_eq!(prev_end, 1_000);
}

#[test]
fn test_descending_leaves_fail_monotonicity() {
    let leaves = vec![SumLeaf::new(100, b"a".to_vec()), SumLeaf::new(50, b"b".to_vec())];
    let tree = SumTree::<Sha256>::build(&leaves);

    let proof = tree.get_inclusion_proof(1).unwrap();
    let err = tree.verify_leaf(&leaves[1], &proof).unwrap_err();
    assert!(
        matches!(err, MerkleError::MonotonicityViolation { .. }),
        "got {err:?}"
    );
}

#[test]
fn test_tampered_payload_is_root_mismatch() {
    let leaves = vec![
        SumLeaf::new(1, b"a".to_vec()),
        SumLeaf::new(2, b"b".to_vec()),
        SumLeaf::new(3, b"c".to_vec()),
    ];
    let tree = SumTree::<Sha256>::build(&leaves);
    let proof = tree.get_inclusion_proof(1).unwrap();

    let forged = SumLeaf::new(2, b"evil".to_vec());
    assert_eq!(tree.verify_leaf(&forged, &proof), Err(MerkleError::RootMismatch));
}

#[test]
fn test_proof_for_wrong_index_rejected() {
    let leaves = vec![
        SumLeaf::new(1, b"a".to_vec()),
        SumLeaf::new(2, b"b".to_vec()),
        SumLeaf::new(3, b"c".to_vec()),
        SumLeaf::new(4, b"d".to_vec()),
    ];
    let tree = SumTree::<Sha256>::build(&leaves);
    let mut proof = tree.get_inclusion_proof(1).unwrap();
    proof.leaf_index = 2;

    assert!(tree.verify_leaf(&leaves[1], &proof).is_err());
}

#[test]
fn test_single_leaf_tree() {
    let leaf = SumLeaf::new(42, b"only".to_vec());
    let tree = SumTree::<Sha256>::build(std::slice::from_ref(&leaf));

    let proof = tree.get_inclusion_proof(0).unwrap();
    assert!(proof.siblings.is_empty());

    let range = tree.verify_leaf(&leaf, &proof).unwrap();
    assert_eq!((range.start, range.end), (0, 42));
}

#[test]
fn test_empty_proof_invalid_for_nonzero_index() {
    let leaf = SumLeaf::new(42, b"only".to_vec());
    let tree = SumTree::<Sha256>::build(std::slice::from_ref(&leaf));

    let proof = InclusionProof::new(1, vec![]);
    assert_eq!(
        tree.verify_leaf(&leaf, &proof),
        Err(MerkleError::InvalidProofLength { index: 1, len: 0 })
    );
}
