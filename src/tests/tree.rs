//! Scenario tests for the sparse Merkle tree

use hex_literal::hex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha2::Sha256;

use super::reference::{reference_root, reference_root_of};
use crate::{Branch, Dsha256, NibblePath, Node, SparseMerkleTree, Truncated};

type Tree24 = SparseMerkleTree<3, Truncated<Dsha256, 32, 3>>;

fn tree24(values: &[&[u8]]) -> Tree24 {
    let mut tree = Tree24::default();
    for value in values {
        tree.update(value).unwrap();
    }
    tree
}

fn branch(node: &Node<3>) -> &Branch<3> {
    match node {
        Node::Branch(branch) => branch,
        Node::Leaf(_) => panic!("expected a branch"),
    }
}

fn root_branch(tree: &Tree24) -> &Branch<3> {
    branch(tree.root())
}

fn random_values(seed: u64, count: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..8).map(|_| rng.gen_range(b'A'..=b'Z')).collect())
        .collect()
}

#[test]
fn test_empty_tree() {
    let tree = Tree24::default();
    assert_eq!(tree.root_hash(), hex!("8f0b34"));
    assert_eq!(tree.root_hash(), reference_root_of(&tree, &[]));
    assert_eq!(tree.root_hash(), tree.default_hash_at_height(0));

    let tree = SparseMerkleTree::<32, Sha256>::default();
    assert_eq!(
        tree.root_hash(),
        hex!("9a596033c82b65c5eef0f5f160b9c9893844765a15ab685486931c870004b910")
    );
}

#[test]
fn test_insert_root_slot_9() {
    // H("hello") = 9595c9
    let tree = tree24(&[b"hello"]);
    assert!(root_branch(&tree).child(9).is_some());
    assert_eq!(tree.root_hash(), hex!("f181e0"));
    assert_eq!(tree.root_hash(), reference_root_of(&tree, &[b"hello"]));
}

#[test]
fn test_insert_root_slot_6() {
    // H("world") = 63e5c1
    let tree = tree24(&[b"world"]);
    let root = root_branch(&tree);
    assert!(root.child(6).is_some());
    assert_eq!(root.children().count(), 1);
}

#[test]
fn test_insert_leaf_without_shared_path() {
    // 9 595c9 and 9 a7948
    let tree = tree24(&[b"hello", b"t-60"]);
    let sub = branch(root_branch(&tree).child(9).unwrap());
    assert!(sub.child(5).is_some());
    assert!(sub.child(0xa).is_some());
    assert_eq!(tree.root_hash(), hex!("3620ee"));
    assert_eq!(
        tree.root_hash(),
        reference_root_of(&tree, &[b"hello", b"t-60"])
    );
}

#[test]
fn test_insert_leaf_with_shared_path() {
    for (other, shared) in [
        // 95 95c9 and 95 ac9f
        (b"op-416".as_slice(), "95"),
        // 959 5c9 and 959 df6
        (b"hi-5515".as_slice(), "959"),
        // 9595 c9 and 9595 8a
        (b"xyz-50318".as_slice(), "9595"),
        // 9595c 9 and 9595c 5
        (b"abc-2120105".as_slice(), "9595c"),
    ] {
        let tree = tree24(&[b"hello", other]);
        let sub = branch(root_branch(&tree).child(9).unwrap());
        assert_eq!(sub.prefix().to_string(), shared);
        assert_eq!(sub.height(), 4);

        let k = shared.len();
        let hello = tree.hash(b"hello");
        let other_hash = tree.hash(other);
        assert_eq!(
            NibblePath::from_bytes(&hello).slice(0, k).unwrap(),
            *sub.prefix()
        );
        let hello_slot = NibblePath::from_bytes(&hello).symbol_at(k).unwrap();
        let other_slot = NibblePath::from_bytes(&other_hash).symbol_at(k).unwrap();
        assert_ne!(hello_slot, other_slot);
        assert!(sub.child(hello_slot as usize).is_some());
        assert!(sub.child(other_slot as usize).is_some());
        assert_eq!(sub.children().count(), 2);

        assert_eq!(
            tree.root_hash(),
            reference_root_of(&tree, &[b"hello", other])
        );
    }
}

#[test]
fn test_insert_leaves_with_shared_paths() {
    let cases: [&[&[u8]]; 3] = [
        &[b"hello", b"abc-2120105", b"xyz-50318"],
        &[b"hello", b"abc-2120105", b"hi-5515"],
        &[b"hello", b"abc-2120105", b"hi-5515", b"op-416"],
    ];
    for values in cases {
        let tree = tree24(values);
        assert!(root_branch(&tree).child(9).is_some());
        assert_eq!(tree.root_hash(), reference_root_of(&tree, values));
        assert_eq!(tree.root().leaf_count(), values.len());
    }
}

#[test]
fn test_branch_split_keeps_subtree() {
    // 9595c9 and 9595c5 give a branch at 9595c, then 959df6 splits it at 959
    let tree = tree24(&[b"hello", b"abc-2120105", b"hi-5515"]);
    let sub = branch(root_branch(&tree).child(9).unwrap());
    assert_eq!(sub.prefix().to_string(), "959");
    let demoted = branch(sub.child(5).unwrap());
    assert_eq!(demoted.height(), 16);
    assert_eq!(demoted.prefix().to_string(), "9595c");
    assert!(demoted.child(9).is_some());
    assert!(demoted.child(5).is_some());
}

#[test]
fn test_insert_leaves_in_different_orders() {
    let data: [&[u8]; 5] = [b"hello", b"abc-2120105", b"hi-5515", b"op-416", b"t-60"];
    let expected = reference_root_of(&Tree24::default(), &data);
    assert_eq!(expected, hex!("5341ea"));

    let mut sorted = data;
    sorted.sort();
    let mut by_length = data;
    by_length.sort_by_key(|value| value.len());
    let mut reversed = data;
    reversed.reverse();

    for order in [data, sorted, by_length, reversed] {
        assert_eq!(tree24(&order).root_hash(), expected);
    }
}

#[test]
fn test_update_random() {
    let values = random_values(123456, 60);
    let values: Vec<&[u8]> = values.iter().map(Vec::as_slice).collect();
    let tree = tree24(&values);
    assert_eq!(tree.root_hash(), reference_root_of(&tree, &values));

    let mut shuffled = values.clone();
    shuffled.reverse();
    assert_eq!(tree24(&shuffled).root_hash(), tree.root_hash());
}

#[test]
fn test_insert_same_leaf() {
    // H("hello") = H("duplicate-20495739") = 9595c9
    let tree = tree24(&[b"hello", b"duplicate-20495739"]);
    assert!(root_branch(&tree).child(9).is_some());
    assert_eq!(tree.root_hash(), reference_root_of(&tree, &[b"hello"]));
    assert_eq!(tree.root_hash(), tree24(&[b"hello"]).root_hash());
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_update_with_precomputed_hash() {
    let mut tree = Tree24::default();
    let key = hex!("000001");
    tree.update_with_hash(&key, b"first").unwrap();
    tree.update_with_hash(&hex!("ffffff"), b"last").unwrap();
    assert_eq!(
        tree.root_hash(),
        reference_root(&tree, &[hex!("000001"), hex!("ffffff")])
    );
    assert_eq!(tree.get(&key), Some(b"first".as_slice()));
}

#[test]
fn test_sha256_tree() {
    let mut tree = SparseMerkleTree::<32, Sha256>::default();
    tree.update(b"hello").unwrap();
    assert_eq!(
        tree.root_hash(),
        hex!("75ede83b60f986de4b5e395daae4563547c84d154d0bb91d6bedb1809a5cfc66")
    );
    tree.update(b"world").unwrap();
    assert_eq!(
        tree.root_hash(),
        hex!("365f1d02b5fae1d2fb2a771cd630fbd2d0e2dcaf0b97754041239c971f00ab65")
    );
}

#[test]
fn test_sha256_random_with_proofs() {
    let values = random_values(42, 200);
    let mut tree = SparseMerkleTree::<32, Sha256>::default();
    for value in values.iter() {
        tree.update(value).unwrap();
    }
    let values: Vec<&[u8]> = values.iter().map(Vec::as_slice).collect();
    assert_eq!(tree.root_hash(), reference_root_of(&tree, &values));

    for value in values.iter().take(20) {
        let key = tree.hash(value);
        let proof = tree.merkle_proof(&key).unwrap();
        proof
            .verify(tree.hasher(), &key, key, tree.root_hash())
            .unwrap();
        let compressed = proof.compress(tree.default_hashes());
        assert_eq!(compressed.decompress(tree.default_hashes()).unwrap(), proof);
    }
}

#[test]
fn test_snapshots_keep_history() {
    let values = random_values(7, 30);
    let mut tree = Tree24::default();
    let mut snapshots = vec![tree.snapshot()];
    for value in values.iter() {
        tree.update(value).unwrap();
        snapshots.push(tree.snapshot());
    }
    for (i, snapshot) in snapshots.iter().enumerate() {
        let inserted: Vec<&[u8]> = values[..i].iter().map(Vec::as_slice).collect();
        assert_eq!(snapshot.root_hash(), reference_root_of(&tree, &inserted));
    }
}

#[cfg(feature = "multi-thread")]
#[test]
fn test_snapshot_shared_across_threads() {
    let mut tree = Tree24::default();
    tree.update(b"hello").unwrap();
    let snapshot = tree.snapshot();
    let expected = snapshot.root_hash();
    tree.update(b"t-60").unwrap();

    let handle = std::thread::spawn(move || {
        let proof = snapshot.merkle_proof(&hex!("9595c9")).unwrap();
        (snapshot.root_hash(), proof.nodes().len())
    });
    let (root, proof_len) = handle.join().unwrap();
    assert_eq!(root, expected);
    assert_eq!(proof_len, 24);
    assert_ne!(tree.root_hash(), expected);
}
