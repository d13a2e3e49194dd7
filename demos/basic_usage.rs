//! Basic example of using the sparse Merkle tree
//!
//! This example demonstrates:
//! - Creating a new tree
//! - Storing values under their digest
//! - Getting the root hash
//! - Verifying merkle proofs

use nibble_smt::{Dsha256, SparseMerkleTree};

fn main() {
    // Create a new tree with 32-byte hashes using double SHA256
    let mut tree = SparseMerkleTree::<32, Dsha256>::default();
    println!("Empty root: {}", hex::encode(tree.root_hash()));

    // Each value is stored under its own digest
    for value in [b"hello".as_slice(), b"world", b"sparse merkle tree"] {
        let root = tree.update(value).unwrap();
        println!(
            "Root after {:?}: {}",
            String::from_utf8_lossy(value),
            hex::encode(root)
        );
    }

    // Look a value up by its key
    let key = tree.hash(b"hello");
    println!("Value under {}: {:?}", hex::encode(key), tree.get(&key));

    // Get and verify a merkle proof for "hello"
    let proof = tree.merkle_proof(&key).unwrap();
    println!("Merkle proof length: {}", proof.nodes().len());
    let compressed = proof.compress(tree.default_hashes());
    println!("Non-empty siblings: {}", compressed.nodes().len());

    let result = proof.verify(tree.hasher(), &key, key, tree.root_hash());
    println!("Proof verification: {}", result.is_ok());

    println!("\n{}", tree);
}
