//! Example of keeping old states of a tree around
//!
//! This example demonstrates:
//! - Taking snapshots while the tree keeps changing
//! - Proving membership against an old root
//! - Reading a snapshot from another thread

use nibble_smt::{Dsha256, SparseMerkleTree};

fn main() {
    let mut tree = SparseMerkleTree::<32, Dsha256>::default();
    tree.update(b"first").unwrap();
    let before = tree.snapshot();

    for i in 0..100u32 {
        tree.update(format!("value-{i}").as_bytes()).unwrap();
    }
    println!(
        "Snapshot: {} keys, root {}",
        before.len(),
        hex::encode(before.root_hash())
    );
    println!(
        "Tree: {} keys, root {}",
        tree.len(),
        hex::encode(tree.root_hash())
    );

    // The old root still proves "first"
    let key = tree.hash(b"first");
    let proof = before.merkle_proof(&key).unwrap();
    let verified = proof.verify(tree.hasher(), &key, key, before.root_hash());
    println!("Proof against the snapshot: {}", verified.is_ok());

    // Snapshots are cheap to clone and can move across threads
    let shared = before.clone();
    let handle = std::thread::spawn(move || shared.contains(&key));
    println!("Seen from another thread: {}", handle.join().unwrap());

    // A key added later is unknown to the snapshot
    let later = tree.hash(b"value-7");
    println!("Snapshot knows value-7: {}", before.contains(&later));
}
