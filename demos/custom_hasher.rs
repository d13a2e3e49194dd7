//! Example of implementing a custom hasher for the sparse Merkle tree
//!
//! This example demonstrates:
//! - Creating a custom hasher implementation
//! - Using it with the tree
//! - Shrinking a digest to get a tree small enough to print

use nibble_smt::{Dsha256, Hasher, SparseMerkleTree, Truncated};
use sha2::{Digest, Sha256};

// Custom hasher that uses SHA256 but adds a prefix to the input
#[derive(Clone, Default)]
struct PrefixedSha256;

impl Hasher<32> for PrefixedSha256 {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        // Add a custom prefix to the input
        hasher.update(b"custom_prefix:");
        hasher.update(data);
        hasher.finalize().into()
    }
}

fn main() {
    // Create a new tree with our custom hasher
    let mut tree = SparseMerkleTree::<32, PrefixedSha256>::default();
    tree.update(b"hello").unwrap();
    println!(
        "Root hash with custom hasher: {}",
        hex::encode(tree.root_hash())
    );

    // Compare with standard SHA256
    let mut standard_tree = SparseMerkleTree::<32, Sha256>::default();
    standard_tree.update(b"hello").unwrap();
    println!(
        "Root hash with standard SHA256: {}",
        hex::encode(standard_tree.root_hash())
    );

    // Note that the hashes are different due to our custom prefix
    println!("\nThe hashes are different because our custom hasher adds a prefix to the input.");

    // A 24-bit tree keeps the first 3 bytes of each digest
    let mut small = SparseMerkleTree::<3, Truncated<Dsha256, 32, 3>>::default();
    for value in [b"hello".as_slice(), b"t-60", b"hi-5515", b"world"] {
        small.update(value).unwrap();
    }
    println!("\n{}", small);
}
