//! Path-compressed sparse Merkle tree
//!
//! This crate provides a sparse Merkle tree addressed by the output of a digest function: every
//! possible digest is a leaf slot, and a value is stored under its own digest.
//!
//! The tree supports:
//! - Radix-16 branches, each collapsing four binary levels
//! - Compression of single-child runs, rebuilt from precomputed empty subtree hashes
//! - Persistent snapshots sharing their nodes with the live tree
//! - Membership proofs, with a compressed form for the mostly empty siblings

mod error;
mod hasher;
mod node;
mod path;
mod proof;
mod tree;

pub use error::{PathError, TreeError};
pub use hasher::{Dsha256, Hasher, ThreadSafe, Truncated};
pub use node::{Branch, Leaf, Node, RADIX};
pub use path::{Bit, BitPath, Nibble, NibblePath, PathView, Radix};
pub use proof::{CompressedProof, Proof};
pub use tree::{DefaultHashes, Snapshot, SparseMerkleTree, TreeHasher};

#[cfg(test)]
mod tests;
