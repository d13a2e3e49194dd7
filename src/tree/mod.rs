mod empty;
mod regular;

pub use empty::DefaultHashes;
pub use regular::{Snapshot, SparseMerkleTree};

use crate::{BitPath, Hasher, PathError};

/// Digest function of a tree together with its empty subtree hashes.
///
/// Nodes only store hashes; every hash they recompute goes through this type.
#[derive(Debug, Clone)]
pub struct TreeHasher<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> {
    hasher: H,
    defaults: DefaultHashes<HASH_SIZE>,
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> TreeHasher<HASH_SIZE, H> {
    pub fn new(hasher: H) -> Self {
        let defaults = DefaultHashes::new(&hasher);
        Self { hasher, defaults }
    }

    /// Max height of the tree
    pub const fn tree_height(&self) -> usize {
        HASH_SIZE * 8
    }

    pub fn hash(&self, data: &[u8]) -> [u8; HASH_SIZE] {
        self.hasher.hash(data)
    }

    /// Hash of an inner binary node: `H(left || right)`.
    pub fn merge(&self, left: &[u8; HASH_SIZE], right: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
        self.hasher
            .hash([left.as_slice(), right.as_slice()].concat().as_slice())
    }

    pub fn default_hash(&self, height: usize) -> [u8; HASH_SIZE] {
        self.defaults.at_height(height)
    }

    pub fn defaults(&self) -> &DefaultHashes<HASH_SIZE> {
        &self.defaults
    }

    /// Walks `merkle`, the hash of a single-path subtree at height `from`, up to height `to`.
    ///
    /// At each level the sibling is empty, so it is taken from the default hashes and the
    /// path bit decides on which side `merkle` sits. `bits` is addressed from the tree root and
    /// must cover at least `from` bits.
    pub(crate) fn fold(
        &self,
        mut merkle: [u8; HASH_SIZE],
        bits: &BitPath,
        from: usize,
        to: usize,
    ) -> Result<[u8; HASH_SIZE], PathError> {
        for depth in (to..from).rev() {
            let sibling = self.defaults.at_height(depth + 1);
            merkle = if bits.symbol_at(depth)? == 0 {
                self.merge(&merkle, &sibling)
            } else {
                self.merge(&sibling, &merkle)
            };
        }
        Ok(merkle)
    }
}
