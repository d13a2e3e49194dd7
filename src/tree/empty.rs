//! Hashes of all-empty subtrees, one per height
use crate::Hasher;

/// Merkle roots of the empty subtrees of a tree.
///
/// Index `h` holds the root of an empty subtree whose top sits at height `h`: index
/// `8 * HASH_SIZE` is the digest of the empty input, index `0` the root of an empty tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultHashes<const HASH_SIZE: usize> {
    hashes: Vec<[u8; HASH_SIZE]>,
}

impl<const HASH_SIZE: usize> DefaultHashes<HASH_SIZE> {
    /// Builds the table bottom-up. This performs `8 * HASH_SIZE + 1` hashes.
    pub fn new<H: Hasher<HASH_SIZE>>(hasher: &H) -> Self {
        let max_height = HASH_SIZE * 8;
        let mut hashes = vec![[0; HASH_SIZE]; max_height + 1];
        hashes[max_height] = hasher.hash(&[]);

        for i in (0..max_height).rev() {
            hashes[i] = hasher.hash(
                [hashes[i + 1].as_slice(), hashes[i + 1].as_slice()]
                    .concat()
                    .as_slice(),
            );
        }

        Self { hashes }
    }

    /// Height of the tree, which is also the number of bits in a digest.
    pub const fn tree_height(&self) -> usize {
        HASH_SIZE * 8
    }

    /// Returns the empty subtree hash at `height`.
    ///
    /// # Panics
    ///
    /// If `height` is greater than the tree height.
    pub fn at_height(&self, height: usize) -> [u8; HASH_SIZE] {
        self.hashes[height]
    }

    /// Root hash of an empty tree.
    pub fn root(&self) -> [u8; HASH_SIZE] {
        self.hashes[0]
    }

    /// Hash of an empty leaf slot.
    pub fn leaf(&self) -> [u8; HASH_SIZE] {
        self.hashes[HASH_SIZE * 8]
    }

    /// All hashes from the root (index 0) down to the leaf level.
    pub fn as_slice(&self) -> &[[u8; HASH_SIZE]] {
        &self.hashes
    }
}
