//! Proofs are used to verify that a key is stored in a tree.
//!
//! A proof is the list of sibling hashes met on the way from a leaf to the root.
//!
//! Most siblings of a sparse tree are empty subtrees, so a proof can be compressed into a
//! bitvector marking the default hashes and the list of the remaining ones.
use bitvec::order::Lsb0;
use bitvec::vec::BitVec;

use crate::{BitPath, DefaultHashes, Hasher, TreeError, TreeHasher};

/// A merkle proof for a given key.
///
/// Entry `i` is the sibling at height `8 * HASH_SIZE - i`: the first entry sits next to the
/// leaf, the last one next to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof<const HASH_SIZE: usize> {
    nodes: Vec<[u8; HASH_SIZE]>,
}

impl<const HASH_SIZE: usize> Proof<HASH_SIZE> {
    /// Creates a new proof from a list of sibling hashes.
    pub fn new(nodes: Vec<[u8; HASH_SIZE]>) -> Self {
        Self { nodes }
    }

    /// Returns the sibling hashes in the proof.
    pub fn nodes(&self) -> &[[u8; HASH_SIZE]] {
        &self.nodes
    }

    /// Computes the root of a tree holding `data_hash` under `key`.
    pub fn root<H: Hasher<HASH_SIZE>>(
        &self,
        hasher: &TreeHasher<HASH_SIZE, H>,
        key: &[u8; HASH_SIZE],
        data_hash: [u8; HASH_SIZE],
    ) -> Result<[u8; HASH_SIZE], TreeError> {
        let tree_height = hasher.tree_height();
        if self.nodes.len() != tree_height {
            return Err(TreeError::InvalidMerkleProof);
        }
        let bits = BitPath::from_bytes(key);
        let mut merkle = data_hash;
        for (i, sibling) in self.nodes.iter().enumerate() {
            merkle = if bits.symbol_at(tree_height - i - 1)? == 0 {
                hasher.merge(&merkle, sibling)
            } else {
                hasher.merge(sibling, &merkle)
            };
        }
        Ok(merkle)
    }

    /// Verify a merkle proof for a given key.
    ///
    /// # Arguments
    ///
    /// * `hasher` - The hasher of the tree the proof comes from
    /// * `key` - The key of the leaf to verify the proof for
    /// * `data_hash` - The data hash stored in the leaf
    /// * `root_hash` - The expected root of the tree
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` if the proof is valid, otherwise returns an error.
    pub fn verify<H: Hasher<HASH_SIZE>>(
        &self,
        hasher: &TreeHasher<HASH_SIZE, H>,
        key: &[u8; HASH_SIZE],
        data_hash: [u8; HASH_SIZE],
        root_hash: [u8; HASH_SIZE],
    ) -> Result<(), TreeError> {
        if self.root(hasher, key, data_hash)? == root_hash {
            Ok(())
        } else {
            Err(TreeError::InvalidMerkleProof)
        }
    }

    /// Compresses the proof into a compressed proof.
    pub fn compress(&self, defaults: &DefaultHashes<HASH_SIZE>) -> CompressedProof<HASH_SIZE> {
        let tree_height = defaults.tree_height();
        let mut bits = BitVec::with_capacity(self.nodes.len());
        let mut nodes = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if i < tree_height && *node == defaults.at_height(tree_height - i) {
                bits.push(true);
            } else {
                bits.push(false);
                nodes.push(*node);
            }
        }
        CompressedProof::new(nodes, bits)
    }
}

/// A compressed merkle proof for a given key.
/// We don't store the siblings that are empty subtrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedProof<const HASH_SIZE: usize> {
    nodes: Vec<[u8; HASH_SIZE]>,
    bits: BitVec<u8, Lsb0>,
}

impl<const HASH_SIZE: usize> CompressedProof<HASH_SIZE> {
    /// Creates a new compressed proof from a list of hashes and a bitvector.
    pub fn new(nodes: Vec<[u8; HASH_SIZE]>, bits: BitVec<u8, Lsb0>) -> Self {
        Self { nodes, bits }
    }

    pub fn nodes(&self) -> &[[u8; HASH_SIZE]] {
        &self.nodes
    }

    /// One bit per sibling, set when the sibling is a default hash.
    pub fn bits(&self) -> &BitVec<u8, Lsb0> {
        &self.bits
    }

    /// Decompresses the proof into a proof.
    pub fn decompress(
        &self,
        defaults: &DefaultHashes<HASH_SIZE>,
    ) -> Result<Proof<HASH_SIZE>, TreeError> {
        let tree_height = defaults.tree_height();
        if self.bits.len() != tree_height || self.nodes.len() != self.bits.count_zeros() {
            return Err(TreeError::InvalidMerkleProof);
        }
        let mut nodes = Vec::with_capacity(self.bits.len());
        let mut stored = self.nodes.iter();
        for (i, bit) in self.bits.iter().enumerate() {
            if *bit {
                nodes.push(defaults.at_height(tree_height - i));
            } else {
                nodes.push(*stored.next().ok_or(TreeError::InvalidMerkleProof)?);
            }
        }
        Ok(Proof::new(nodes))
    }

    /// Encodes the proof into a byte vector.
    ///
    /// The layout is the number of stored hashes as a big endian `u16`, the hashes, then the
    /// raw bytes of the bitvector. Fails if more hashes are stored than a `u16` can count.
    pub fn encode(&self) -> Result<Vec<u8>, TreeError> {
        let count = u16::try_from(self.nodes.len()).map_err(|_| TreeError::InvalidMerkleProof)?;
        let mut encoded = Vec::with_capacity(2 + self.nodes.len() * HASH_SIZE);
        encoded.extend_from_slice(&count.to_be_bytes());
        for node in self.nodes.iter() {
            encoded.extend_from_slice(node);
        }
        encoded.extend_from_slice(self.bits.as_raw_slice());
        Ok(encoded)
    }

    /// Decodes a proof from a byte vector. The bitvector is restored to `8 * HASH_SIZE` bits.
    pub fn decode(data: &[u8]) -> Result<Self, TreeError> {
        let tree_height = HASH_SIZE * 8;
        let (count, mut rest) = data
            .split_first_chunk::<2>()
            .ok_or(TreeError::InvalidMerkleProof)?;
        let nb_nodes = u16::from_be_bytes(*count) as usize;

        let mut nodes = Vec::with_capacity(nb_nodes);
        for _ in 0..nb_nodes {
            let (node, tail) = rest
                .split_first_chunk::<HASH_SIZE>()
                .ok_or(TreeError::InvalidMerkleProof)?;
            nodes.push(*node);
            rest = tail;
        }

        if rest.len() != tree_height.div_ceil(8) {
            return Err(TreeError::InvalidMerkleProof);
        }
        let mut bits = BitVec::<u8, Lsb0>::from_slice(rest);
        bits.truncate(tree_height);
        Ok(Self::new(nodes, bits))
    }
}
