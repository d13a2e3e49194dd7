//! Sparse Merkle tree over nibble-compressed paths

use std::fmt::{self, Display};
use std::sync::Arc;

use tracing::{debug, trace};

use super::{DefaultHashes, TreeHasher};
use crate::{Branch, Hasher, NibblePath, Node, Proof, TreeError};

/// Read-only state of a tree, as it was when the snapshot was taken.
///
/// Snapshots share their nodes with the tree they come from. Later updates of the tree build
/// new nodes and never touch the ones a snapshot holds.
pub struct Snapshot<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> {
    hasher: Arc<TreeHasher<HASH_SIZE, H>>,
    root: Arc<Node<HASH_SIZE>>,
    len: usize,
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> Clone for Snapshot<HASH_SIZE, H> {
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            root: self.root.clone(),
            len: self.len,
        }
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> fmt::Debug for Snapshot<HASH_SIZE, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("root_hash", &hex::encode(self.root.hash()))
            .field("len", &self.len)
            .finish()
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> Snapshot<HASH_SIZE, H> {
    /// Root hash. NO HASHING IS DONE HERE.
    pub fn root_hash(&self) -> [u8; HASH_SIZE] {
        self.root.hash()
    }

    pub fn root(&self) -> &Arc<Node<HASH_SIZE>> {
        &self.root
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value stored under the key `data_hash`.
    pub fn get(&self, data_hash: &[u8]) -> Option<&[u8]> {
        self.get_at(&NibblePath::from_bytes(data_hash))
    }

    /// Value stored under `path`.
    pub fn get_at(&self, path: &NibblePath) -> Option<&[u8]> {
        self.root.find(path).map(|leaf| leaf.value())
    }

    pub fn contains(&self, data_hash: &[u8]) -> bool {
        self.get(data_hash).is_some()
    }

    /// Membership proof of the key `data_hash`.
    pub fn merkle_proof(&self, data_hash: &[u8]) -> Result<Proof<HASH_SIZE>, TreeError> {
        let key = to_digest::<HASH_SIZE>(data_hash)?;
        self.merkle_proof_at(&NibblePath::from_bytes(&key))
    }

    /// Membership proof of the leaf stored under `path`.
    ///
    /// The proof holds one sibling per binary level, from the leaf level up to the root. Levels
    /// the tree does not store get the default hash of their height.
    pub fn merkle_proof_at(&self, path: &NibblePath) -> Result<Proof<HASH_SIZE>, TreeError> {
        let tree_height = self.hasher.tree_height();
        let mut nodes: Vec<_> = (0..tree_height)
            .map(|i| self.hasher.default_hash(tree_height - i))
            .collect();

        let mut current = self.root.as_ref();
        loop {
            match current {
                Node::Branch(branch) => {
                    if !path.starts_with(branch.prefix()) {
                        return Err(TreeError::KeyNotFound);
                    }
                    let slot = path.symbol_at(branch.prefix().len())? as usize;
                    let child = branch.child(slot).ok_or(TreeError::KeyNotFound)?;
                    let child_height = branch.fanout_height() + 4;
                    for (level, sibling) in branch
                        .fanout_siblings(self.hasher.as_ref(), slot)
                        .into_iter()
                        .enumerate()
                    {
                        nodes[tree_height - (child_height - level)] = sibling;
                    }
                    current = child;
                }
                Node::Leaf(leaf) if leaf.path() == path => return Ok(Proof::new(nodes)),
                Node::Leaf(_) => return Err(TreeError::KeyNotFound),
            }
        }
    }

    /// Indented listing of every node, one per line.
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> Display for Snapshot<HASH_SIZE, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "== SparseMerkleTree(height={}) ==",
            self.hasher.tree_height()
        )?;
        self.root.dump(f, None, 0)?;
        writeln!(f, "== END ==")
    }
}

/// Sparse Merkle tree whose keys are the digests of the stored values.
///
/// Every key of `8 * HASH_SIZE` bits addresses a leaf slot. Stored keys are kept as
/// [`Leaf`](crate::Leaf) nodes under 16-way [`Branch`] nodes, and runs of empty levels are
/// compressed away.
///
/// * `HASH_SIZE` - size of the hash digest in bytes.
/// * `H` - Hasher used for the keys and the inner nodes.
pub struct SparseMerkleTree<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> {
    current: Snapshot<HASH_SIZE, H>,
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> SparseMerkleTree<HASH_SIZE, H> {
    /// Creates an empty tree. This computes the default hashes of every height.
    pub fn new(hasher: H) -> Self {
        let hasher = Arc::new(TreeHasher::new(hasher));
        let root = Arc::new(Node::Branch(Branch::root(hasher.as_ref())));
        debug!(
            height = hasher.tree_height(),
            empty_root = %hex::encode(hasher.defaults().root()),
            empty_leaf = %hex::encode(hasher.defaults().leaf()),
            "created sparse merkle tree"
        );
        Self {
            current: Snapshot {
                hasher,
                root,
                len: 0,
            },
        }
    }

    /// Max height of the tree
    pub const fn tree_height(&self) -> usize {
        HASH_SIZE * 8
    }

    /// Stores `value` under its own digest and returns the new root hash.
    pub fn update(&mut self, value: &[u8]) -> Result<[u8; HASH_SIZE], TreeError> {
        let data_hash = self.current.hasher.hash(value);
        self.update_with_hash(&data_hash, value)
    }

    /// Stores `value` under the precomputed key `data_hash` and returns the new root hash.
    pub fn update_with_hash(
        &mut self,
        data_hash: &[u8],
        value: &[u8],
    ) -> Result<[u8; HASH_SIZE], TreeError> {
        let key = to_digest::<HASH_SIZE>(data_hash)?;
        self.update_at(&NibblePath::from_bytes(&key), &key, value)
    }

    /// Stores `value` with digest `data_hash` under `path` and returns the new root hash.
    ///
    /// `path` must hold `2 * HASH_SIZE` nibbles and `value` must not be empty.
    pub fn update_at(
        &mut self,
        path: &NibblePath,
        data_hash: &[u8],
        value: &[u8],
    ) -> Result<[u8; HASH_SIZE], TreeError> {
        if value.is_empty() {
            return Err(TreeError::EmptyValue);
        }
        let data_hash = to_digest::<HASH_SIZE>(data_hash)?;
        if path.len() != HASH_SIZE * 2 {
            return Err(TreeError::PathLength {
                expected: HASH_SIZE * 2,
                actual: path.len(),
            });
        }

        trace!(path = %path, "updating tree");
        let state = &mut self.current;
        let is_new = state.root.find(path).is_none();
        let root = Node::update(&state.root, state.hasher.as_ref(), path, data_hash, value)?;
        state.root = root;
        if is_new {
            state.len += 1;
        }
        Ok(state.root.hash())
    }

    /// Root hash. NO HASHING IS DONE HERE.
    pub fn root_hash(&self) -> [u8; HASH_SIZE] {
        self.current.root_hash()
    }

    /// Current root node.
    pub fn root(&self) -> &Arc<Node<HASH_SIZE>> {
        self.current.root()
    }

    /// Freezes the current state. The snapshot is unaffected by later updates.
    pub fn snapshot(&self) -> Snapshot<HASH_SIZE, H> {
        self.current.clone()
    }

    /// The tree digest function.
    pub fn hash(&self, data: &[u8]) -> [u8; HASH_SIZE] {
        self.current.hasher.hash(data)
    }

    /// Hash of an inner node from its two children.
    pub fn merge(&self, left: &[u8; HASH_SIZE], right: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
        self.current.hasher.merge(left, right)
    }

    /// Hash of an empty subtree whose top sits at `height`.
    ///
    /// # Panics
    ///
    /// If `height` is greater than the tree height.
    pub fn default_hash_at_height(&self, height: usize) -> [u8; HASH_SIZE] {
        self.current.hasher.default_hash(height)
    }

    pub fn default_hashes(&self) -> &DefaultHashes<HASH_SIZE> {
        self.current.hasher.defaults()
    }

    pub fn hasher(&self) -> &TreeHasher<HASH_SIZE, H> {
        &self.current.hasher
    }

    pub fn get(&self, data_hash: &[u8]) -> Option<&[u8]> {
        self.current.get(data_hash)
    }

    pub fn get_at(&self, path: &NibblePath) -> Option<&[u8]> {
        self.current.get_at(path)
    }

    pub fn contains(&self, data_hash: &[u8]) -> bool {
        self.current.contains(data_hash)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn merkle_proof(&self, data_hash: &[u8]) -> Result<Proof<HASH_SIZE>, TreeError> {
        self.current.merkle_proof(data_hash)
    }

    pub fn merkle_proof_at(&self, path: &NibblePath) -> Result<Proof<HASH_SIZE>, TreeError> {
        self.current.merkle_proof_at(path)
    }

    pub fn dump(&self) -> String {
        self.current.dump()
    }
}

/// Clones share every node with the tree they come from, then evolve independently.
impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> Clone for SparseMerkleTree<HASH_SIZE, H> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
        }
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE> + Default> Default
    for SparseMerkleTree<HASH_SIZE, H>
{
    fn default() -> Self {
        Self::new(H::default())
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> fmt::Debug for SparseMerkleTree<HASH_SIZE, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMerkleTree")
            .field("root_hash", &hex::encode(self.root_hash()))
            .field("len", &self.len())
            .finish()
    }
}

impl<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>> Display for SparseMerkleTree<HASH_SIZE, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.current, f)
    }
}

fn to_digest<const HASH_SIZE: usize>(data_hash: &[u8]) -> Result<[u8; HASH_SIZE], TreeError> {
    data_hash.try_into().map_err(|_| TreeError::HashLength {
        expected: HASH_SIZE,
        actual: data_hash.len(),
    })
}
