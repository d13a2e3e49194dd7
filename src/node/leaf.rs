use std::fmt::{self, Display};
use std::sync::Arc;

use tracing::{debug, trace};

use super::{Branch, Node, RADIX};
use crate::{Hasher, NibblePath, TreeError, TreeHasher};

/// Printable values longer than this are cut in [`Display`] output.
const VALUE_PREVIEW_CHARS: usize = 20;

/// A Leaf is a node that has no children and holds the data stored under one key.
///
/// The leaf sits in a slot of its parent branch at `height`, but its key addresses a slot at
/// the bottom of the tree. Every level in between has a single non-empty child, so those levels
/// are not stored: the leaf hash is the data hash folded up from the bottom with empty siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf<const HASH_SIZE: usize> {
    height: usize,
    path: NibblePath,
    data_hash: [u8; HASH_SIZE],
    value: Vec<u8>,
    node_hash: [u8; HASH_SIZE],
}

impl<const HASH_SIZE: usize> Leaf<HASH_SIZE> {
    /// Creates a new [`Leaf`] at `height`. This performs `tree_height - height` hashes.
    pub(crate) fn new<H: Hasher<HASH_SIZE>>(
        hasher: &TreeHasher<HASH_SIZE, H>,
        height: usize,
        path: NibblePath,
        data_hash: [u8; HASH_SIZE],
        value: Vec<u8>,
    ) -> Result<Self, TreeError> {
        debug_assert!(
            height % 4 == 0 && height > 0 && height <= hasher.tree_height(),
            "leaf height {height} is not a nibble boundary below the root"
        );
        debug_assert_eq!(path.len() * 4, hasher.tree_height());
        debug_assert!(!value.is_empty());

        let node_hash = hasher.fold(data_hash, &path.bits(), hasher.tree_height(), height)?;
        Ok(Self {
            height,
            path,
            data_hash,
            value,
            node_hash,
        })
    }

    /// Same leaf moved to another height.
    fn with_height<H: Hasher<HASH_SIZE>>(
        &self,
        hasher: &TreeHasher<HASH_SIZE, H>,
        height: usize,
    ) -> Result<Self, TreeError> {
        Self::new(
            hasher,
            height,
            self.path.clone(),
            self.data_hash,
            self.value.clone(),
        )
    }

    /// Returns the hash of the node. NO HASHING IS DONE HERE.
    pub fn hash(&self) -> [u8; HASH_SIZE] {
        self.node_hash
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Full key of the leaf.
    pub fn path(&self) -> &NibblePath {
        &self.path
    }

    pub fn data_hash(&self) -> [u8; HASH_SIZE] {
        self.data_hash
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Stores `value` under `path` in place of this leaf.
    ///
    /// The same key replaces the data in place. Any other key turns the slot into a branch
    /// that fans out where the two keys diverge, with both leaves pushed down one level below the
    /// fan-out.
    pub(crate) fn update<H: Hasher<HASH_SIZE>>(
        &self,
        this: &Arc<Node<HASH_SIZE>>,
        hasher: &TreeHasher<HASH_SIZE, H>,
        path: &NibblePath,
        data_hash: [u8; HASH_SIZE],
        value: &[u8],
    ) -> Result<Arc<Node<HASH_SIZE>>, TreeError> {
        if self.path == *path {
            if self.data_hash == data_hash && self.value == value {
                return Ok(this.clone());
            }
            debug!(path = %path, height = self.height, "overwriting leaf data");
            let value = value.to_vec();
            let leaf = Self::new(hasher, self.height, path.clone(), data_hash, value)?;
            return Ok(Arc::new(Node::Leaf(leaf)));
        }

        let prefix = NibblePath::common_prefix(&self.path, path);
        let fanout = prefix.len();
        let child_height = (fanout + 1) * 4;
        debug_assert!(fanout * 4 >= self.height);
        trace!(height = self.height, prefix = %prefix, child_height, "splitting leaf");

        let mut children: [Option<Arc<Node<HASH_SIZE>>>; RADIX] = Default::default();
        let demoted = self.with_height(hasher, child_height)?;
        children[self.path.symbol_at(fanout)? as usize] = Some(Arc::new(Node::Leaf(demoted)));
        let value = value.to_vec();
        let inserted = Self::new(hasher, child_height, path.clone(), data_hash, value)?;
        children[path.symbol_at(fanout)? as usize] = Some(Arc::new(Node::Leaf(inserted)));

        let branch = Branch::new(hasher, self.height, prefix, children)?;
        Ok(Arc::new(Node::Branch(branch)))
    }
}

impl<const HASH_SIZE: usize> Display for Leaf<HASH_SIZE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = String::from_utf8_lossy(&self.value);
        let preview: String = text.chars().take(VALUE_PREVIEW_CHARS).collect();
        let ellipsis = if text.chars().count() > VALUE_PREVIEW_CHARS {
            "..."
        } else {
            ""
        };
        write!(
            f,
            "Leaf {{ height: {}, path: \"{}\", data_hash: {}, hash: {}, value: (length={}) {}{} }}",
            self.height,
            self.path,
            hex::encode(self.data_hash),
            hex::encode(self.node_hash),
            self.value.len(),
            preview,
            ellipsis
        )
    }
}
