mod branch;
mod leaf;

use std::fmt::{self, Display, Write};
use std::sync::Arc;

pub use branch::Branch;
pub use leaf::Leaf;

use crate::{Hasher, NibblePath, TreeError, TreeHasher};

/// Number of children of a [`Branch`], one per nibble value.
pub const RADIX: usize = 16;

/// All possible nodes in the tree.
///
/// Nodes are immutable once built. Updating the tree rebuilds the nodes on the path to the
/// modified leaf and shares every other subtree with the previous root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<const HASH_SIZE: usize> {
    /// A 16-way fan-out behind a compressed prefix
    Branch(Branch<HASH_SIZE>),
    /// A single key with its data
    Leaf(Leaf<HASH_SIZE>),
}

impl<const HASH_SIZE: usize> Node<HASH_SIZE> {
    /// Returns the hash of the node. NO HASHING IS DONE HERE.
    pub fn hash(&self) -> [u8; HASH_SIZE] {
        match self {
            Self::Branch(branch) => branch.hash(),
            Self::Leaf(leaf) => leaf.hash(),
        }
    }

    /// Height at which the node hash sits.
    pub fn height(&self) -> usize {
        match self {
            Self::Branch(branch) => branch.height(),
            Self::Leaf(leaf) => leaf.height(),
        }
    }

    /// Stores `value` under `path` in the subtree rooted at `this`.
    ///
    /// Returns the node replacing `this`, which is `this` itself when nothing changed.
    pub(crate) fn update<H: Hasher<HASH_SIZE>>(
        this: &Arc<Self>,
        hasher: &TreeHasher<HASH_SIZE, H>,
        path: &NibblePath,
        data_hash: [u8; HASH_SIZE],
        value: &[u8],
    ) -> Result<Arc<Self>, TreeError> {
        match this.as_ref() {
            Self::Branch(branch) => branch.update(this, hasher, path, data_hash, value),
            Self::Leaf(leaf) => leaf.update(this, hasher, path, data_hash, value),
        }
    }

    /// Finds the leaf stored under `path`.
    pub fn find(&self, path: &NibblePath) -> Option<&Leaf<HASH_SIZE>> {
        let mut current = self;
        loop {
            match current {
                Self::Branch(branch) => {
                    if !path.starts_with(branch.prefix()) {
                        return None;
                    }
                    let slot = path.symbol_at(branch.prefix().len()).ok()?;
                    current = branch.child(slot as usize)?;
                }
                Self::Leaf(leaf) => return (leaf.path() == path).then_some(leaf),
            }
        }
    }

    /// Number of leaves below this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Branch(branch) => branch.children().map(|(_, node)| node.leaf_count()).sum(),
            Self::Leaf(_) => 1,
        }
    }

    /// Writes one indented line per node of this subtree.
    pub(crate) fn dump(
        &self,
        out: &mut impl Write,
        slot: Option<usize>,
        depth: usize,
    ) -> fmt::Result {
        for _ in 0..depth {
            out.write_str("  ")?;
        }
        if let Some(slot) = slot {
            write!(out, "{:x}=", slot)?;
        }
        writeln!(out, "{}", self)?;
        if let Self::Branch(branch) = self {
            for (slot, child) in branch.children() {
                child.dump(out, Some(slot), depth + 1)?;
            }
        }
        Ok(())
    }
}

impl<const HASH_SIZE: usize> Display for Node<HASH_SIZE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(branch) => write!(f, "{}", branch),
            Self::Leaf(leaf) => write!(f, "{}", leaf),
        }
    }
}
