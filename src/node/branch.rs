use std::fmt::{self, Display};
use std::sync::Arc;

use tracing::trace;

use super::{Leaf, Node, RADIX};
use crate::{Hasher, NibblePath, TreeError, TreeHasher};

/// Binary levels spanned by one nibble.
const LEVELS: usize = 4;

/// A Branch fans out into 16 children after a compressed run of single-child levels.
///
/// The branch hash sits at `height`. Its `prefix` is the nibble path shared by every leaf below
/// it, from the tree root to the fan-out point at height `4 * prefix.len()`. Children sit one
/// nibble below the fan-out, in the slot given by the next nibble of their keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch<const HASH_SIZE: usize> {
    height: usize,
    prefix: NibblePath,
    children: [Option<Arc<Node<HASH_SIZE>>>; RADIX],
    /// Hash at the fan-out height
    fanout_hash: [u8; HASH_SIZE],
    node_hash: [u8; HASH_SIZE],
}

impl<const HASH_SIZE: usize> Branch<HASH_SIZE> {
    /// Root of an empty tree. NO HASHING IS DONE HERE.
    pub fn root<H: Hasher<HASH_SIZE>>(hasher: &TreeHasher<HASH_SIZE, H>) -> Self {
        let empty = hasher.defaults().root();
        Self {
            height: 0,
            prefix: NibblePath::empty(),
            children: Default::default(),
            fanout_hash: empty,
            node_hash: empty,
        }
    }

    /// Creates a new [`Branch`] and computes its hash from the children.
    pub(crate) fn new<H: Hasher<HASH_SIZE>>(
        hasher: &TreeHasher<HASH_SIZE, H>,
        height: usize,
        prefix: NibblePath,
        children: [Option<Arc<Node<HASH_SIZE>>>; RADIX],
    ) -> Result<Self, TreeError> {
        debug_assert!(
            height % LEVELS == 0 && height <= prefix.len() * LEVELS,
            "branch height {height} does not fit prefix of {} nibbles",
            prefix.len()
        );
        debug_assert!(children
            .iter()
            .flatten()
            .all(|child| child.height() == (prefix.len() + 1) * LEVELS));

        let fanout_hash = layers(hasher, &prefix, &children)[LEVELS][0];
        let node_hash = hasher.fold(fanout_hash, &prefix.bits(), prefix.len() * LEVELS, height)?;
        Ok(Self {
            height,
            prefix,
            children,
            fanout_hash,
            node_hash,
        })
    }

    /// Same branch moved to another height. Only the compressed levels are hashed again.
    fn with_height<H: Hasher<HASH_SIZE>>(
        &self,
        hasher: &TreeHasher<HASH_SIZE, H>,
        height: usize,
    ) -> Result<Self, TreeError> {
        debug_assert!(height % LEVELS == 0 && height <= self.fanout_height());
        let node_hash = hasher.fold(
            self.fanout_hash,
            &self.prefix.bits(),
            self.fanout_height(),
            height,
        )?;
        Ok(Self {
            height,
            prefix: self.prefix.clone(),
            children: self.children.clone(),
            fanout_hash: self.fanout_hash,
            node_hash,
        })
    }

    /// Returns the hash of the node. NO HASHING IS DONE HERE.
    pub fn hash(&self) -> [u8; HASH_SIZE] {
        self.node_hash
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn prefix(&self) -> &NibblePath {
        &self.prefix
    }

    /// Height at which the 16 children are combined.
    pub fn fanout_height(&self) -> usize {
        self.prefix.len() * LEVELS
    }

    pub fn child(&self, slot: usize) -> Option<&Node<HASH_SIZE>> {
        self.children.get(slot)?.as_deref()
    }

    pub fn child_arc(&self, slot: usize) -> Option<&Arc<Node<HASH_SIZE>>> {
        self.children.get(slot)?.as_ref()
    }

    /// Non-empty children with their slot.
    pub fn children(&self) -> impl Iterator<Item = (usize, &Node<HASH_SIZE>)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(slot, child)| child.as_deref().map(|child| (slot, child)))
    }

    /// Sibling hashes met when walking from `slot` up to the fan-out height, deepest first.
    pub(crate) fn fanout_siblings<H: Hasher<HASH_SIZE>>(
        &self,
        hasher: &TreeHasher<HASH_SIZE, H>,
        slot: usize,
    ) -> [[u8; HASH_SIZE]; LEVELS] {
        let layers = layers(hasher, &self.prefix, &self.children);
        let mut siblings = [[0; HASH_SIZE]; LEVELS];
        for (level, sibling) in siblings.iter_mut().enumerate() {
            *sibling = layers[level][(slot >> level) ^ 1];
        }
        siblings
    }

    /// Stores `value` under `path` in the subtree of this branch.
    ///
    /// A path under the prefix goes down to its slot. A path leaving the prefix splits the
    /// branch: a new branch takes its place where the paths diverge, with this branch and the
    /// new leaf as children.
    pub(crate) fn update<H: Hasher<HASH_SIZE>>(
        &self,
        this: &Arc<Node<HASH_SIZE>>,
        hasher: &TreeHasher<HASH_SIZE, H>,
        path: &NibblePath,
        data_hash: [u8; HASH_SIZE],
        value: &[u8],
    ) -> Result<Arc<Node<HASH_SIZE>>, TreeError> {
        let child_height = self.fanout_height() + LEVELS;

        if path.starts_with(&self.prefix) {
            let slot = path.symbol_at(self.prefix.len())? as usize;
            let child = match &self.children[slot] {
                Some(child) => {
                    let updated = Node::update(child, hasher, path, data_hash, value)?;
                    if Arc::ptr_eq(child, &updated) {
                        return Ok(this.clone());
                    }
                    updated
                }
                None => {
                    let leaf = Leaf::new(
                        hasher,
                        child_height,
                        path.clone(),
                        data_hash,
                        value.to_vec(),
                    )?;
                    Arc::new(Node::Leaf(leaf))
                }
            };
            let mut children = self.children.clone();
            children[slot] = Some(child);
            let branch = Self::new(hasher, self.height, self.prefix.clone(), children)?;
            return Ok(Arc::new(Node::Branch(branch)));
        }

        let prefix = NibblePath::common_prefix(&self.prefix, path);
        let fanout = prefix.len();
        let split_height = (fanout + 1) * LEVELS;
        trace!(
            height = self.height,
            prefix = %self.prefix,
            common = %prefix,
            split_height,
            "splitting branch"
        );

        let mut children: [Option<Arc<Node<HASH_SIZE>>>; RADIX] = Default::default();
        let demoted = self.with_height(hasher, split_height)?;
        children[self.prefix.symbol_at(fanout)? as usize] = Some(Arc::new(Node::Branch(demoted)));
        let leaf = Leaf::new(
            hasher,
            split_height,
            path.clone(),
            data_hash,
            value.to_vec(),
        )?;
        children[path.symbol_at(fanout)? as usize] = Some(Arc::new(Node::Leaf(leaf)));

        let branch = Self::new(hasher, self.height, prefix, children)?;
        Ok(Arc::new(Node::Branch(branch)))
    }
}

/// Hashes of the fan-out subtree, level by level from the children up.
///
/// Entry `i` holds the `16 >> i` hashes sitting `i` levels above the children, empty slots
/// filled with default hashes. The last entry holds the fan-out hash alone.
fn layers<const HASH_SIZE: usize, H: Hasher<HASH_SIZE>>(
    hasher: &TreeHasher<HASH_SIZE, H>,
    prefix: &NibblePath,
    children: &[Option<Arc<Node<HASH_SIZE>>>; RADIX],
) -> Vec<Vec<[u8; HASH_SIZE]>> {
    let child_height = (prefix.len() + 1) * LEVELS;
    let empty = hasher.default_hash(child_height);
    let mut layers = Vec::with_capacity(LEVELS + 1);
    layers.push(
        children
            .iter()
            .map(|child| child.as_ref().map_or(empty, |child| child.hash()))
            .collect::<Vec<_>>(),
    );

    for level in 1..=LEVELS {
        let empty = hasher.default_hash(child_height - level + 1);
        let parent = hasher.default_hash(child_height - level);
        let below = &layers[level - 1];
        let hashes = below
            .chunks_exact(2)
            .map(|pair| {
                if pair[0] == empty && pair[1] == empty {
                    parent
                } else {
                    hasher.merge(&pair[0], &pair[1])
                }
            })
            .collect();
        layers.push(hashes);
    }
    layers
}

impl<const HASH_SIZE: usize> Display for Branch<HASH_SIZE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Branch {{ height: {}, prefix: \"{}\", fanout: {}, hash: {} }}",
            self.height,
            self.prefix,
            self.children().count(),
            hex::encode(self.node_hash)
        )
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use hex_literal::hex;

    use super::{Branch, LEVELS};
    use crate::{Dsha256, NibblePath, Node, TreeHasher, Truncated};

    type Hasher24 = Truncated<Dsha256, 32, 3>;

    fn hasher() -> TreeHasher<3, Hasher24> {
        TreeHasher::new(Truncated(Dsha256))
    }

    fn insert(
        hasher: &TreeHasher<3, Hasher24>,
        root: &Arc<Node<3>>,
        value: &[u8],
    ) -> Arc<Node<3>> {
        let data_hash = hasher.hash(value);
        Node::update(
            root,
            hasher,
            &NibblePath::from_bytes(&data_hash),
            data_hash,
            value,
        )
        .unwrap()
    }

    fn root_with(hasher: &TreeHasher<3, Hasher24>, values: &[&[u8]]) -> Arc<Node<3>> {
        values.iter().fold(
            Arc::new(Node::Branch(Branch::root(hasher))),
            |root, value| insert(hasher, &root, value),
        )
    }

    fn branch(node: &Node<3>) -> &Branch<3> {
        match node {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected a branch"),
        }
    }

    #[test]
    fn test_empty_root() {
        let hasher = hasher();
        let root = Branch::root(&hasher);
        assert_eq!(root.hash(), hasher.default_hash(0));
        assert_eq!(root.children().count(), 0);
        let rebuilt = Branch::new(&hasher, 0, NibblePath::empty(), Default::default()).unwrap();
        assert_eq!(rebuilt, root);
    }

    #[test]
    fn test_single_child_matches_fold() {
        let hasher = hasher();
        let root = root_with(&hasher, &[b"hello"]);
        let data_hash = hex!("9595c9");
        let expected = hasher
            .fold(data_hash, &NibblePath::from_bytes(&data_hash).bits(), 24, 0)
            .unwrap();
        assert_eq!(root.hash(), expected);
    }

    #[test]
    fn test_fanout_siblings_rebuild_fanout_hash() {
        let hasher = hasher();
        let root = root_with(&hasher, &[b"hello", b"t-60"]);
        let inner = branch(branch(&root).child(9).unwrap());
        assert_eq!(inner.prefix().to_string(), "9");

        let slot = 5;
        let siblings = inner.fanout_siblings(&hasher, slot);
        let mut merkle = inner.child(slot).unwrap().hash();
        for (level, sibling) in siblings.iter().enumerate() {
            merkle = if (slot >> level) & 1 == 0 {
                hasher.merge(&merkle, sibling)
            } else {
                hasher.merge(sibling, &merkle)
            };
        }
        assert_eq!(merkle, inner.fanout_hash);
        // slot 4 is empty
        let child_height = inner.fanout_height() + LEVELS;
        assert_eq!(siblings[0], hasher.default_hash(child_height));
    }

    #[test]
    fn test_with_height_only_refolds_prefix() {
        let hasher = hasher();
        let root = root_with(&hasher, &[b"hello", b"t-60"]);
        let inner = branch(branch(&root).child(9).unwrap());
        assert_eq!(inner.height(), 4);
        let lifted = inner.with_height(&hasher, 0).unwrap();
        assert_eq!(lifted.fanout_hash, inner.fanout_hash);
        assert_eq!(
            lifted.hash(),
            hasher
                .fold(inner.hash(), &inner.prefix().bits(), 4, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_branch_split_on_divergent_prefix() {
        let hasher = hasher();
        // 9595c9 and 959df6 fan out after 959
        let root = root_with(&hasher, &[b"hello", b"hi-5515"]);
        let inner = branch(branch(&root).child(9).unwrap());
        assert_eq!(inner.height(), 4);
        assert_eq!(inner.prefix().to_string(), "959");
        assert_eq!(inner.child(5).unwrap().height(), 16);
        assert_eq!(inner.child(0xd).unwrap().height(), 16);

        // 9a7948 leaves the prefix after one nibble
        let root = insert(&hasher, &root, b"t-60");
        let split = branch(branch(&root).child(9).unwrap());
        assert_eq!(split.height(), 4);
        assert_eq!(split.prefix().to_string(), "9");
        let demoted = branch(split.child(5).unwrap());
        assert_eq!(demoted.height(), 8);
        assert_eq!(demoted.prefix().to_string(), "959");
        assert_eq!(demoted.fanout_hash, inner.fanout_hash);
        assert_eq!(split.child(0xa).unwrap().height(), 8);
        assert_eq!(root.leaf_count(), 3);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "does not fit prefix")]
    fn test_branch_below_its_fanout() {
        let hasher = hasher();
        let _ = Branch::new(&hasher, 4, NibblePath::empty(), Default::default());
    }

    #[test]
    fn test_display() {
        let hasher = hasher();
        let root = root_with(&hasher, &[b"hello", b"world"]);
        assert_eq!(
            format!("{}", root),
            format!(
                "Branch {{ height: 0, prefix: \"\", fanout: 2, hash: {} }}",
                hex::encode(root.hash())
            )
        );
    }
}
