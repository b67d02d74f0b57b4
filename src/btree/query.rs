//! Point lookups and ordered scans
//!
//! Range scans differ by layout:
//! - B+ tree: one descent to the first leaf in range, then a walk along the
//!   `next` chain
//! - B-tree: a bounded in-order traversal driven by an explicit stack, since
//!   payloads also live in internal nodes and there is no leaf chain

use std::iter::FusedIterator;

use super::error::{BTreeError, BTreeResult};
use super::node::{Node, NodeId};
use super::BTree;

impl<K: Ord + Clone, V> BTree<K, V> {
    /// Search for a key, returning its payload
    pub fn search(&self, key: &K) -> Option<&V> {
        let (id, index) = self.locate(key)?;
        match self.get_node(id)? {
            Node::Internal(node) => node.values.get(index),
            Node::Leaf(node) => node.search(key),
        }
    }

    /// Mutable access to the payload stored under `key`
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (id, index) = self.locate(key)?;
        match self.nodes.get_mut(id)?.as_mut()? {
            Node::Internal(node) => node.values.get_mut(index),
            Node::Leaf(node) => node.search_mut(key),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.locate(key).is_some()
    }

    /// Smallest entry in the tree
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.leaf(self.leftmost_leaf(self.root).ok()?).ok()?;
        Some((leaf.keys.first()?, leaf.values.first()?))
    }

    /// Largest entry in the tree
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.leaf(self.rightmost_leaf(self.root).ok()?).ok()?;
        Some((leaf.keys.last()?, leaf.values.last()?))
    }

    /// All entries with `low <= key <= high`, in ascending key order
    ///
    /// The scan is lazy and single-pass; ask again for a fresh one.
    ///
    /// # Returns
    /// * `Err(BTreeError::InvalidRange)` - If `low > high`
    pub fn range(&self, low: &K, high: &K) -> BTreeResult<Range<'_, K, V>> {
        if low > high {
            return Err(BTreeError::InvalidRange);
        }
        Ok(Range::new(self, Some(low), Some(high.clone())))
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> Range<'_, K, V> {
        Range::new(self, None, None)
    }

    /// Node and slot holding `key`
    ///
    /// B-tree lookups stop at the first node holding the key. B+ lookups treat
    /// internal matches only as a signpost and always finish in a leaf.
    fn locate(&self, key: &K) -> Option<(NodeId, usize)> {
        let leaves_only = self.leaves_only();
        let mut current = self.root;

        loop {
            match self.get_node(current)? {
                Node::Leaf(leaf) => {
                    return leaf.keys.binary_search(key).ok().map(|i| (current, i));
                }
                Node::Internal(node) => {
                    if !leaves_only {
                        if let Ok(i) = node.keys.binary_search(key) {
                            return Some((current, i));
                        }
                    }
                    current = *node.children.get(node.find_child_index(key))?;
                }
            }
        }
    }

    pub(super) fn leftmost_leaf(&self, from: NodeId) -> BTreeResult<NodeId> {
        let mut current = from;
        while !self.node(current)?.is_leaf() {
            current = self.child_of(current, 0)?;
        }
        Ok(current)
    }

    pub(super) fn rightmost_leaf(&self, from: NodeId) -> BTreeResult<NodeId> {
        let mut current = from;
        while let Node::Internal(node) = self.node(current)? {
            current = self.child_of(current, node.children.len().saturating_sub(1))?;
        }
        Ok(current)
    }

    /// Smallest key in the subtree rooted at `from`
    pub(super) fn min_key_below(&self, from: NodeId) -> BTreeResult<&K> {
        let leaf = self.leftmost_leaf(from)?;
        self.leaf(leaf)?
            .min_key()
            .ok_or_else(|| BTreeError::InvalidState(format!("leaf {leaf} is empty")))
    }

    /// Largest key in the subtree rooted at `from`
    pub(super) fn max_key_below(&self, from: NodeId) -> BTreeResult<&K> {
        let leaf = self.rightmost_leaf(from)?;
        self.leaf(leaf)?
            .max_key()
            .ok_or_else(|| BTreeError::InvalidState(format!("leaf {leaf} is empty")))
    }
}

/// Position of a scan inside the tree
enum Cursor {
    /// Walking the B+ leaf chain
    Chain { leaf: Option<NodeId>, index: usize },
    /// In-order traversal; each frame is (node, next key index to yield)
    Stack(Vec<(NodeId, usize)>),
}

/// Lazy ordered scan over a key range
///
/// Yields `(key, value)` pairs in ascending order and stops at the first key
/// past the upper bound. Borrowing the tree keeps it frozen for the lifetime
/// of the scan; dropping the scan early needs no cleanup.
pub struct Range<'a, K, V> {
    tree: &'a BTree<K, V>,
    cursor: Cursor,
    upper: Option<K>,
    done: bool,
}

impl<'a, K: Ord + Clone, V> Range<'a, K, V> {
    fn new(tree: &'a BTree<K, V>, lower: Option<&K>, upper: Option<K>) -> Self {
        let cursor = if tree.leaves_only() {
            let mut current = tree.root;
            while let Some(Node::Internal(node)) = tree.get_node(current) {
                let index = lower.map_or(0, |low| node.find_child_index(low));
                match node.children.get(index) {
                    Some(&child) => current = child,
                    None => break,
                }
            }
            let index = match (lower, tree.get_node(current)) {
                (Some(low), Some(node)) => node.keys().partition_point(|k| k < low),
                _ => 0,
            };
            Cursor::Chain {
                leaf: Some(current),
                index,
            }
        } else {
            let mut stack = Vec::new();
            Self::seek(tree, &mut stack, tree.root, lower);
            Cursor::Stack(stack)
        };

        Self {
            tree,
            cursor,
            upper,
            done: false,
        }
    }

    /// Push frames from `start` down to a leaf, skipping keys below `lower`
    fn seek(tree: &BTree<K, V>, stack: &mut Vec<(NodeId, usize)>, start: NodeId, lower: Option<&K>) {
        let mut current = Some(start);
        while let Some(id) = current {
            let Some(node) = tree.get_node(id) else {
                break;
            };
            let index = lower.map_or(0, |low| node.keys().partition_point(|k| k < low));
            stack.push((id, index));
            current = node.child(index);
        }
    }

    fn advance(&mut self) -> Option<(&'a K, &'a V)> {
        let tree = self.tree;
        match &mut self.cursor {
            Cursor::Chain { leaf, index } => loop {
                let node = tree.get_node((*leaf)?)?.as_leaf()?;
                if *index < node.len() {
                    let entry = (&node.keys[*index], node.values.get(*index)?);
                    *index += 1;
                    return Some(entry);
                }
                *leaf = node.next;
                *index = 0;
            },
            Cursor::Stack(stack) => loop {
                let (id, index) = stack.pop()?;
                let node = tree.get_node(id)?;
                if index < node.len() {
                    stack.push((id, index + 1));
                    if let Some(child) = node.child(index + 1) {
                        Self::seek(tree, stack, child, None);
                    }
                    let value = match node {
                        Node::Internal(node) => node.values.get(index)?,
                        Node::Leaf(node) => node.values.get(index)?,
                    };
                    return Some((&node.keys()[index], value));
                }
            },
        }
    }
}

impl<'a, K: Ord + Clone, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let entry = self.advance();
        let in_range = match (&entry, &self.upper) {
            (Some((key, _)), Some(upper)) => *key <= upper,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !in_range {
            self.done = true;
            return None;
        }
        entry
    }
}

impl<K: Ord + Clone, V> FusedIterator for Range<'_, K, V> {}

impl<'a, K: Ord + Clone, V> IntoIterator for &'a BTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Range<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
