use tracing::{debug, trace};

use super::error::{BTreeError, BTreeResult};
use super::node::{Node, NodeId};
use super::BTree;

/// What a delete does at an internal node
enum Step {
    /// The key is this node's separator at the given index (B-tree layout)
    Separator(usize),
    /// The key lies below the child at the given index
    Descend(usize),
}

impl<K: Ord + Clone, V> BTree<K, V> {
    /// Delete the entry with the given key, treating absence as a normal outcome
    ///
    /// # Returns
    /// * `Ok(Some(value))` - The entry was removed
    /// * `Ok(None)` - The key was not present; the tree is unchanged
    pub fn remove(&mut self, key: &K) -> BTreeResult<Option<V>> {
        if !self.contains_key(key) {
            return Ok(None);
        }

        let root = self.root;
        let (_, value) = self.remove_below(root, key)?;
        self.shrink_root()?;
        self.entry_count -= 1;

        self.debug_validate();
        Ok(Some(value))
    }

    /// Delete the entry with the given key
    ///
    /// Same as [`BTree::remove`] but reports a missing key as
    /// `BTreeError::KeyNotFound`.
    pub fn delete(&mut self, key: &K) -> BTreeResult<V> {
        self.remove(key)?.ok_or(BTreeError::KeyNotFound)
    }

    /// Remove `key` from the subtree rooted at `start`
    ///
    /// `start` must be the root or hold at least `t` keys. Every child is
    /// brought up to `t` keys before the descent enters it, so the final leaf
    /// removal can never underflow.
    fn remove_below(&mut self, start: NodeId, key: &K) -> BTreeResult<(K, V)> {
        let leaves_only = self.leaves_only();
        let min = self.min_keys();
        let mut current = start;

        loop {
            let step = match self.node(current)? {
                Node::Leaf(_) => break,
                Node::Internal(node) => match node.keys.binary_search(key) {
                    Ok(index) if !leaves_only => Step::Separator(index),
                    _ => Step::Descend(node.find_child_index(key)),
                },
            };

            match step {
                Step::Separator(index) => {
                    if let Some(entry) = self.replace_with_neighbour(current, index)? {
                        return Ok(entry);
                    }
                    // Both neighbours are minimal: pull the key down into a merged child
                    self.merge_children(current, index)?;
                    current = self.child_of(current, index)?;
                }
                Step::Descend(mut index) => {
                    if self.node(self.child_of(current, index)?)?.len() <= min {
                        index = self.merge_or_borrow(current, index)?;
                    }
                    current = self.child_of(current, index)?;
                }
            }
        }

        self.leaf_mut(current)?
            .delete(key)
            .ok_or(BTreeError::KeyNotFound)
    }

    /// Replace the separator at `index` with its in-order predecessor or
    /// successor, removing that neighbour from its subtree
    ///
    /// Returns the evicted separator entry, or `None` when neither adjacent
    /// child can spare a key.
    fn replace_with_neighbour(&mut self, node: NodeId, index: usize) -> BTreeResult<Option<(K, V)>> {
        let min = self.min_keys();
        let left = self.child_of(node, index)?;
        let right = self.child_of(node, index + 1)?;

        let (key, value) = if self.node(left)?.len() > min {
            let predecessor = self.max_key_below(left)?.clone();
            self.remove_below(left, &predecessor)?
        } else if self.node(right)?.len() > min {
            let successor = self.min_key_below(right)?.clone();
            self.remove_below(right, &successor)?
        } else {
            return Ok(None);
        };

        let (old_key, old_value) =
            self.internal_mut(node)?
                .replace_separator(index, key, Some(value));
        let old_value = old_value.ok_or_else(|| {
            BTreeError::InvalidState(format!("separator {index} of node {node} has no payload"))
        })?;

        trace!(node, index, "replaced separator with neighbour");
        Ok(Some((old_key, old_value)))
    }

    /// Collapse keyless internal roots onto their only child
    fn shrink_root(&mut self) -> BTreeResult<()> {
        loop {
            let only_child = match self.node(self.root)? {
                Node::Internal(root) if root.is_empty() => root.children.first().copied(),
                _ => None,
            };
            let Some(child) = only_child else {
                return Ok(());
            };

            let old_root = self.root;
            self.root = child;
            self.free_node(old_root);
            debug!(root = child, height = self.height(), "root emptied, tree shrank");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{TreeConfig, Variant};
    use super::*;

    fn tree(variant: Variant, keys: impl IntoIterator<Item = i64>) -> BTree<i64, i64> {
        let mut tree = BTree::with_config(TreeConfig::new(2, variant)).unwrap();
        for key in keys {
            tree.insert(key, key * 10).unwrap();
        }
        tree
    }

    #[test]
    fn test_remove_missing_is_not_an_error() {
        let mut tree = tree(Variant::BPlusTree, 0..10);
        let nodes_before = tree.node_count();

        assert_eq!(tree.remove(&99).unwrap(), None);
        assert_eq!(tree.delete(&99), Err(BTreeError::KeyNotFound));
        assert_eq!(tree.len(), 10);
        assert_eq!(tree.node_count(), nodes_before);
    }

    #[test]
    fn test_delete_internal_separator_uses_predecessor() {
        // Root [10] over leaves [5, 6, 7] and [20]
        let mut tree = tree(Variant::BTree, [10, 20, 5, 6, 7]);
        assert_eq!(tree.root_keys(), &[10]);

        assert_eq!(tree.delete(&10).unwrap(), 100);
        assert_eq!(tree.root_keys(), &[7]);
        assert_eq!(tree.search(&10), None);
        tree.validate().unwrap();
    }

    #[test]
    fn test_delete_internal_separator_uses_successor() {
        // Root [10] over leaves [5] and [20, 30]
        let mut tree = tree(Variant::BTree, [10, 20, 5, 30]);
        assert_eq!(tree.root_keys(), &[10]);

        tree.delete(&10).unwrap();
        assert_eq!(tree.root_keys(), &[20]);
        tree.validate().unwrap();
    }

    #[test]
    fn test_delete_internal_separator_merges() {
        // Root [10] over leaves [5] and [20]: deleting 10 collapses the root
        let mut tree = tree(Variant::BTree, [10, 20, 5, 30]);
        tree.delete(&30).unwrap();
        assert_eq!(tree.height(), 2);

        tree.delete(&10).unwrap();
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.root_keys(), &[5, 20]);
        tree.validate().unwrap();
    }

    #[test]
    fn test_borrow_from_left_leaf_updates_separator() {
        // Root [10, 12] over leaves [5, 6, 7], [10], [12, 20, 30]
        let mut tree = tree(Variant::BPlusTree, [10, 20, 5, 6, 12, 30, 7]);
        assert_eq!(tree.root_keys(), &[10, 12]);

        // [10] is minimal and its left sibling can spare 7
        tree.delete(&10).unwrap();
        assert_eq!(tree.root_keys(), &[7, 12]);
        assert_eq!(
            tree.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            vec![5, 6, 7, 12, 20, 30]
        );
        tree.validate().unwrap();
    }

    #[test]
    fn test_merge_relinks_leaf_chain() {
        let mut tree = tree(Variant::BPlusTree, 0..12);
        let before = tree.node_count();

        for key in 0..6 {
            tree.delete(&key).unwrap();
            tree.validate().unwrap();
        }

        assert!(tree.node_count() < before);
        assert_eq!(
            tree.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            (6..12).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_freed_nodes_are_recycled() {
        let mut tree = tree(Variant::BPlusTree, 0..50);
        for key in 0..50 {
            tree.delete(&key).unwrap();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);

        let slots = tree.nodes.len();
        for key in 0..50 {
            tree.insert(key, key).unwrap();
        }
        // Regrowing to the same size reuses the freed slots
        assert_eq!(tree.nodes.len(), slots);
    }
}
