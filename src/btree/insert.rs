use std::mem;

use tracing::debug;

use super::error::{BTreeError, BTreeResult};
use super::node::{InternalNode, Node};
use super::BTree;

impl<K: Ord + Clone, V> BTree<K, V> {
    /// Insert a key-value pair into the tree
    ///
    /// # Returns
    /// * `Ok(())` - The entry was added
    /// * `Err(BTreeError::DuplicateKey)` - The key is already present; the tree is unchanged
    pub fn insert(&mut self, key: K, value: V) -> BTreeResult<()> {
        if self.contains_key(&key) {
            return Err(BTreeError::DuplicateKey);
        }

        self.insert_absent(key, value)?;
        self.entry_count += 1;

        self.debug_validate();
        Ok(())
    }

    /// Insert a key-value pair, replacing the payload of an existing key
    ///
    /// Returns the previous payload if the key was present.
    pub fn upsert(&mut self, key: K, value: V) -> BTreeResult<Option<V>> {
        if let Some(slot) = self.get_mut(&key) {
            return Ok(Some(mem::replace(slot, value)));
        }
        self.insert(key, value)?;
        Ok(None)
    }

    /// Top-down insert of a key known to be absent
    fn insert_absent(&mut self, key: K, value: V) -> BTreeResult<()> {
        if self.node(self.root)?.len() == self.max_keys() {
            let old_root = self.root;
            let new_root = self.allocate_node(Node::Internal(InternalNode::with_child(old_root)));
            self.root = new_root;
            self.split_child(new_root, 0)?;
            debug!(root = new_root, height = self.height(), "root split, tree grew");
        }

        let mut current = self.root;
        loop {
            let mut index = match self.node(current)? {
                Node::Leaf(_) => break,
                Node::Internal(node) => node.find_child_index(&key),
            };

            let child = self.child_of(current, index)?;
            if self.node(child)?.len() == self.max_keys() {
                self.split_child(current, index)?;
                // The promoted separator decides which half to enter
                if self
                    .internal(current)?
                    .keys
                    .get(index)
                    .is_some_and(|separator| &key >= separator)
                {
                    index += 1;
                }
            }

            current = self.child_of(current, index)?;
        }

        let replaced = self.leaf_mut(current)?.insert(key, value);
        debug_assert!(replaced.is_none());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{TreeConfig, Variant};
    use super::*;

    #[test]
    fn test_root_split_promotes_median() {
        let mut tree = BTree::with_config(TreeConfig::new(2, Variant::BTree)).unwrap();
        for key in [1, 2, 3, 4] {
            tree.insert(key, key * 10).unwrap();
        }

        assert_eq!(tree.height(), 2);
        assert_eq!(tree.root_keys(), &[2]);
    }

    #[test]
    fn test_root_split_copies_separator() {
        let mut tree = BTree::new(2).unwrap();
        for key in [1, 2, 3, 4] {
            tree.insert(key, key * 10).unwrap();
        }

        // Left leaf [1], right leaf [2, 3, 4]; the separator stays in the leaf too
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.root_keys(), &[2]);
        assert_eq!(tree.search(&2), Some(&20));
    }

    #[test]
    fn test_duplicate_leaves_tree_unchanged() {
        let mut tree = BTree::new(2).unwrap();
        for key in [10, 20, 30] {
            tree.insert(key, "first").unwrap();
        }
        let nodes_before = tree.node_count();

        // The root is full, but a rejected insert must not split it
        assert_eq!(tree.insert(20, "second"), Err(BTreeError::DuplicateKey));
        assert_eq!(tree.node_count(), nodes_before);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.search(&20), Some(&"first"));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_upsert() {
        let mut tree = BTree::with_config(TreeConfig::new(2, Variant::BTree)).unwrap();
        for key in 0..10 {
            assert_eq!(tree.upsert(key, key).unwrap(), None);
        }

        // Keys in internal nodes and in leaves are both overwritten in place
        for key in 0..10 {
            assert_eq!(tree.upsert(key, key + 100).unwrap(), Some(key));
        }

        assert_eq!(tree.len(), 10);
        for key in 0..10 {
            assert_eq!(tree.search(&key), Some(&(key + 100)));
        }
    }
}
