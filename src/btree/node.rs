use std::mem;

use super::error::{BTreeError, BTreeResult};

/// Node identifier (index into node storage)
pub type NodeId = usize;

/// An entry moving between nodes during a rotation: the key, its payload
/// (absent for B+ tree separators) and the child edge that travels with it.
#[derive(Debug)]
pub(crate) struct Slot<K, V> {
    pub key: K,
    pub value: Option<V>,
    pub edge: Option<NodeId>,
}

/// Internal node: stores separator keys and child pointers
///
/// - children[i] holds keys < keys[i]
/// - children[i + 1] holds keys >= keys[i]
/// - children.len() == keys.len() + 1
#[derive(Debug, Clone)]
pub struct InternalNode<K, V> {
    /// Separator keys (sorted, unique)
    pub keys: Vec<K>,
    /// Payloads parallel to `keys`; always empty in a B+ tree
    pub values: Vec<V>,
    /// Child node IDs
    pub children: Vec<NodeId>,
}

impl<K: Ord, V> InternalNode<K, V> {
    /// Create a new internal node with given keys, payloads and children
    pub fn new(keys: Vec<K>, values: Vec<V>, children: Vec<NodeId>) -> Self {
        debug_assert_eq!(keys.len() + 1, children.len());
        Self {
            keys,
            values,
            children,
        }
    }

    /// A keyless node above a single child, used when the root grows
    pub fn with_child(child: NodeId) -> Self {
        Self::new(Vec::new(), Vec::new(), vec![child])
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Find the child index for a given key
    /// Returns the index of the first key > search key, so equal keys route right
    pub fn find_child_index(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k <= key)
    }

    /// Split this node around its median key
    /// This node keeps the lower half; the median key (and payload, if any)
    /// is returned for promotion together with the new right sibling
    pub fn split(&mut self) -> Option<(K, Option<V>, InternalNode<K, V>)> {
        if self.keys.is_empty() {
            return None;
        }
        let mid = self.keys.len() / 2;

        let right_keys = self.keys.split_off(mid + 1);
        let right_children = self.children.split_off(mid + 1);
        let right_values = if self.values.is_empty() {
            Vec::new()
        } else {
            self.values.split_off(mid + 1)
        };

        let median = self.keys.pop()?;
        let median_value = self.values.pop();

        Some((
            median,
            median_value,
            InternalNode::new(right_keys, right_values, right_children),
        ))
    }

    /// Insert a separator at `index` with `right` as the child after it
    pub fn insert_separator(&mut self, index: usize, key: K, value: Option<V>, right: NodeId) {
        self.keys.insert(index, key);
        if let Some(value) = value {
            self.values.insert(index, value);
        }
        self.children.insert(index + 1, right);
    }

    /// Remove the separator at `index` and the child to its right
    pub fn remove_separator(&mut self, index: usize) -> (K, Option<V>, NodeId) {
        let key = self.keys.remove(index);
        let value = (index < self.values.len()).then(|| self.values.remove(index));
        let right = self.children.remove(index + 1);
        (key, value, right)
    }

    /// Swap the separator at `index`, returning the old key and payload
    pub fn replace_separator(&mut self, index: usize, key: K, value: Option<V>) -> (K, Option<V>) {
        let old_key = mem::replace(&mut self.keys[index], key);
        let old_value = match value {
            Some(value) if index < self.values.len() => {
                Some(mem::replace(&mut self.values[index], value))
            }
            _ => None,
        };
        (old_key, old_value)
    }
}

/// Leaf node: stores key-value pairs, linked to next leaf in a B+ tree
#[derive(Debug, Clone)]
pub struct LeafNode<K, V> {
    /// Keys (sorted, unique)
    pub keys: Vec<K>,
    /// Values corresponding to keys
    pub values: Vec<V>,
    /// Link to next leaf for range queries (B+ tree only, never owning)
    pub next: Option<NodeId>,
}

impl<K: Ord, V> LeafNode<K, V> {
    /// Create a new empty leaf node
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            next: None,
        }
    }

    /// Create a leaf node with given entries
    pub fn with_entries(keys: Vec<K>, values: Vec<V>) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self {
            keys,
            values,
            next: None,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if leaf is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn search(&self, key: &K) -> Option<&V> {
        let i = self.keys.binary_search(key).ok()?;
        self.values.get(i)
    }

    /// Mutable access to the payload stored under `key`
    pub fn search_mut(&mut self, key: &K) -> Option<&mut V> {
        let i = self.keys.binary_search(key).ok()?;
        self.values.get_mut(i)
    }

    /// Insert a key-value pair in sorted order
    /// An existing payload for the same key is replaced and returned
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.keys.binary_search(&key) {
            Ok(i) => Some(mem::replace(&mut self.values[i], value)),
            Err(i) => {
                self.keys.insert(i, key);
                self.values.insert(i, value);
                None
            }
        }
    }

    /// Remove the entry with the given key
    pub fn delete(&mut self, key: &K) -> Option<(K, V)> {
        let i = self.keys.binary_search(key).ok()?;
        Some((self.keys.remove(i), self.values.remove(i)))
    }

    /// Get the minimum key in this leaf
    pub fn min_key(&self) -> Option<&K> {
        self.keys.first()
    }

    /// Get the maximum key in this leaf
    pub fn max_key(&self) -> Option<&K> {
        self.keys.last()
    }

    /// Split this leaf node, returning the new right sibling
    /// This node keeps the first half, new node gets the second half
    pub fn split(&mut self) -> LeafNode<K, V> {
        let mid = self.keys.len() / 2;

        let right_keys = self.keys.split_off(mid);
        let right_values = self.values.split_off(mid);

        let mut right = LeafNode::with_entries(right_keys, right_values);
        right.next = self.next.take();

        right
    }

    /// Split this leaf around its median entry, which is handed back for
    /// promotion into the parent (B-tree layout)
    pub fn split_at_median(&mut self) -> Option<(K, V, LeafNode<K, V>)> {
        if self.keys.is_empty() {
            return None;
        }
        let mid = self.keys.len() / 2;

        let right_keys = self.keys.split_off(mid + 1);
        let right_values = self.values.split_off(mid + 1);

        let key = self.keys.pop()?;
        let value = self.values.pop()?;

        Some((key, value, LeafNode::with_entries(right_keys, right_values)))
    }
}

impl<K: Ord, V> Default for LeafNode<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tree node (either internal or leaf)
#[derive(Debug, Clone)]
pub enum Node<K, V> {
    Internal(InternalNode<K, V>),
    Leaf(LeafNode<K, V>),
}

impl<K: Ord, V> Node<K, V> {
    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn keys(&self) -> &[K] {
        match self {
            Node::Internal(node) => &node.keys,
            Node::Leaf(node) => &node.keys,
        }
    }

    /// Number of keys held by this node
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Child at `index`; always `None` for leaves
    pub fn child(&self, index: usize) -> Option<NodeId> {
        match self {
            Node::Internal(node) => node.children.get(index).copied(),
            Node::Leaf(_) => None,
        }
    }

    /// Get as internal node reference
    pub fn as_internal(&self) -> Option<&InternalNode<K, V>> {
        match self {
            Node::Internal(node) => Some(node),
            Node::Leaf(_) => None,
        }
    }

    /// Get as internal node mutable reference
    pub fn as_internal_mut(&mut self) -> Option<&mut InternalNode<K, V>> {
        match self {
            Node::Internal(node) => Some(node),
            Node::Leaf(_) => None,
        }
    }

    /// Get as leaf node reference
    pub fn as_leaf(&self) -> Option<&LeafNode<K, V>> {
        match self {
            Node::Internal(_) => None,
            Node::Leaf(node) => Some(node),
        }
    }

    /// Get as leaf node mutable reference
    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafNode<K, V>> {
        match self {
            Node::Internal(_) => None,
            Node::Leaf(node) => Some(node),
        }
    }

    /// Detach the last key with its payload and, for internal nodes, the last child
    pub(crate) fn take_last(&mut self) -> Option<Slot<K, V>> {
        match self {
            Node::Internal(node) => {
                let key = node.keys.pop()?;
                let value = node.values.pop();
                let edge = node.children.pop();
                Some(Slot { key, value, edge })
            }
            Node::Leaf(node) => {
                let key = node.keys.pop()?;
                let value = node.values.pop();
                Some(Slot {
                    key,
                    value,
                    edge: None,
                })
            }
        }
    }

    /// Detach the first key with its payload and, for internal nodes, the first child
    pub(crate) fn take_first(&mut self) -> Option<Slot<K, V>> {
        let (keys, values) = match self {
            Node::Internal(node) => (&mut node.keys, &mut node.values),
            Node::Leaf(node) => (&mut node.keys, &mut node.values),
        };
        if keys.is_empty() {
            return None;
        }
        let key = keys.remove(0);
        let value = (!values.is_empty()).then(|| values.remove(0));
        let edge = match self {
            Node::Internal(node) if !node.children.is_empty() => Some(node.children.remove(0)),
            _ => None,
        };
        Some(Slot { key, value, edge })
    }

    /// Prepend an entry taken from a left neighbour
    pub(crate) fn put_first(&mut self, slot: Slot<K, V>) {
        match self {
            Node::Internal(node) => {
                node.keys.insert(0, slot.key);
                if let Some(value) = slot.value {
                    node.values.insert(0, value);
                }
                if let Some(edge) = slot.edge {
                    node.children.insert(0, edge);
                }
            }
            Node::Leaf(node) => {
                node.keys.insert(0, slot.key);
                if let Some(value) = slot.value {
                    node.values.insert(0, value);
                }
            }
        }
    }

    /// Append an entry taken from a right neighbour
    pub(crate) fn put_last(&mut self, slot: Slot<K, V>) {
        match self {
            Node::Internal(node) => {
                node.keys.push(slot.key);
                if let Some(value) = slot.value {
                    node.values.push(value);
                }
                if let Some(edge) = slot.edge {
                    node.children.push(edge);
                }
            }
            Node::Leaf(node) => {
                node.keys.push(slot.key);
                if let Some(value) = slot.value {
                    node.values.push(value);
                }
            }
        }
    }

    /// Append the right sibling's contents to this node
    ///
    /// `separator` is the parent key pulled down between the two halves; a B+
    /// tree leaf merge passes `None` since the separator only duplicates a leaf
    /// key. The merged leaf inherits the right sibling's `next` link.
    pub fn absorb(&mut self, separator: Option<(K, Option<V>)>, right: Node<K, V>) -> BTreeResult<()> {
        match (self, right) {
            (Node::Internal(left), Node::Internal(right)) => {
                if let Some((key, value)) = separator {
                    left.keys.push(key);
                    left.values.extend(value);
                }
                left.keys.extend(right.keys);
                left.values.extend(right.values);
                left.children.extend(right.children);
                Ok(())
            }
            (Node::Leaf(left), Node::Leaf(right)) => {
                if let Some((key, value)) = separator {
                    left.keys.push(key);
                    left.values.extend(value);
                }
                left.keys.extend(right.keys);
                left.values.extend(right.values);
                left.next = right.next;
                Ok(())
            }
            _ => Err(BTreeError::InvalidState(
                "cannot merge nodes of different kinds".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(keys: &[i64]) -> LeafNode<i64, String> {
        LeafNode::with_entries(keys.to_vec(), keys.iter().map(|k| format!("v{k}")).collect())
    }

    #[test]
    fn test_leaf_node_insert() {
        let mut leaf = LeafNode::new();

        assert_eq!(leaf.insert(5, "a"), None);
        assert_eq!(leaf.insert(3, "b"), None);
        assert_eq!(leaf.insert(7, "c"), None);

        assert_eq!(leaf.len(), 3);
        assert_eq!(leaf.keys, vec![3, 5, 7]);
        assert_eq!(leaf.values, vec!["b", "a", "c"]);

        // Same key replaces the payload in place
        assert_eq!(leaf.insert(3, "d"), Some("b"));
        assert_eq!(leaf.keys, vec![3, 5, 7]);
        assert_eq!(leaf.search(&3), Some(&"d"));
    }

    #[test]
    fn test_leaf_node_search() {
        let leaf = leaf(&[3, 5, 7]);

        assert_eq!(leaf.search(&5), Some(&"v5".to_string()));
        assert_eq!(leaf.search(&4), None);
        assert_eq!(leaf.search(&10), None);
    }

    #[test]
    fn test_leaf_node_delete() {
        let mut leaf = leaf(&[3, 5, 7]);

        assert_eq!(leaf.delete(&5), Some((5, "v5".to_string())));
        assert_eq!(leaf.len(), 2);
        assert_eq!(leaf.search(&5), None);

        assert_eq!(leaf.delete(&5), None); // Already deleted
    }

    #[test]
    fn test_leaf_node_split() {
        let mut left = leaf(&[0, 1, 2, 3, 4]);
        left.next = Some(9);

        let right = left.split();

        assert_eq!(left.keys, vec![0, 1]);
        assert_eq!(right.keys, vec![2, 3, 4]);
        assert_eq!(left.max_key(), Some(&1));
        assert_eq!(right.min_key(), Some(&2));
        // The right half inherits the old forward link
        assert_eq!(left.next, None);
        assert_eq!(right.next, Some(9));
    }

    #[test]
    fn test_leaf_node_split_at_median() {
        let mut left = leaf(&[0, 1, 2, 3, 4]);

        let (key, value, right) = left.split_at_median().unwrap();

        assert_eq!(key, 2);
        assert_eq!(value, "v2");
        assert_eq!(left.keys, vec![0, 1]);
        assert_eq!(right.keys, vec![3, 4]);
        assert_eq!(right.values, vec!["v3", "v4"]);
    }

    #[test]
    fn test_internal_node_find_child() {
        let node: InternalNode<i64, ()> = InternalNode::new(vec![3, 7, 12], vec![], vec![0, 1, 2, 3]);

        assert_eq!(node.find_child_index(&1), 0); // < 3, go to child 0
        assert_eq!(node.find_child_index(&3), 1); // == 3, routes right
        assert_eq!(node.find_child_index(&5), 1);
        assert_eq!(node.find_child_index(&7), 2);
        assert_eq!(node.find_child_index(&10), 2);
        assert_eq!(node.find_child_index(&15), 3); // > all, go to last child
    }

    #[test]
    fn test_internal_node_split() {
        let mut node: InternalNode<i64, &str> =
            InternalNode::new(vec![10, 20, 30], vec![], vec![0, 1, 2, 3]);

        let (median, value, right) = node.split().unwrap();

        assert_eq!(median, 20);
        assert_eq!(value, None);
        assert_eq!(node.keys, vec![10]);
        assert_eq!(node.children, vec![0, 1]);
        assert_eq!(right.keys, vec![30]);
        assert_eq!(right.children, vec![2, 3]);
    }

    #[test]
    fn test_internal_node_split_with_payloads() {
        let mut node = InternalNode::new(vec![10, 20, 30], vec!["a", "b", "c"], vec![0, 1, 2, 3]);

        let (median, value, right) = node.split().unwrap();

        assert_eq!(median, 20);
        assert_eq!(value, Some("b"));
        assert_eq!(node.values, vec!["a"]);
        assert_eq!(right.values, vec!["c"]);
    }

    #[test]
    fn test_internal_node_separators() {
        let mut node = InternalNode::new(vec![10, 30], vec!["a", "c"], vec![0, 2, 3]);

        node.insert_separator(1, 20, Some("b"), 1);
        assert_eq!(node.keys, vec![10, 20, 30]);
        assert_eq!(node.values, vec!["a", "b", "c"]);
        assert_eq!(node.children, vec![0, 2, 1, 3]);

        assert_eq!(node.replace_separator(1, 25, Some("x")), (20, Some("b")));
        assert_eq!(node.remove_separator(1), (25, Some("x"), 1));
        assert_eq!(node.keys, vec![10, 30]);
        assert_eq!(node.children, vec![0, 2, 3]);
    }

    #[test]
    fn test_rotation_slots() {
        let mut left: Node<i64, &str> =
            Node::Internal(InternalNode::new(vec![1, 2], vec![], vec![10, 11, 12]));
        let mut right: Node<i64, &str> =
            Node::Internal(InternalNode::new(vec![8], vec![], vec![13, 14]));

        let slot = left.take_last().unwrap();
        assert_eq!((slot.key, slot.value, slot.edge), (2, None, Some(12)));

        right.put_first(Slot {
            key: 5,
            value: None,
            edge: Some(12),
        });
        let right = right.as_internal().unwrap();
        assert_eq!(right.keys, vec![5, 8]);
        assert_eq!(right.children, vec![12, 13, 14]);

        let mut leaf_node = Node::Leaf(leaf(&[4, 6]));
        let slot = leaf_node.take_first().unwrap();
        assert_eq!(slot.key, 4);
        assert_eq!(slot.value.as_deref(), Some("v4"));
        assert_eq!(slot.edge, None);
        leaf_node.put_last(slot);
        assert_eq!(leaf_node.keys(), &[6, 4]);
    }

    #[test]
    fn test_absorb() {
        let mut left = Node::Leaf(leaf(&[1, 2]));
        let mut right = leaf(&[5, 6]);
        right.next = Some(42);

        left.absorb(None, Node::Leaf(right)).unwrap();
        let merged = left.as_leaf().unwrap();
        assert_eq!(merged.keys, vec![1, 2, 5, 6]);
        assert_eq!(merged.next, Some(42));

        let mut left = Node::Leaf(leaf(&[1]));
        left.absorb(Some((3, Some("v3".to_string()))), Node::Leaf(leaf(&[5])))
            .unwrap();
        assert_eq!(left.keys(), &[1, 3, 5]);
        assert_eq!(left.as_leaf().unwrap().values, vec!["v1", "v3", "v5"]);

        let internal: Node<i64, String> = Node::Internal(InternalNode::with_child(0));
        assert!(left.absorb(None, internal).is_err());
    }
}
