//! B-tree / B+ tree implementation for in-memory indexing
//!
//! This module provides an ordered multiway search tree with two storage
//! layouts selected by [`Variant`]:
//! - `BTree`: payloads live in every node next to their key
//! - `BPlusTree`: payloads live only in leaves, separator keys are copied
//!   upward and leaves are linked for range scans
//!
//! Nodes live in an arena (`Vec<Option<Node>>` plus a free list) and refer to
//! each other by [`NodeId`]. Parent-to-child edges are owning by construction;
//! the leaf `next` link is a plain id used only for traversal.
//!
//! Insert and delete are single top-down passes: full children are split
//! before descending and minimal children are refilled before descending,
//! so no fix-up ever has to travel back up the tree.
//!
//! The tree is single-writer: mutation takes `&mut self`, reads and the lazy
//! [`Range`] iterator borrow `&self`, so a scan must finish (or be dropped)
//! before the next mutation can start.

mod config;
mod delete;
mod error;
mod insert;
mod node;
mod query;
mod store;
mod validate;

pub use config::{DEFAULT_MIN_DEGREE, TreeConfig, Variant};
pub use error::{BTreeError, BTreeResult};
pub use node::{InternalNode, LeafNode, Node, NodeId};
pub use query::Range;
pub use validate::TreeStats;

/// Ordered multiway search tree
///
/// Minimum degree `t` means:
/// - Every node holds at most `2t-1` keys
/// - Every node except the root holds at least `t-1` keys
/// - Internal nodes have exactly one more child than keys
/// - All leaves sit at the same depth
#[derive(Debug, Clone)]
pub struct BTree<K, V> {
    /// Root node ID (an empty leaf when the tree is empty)
    root: NodeId,

    config: TreeConfig,

    /// Node storage
    nodes: Vec<Option<Node<K, V>>>,

    /// Free list for recycling deleted nodes
    free_list: Vec<NodeId>,

    /// Total number of entries in the tree
    entry_count: usize,
}

impl<K: Ord + Clone, V> BTree<K, V> {
    /// Create a new empty B+ tree with the given minimum degree
    ///
    /// # Returns
    /// * `Ok(BTree)` - A new empty tree
    /// * `Err(BTreeError::InvalidOrder)` - If `min_degree < 2`
    pub fn new(min_degree: usize) -> BTreeResult<Self> {
        Self::with_config(TreeConfig::new(min_degree, Variant::BPlusTree))
    }

    /// Create a new empty tree from a full configuration
    pub fn with_config(config: TreeConfig) -> BTreeResult<Self> {
        config.validate()?;
        Ok(Self::empty(config))
    }

    fn empty(config: TreeConfig) -> Self {
        Self {
            root: 0,
            config,
            nodes: vec![Some(Node::Leaf(LeafNode::new()))],
            free_list: Vec::new(),
            entry_count: 0,
        }
    }

    pub fn config(&self) -> TreeConfig {
        self.config
    }

    pub fn min_degree(&self) -> usize {
        self.config.min_degree
    }

    pub fn variant(&self) -> Variant {
        self.config.variant
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Get number of entries in the tree
    pub fn len(&self) -> usize {
        self.entry_count
    }

    /// Get tree height (1 for a lone root leaf, 2+ once internal nodes exist)
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root;

        while let Some(Node::Internal(node)) = self.get_node(current) {
            if let Some(&child_id) = node.children.first() {
                current = child_id;
                height += 1;
            } else {
                break;
            }
        }

        height
    }

    /// Drop every entry, leaving an empty root leaf
    pub fn clear(&mut self) {
        *self = Self::empty(self.config);
    }

    /// Keys currently held by the root node
    pub fn root_keys(&self) -> &[K] {
        self.get_node(self.root).map(Node::keys).unwrap_or(&[])
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    fn leaves_only(&self) -> bool {
        self.config.variant.stores_values_in_leaves_only()
    }

    /// Maximum keys in a node (2t-1)
    fn max_keys(&self) -> usize {
        self.config.max_keys()
    }

    /// Minimum keys in a non-root node (t-1)
    fn min_keys(&self) -> usize {
        self.config.min_keys()
    }

    // ========== Node Management ==========

    /// Allocate a new node, returning its ID
    fn allocate_node(&mut self, node: Node<K, V>) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            let id = self.nodes.len();
            self.nodes.push(Some(node));
            id
        }
    }

    /// Free a node, adding it to the free list
    fn free_node(&mut self, id: NodeId) {
        if let Some(slot) = self.nodes.get_mut(id) {
            if slot.take().is_some() {
                self.free_list.push(id);
            }
        }
    }

    /// Remove a node from storage and hand it back
    fn take_node(&mut self, id: NodeId) -> BTreeResult<Node<K, V>> {
        let node = self
            .nodes
            .get_mut(id)
            .and_then(Option::take)
            .ok_or(BTreeError::NodeNotFound(id))?;
        self.free_list.push(id);
        Ok(node)
    }

    /// Get a reference to a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.nodes.get(id).and_then(|n| n.as_ref())
    }

    fn node(&self, id: NodeId) -> BTreeResult<&Node<K, V>> {
        self.get_node(id).ok_or(BTreeError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> BTreeResult<&mut Node<K, V>> {
        self.nodes
            .get_mut(id)
            .and_then(|n| n.as_mut())
            .ok_or(BTreeError::NodeNotFound(id))
    }

    fn internal(&self, id: NodeId) -> BTreeResult<&InternalNode<K, V>> {
        self.node(id)?
            .as_internal()
            .ok_or_else(|| BTreeError::InvalidState(format!("node {id} is not internal")))
    }

    fn internal_mut(&mut self, id: NodeId) -> BTreeResult<&mut InternalNode<K, V>> {
        self.node_mut(id)?
            .as_internal_mut()
            .ok_or_else(|| BTreeError::InvalidState(format!("node {id} is not internal")))
    }

    fn leaf(&self, id: NodeId) -> BTreeResult<&LeafNode<K, V>> {
        self.node(id)?
            .as_leaf()
            .ok_or_else(|| BTreeError::InvalidState(format!("node {id} is not a leaf")))
    }

    fn leaf_mut(&mut self, id: NodeId) -> BTreeResult<&mut LeafNode<K, V>> {
        self.node_mut(id)?
            .as_leaf_mut()
            .ok_or_else(|| BTreeError::InvalidState(format!("node {id} is not a leaf")))
    }

    /// ID of the child at `index` under `parent`
    fn child_of(&self, parent: NodeId, index: usize) -> BTreeResult<NodeId> {
        self.internal(parent)?
            .children
            .get(index)
            .copied()
            .ok_or_else(|| BTreeError::InvalidState(format!("node {parent} has no child {index}")))
    }
}

impl<K: Ord + Clone, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self::empty(TreeConfig::default())
    }
}
