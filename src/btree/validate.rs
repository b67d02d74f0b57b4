//! Structural invariant checks and tree statistics

use serde::Serialize;

use super::config::Variant;
use super::error::{BTreeError, BTreeResult};
use super::node::{Node, NodeId};
use super::BTree;

/// Shape summary of a tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeStats {
    pub entries: usize,
    pub height: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub min_degree: usize,
    pub variant: Variant,
    /// Share of key slots in use across all nodes (0.0 - 1.0)
    pub fill_factor: f64,
}

/// Facts gathered during a depth-first walk
#[derive(Default)]
struct Walk {
    /// Leaves in key order
    leaves: Vec<NodeId>,
    leaf_depth: Option<usize>,
    entries: usize,
    nodes: usize,
}

fn violation(message: String) -> BTreeError {
    BTreeError::InvalidState(message)
}

impl<K: Ord + Clone, V> BTree<K, V> {
    /// Check every structural invariant
    ///
    /// - Keys within a node are sorted and unique
    /// - Non-root nodes hold between t-1 and 2t-1 keys
    /// - Every key respects the separators above it
    /// - All leaves are at the same depth
    /// - Payloads sit where the variant puts them
    /// - B+ leaves form one terminating chain in key order
    /// - Entry and node counts match the arena
    pub fn validate(&self) -> BTreeResult<()> {
        let mut walk = Walk::default();
        self.check_node(self.root, 0, None, None, &mut walk)?;

        if walk.entries != self.entry_count {
            return Err(violation(format!(
                "tree holds {} entries but counts {}",
                walk.entries, self.entry_count
            )));
        }
        if walk.nodes != self.node_count() {
            return Err(violation(format!(
                "{} nodes reachable but {} allocated",
                walk.nodes,
                self.node_count()
            )));
        }

        if self.leaves_only() {
            self.check_leaf_chain(&walk.leaves)
        } else {
            match walk.leaves.iter().find(|&&id| self.leaf(id).is_ok_and(|l| l.next.is_some())) {
                Some(id) => Err(violation(format!("B-tree leaf {id} has a next link"))),
                None => Ok(()),
            }
        }
    }

    fn check_node(
        &self,
        id: NodeId,
        depth: usize,
        lower: Option<&K>,
        upper: Option<&K>,
        walk: &mut Walk,
    ) -> BTreeResult<()> {
        let node = self.node(id)?;
        let keys = node.keys();
        let leaves_only = self.leaves_only();
        walk.nodes += 1;

        if id != self.root && keys.len() < self.min_keys() {
            return Err(violation(format!(
                "node {id} has {} keys, minimum is {}",
                keys.len(),
                self.min_keys()
            )));
        }
        if keys.len() > self.max_keys() {
            return Err(violation(format!(
                "node {id} has {} keys, maximum is {}",
                keys.len(),
                self.max_keys()
            )));
        }
        if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(violation(format!("keys of node {id} are not strictly increasing")));
        }

        // B+ right subtrees start at their separator; B-tree keys are never repeated
        if let (Some(low), Some(first)) = (lower, keys.first()) {
            if first < low || (!leaves_only && first == low) {
                return Err(violation(format!("node {id} holds a key below its separator")));
            }
        }
        if let (Some(high), Some(last)) = (upper, keys.last()) {
            if last >= high {
                return Err(violation(format!("node {id} holds a key at or above its separator")));
            }
        }

        match node {
            Node::Leaf(leaf) => {
                if leaf.values.len() != leaf.keys.len() {
                    return Err(violation(format!("leaf {id} has mismatched values")));
                }
                match walk.leaf_depth {
                    Some(expected) if expected != depth => {
                        return Err(violation(format!(
                            "leaf {id} at depth {depth}, expected {expected}"
                        )));
                    }
                    _ => walk.leaf_depth = Some(depth),
                }
                walk.leaves.push(id);
                walk.entries += leaf.len();
            }
            Node::Internal(internal) => {
                if internal.keys.is_empty() {
                    return Err(violation(format!("internal node {id} has no keys")));
                }
                if internal.children.len() != internal.keys.len() + 1 {
                    return Err(violation(format!(
                        "internal node {id} has {} keys but {} children",
                        internal.keys.len(),
                        internal.children.len()
                    )));
                }
                let expected_values = if leaves_only { 0 } else { internal.keys.len() };
                if internal.values.len() != expected_values {
                    return Err(violation(format!(
                        "internal node {id} carries {} payloads, expected {expected_values}",
                        internal.values.len()
                    )));
                }
                walk.entries += internal.values.len();

                for (i, &child) in internal.children.iter().enumerate() {
                    let child_lower = if i == 0 { lower } else { internal.keys.get(i - 1) };
                    let child_upper = internal.keys.get(i).or(upper);
                    self.check_node(child, depth + 1, child_lower, child_upper, walk)?;
                }
            }
        }

        Ok(())
    }

    /// Follow `next` from the leftmost leaf; it must visit `leaves` in order and stop
    fn check_leaf_chain(&self, leaves: &[NodeId]) -> BTreeResult<()> {
        let mut current = leaves.first().copied();
        for (position, &expected) in leaves.iter().enumerate() {
            if current != Some(expected) {
                return Err(violation(format!(
                    "leaf chain reaches {current:?} at position {position}, expected leaf {expected}"
                )));
            }
            current = self.leaf(expected)?.next;
        }
        match current {
            Some(id) => Err(violation(format!("leaf chain does not terminate (points to {id})"))),
            None => Ok(()),
        }
    }

    /// Run the full check in debug builds
    pub(super) fn debug_validate(&self) {
        debug_assert!(
            self.validate().is_ok(),
            "tree invariant violated: {:?}",
            self.validate()
        );
    }

    /// Collect shape statistics
    pub fn stats(&self) -> TreeStats {
        let (nodes, leaves, keys) = self
            .nodes
            .iter()
            .flatten()
            .fold((0, 0, 0), |(nodes, leaves, keys), node| {
                (nodes + 1, leaves + usize::from(node.is_leaf()), keys + node.len())
            });

        TreeStats {
            entries: self.entry_count,
            height: self.height(),
            nodes,
            leaves,
            min_degree: self.min_degree(),
            variant: self.variant(),
            fill_factor: keys as f64 / (nodes.max(1) * self.max_keys()) as f64,
        }
    }
}
