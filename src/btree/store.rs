//! Structural primitives: splitting a full child and refilling a minimal one

use tracing::trace;

use super::error::{BTreeError, BTreeResult};
use super::node::{Node, NodeId, Slot};
use super::BTree;

fn empty_node(id: NodeId) -> BTreeError {
    BTreeError::InvalidState(format!("node {id} is unexpectedly empty"))
}

impl<K: Ord + Clone, V> BTree<K, V> {
    /// Split the full child at `index` under `parent`
    ///
    /// The child keeps the lower half and a new right sibling takes the upper
    /// half. The parent gains one separator and one child:
    /// - B-tree nodes and all internal nodes promote their median key
    /// - B+ leaves copy the right half's first key upward and splice the new
    ///   leaf into the `next` chain
    pub(super) fn split_child(&mut self, parent: NodeId, index: usize) -> BTreeResult<()> {
        let child = self.child_of(parent, index)?;
        let leaves_only = self.leaves_only();
        debug_assert_eq!(self.node(child)?.len(), self.max_keys());

        let (separator, payload, right) = match self.node_mut(child)? {
            Node::Internal(node) => {
                let (median, payload, right) = node.split().ok_or_else(|| empty_node(child))?;
                (median, payload, Node::Internal(right))
            }
            Node::Leaf(node) if leaves_only => {
                let right = node.split();
                let separator = right.min_key().cloned().ok_or_else(|| empty_node(child))?;
                (separator, None, Node::Leaf(right))
            }
            Node::Leaf(node) => {
                let (median, payload, right) =
                    node.split_at_median().ok_or_else(|| empty_node(child))?;
                (median, Some(payload), Node::Leaf(right))
            }
        };

        let right_id = self.allocate_node(right);
        if leaves_only {
            if let Some(leaf) = self.node_mut(child)?.as_leaf_mut() {
                leaf.next = Some(right_id);
            }
        }
        self.internal_mut(parent)?
            .insert_separator(index, separator, payload, right_id);

        trace!(parent, child, right = right_id, "split child");
        Ok(())
    }

    /// Give the child at `index` under `parent` at least `t` keys before a
    /// delete descends into it
    ///
    /// Borrows from the left sibling, then the right sibling, and merges
    /// (preferring the left sibling) when neither can spare a key. Returns the
    /// index of the child now covering the original child's key range.
    pub(super) fn merge_or_borrow(&mut self, parent: NodeId, index: usize) -> BTreeResult<usize> {
        let min = self.min_keys();
        let (left, right) = {
            let node = self.internal(parent)?;
            let left = index
                .checked_sub(1)
                .and_then(|i| node.children.get(i).copied());
            (left, node.children.get(index + 1).copied())
        };

        if let Some(left) = left {
            if self.node(left)?.len() > min {
                self.borrow_from_left(parent, index)?;
                return Ok(index);
            }
        }
        if let Some(right) = right {
            if self.node(right)?.len() > min {
                self.borrow_from_right(parent, index)?;
                return Ok(index);
            }
        }

        match (left, right) {
            (Some(_), _) => {
                self.merge_children(parent, index - 1)?;
                Ok(index - 1)
            }
            (None, Some(_)) => {
                self.merge_children(parent, index)?;
                Ok(index)
            }
            (None, None) => Err(BTreeError::InvalidState(format!(
                "child {index} of node {parent} has no siblings"
            ))),
        }
    }

    /// Rotate the left sibling's last entry into the child at `index`
    fn borrow_from_left(&mut self, parent: NodeId, index: usize) -> BTreeResult<()> {
        let left = self.child_of(parent, index - 1)?;
        let child = self.child_of(parent, index)?;
        let leaf_chain = self.leaves_only() && self.node(child)?.is_leaf();

        let slot = self
            .node_mut(left)?
            .take_last()
            .ok_or_else(|| empty_node(left))?;

        let slot = if leaf_chain {
            // The moved key becomes the child's first key and thus its separator
            self.internal_mut(parent)?
                .replace_separator(index - 1, slot.key.clone(), None);
            slot
        } else {
            let (key, value) =
                self.internal_mut(parent)?
                    .replace_separator(index - 1, slot.key, slot.value);
            Slot {
                key,
                value,
                edge: slot.edge,
            }
        };
        self.node_mut(child)?.put_first(slot);

        trace!(parent, from = left, to = child, "borrowed from left sibling");
        Ok(())
    }

    /// Rotate the right sibling's first entry into the child at `index`
    fn borrow_from_right(&mut self, parent: NodeId, index: usize) -> BTreeResult<()> {
        let child = self.child_of(parent, index)?;
        let right = self.child_of(parent, index + 1)?;
        let leaf_chain = self.leaves_only() && self.node(child)?.is_leaf();

        let slot = self
            .node_mut(right)?
            .take_first()
            .ok_or_else(|| empty_node(right))?;

        let slot = if leaf_chain {
            let new_first = self
                .node(right)?
                .keys()
                .first()
                .cloned()
                .ok_or_else(|| empty_node(right))?;
            self.internal_mut(parent)?
                .replace_separator(index, new_first, None);
            slot
        } else {
            let (key, value) = self
                .internal_mut(parent)?
                .replace_separator(index, slot.key, slot.value);
            Slot {
                key,
                value,
                edge: slot.edge,
            }
        };
        self.node_mut(child)?.put_last(slot);

        trace!(parent, from = right, to = child, "borrowed from right sibling");
        Ok(())
    }

    /// Merge the children at `index` and `index + 1` into the left one
    ///
    /// The separator between them moves down into the merged node, except for
    /// B+ leaves where it only duplicated a leaf key and is dropped. The right
    /// node is freed; a merged B+ leaf takes over its `next` link.
    pub(super) fn merge_children(&mut self, parent: NodeId, index: usize) -> BTreeResult<()> {
        let left = self.child_of(parent, index)?;
        let right = self.child_of(parent, index + 1)?;
        let left_is_leaf = self.node(left)?.is_leaf();
        if left_is_leaf != self.node(right)?.is_leaf() {
            return Err(BTreeError::InvalidState(format!(
                "siblings {left} and {right} are at different depths"
            )));
        }

        let (key, value, removed) = self.internal_mut(parent)?.remove_separator(index);
        debug_assert_eq!(removed, right);

        let right_node = self.take_node(right)?;
        let separator = if self.leaves_only() && left_is_leaf {
            None
        } else {
            Some((key, value))
        };
        self.node_mut(left)?.absorb(separator, right_node)?;
        debug_assert!(self.node(left)?.len() <= self.max_keys());

        trace!(parent, left, right, "merged siblings");
        Ok(())
    }
}
