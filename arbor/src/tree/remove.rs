//! Removal and rebalancing
//!
//! Two strategies are available, selected per tree by [`Rebalance`]:
//!
//! Simplified: an underflowing node is cut out of the tree and its keys are re-inserted from its
//! parent. Separators dropped from internal nodes are not replaced by a successor, so after
//! removals the tree can end up with fewer children than keys + 1 in places and descent may pick
//! a neighbouring leaf. Membership stays exact because search visits every leaf and insertion
//! refuses a key already held by any leaf.
//!
//! Merge: classic B+Tree deletion, borrowing from or merging with an adjacent sibling.

use super::arbor::{Arbor, ArborKey, Rebalance};
use super::compare::Comparator;
use super::sparse::NodeId;

impl<T, C> Arbor<T, C>
where
    T: ArborKey,
    C: Comparator<T>,
{
    /// Remove a key and return the (possibly new) root.
    ///
    /// Removing a key which isn't in the tree logs a warning and leaves the tree unchanged.
    pub fn remove(&mut self, value: &T) -> NodeId {
        tracing::debug!("REMOVING: {:?}", value);
        match self.rebalance {
            Rebalance::Simplified => self.remove_flattening(value),
            Rebalance::Merge => self.remove_merging(value),
        }
        self.root
    }

    fn remove_flattening(&mut self, value: &T) {
        let Some(leaf) = self.find(value) else {
            tracing::warn!("attempted to remove a value not present in the tree: {value:?}");
            return;
        };
        let ancestors = self.ancestors(leaf);

        // Keys of detached nodes, and the node they are re-inserted from
        let mut orphans = vec![];
        let mut landing = None;

        if let Some((parent, keys)) = self.purge(leaf, value) {
            landing = Some(parent);
            orphans.extend(keys);
        }

        // Clean separator copies out of the ancestors, root first. Once an ancestor is detached
        // everything below it has gone with it.
        for ancestor in ancestors.into_iter().rev() {
            if let Some((parent, keys)) = self.purge(ancestor, value) {
                landing = Some(parent);
                orphans.extend(keys);
                break;
            }
        }

        let Some(landing) = landing else {
            return;
        };
        orphans.retain(|key| !self.comparator.equivalent(key, value));
        orphans.sort_by(|a, b| self.comparator.ordering(a, b));
        orphans.dedup_by(|a, b| self.comparator.equivalent(a, b));
        tracing::debug!("Re-homing {} keys from {landing}", orphans.len());
        for key in orphans {
            // Re-homing can split the landing node itself
            let start = if self.nodes.contains(landing) {
                landing
            } else {
                self.root
            };
            let target = self.choose_insertion_node(start, &key);
            self.place(target, key);
        }
    }

    /// Force-remove `value` from `target`.
    ///
    /// If that leaves a non-root node below `order / 2` keys, the node is detached from its
    /// parent and dropped along with its subtree. The parent and the keys held by the dropped
    /// leaves are returned so the caller can re-home them.
    fn purge(&mut self, target: NodeId, value: &T) -> Option<(NodeId, Vec<T>)> {
        let min = self.min_keys();
        let node = self.nodes.get_mut(target);
        node.remove_key(value, &self.comparator)?;
        let parent = node.parent()?;
        if node.len() >= min {
            return None;
        }
        tracing::debug!(
            "Flattening node {target} into {parent}, {} keys left",
            node.len()
        );
        let parent_node = self.nodes.get_mut(parent);
        parent_node.remove_child(target);
        if parent_node.is_leaf() {
            // Left without children, its separator copies would read as stored keys
            parent_node.keys_mut().clear();
        }
        let orphans = self
            .nodes
            .take_subtree(target)
            .into_iter()
            .filter(|node| node.is_leaf())
            .flat_map(|node| node.into_keys())
            .collect();
        Some((parent, orphans))
    }

    /// Parent, grandparent, ... up to the root.
    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = vec![];
        let mut cursor = self.nodes.get(id).parent();
        while let Some(parent) = cursor {
            ancestors.push(parent);
            cursor = self.nodes.get(parent).parent();
        }
        ancestors
    }

    fn remove_merging(&mut self, value: &T) {
        let leaf = self.choose_insertion_node(self.root, value);
        if self
            .nodes
            .get_mut(leaf)
            .remove_key(value, &self.comparator)
            .is_none()
        {
            tracing::warn!("attempted to remove a value not present in the tree: {value:?}");
            return;
        }
        self.rebalance_from(leaf);
    }

    fn rebalance_from(&mut self, mut target: NodeId) {
        let min = self.min_keys();
        loop {
            let node = self.nodes.get(target);
            let Some(parent) = node.parent() else {
                // A root emptied by a merge hands over to its only child
                if !node.is_leaf() && node.is_empty() {
                    let child = node.children()[0];
                    tracing::debug!("Collapsing root {target} into {child}");
                    self.nodes.take(target);
                    self.nodes.get_mut(child).set_parent(None);
                    self.root = child;
                }
                return;
            };
            if node.len() >= min {
                return;
            }

            let parent_node = self.nodes.get(parent);
            let Some(index) = parent_node.child_position(target) else {
                tracing::error!("node {target} is not a child of its parent {parent}");
                return;
            };
            let siblings = parent_node.children();
            let left = index.checked_sub(1).map(|i| siblings[i]);
            let right = siblings.get(index + 1).copied();

            if let Some(left) = left {
                if self.nodes.get(left).len() > min {
                    self.borrow_from_left(parent, index);
                    return;
                }
            }
            if let Some(right) = right {
                if self.nodes.get(right).len() > min {
                    self.borrow_from_right(parent, index);
                    return;
                }
            }
            match (left, right) {
                (Some(_), _) => self.merge_children(parent, index - 1),
                (None, Some(_)) => self.merge_children(parent, index),
                (None, None) => return,
            }
            target = parent;
        }
    }

    /// Move the last key (and child) of `children[index - 1]` to the front of `children[index]`.
    fn borrow_from_left(&mut self, parent: NodeId, index: usize) {
        let children = self.nodes.get(parent).children();
        let (left, target) = (children[index - 1], children[index]);
        tracing::debug!("Node {target} borrowing from {left}");

        let donor = self.nodes.get_mut(left);
        let Some(key) = donor.keys_mut().pop() else {
            return;
        };
        let child = donor.children_mut().pop();

        let separator = &mut self.nodes.get_mut(parent).keys_mut()[index - 1];
        match child {
            None => {
                *separator = key.clone();
                self.nodes.get_mut(target).keys_mut().insert(0, key);
            }
            Some(child) => {
                let separator = std::mem::replace(separator, key);
                let node = self.nodes.get_mut(target);
                node.keys_mut().insert(0, separator);
                node.insert_child(0, child);
                self.nodes.get_mut(child).set_parent(Some(target));
            }
        }
    }

    /// Move the first key (and child) of `children[index + 1]` to the end of `children[index]`.
    fn borrow_from_right(&mut self, parent: NodeId, index: usize) {
        let children = self.nodes.get(parent).children();
        let (target, right) = (children[index], children[index + 1]);
        tracing::debug!("Node {target} borrowing from {right}");

        let donor = self.nodes.get_mut(right);
        if donor.len() < 2 {
            return;
        }
        let key = donor.keys_mut().remove(0);
        let child = if donor.is_leaf() {
            None
        } else {
            Some(donor.children_mut().remove(0))
        };
        let donor_first = donor.keys()[0].clone();

        let separator = &mut self.nodes.get_mut(parent).keys_mut()[index];
        match child {
            None => {
                *separator = donor_first;
                self.nodes.get_mut(target).keys_mut().push(key);
            }
            Some(child) => {
                let separator = std::mem::replace(separator, key);
                let node = self.nodes.get_mut(target);
                node.keys_mut().push(separator);
                node.push_child(child);
                self.nodes.get_mut(child).set_parent(Some(target));
            }
        }
    }

    /// Fold `children[index + 1]` into `children[index]`, dropping their separator from the
    /// parent (internal nodes pull it down between the two halves).
    fn merge_children(&mut self, parent: NodeId, index: usize) {
        let parent_node = self.nodes.get_mut(parent);
        let separator = parent_node.keys_mut().remove(index);
        let right = parent_node.children_mut().remove(index + 1);
        let left = parent_node.children()[index];
        tracing::debug!("Merging node {right} into {left}");

        let (right_keys, right_children) = self.nodes.take(right).into_parts();
        let node = self.nodes.get_mut(left);
        if !right_children.is_empty() {
            node.keys_mut().push(separator);
        }
        node.keys_mut().extend(right_keys);
        node.children_mut().extend(right_children);
        self.adopt_children(left);
    }
}
