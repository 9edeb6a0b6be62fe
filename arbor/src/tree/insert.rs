//! Insertion and node splitting

use super::arbor::{Arbor, ArborKey};
use super::compare::Comparator;
use super::node::Node;
use super::sparse::NodeId;

impl<T, C> Arbor<T, C>
where
    T: ArborKey,
    C: Comparator<T>,
{
    /// Insert a key and return the (possibly new) root.
    ///
    /// Inserting a key which is already held by any leaf changes nothing.
    pub fn insert(&mut self, value: T) -> NodeId {
        tracing::debug!("INSERTING: {:?}", value);
        // Descent can miss the owning leaf once simplified removals have dropped separators
        if self.find(&value).is_some() {
            return self.root;
        }
        let target = self.choose_insertion_node(self.root, &value);
        self.place(target, value);
        self.root
    }

    /// Force-insert `value` into `target`, without searching, splitting as required.
    pub(crate) fn place(&mut self, target: NodeId, value: T) {
        let node = self.nodes.get_mut(target);
        if node.holds(&value, &self.comparator) {
            return;
        }
        node.insert_key_sorted(value, &self.comparator);
        if node.len() > self.order {
            self.split(target);
        }
    }

    /// Split an overfull node into two new siblings and push its median into the parent.
    ///
    /// The overfull node is dropped. If it was the root, a new root is created above the
    /// siblings, otherwise the median is force-inserted into the existing parent, which may
    /// split in turn.
    fn split(&mut self, target: NodeId) {
        let node = self.nodes.take(target);
        tracing::debug!("Splitting node: {target}: {:?}", node.keys());
        let internal = !node.is_leaf();
        let split = node.split();

        let left = self
            .nodes
            .alloc(Node::from_parts(split.left_keys, split.left_children, None));
        self.adopt_children(left);
        let mut halves = vec![left];
        // After simplified removals an internal node can run out of children before keys, a
        // childless right half would hold separator copies as if they were stored keys
        if internal && split.right_children.is_empty() {
            tracing::debug!("Dropping childless right half of {target}: {:?}", split.right_keys);
        } else {
            let right = self
                .nodes
                .alloc(Node::from_parts(split.right_keys, split.right_children, None));
            self.adopt_children(right);
            halves.push(right);
        }

        match split.parent {
            None => {
                let root = self
                    .nodes
                    .alloc(Node::from_parts(vec![], halves.clone(), None));
                for half in &halves {
                    self.nodes.get_mut(*half).set_parent(Some(root));
                }
                tracing::debug!(
                    "Adding a new root: {root}, children: {halves:?}, key: {:?}",
                    split.median
                );
                self.root = root;
                self.place(root, split.median);
            }
            Some(parent) => {
                self.nodes.get_mut(parent).remove_child(target);
                for half in halves {
                    self.insert_child_sorted(parent, half);
                }
                self.place(parent, split.median);
            }
        }
    }

    /// Point every child of `parent` back at it.
    pub(crate) fn adopt_children(&mut self, parent: NodeId) {
        let children = self.nodes.get(parent).children().to_vec();
        for child in children {
            self.nodes.get_mut(child).set_parent(Some(parent));
        }
    }

    /// Attach `child` to `parent`, positioned by key range.
    pub(crate) fn insert_child_sorted(&mut self, parent: NodeId, child: NodeId) {
        let position = self.nodes.get(parent).sorted_child_position(
            self.nodes.get(child).keys().first(),
            |sibling| self.nodes.get(sibling).keys().last(),
            &self.comparator,
        );
        self.nodes.get_mut(parent).insert_child(position, child);
        self.nodes.get_mut(child).set_parent(Some(parent));
    }
}
