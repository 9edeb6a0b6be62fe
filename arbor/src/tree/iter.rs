use std::ops::ControlFlow;

use super::arbor::{Arbor, ArborKey, Direction};
use super::compare::Comparator;
use super::node::Node;
use super::sparse::{NodeId, NodeStore};

/// Iterator over the keys held by the leaves of an [`Arbor`], created by [`Arbor::keys`].
///
/// Leaves are visited depth first. In a tree built by insertions this yields keys in comparator
/// order (or its reverse).
pub struct Keys<'a, T> {
    nodes: &'a NodeStore<T>,
    pending: Vec<NodeId>,
    leaf: Option<&'a Node<T>>,
    index: usize,
    direction: Direction,
}

impl<'a, T> Keys<'a, T> {
    fn new(nodes: &'a NodeStore<T>, root: NodeId, direction: Direction) -> Self {
        Self {
            nodes,
            pending: vec![root],
            leaf: None,
            index: 0,
            direction,
        }
    }

    fn next_leaf(&mut self) -> Option<&'a Node<T>> {
        while let Some(id) = self.pending.pop() {
            let node = self.nodes.get(id);
            if node.is_leaf() {
                return Some(node);
            }
            // Pushed in reverse so the first child to visit is popped first
            match self.direction {
                Direction::Ascending => self.pending.extend(node.children().iter().rev()),
                Direction::Descending => self.pending.extend(node.children().iter()),
            }
        }
        None
    }
}

impl<'a, T> Iterator for Keys<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        // Each leaf contains a number of keys, we must read all the keys from the current leaf
        // before advancing. (i.e.: a loop within a loop)
        loop {
            if let Some(leaf) = self.leaf {
                let key = match self.direction {
                    Direction::Ascending => leaf.keys().get(self.index),
                    Direction::Descending => leaf.keys().iter().rev().nth(self.index),
                };
                if key.is_some() {
                    self.index += 1;
                    return key;
                }
            }
            self.leaf = Some(self.next_leaf()?);
            self.index = 0;
        }
    }
}

impl<T, C> Arbor<T, C>
where
    T: ArborKey,
    C: Comparator<T>,
{
    /// Return an iterator over the keys held by leaves.
    pub fn keys(&self, direction: Direction) -> Keys<'_, T> {
        Keys::new(&self.nodes, self.root, direction)
    }

    /// Traverse keys until exhausted or callback returns break.
    pub fn traverse_keys(&self, direction: Direction, mut f: impl FnMut(&T) -> ControlFlow<()>) {
        for key in self.keys(direction) {
            if f(key).is_break() {
                break;
            }
        }
    }

    /// Traverse every node reachable from the root, parents before children, until exhausted or
    /// callback returns break.
    pub fn traverse_nodes(
        &self,
        direction: Direction,
        mut f: impl FnMut(NodeId, &Node<T>) -> ControlFlow<()>,
    ) {
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            let node = self.nodes.get(id);
            if f(id, node).is_break() {
                break;
            }
            match direction {
                Direction::Ascending => pending.extend(node.children().iter().rev()),
                Direction::Descending => pending.extend(node.children().iter()),
            }
        }
    }
}
