//! Node storage
//!
//! Nodes are kept in a map keyed by [`NodeId`]. Ids are handed out from a monotonic counter and
//! are never recycled, so a handle to a node which has since been detached (and dropped) simply
//! fails to resolve instead of silently pointing at some other node.

use core::hash::{BuildHasherDefault, Hasher};
use std::collections::HashMap;
use std::fmt;

use super::node::Node;

/// Stable handle to a node of an [`Arbor`](super::Arbor).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw index of this node within its tree.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, _bytes: &[u8]) {
        unimplemented!("IdentityHasher only supports NodeId keys")
    }

    fn write_usize(&mut self, i: usize) {
        self.0 = i as u64;
    }
}

pub(crate) type BuildIdentityHasher = BuildHasherDefault<IdentityHasher>;

#[derive(Clone, Debug)]
pub(crate) struct NodeStore<T> {
    nodes: HashMap<NodeId, Node<T>, BuildIdentityHasher>,
    next: usize,
}

impl<T> NodeStore<T> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: HashMap::default(),
            next: 1,
        }
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn alloc(&mut self, node: Node<T>) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        self.nodes.insert(id, node);
        id
    }

    pub(crate) fn try_get(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(&id)
    }

    // Handles held by the tree itself always resolve; a miss here is a broken tree.
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<T> {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("`NodeStore::get()` - {id} is not in the store"))
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes
            .get_mut(&id)
            .unwrap_or_else(|| panic!("`NodeStore::get_mut()` - {id} is not in the store"))
    }

    pub(crate) fn take(&mut self, id: NodeId) -> Node<T> {
        self.nodes
            .remove(&id)
            .unwrap_or_else(|| panic!("`NodeStore::take()` - {id} is not in the store"))
    }

    /// Remove a node and everything below it, returning the removed nodes in depth-first,
    /// left-to-right order.
    pub(crate) fn take_subtree(&mut self, id: NodeId) -> Vec<Node<T>> {
        let mut taken = vec![];
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let node = self.take(next);
            pending.extend(node.children().iter().rev().copied());
            taken.push(node);
        }
        taken
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }
}
