//! Tree Node Type

use super::compare::Comparator;
use super::sparse::NodeId;

/// A node of an [`Arbor`](super::Arbor).
///
/// Keys are kept sorted by the tree's comparator. A node is a leaf exactly when it has no
/// children. The parent handle is advisory: it lets the tree walk upwards, ownership only ever
/// flows downwards through the child list.
#[derive(Clone, Debug)]
pub struct Node<T> {
    keys: Vec<T>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// The pieces of a node which has been split around its median key.
#[derive(Debug)]
pub(crate) struct Split<T> {
    pub(crate) median: T,
    pub(crate) left_keys: Vec<T>,
    pub(crate) left_children: Vec<NodeId>,
    pub(crate) right_keys: Vec<T>,
    pub(crate) right_children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl<T> Node<T> {
    pub(crate) fn empty(parent: Option<NodeId>) -> Self {
        Self::from_parts(vec![], vec![], parent)
    }

    pub(crate) fn from_parts(keys: Vec<T>, children: Vec<NodeId>, parent: Option<NodeId>) -> Self {
        Self {
            keys,
            children,
            parent,
        }
    }

    /// Keys held by this node, in ascending order.
    pub fn keys(&self) -> &[T] {
        &self.keys
    }

    /// Child handles, in key order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The node which lists this node as a child, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Is this a leaf?
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Does this node hold no keys?
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn keys_mut(&mut self) -> &mut Vec<T> {
        &mut self.keys
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn insert_child(&mut self, at: usize, child: NodeId) {
        self.children.insert(at, child);
    }

    /// Remove a child by identity.
    pub(crate) fn remove_child(&mut self, child: NodeId) -> bool {
        match self.child_position(child) {
            Some(idx) => {
                self.children.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn child_position(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|c| *c == child)
    }

    pub(crate) fn into_keys(self) -> Vec<T> {
        self.keys
    }

    pub(crate) fn into_parts(self) -> (Vec<T>, Vec<NodeId>) {
        (self.keys, self.children)
    }

    pub(crate) fn key_position<C>(&self, value: &T, comparator: &C) -> Option<usize>
    where
        C: Comparator<T>,
    {
        self.keys
            .iter()
            .position(|key| comparator.equivalent(key, value))
    }

    pub(crate) fn holds<C>(&self, value: &T, comparator: &C) -> bool
    where
        C: Comparator<T>,
    {
        self.key_position(value, comparator).is_some()
    }

    /// Insert before the first key which is not less than `value`.
    pub(crate) fn insert_key_sorted<C>(&mut self, value: T, comparator: &C)
    where
        C: Comparator<T>,
    {
        let idx = self
            .keys
            .iter()
            .position(|key| !comparator.less_than(key, &value))
            .unwrap_or(self.keys.len());
        self.keys.insert(idx, value);
    }

    pub(crate) fn remove_key<C>(&mut self, value: &T, comparator: &C) -> Option<T>
    where
        C: Comparator<T>,
    {
        self.key_position(value, comparator)
            .map(|idx| self.keys.remove(idx))
    }

    /// Where a new child, whose first key is `first`, belongs among our children.
    ///
    /// Children are scanned left to right while their last key orders before `first`. A child
    /// without keys never orders before anything.
    pub(crate) fn sorted_child_position<'a, C>(
        &self,
        first: Option<&T>,
        last_key_of: impl Fn(NodeId) -> Option<&'a T>,
        comparator: &C,
    ) -> usize
    where
        T: 'a,
        C: Comparator<T>,
    {
        let Some(first) = first else {
            return self.children.len();
        };
        self.children
            .iter()
            .position(|child| match last_key_of(*child) {
                Some(last) => !comparator.less_than(last, first),
                None => true,
            })
            .unwrap_or(self.children.len())
    }

    /// Median used when splitting: upper middle for even counts, middle for odd counts.
    pub(crate) fn median_index(&self) -> usize {
        let count = self.keys.len();
        if count % 2 == 0 {
            count / 2
        } else {
            (count + 1) / 2 - 1
        }
    }

    /// Break this node in two around its median.
    ///
    /// A leaf keeps the median as the first key of its right half. An internal node gives the
    /// median up entirely and hands `children[..=median]` to the left half.
    pub(crate) fn split(self) -> Split<T>
    where
        T: Clone,
    {
        let median = self.median_index();
        let leaf = self.is_leaf();
        let Node {
            mut keys,
            mut children,
            parent,
        } = self;

        let mut right_keys = keys.split_off(median);
        let median_key = right_keys[0].clone();
        if !leaf {
            right_keys.remove(0);
        }
        let right_children = children.split_off((median + 1).min(children.len()));

        Split {
            median: median_key,
            left_keys: keys,
            left_children: children,
            right_keys,
            right_children,
            parent,
        }
    }

    pub(crate) fn is_sorted<C>(&self, comparator: &C) -> bool
    where
        C: Comparator<T>,
    {
        self.keys
            .windows(2)
            .all(|pair| comparator.less_than(&pair[0], &pair[1]))
    }
}
