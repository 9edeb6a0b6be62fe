//! Multiway tree implementation
//!
//! This is the main data structure exposed by the library.
//!

use std::fmt::Display;
use std::io::Write;
use std::ops::ControlFlow;

use anyhow::Result;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

use super::compare::Comparator;
use super::node::Node;
use super::sparse::{NodeId, NodeStore};

/// When accessing tree contents serially, ascending or descending order.
#[derive(Clone, Copy, Debug, EnumString, PartialEq)]
#[strum(ascii_case_insensitive)]
pub enum Direction {
    /// Process in ascending order.
    Ascending,
    /// Process in descending order.
    Descending,
}

/// How a removal repairs a node which has dropped below `order / 2` keys.
#[derive(Clone, Copy, Debug, Default, EnumString, StrumDisplay, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum Rebalance {
    /// Detach the underflowing node and re-home its remaining keys from its parent. Separators
    /// removed from internal nodes are not replaced, so the tree may lose its strict fan-out.
    #[default]
    Simplified,
    /// Borrow a key from an adjacent sibling, or merge with one, keeping every internal node at
    /// key count + 1 children.
    Merge,
}

/// Keys which we wish to store in an Arbor tree.
pub trait ArborKey: Clone + std::fmt::Debug {}

// Blanket implementation which satisfies the compiler
impl<K> ArborKey for K
where
    K: Clone + std::fmt::Debug,
{
    // Nothing to implement, since K already supports the other traits.
}

/// Arbor specific errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArborError {
    /// Supplied order too small
    #[error("order: {0} must be >=2")]
    OrderTooSmall(usize),

    /// A handle which does not resolve to a node of this tree
    #[error("no node with handle: {0}")]
    UnknownNode(NodeId),

    /// Keys out of comparator order
    #[error("keys of node {0} are not strictly increasing")]
    UnsortedKeys(NodeId),

    /// More keys than the order allows
    #[error("node {node} holds {len} keys, order is {order}")]
    Overfull {
        /// Offending node
        node: NodeId,
        /// Its key count
        len: usize,
        /// The tree order
        order: usize,
    },

    /// A child whose parent handle doesn't point back at the node listing it
    #[error("node {child} is listed by {parent} but records parent {recorded:?}")]
    LostParent {
        /// The child
        child: NodeId,
        /// The node listing it
        parent: NodeId,
        /// The parent handle the child actually holds
        recorded: Option<NodeId>,
    },

    /// An internal node without exactly one more child than keys
    #[error("internal node {node} has {keys} keys and {children} children")]
    FanOut {
        /// Offending node
        node: NodeId,
        /// Its key count
        keys: usize,
        /// Its child count
        children: usize,
    },
}

/// Construction parameters for an [`Arbor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArborConfig {
    /// Maximum number of keys in a node once an insertion completes.
    pub order: usize,
    /// Deletion strategy.
    pub rebalance: Rebalance,
}

impl Default for ArborConfig {
    fn default() -> Self {
        Self {
            order: 4,
            rebalance: Rebalance::Simplified,
        }
    }
}

impl ArborConfig {
    /// Set the order.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Set the deletion strategy.
    pub fn with_rebalance(mut self, rebalance: Rebalance) -> Self {
        self.rebalance = rebalance;
        self
    }
}

/// A multiway ordered tree.
#[derive(Clone, Debug)]
pub struct Arbor<T, C> {
    pub(crate) nodes: NodeStore<T>,
    pub(crate) root: NodeId,
    pub(crate) order: usize,
    pub(crate) rebalance: Rebalance,
    pub(crate) comparator: C,
}

impl<T, C> Arbor<T, C>
where
    T: ArborKey,
    C: Comparator<T>,
{
    /// Create a new, empty, tree with the specified order and the default deletion strategy.
    pub fn try_new(order: usize, comparator: C) -> Result<Self> {
        Self::try_with_config(ArborConfig::default().with_order(order), comparator)
    }

    /// Create a new, empty, tree from a configuration.
    pub fn try_with_config(config: ArborConfig, comparator: C) -> Result<Self> {
        if config.order < 2 {
            return Err(ArborError::OrderTooSmall(config.order).into());
        }
        let mut nodes = NodeStore::new();
        let root = nodes.alloc(Node::empty(None));
        tracing::debug!(order = config.order, rebalance = %config.rebalance, "creating tree");
        Ok(Self {
            nodes,
            root,
            order: config.order,
            rebalance: config.rebalance,
            comparator,
        })
    }

    /// The current root. Any handle obtained before the last mutation may be stale.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Maximum keys per node.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Deletion strategy.
    pub fn rebalance(&self) -> Rebalance {
        self.rebalance
    }

    /// The comparator shared by every node.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Look up a node. Returns `None` for handles of nodes which no longer exist.
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.try_get(id)
    }

    /// Clear our tree.
    pub fn clear(&mut self) -> NodeId {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::empty(None));
        self.root
    }

    /// Does the tree contain this key?
    ///
    /// Only keys held by leaves count. A separator key which survives solely in an internal
    /// node (for instance after a simplified removal) is not reported.
    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// Find the leaf holding `value`.
    pub fn find(&self, value: &T) -> Option<NodeId> {
        self.find_from(self.root, value)
    }

    /// Find the leaf holding `value`, searching the subtree below `start`.
    ///
    /// Children are searched depth first, left to right, and the first leaf holding the value
    /// wins. An unknown `start` finds nothing.
    pub fn find_from(&self, start: NodeId, value: &T) -> Option<NodeId> {
        let node = self.nodes.try_get(start)?;
        if node.is_leaf() {
            return node.holds(value, &self.comparator).then_some(start);
        }
        node.children()
            .iter()
            .find_map(|child| self.find_from(*child, value))
    }

    /// The leaf a new `value` would be placed into, descending from `start`.
    pub(crate) fn choose_insertion_node(&self, start: NodeId, value: &T) -> NodeId {
        let mut target = start;
        loop {
            let node = self.nodes.get(target);
            if node.is_leaf() {
                return target;
            }
            let idx = node
                .keys()
                .iter()
                .position(|key| self.comparator.less_than(value, key))
                .unwrap_or(node.len());
            // Simplified removals can leave fewer children than keys + 1
            target = node.children()[idx.min(node.children().len() - 1)];
        }
    }

    pub(crate) fn min_keys(&self) -> usize {
        self.order / 2
    }

    /// Count of keys held by leaves.
    pub fn count(&self) -> usize {
        let mut count = 0;
        self.traverse_nodes(Direction::Ascending, |_, node| {
            if node.is_leaf() {
                count += node.len();
            }
            ControlFlow::Continue(())
        });
        count
    }

    /// Is the tree empty?
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.traverse_nodes(Direction::Ascending, |_, _| {
            count += 1;
            ControlFlow::Continue(())
        });
        count
    }

    /// Number of levels, following first children. An empty root counts as one level.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = self.nodes.get(self.root);
        while let Some(child) = node.children().first() {
            height += 1;
            node = self.nodes.get(*child);
        }
        height
    }

    /// Return leaf node utilization.
    pub fn utilization(&self) -> f64 {
        let mut used = 0;
        let mut total = 0;
        self.traverse_nodes(Direction::Ascending, |_, node| {
            if node.is_leaf() {
                used += node.len();
                total += self.order;
            }
            ControlFlow::Continue(())
        });
        used as f64 / total as f64
    }

    /// Log basic information about our tree.
    pub fn info(&self) {
        tracing::info!(
            order = self.order,
            rebalance = %self.rebalance,
            node_count = self.node_count(),
            count = self.count(),
            height = self.height(),
            "Arbor"
        );
    }

    /// Verify all the nodes reachable from the root.
    ///
    /// Every node must hold strictly increasing keys, no more than `order` of them, and each
    /// child must record the node listing it as its parent.
    pub fn verify(&self) -> Result<()> {
        self.verify_with(|_, _| Ok(()))
    }

    /// As [`Arbor::verify`], and additionally require every internal node to have exactly one
    /// more child than it has keys.
    ///
    /// Trees built purely by insertions, or maintained with [`Rebalance::Merge`], pass this.
    pub fn verify_fanout(&self) -> Result<()> {
        self.verify_with(|id, node| {
            if !node.is_leaf() && node.children().len() != node.len() + 1 {
                return Err(ArborError::FanOut {
                    node: id,
                    keys: node.len(),
                    children: node.children().len(),
                });
            }
            Ok(())
        })
    }

    fn verify_with(
        &self,
        extra: impl Fn(NodeId, &Node<T>) -> Result<(), ArborError>,
    ) -> Result<()> {
        let mut outcome: Result<(), ArborError> = Ok(());
        self.traverse_nodes(Direction::Ascending, |id, node| {
            match self.verify_node(id, node).and_then(|_| extra(id, node)) {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => {
                    tracing::error!("verification failed: {e}");
                    outcome = Err(e);
                    ControlFlow::Break(())
                }
            }
        });
        outcome.map_err(|e| e.into())
    }

    fn verify_node(&self, id: NodeId, node: &Node<T>) -> Result<(), ArborError> {
        if !node.is_sorted(&self.comparator) {
            return Err(ArborError::UnsortedKeys(id));
        }
        if node.len() > self.order {
            return Err(ArborError::Overfull {
                node: id,
                len: node.len(),
                order: self.order,
            });
        }
        for child in node.children() {
            let recorded = self
                .nodes
                .try_get(*child)
                .ok_or(ArborError::UnknownNode(*child))?
                .parent();
            if recorded != Some(id) {
                return Err(ArborError::LostParent {
                    child: *child,
                    parent: id,
                    recorded,
                });
            }
        }
        Ok(())
    }
}

impl<T, C> Arbor<T, C>
where
    T: ArborKey + Display,
    C: Comparator<T>,
{
    /// Write a depth-indented dump of `node`, and optionally its descendants, to `out`.
    ///
    /// Each line starts with `..` per level of `depth`, followed by the node's keys, each
    /// followed by a space.
    pub fn write_node<W: Write>(
        &self,
        out: &mut W,
        node: NodeId,
        include_descendants: bool,
        depth: usize,
    ) -> Result<()> {
        let target = self
            .nodes
            .try_get(node)
            .ok_or(ArborError::UnknownNode(node))?;
        let mut line = "..".repeat(depth);
        for key in target.keys() {
            line.push_str(&format!("{key} "));
        }
        writeln!(out, "{line}")?;
        if include_descendants {
            for child in target.children() {
                self.write_node(out, *child, include_descendants, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Print to stdout a dump of `node` (see [`Arbor::write_node`]).
    pub fn print_node(&self, node: NodeId, include_descendants: bool, depth: usize) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = self.write_node(&mut lock, node, include_descendants, depth) {
            tracing::warn!("could not print node {node}: {e}");
        }
    }

    /// Print to stdout the whole tree.
    pub fn print_tree(&self) {
        self.print_node(self.root, true, 0)
    }

    /// Print to stdout all the keys in the tree.
    pub fn print_keys(&self, direction: Direction) {
        let mut sep = "";
        self.traverse_keys(direction, |key| {
            print!("{sep}{key}");
            sep = ", ";
            ControlFlow::Continue(())
        });
        println!();
    }
}

#[cfg(test)]
mod tests;
