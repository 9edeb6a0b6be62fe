#![warn(missing_docs)]
//! Arbor Multiway Tree
//!
//! # Implementation Details
//!
//! Provides an in-memory multiway ordered tree (a B-tree in the B+ tradition) which maintains a
//! set of keys under a caller supplied strict total order.
//!
//! The tree is parameterised by an order `u`: the maximum number of keys a node may hold once an
//! insertion has completed. A node receiving one key more than that is split around its median.
//! Leaf splits copy the median into the right hand leaf, so every stored key lives in a leaf and
//! internal nodes only hold separator copies.
//!
//! (If you aren't sure what that means, you can read more about B+Trees here: <https://en.wikipedia.org/wiki/B%2B_tree>.)
//!
//! All nodes live in a node store and are addressed by [`tree::NodeId`] handles. Each node knows
//! its children and (advisory only) its parent. The root is whichever node has no parent and
//! every mutating operation returns the current root handle, since inserts and removals are free
//! to relocate it.
//!
//! Ordering is supplied through the [`tree::Comparator`] trait rather than through `Ord`, so the
//! same key type can be stored under different orders.
//!
//! Deletion comes in two flavours, see [`tree::Rebalance`]:
//!  - Simplified: an underflowing node is flattened into its parent
//!  - Merge: a classic borrow-from-sibling / merge-with-sibling rebalance
//!

pub mod tree;
