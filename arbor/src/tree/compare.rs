//! Ordering predicates
//!
//! The tree never asks its keys how they order themselves. Instead, every tree holds a single
//! [`Comparator`], shared by every node, and trusts it completely: it must be a consistent strict
//! total order for the lifetime of the tree.

use std::cmp::Ordering;

/// A strict total order over `T`.
pub trait Comparator<T> {
    /// Is `a` ordered strictly before `b`?
    fn less_than(&self, a: &T, b: &T) -> bool;

    /// Full ordering, derived from `less_than`.
    fn ordering(&self, a: &T, b: &T) -> Ordering {
        if self.less_than(a, b) {
            Ordering::Less
        } else if self.less_than(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Neither key orders before the other.
    fn equivalent(&self, a: &T, b: &T) -> bool {
        !self.less_than(a, b) && !self.less_than(b, a)
    }
}

/// Ascending order of any `Ord` type.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaturalOrder;

impl<T: Ord> Comparator<T> for NaturalOrder {
    fn less_than(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Descending order of any `Ord` type.
#[derive(Clone, Copy, Debug, Default)]
pub struct Descending;

impl<T: Ord> Comparator<T> for Descending {
    fn less_than(&self, a: &T, b: &T) -> bool {
        b < a
    }
}

/// Adapts a closure into a [`Comparator`].
///
/// ```
/// use arbor::tree::{Arbor, LessThan};
///
/// let by_len = LessThan(|a: &String, b: &String| (a.len(), a) < (b.len(), b));
/// let mut tree = Arbor::try_new(4, by_len).expect("order is valid");
/// tree.insert("ccc".to_string());
/// tree.insert("a".to_string());
/// assert!(tree.contains(&"a".to_string()));
/// ```
#[derive(Clone, Copy)]
pub struct LessThan<F>(pub F);

impl<T, F> Comparator<T> for LessThan<F>
where
    F: Fn(&T, &T) -> bool,
{
    fn less_than(&self, a: &T, b: &T) -> bool {
        (self.0)(a, b)
    }
}

impl<F> std::fmt::Debug for LessThan<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LessThan(..)")
    }
}
