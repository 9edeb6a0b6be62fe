//! Multiway tree implementation
//!

// Re-export
pub use self::arbor::Arbor;
pub use self::arbor::ArborConfig;
pub use self::arbor::ArborError;
pub use self::arbor::ArborKey;
pub use self::arbor::Direction;
pub use self::arbor::Rebalance;
pub use self::compare::Comparator;
pub use self::compare::Descending;
pub use self::compare::LessThan;
pub use self::compare::NaturalOrder;
pub use self::iter::Keys;
pub use self::node::Node;
pub use self::sparse::NodeId;

pub mod arbor;
mod compare;
mod insert;
mod iter;
mod node;
mod remove;
mod sparse;
