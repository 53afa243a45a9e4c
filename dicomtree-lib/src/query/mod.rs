//! Query templates for each level of the hierarchy.
//!
//! Every node owns one statement that lists the rows directly beneath it.
//! The statement is produced by the [`LevelQuery`] strategy of the node's
//! [`Level`], parametrized by the node's key and the tree-wide sort order.
//!
//! - [`Level`] - Depth of a node in the hierarchy
//! - [`LevelQuery`] - Per-level statement strategy
//! - [`Statement`] - SQL text with bound parameters
//! - [`SortOrder`] - Ordering applied at every level

mod level;
mod order;
mod statement;

pub use level::Level;
pub use level::LevelQuery;
pub use level::Projection;
pub use level::KEY_FIELD;
pub use order::Direction;
pub use order::SortOrder;
pub use statement::Statement;
pub use statement::quote_identifier;
