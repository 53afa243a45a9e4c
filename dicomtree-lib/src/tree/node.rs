//! A cached tree position.

use std::fmt;

use crate::backend::Cursor;
use crate::query::Level;
use crate::query::LevelQuery;
use crate::query::Statement;

use super::NodeId;

/// Fetch progress of a node's cursor.
///
/// `Idle` nodes may still grow, `Fetching` nodes reject further fetches until
/// the running one completes, and `Settled` nodes know their exact row count
/// for the current cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Fetching,
    Settled,
}

/// A position in the tree that has been addressed at least once.
///
/// The node's statement lists the rows *beneath* it. The node's own display
/// values are one of its parent's rows.
pub struct Node {
    level: Level,
    query: &'static dyn LevelQuery,
    parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    row: usize,
    column: usize,
    key: String,
    pub(crate) statement: Option<Statement>,
    pub(crate) cursor: Option<Box<dyn Cursor>>,
    pub(crate) row_count: usize,
    pub(crate) state: FetchState,
}

impl Node {
    pub(crate) fn new(
        level: Level,
        parent: Option<NodeId>,
        row: usize,
        column: usize,
        key: String,
    ) -> Self {
        Self {
            level,
            query: level.query(),
            parent,
            children: Vec::new(),
            row,
            column,
            key,
            statement: None,
            cursor: None,
            row_count: 0,
            state: FetchState::Idle,
        }
    }

    /// Depth of the node.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Statement strategy chosen for this node's level.
    pub fn query(&self) -> &'static dyn LevelQuery {
        self.query
    }

    /// The node this one was created under. `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children created so far, in creation order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Row under the parent.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Column under the parent.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Key bound into this node's statement, read from the parent's row.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current statement, `None` for leaves.
    pub fn statement(&self) -> Option<&Statement> {
        self.statement.as_ref()
    }

    /// Returns `true` if the node has a usable cursor.
    pub fn has_cursor(&self) -> bool {
        self.cursor.is_some()
    }

    pub(crate) fn cursor(&self) -> Option<&(dyn Cursor + 'static)> {
        self.cursor.as_deref()
    }

    pub(crate) fn cursor_mut(&mut self) -> Option<&mut (dyn Cursor + 'static)> {
        self.cursor.as_deref_mut()
    }

    /// Number of rows beneath this node known to exist.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Fetch progress of the cursor.
    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Returns `true` once the exact row count is known.
    pub fn is_settled(&self) -> bool {
        self.state == FetchState::Settled
    }

    /// Returns `true` while a fetch is running on this node.
    pub fn is_fetching(&self) -> bool {
        self.state == FetchState::Fetching
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("level", &self.level)
            .field("parent", &self.parent)
            .field("row", &self.row)
            .field("column", &self.column)
            .field("key", &self.key)
            .field("children", &self.children.len())
            .field("row_count", &self.row_count)
            .field("state", &self.state)
            .field("has_cursor", &self.cursor.is_some())
            .finish()
    }
}
