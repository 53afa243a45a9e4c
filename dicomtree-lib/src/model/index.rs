//! Model positions

use crate::tree::NodeId;

/// A position in the model, as handed out to presentation layers.
///
/// The root position addresses the invisible node above the top-level rows
/// and is also what [`DicomModel::parent`](super::DicomModel::parent) returns
/// for top-level positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModelIndex {
    row: usize,
    column: usize,
    node: Option<NodeId>,
}

impl ModelIndex {
    /// Returns the root position.
    pub const fn root() -> Self {
        Self {
            row: 0,
            column: 0,
            node: None,
        }
    }

    pub(crate) fn new(row: usize, column: usize, node: NodeId) -> Self {
        Self {
            row,
            column,
            node: Some(node),
        }
    }

    /// Returns `true` for the root position.
    pub fn is_root(&self) -> bool {
        self.node.is_none()
    }

    /// Row under the parent. Meaningless for the root.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Column under the parent. Meaningless for the root.
    pub fn column(&self) -> usize {
        self.column
    }

    /// The cached node behind this position, `None` for the root.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

/// Orientation of a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Column headers.
    Horizontal,
    /// Row headers.
    Vertical,
}
