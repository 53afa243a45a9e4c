//! Lazily built node cache.
//!
//! The [`Tree`] holds one [`Node`] per tree position a consumer has ever
//! addressed. Nodes live in an arena and refer to each other by [`NodeId`]:
//! a node stores its parent's id and the ids of the children created under
//! it, in creation order.
//!
//! Each node owns the cursor over the rows directly beneath it, plus the
//! bookkeeping of how many of those rows are known to exist.

mod node;

pub use node::*;

use crate::backend::Cursor;
use crate::backend::Executor;
use crate::error::QueryError;
use crate::query::Level;
use crate::query::SortOrder;
use crate::query::Statement;

/// Stable handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena slot of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of cached nodes plus the backing store they read from.
///
/// The tree owns the executor and every cursor. Replacing the executor
/// discards all nodes.
#[derive(Default)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    root: Option<NodeId>,
    executor: Option<Box<dyn Executor>>,
    sort: Option<SortOrder>,
    generation: u64,
}

impl Tree {
    /// Creates an empty tree with no backing store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every node and attaches a new backing store.
    ///
    /// The root is not created; see [`create_root`](Self::create_root).
    pub fn attach(&mut self, executor: Box<dyn Executor>) {
        self.clear();
        self.executor = Some(executor);
    }

    /// Returns the attached backing store.
    pub fn executor(&self) -> Option<&dyn Executor> {
        self.executor.as_deref()
    }

    /// Discards every node. The backing store stays attached.
    pub fn clear(&mut self) {
        if let Some(root) = self.root {
            self.remove_subtree(root);
        }
        self.nodes.clear();
        self.root = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Counts how often the tree has been cleared.
    ///
    /// Node ids are reused after a clear; an id is only meaningful together
    /// with the generation it was obtained in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the root node, if one has been created.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Creates the root node, replacing any existing tree.
    pub fn create_root(&mut self) -> NodeId {
        self.clear();
        let mut node = Node::new(Level::Root, None, 0, 0, String::new());
        self.open_cursor(&mut node);
        let id = self.push(node);
        self.root = Some(id);
        log::debug!("created root node {:?}", id);
        id
    }

    /// Returns the tree-wide sort order.
    pub fn sort(&self) -> Option<SortOrder> {
        self.sort
    }

    /// Sets the tree-wide sort order.
    ///
    /// Existing cursors are untouched until [`regenerate`](Self::regenerate).
    pub fn set_sort(&mut self, sort: Option<SortOrder>) {
        self.sort = sort;
    }

    /// Returns a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)?.as_ref()
    }

    /// Returns a node by id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)?.as_mut()
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns `true` if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the child created at `row`/`column` under `parent`.
    ///
    /// Linear in the number of children addressed so far, which is bounded by
    /// what a consumer has looked at rather than by the size of the store.
    pub fn find_child(&self, parent: NodeId, row: usize, column: usize) -> Option<NodeId> {
        let parent = self.node(parent)?;
        parent.children().iter().copied().find(|&child| {
            self.node(child)
                .is_some_and(|c| c.row() == row && c.column() == column)
        })
    }

    /// Returns the child at `row`/`column` under `parent`, creating it if this
    /// position has never been addressed.
    ///
    /// `key` is only used when the node is created. Returns `None` if the
    /// parent does not exist or is a leaf.
    pub fn create_child(
        &mut self,
        parent: NodeId,
        row: usize,
        column: usize,
        key: String,
    ) -> Option<NodeId> {
        if let Some(existing) = self.find_child(parent, row, column) {
            return Some(existing);
        }

        let level = self.node(parent)?.level().child()?;
        let mut node = Node::new(level, Some(parent), row, column, key);
        self.open_cursor(&mut node);
        let id = self.push(node);
        self.node_mut(parent)?.children.push(id);

        log::debug!(
            "created {:?} node {:?} at ({}, {}) under {:?}",
            level,
            id,
            row,
            column,
            parent
        );
        Some(id)
    }

    /// Rebuilds the statement and cursor of `id` and every descendant with
    /// the current sort order.
    ///
    /// Row counts and fetch states are left alone: until the next fetch they
    /// describe the previous cursors.
    pub fn regenerate(&mut self, id: NodeId) {
        let mut pending = vec![id];
        let mut count = 0;
        while let Some(current) = pending.pop() {
            let Some(mut node) = self.nodes.get_mut(current.0).and_then(Option::take) else {
                continue;
            };
            self.open_cursor(&mut node);
            pending.extend(node.children().iter().rev().copied());
            self.nodes[current.0] = Some(node);
            count += 1;
        }
        log::debug!("regenerated {} cursors under {:?}", count, id);
    }

    /// Destroys `id` and its whole subtree, releasing their cursors.
    ///
    /// Returns the number of nodes removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        let parent = self.node(id).and_then(Node::parent);
        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.children.retain(|&child| child != id);
        }
        if self.root == Some(id) {
            self.root = None;
        }

        let mut pending = vec![id];
        let mut removed = 0;
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                pending.extend(node.children);
                removed += 1;
            }
        }
        removed
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }

    /// Builds the node's statement and replaces its cursor.
    ///
    /// Failures leave the node with no cursor; reads from it come back empty.
    fn open_cursor(&self, node: &mut Node) {
        let statement = node.query().build(node.key(), self.sort.as_ref());
        let cursor = match &statement {
            Some(statement) => self.execute(statement),
            None => Err(QueryError::NoQuery(node.level())),
        };
        node.cursor = match cursor {
            Ok(cursor) => Some(cursor),
            Err(e) if e.is_backend() => {
                log::warn!("query for {:?} node failed: {}", node.level(), e);
                None
            }
            Err(e) => {
                log::trace!("{}", e);
                None
            }
        };
        node.statement = statement;
    }

    fn execute(&self, statement: &Statement) -> Result<Box<dyn Cursor>, QueryError> {
        self.executor
            .as_deref()
            .ok_or(QueryError::Detached)?
            .execute(statement)
    }
}
