//! Backing-store boundary
//!
//! The tree never talks to a database directly. It hands [`Statement`]s to an
//! [`Executor`] and reads rows back through the [`Cursor`] it returns.
//!
//! - [`SqliteExecutor`] - DICOM index databases on SQLite
//! - [`MemoryExecutor`] - rows held in memory, for tests and tooling

mod memory;
pub mod schema;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use crate::error::QueryError;
use crate::model::Value;
use crate::query::Statement;

/// A seekable result set.
///
/// A cursor is positioned on at most one row at a time. Seeking or advancing
/// past the last row leaves it positioned after the end.
pub trait Cursor {
    /// Positions the cursor on `row`.
    ///
    /// Returns `false` if the result has no such row.
    fn seek(&mut self, row: usize) -> bool;

    /// Advances to the next row.
    ///
    /// From before the first row this moves to row 0. Returns `false` once
    /// the result is exhausted.
    fn next(&mut self) -> bool;

    /// Returns the row the cursor is on, if any.
    fn position(&self) -> Option<usize>;

    /// Returns the index of the column with the given name (or alias).
    fn column_index(&self, name: &str) -> Option<usize>;

    /// Reads a column of the current row.
    fn value(&self, column: usize) -> Option<Value>;

    /// Total number of rows, when the driver can report it without scanning.
    fn size(&self) -> Option<usize> {
        None
    }
}

/// Executes statements against a backing store.
pub trait Executor {
    /// Runs a statement and returns a cursor over its rows.
    fn execute(&self, statement: &Statement) -> Result<Box<dyn Cursor>, QueryError>;

    /// Returns `true` if the store contains any tables at all.
    fn has_tables(&self) -> bool;

    /// Returns `true` if cursors from this executor report [`Cursor::size`].
    fn supports_size(&self) -> bool {
        false
    }
}

/// Cursor position relative to the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Position {
    #[default]
    BeforeFirst,
    At(usize),
    AfterLast,
}

impl Position {
    pub(crate) fn row(self) -> Option<usize> {
        match self {
            Position::At(row) => Some(row),
            _ => None,
        }
    }

    /// Row that `next()` would move to, `None` once past the end.
    pub(crate) fn successor(self) -> Option<usize> {
        match self {
            Position::BeforeFirst => Some(0),
            Position::At(row) => row.checked_add(1),
            Position::AfterLast => None,
        }
    }
}
