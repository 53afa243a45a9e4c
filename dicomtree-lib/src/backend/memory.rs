//! In-memory cursors and executor.

use crate::error::QueryError;
use crate::model::Value;
use crate::query::Statement;

use super::Cursor;
use super::Executor;
use super::Position;

/// A cursor over rows held in memory.
///
/// # Example
///
/// ```
/// use dicomtree_lib::backend::{Cursor, VecCursor};
/// use dicomtree_lib::model::Value;
///
/// let mut cursor = VecCursor::new(["UID", "Name"], vec![
///     vec![Value::from("p1"), Value::from("Doe^John")],
/// ]);
/// assert!(cursor.seek(0));
/// assert_eq!(cursor.value(1), Some(Value::from("Doe^John")));
/// assert!(!cursor.next());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VecCursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: Position,
    report_size: bool,
}

impl VecCursor {
    /// Creates a cursor over `rows`, whose cells follow `columns`.
    pub fn new<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
            position: Position::BeforeFirst,
            report_size: false,
        }
    }

    /// Makes the cursor report its row count through [`Cursor::size`].
    pub fn with_size(mut self) -> Self {
        self.report_size = true;
        self
    }

    /// Returns the number of rows held.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the cursor holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn move_to(&mut self, row: Option<usize>) -> bool {
        match row {
            Some(row) if row < self.rows.len() => {
                self.position = Position::At(row);
                true
            }
            _ => {
                self.position = Position::AfterLast;
                false
            }
        }
    }
}

impl Cursor for VecCursor {
    fn seek(&mut self, row: usize) -> bool {
        self.move_to(Some(row))
    }

    fn next(&mut self) -> bool {
        let target = self.position.successor();
        self.move_to(target)
    }

    fn position(&self) -> Option<usize> {
        self.position.row()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn value(&self, column: usize) -> Option<Value> {
        let row = self.position.row()?;
        self.rows.get(row)?.get(column).cloned()
    }

    fn size(&self) -> Option<usize> {
        self.report_size.then_some(self.rows.len())
    }
}

type Resolver = dyn Fn(&Statement) -> Result<VecCursor, QueryError>;

/// An executor that answers statements from memory.
///
/// The resolver decides which rows a statement yields; it typically matches
/// on the table named in the SQL and the bound key.
pub struct MemoryExecutor {
    resolver: Box<Resolver>,
}

impl MemoryExecutor {
    /// Creates an executor backed by `resolver`.
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn(&Statement) -> Result<VecCursor, QueryError> + 'static,
    {
        Self {
            resolver: Box::new(resolver),
        }
    }
}

impl Executor for MemoryExecutor {
    fn execute(&self, statement: &Statement) -> Result<Box<dyn Cursor>, QueryError> {
        let cursor = (self.resolver)(statement)?;
        Ok(Box::new(cursor))
    }

    fn has_tables(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(rows: usize) -> VecCursor {
        VecCursor::new(
            ["UID"],
            (0..rows).map(|r| vec![Value::from(r as i64)]).collect(),
        )
    }

    #[test]
    fn test_next_walks_from_before_first() {
        let mut c = cursor(2);
        assert_eq!(c.position(), None);
        assert!(c.next());
        assert_eq!(c.position(), Some(0));
        assert!(c.next());
        assert!(!c.next());
        assert!(!c.next());
        assert_eq!(c.value(0), None);
    }

    #[test]
    fn test_failed_seek_leaves_cursor_after_end() {
        let mut c = cursor(3);
        assert!(!c.seek(3));
        assert!(!c.next());
        assert!(c.seek(1));
        assert_eq!(c.value(0), Some(Value::Integer(1)));
    }

    #[test]
    fn test_size_only_when_requested() {
        assert_eq!(cursor(4).size(), None);
        assert_eq!(cursor(4).with_size().size(), Some(4));
    }
}
