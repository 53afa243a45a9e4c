//! SQLite-backed executor and cursor.

use std::path::Path;
use std::rc::Rc;

use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use rusqlite::OpenFlags;

use crate::error::QueryError;
use crate::model::Value;
use crate::query::Statement;

use super::Cursor;
use super::Executor;
use super::Position;

/// Rows pulled from SQLite when a cursor advances past its window.
///
/// Forward scans move one row at a time; windowing keeps them from re-running
/// the statement for every row. A seek only pulls the row it lands on.
const SCAN_WINDOW: usize = 64;

/// Executes statements against a SQLite DICOM index database.
///
/// SQLite cannot report the size of a result set, so by default cursors
/// have no [`Cursor::size`]. [`with_row_counts`](Self::with_row_counts)
/// emulates the capability with a `COUNT(*)` over each statement.
///
/// # Example
///
/// ```
/// use dicomtree_lib::backend::SqliteExecutor;
///
/// let executor = SqliteExecutor::open_in_memory()?.with_row_counts(true);
/// # Ok::<(), dicomtree_lib::error::QueryError>(())
/// ```
pub struct SqliteExecutor {
    conn: Rc<Connection>,
    row_counts: bool,
}

impl SqliteExecutor {
    /// Wraps an open connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Rc::new(conn),
            row_counts: false,
        }
    }

    /// Opens an existing database read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueryError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        Ok(Self::new(conn))
    }

    /// Opens an empty in-memory database.
    pub fn open_in_memory() -> Result<Self, QueryError> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Enables or disables `COUNT(*)` based cursor sizes.
    pub fn with_row_counts(mut self, enabled: bool) -> Self {
        self.row_counts = enabled;
        self
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn count_rows(&self, statement: &Statement) -> Result<usize, QueryError> {
        let sql = format!("SELECT COUNT(*) FROM ({})", statement.sql());
        let count: i64 = self.conn.query_row(
            &sql,
            params_from_iter(statement.params().iter()),
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    fn open_cursor(&self, statement: &Statement) -> Result<SqliteCursor, QueryError> {
        // Preparing validates the SQL and yields the column aliases.
        let columns = {
            let stmt = self.conn.prepare(statement.sql())?;
            stmt.column_names()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        };

        let size = if self.row_counts {
            Some(self.count_rows(statement)?)
        } else {
            None
        };

        log::trace!("opened cursor over {} ({} columns)", statement, columns.len());
        Ok(SqliteCursor {
            conn: Rc::clone(&self.conn),
            statement: statement.clone(),
            columns,
            window_start: 0,
            rows: Vec::new(),
            end: None,
            position: Position::BeforeFirst,
            size,
        })
    }
}

impl Executor for SqliteExecutor {
    fn execute(&self, statement: &Statement) -> Result<Box<dyn Cursor>, QueryError> {
        Ok(Box::new(self.open_cursor(statement)?))
    }

    fn has_tables(&self) -> bool {
        let result = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
            [],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(count) => count > 0,
            Err(e) => {
                log::warn!("could not list tables: {}", e);
                false
            }
        }
    }

    fn supports_size(&self) -> bool {
        self.row_counts
    }
}

/// A cursor over a SQLite statement.
///
/// Only a small window of rows is held at a time, re-read with `LIMIT` and
/// `OFFSET` appended to the statement when the cursor leaves it. Seeking
/// pulls the target row alone; advancing pulls a scan window. Read errors
/// are logged and end the result set.
pub struct SqliteCursor {
    conn: Rc<Connection>,
    statement: Statement,
    columns: Vec<String>,
    /// Result row of `rows[0]`.
    window_start: usize,
    rows: Vec<Vec<Value>>,
    /// First row known not to exist, once a read has come up short.
    end: Option<usize>,
    position: Position,
    size: Option<usize>,
}

impl SqliteCursor {
    fn in_window(&self, row: usize) -> bool {
        row >= self.window_start && row - self.window_start < self.rows.len()
    }

    /// Makes sure `row` is in the window if it exists, pulling up to `len`
    /// rows starting at `row` when it is not.
    fn load(&mut self, row: usize, len: usize) -> bool {
        if self.in_window(row) {
            return true;
        }
        if self.end.is_some_and(|end| row >= end) {
            return false;
        }

        match self.load_window(row, len) {
            Ok(loaded) if loaded < len => self.end = Some(row.saturating_add(loaded)),
            Ok(_) => {}
            Err(e) => {
                log::warn!("reading {} failed at row {}: {}", self.statement, row, e);
                self.rows.clear();
                self.end = Some(row);
            }
        }
        self.in_window(row)
    }

    fn load_window(&mut self, offset: usize, limit: usize) -> rusqlite::Result<usize> {
        let limit_at = self.statement.params().len() + 1;
        let sql = format!(
            "{} LIMIT ?{} OFFSET ?{}",
            self.statement.sql(),
            limit_at,
            limit_at + 1
        );
        let params: Vec<SqlValue> = self
            .statement
            .params()
            .iter()
            .map(|p| SqlValue::Text(p.clone()))
            .chain([SqlValue::Integer(to_sql_int(limit)), SqlValue::Integer(to_sql_int(offset))])
            .collect();

        log::trace!("loading {} rows at {} of {}", limit, offset, self.statement);

        let conn = Rc::clone(&self.conn);
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        self.window_start = offset;
        self.rows.clear();
        let width = self.columns.len();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for column in 0..width {
                values.push(Value::from(row.get_ref(column)?));
            }
            self.rows.push(values);
        }
        Ok(self.rows.len())
    }

    fn move_to(&mut self, row: Option<usize>, len: usize) -> bool {
        match row {
            Some(row) if self.load(row, len) => {
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

/// Clamps a row number into SQLite's integer range.
fn to_sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl Cursor for SqliteCursor {
    fn seek(&mut self, row: usize) -> bool {
        self.move_to(Some(row), 1)
    }

    fn next(&mut self) -> bool {
        let target = self.position.successor();
        self.move_to(target, SCAN_WINDOW)
    }

    fn position(&self) -> Option<usize> {
        self.position.row()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn value(&self, column: usize) -> Option<Value> {
        let row = self.position.row()?;
        self.rows.get(row.checked_sub(self.window_start)?)?.get(column).cloned()
    }

    fn size(&self) -> Option<usize> {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor(rows: usize) -> SqliteExecutor {
        let executor = SqliteExecutor::open_in_memory().unwrap();
        executor
            .connection()
            .execute_batch("CREATE TABLE t (id INTEGER, name TEXT);")
            .unwrap();
        for id in 0..rows {
            executor
                .connection()
                .execute(
                    "INSERT INTO t (id, name) VALUES (?1, ?2)",
                    rusqlite::params![id as i64, format!("row-{}", id)],
                )
                .unwrap();
        }
        executor
    }

    #[test]
    fn test_seek_loads_only_needed_window() {
        let executor = executor(500);
        let stmt = Statement::new("SELECT id AS \"UID\", name AS \"Name\" FROM t ORDER BY id");
        let mut cursor = executor.execute(&stmt).unwrap();

        assert!(cursor.seek(3));
        let name = cursor.column_index("Name").unwrap();
        assert_eq!(cursor.value(name), Some(Value::from("row-3")));

        assert!(cursor.seek(499));
        assert!(!cursor.next());
        assert!(!cursor.seek(500));
    }

    #[test]
    fn test_seek_pulls_single_row() {
        let executor = executor(500);
        let stmt = Statement::new("SELECT id AS \"UID\" FROM t ORDER BY id");
        let mut cursor = executor.open_cursor(&stmt).unwrap();

        assert!(cursor.seek(255));
        assert_eq!(cursor.rows.len(), 1);
        assert_eq!(cursor.value(0), Some(Value::Integer(255)));

        assert!(cursor.next());
        assert_eq!(cursor.window_start, 256);
        assert_eq!(cursor.rows.len(), SCAN_WINDOW);
        assert_eq!(cursor.value(0), Some(Value::Integer(256)));

        assert!(cursor.seek(3));
        assert_eq!(cursor.rows.len(), 1);
        assert_eq!(cursor.value(0), Some(Value::Integer(3)));
    }

    #[test]
    fn test_scan_records_end() {
        let executor = executor(70);
        let stmt = Statement::new("SELECT id AS \"UID\" FROM t ORDER BY id");
        let mut cursor = executor.open_cursor(&stmt).unwrap();

        let mut count = 0;
        while cursor.next() {
            count += 1;
        }
        assert_eq!(count, 70);
        assert_eq!(cursor.end, Some(70));
        assert!(!cursor.seek(70));
        assert!(cursor.seek(69));
    }

    #[test]
    fn test_rows_beyond_integer_range_are_absent() {
        let executor = executor(3);
        let stmt = Statement::new("SELECT id AS \"UID\" FROM t");
        let mut cursor = executor.open_cursor(&stmt).unwrap();

        assert!(!cursor.seek(usize::MAX));
        assert!(cursor.rows.is_empty());
        assert!(!cursor.next());
        assert!(cursor.seek(2));
        assert_eq!(to_sql_int(usize::MAX), i64::MAX);
    }

    #[test]
    fn test_bound_parameters_precede_window() {
        let executor = executor(10);
        let stmt = Statement::new("SELECT id AS \"UID\" FROM t WHERE name = ?1").bind("row-7");
        let mut cursor = executor.execute(&stmt).unwrap();
        assert!(cursor.next());
        assert_eq!(cursor.value(0), Some(Value::Integer(7)));
        assert!(!cursor.next());
    }

    #[test]
    fn test_row_counts() {
        let stmt = Statement::new("SELECT id FROM t");
        let plain = executor(5);
        assert!(!plain.supports_size());
        assert_eq!(plain.execute(&stmt).unwrap().size(), None);

        let counted = executor(5).with_row_counts(true);
        assert!(counted.supports_size());
        assert_eq!(counted.execute(&stmt).unwrap().size(), Some(5));
    }

    #[test]
    fn test_malformed_statement_is_an_error() {
        let executor = executor(1);
        let err = executor.execute(&Statement::new("SELECT nope FROM missing")).err();
        assert!(matches!(err, Some(QueryError::Sqlite(_))));
    }

    #[test]
    fn test_has_tables() {
        assert!(!SqliteExecutor::open_in_memory().unwrap().has_tables());
        assert!(executor(0).has_tables());
    }
}
