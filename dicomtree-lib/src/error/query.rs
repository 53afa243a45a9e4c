//! Query execution error types

use crate::query::Level;

/// Errors that can occur while turning a statement into a cursor.
///
/// These never cross the [`DicomModel`](crate::DicomModel) API: the tree
/// logs them and leaves the affected node with a failed cursor.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The backing store rejected or failed the statement.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Nodes at this level own no rows, so there is nothing to query.
    #[error("Level {0:?} has no child query")]
    NoQuery(Level),

    /// No backing store is attached.
    #[error("No backing store attached")]
    Detached,
}

impl QueryError {
    /// Returns `true` if the backing store itself reported the failure.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Sqlite(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            QueryError::NoQuery(Level::Image).to_string(),
            "Level Image has no child query"
        );
        assert_eq!(QueryError::Detached.to_string(), "No backing store attached");
        assert!(QueryError::Sqlite(rusqlite::Error::InvalidQuery).is_backend());
        assert!(!QueryError::Detached.is_backend());
    }
}
