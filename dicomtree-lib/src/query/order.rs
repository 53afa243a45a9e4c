//! Ordering applied to every level's statement.

use crate::model::Field;

use super::statement::quote_identifier;

/// Sort direction for ordering rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Returns the SQL keyword for this direction.
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    /// Returns the direction for an `ascending` flag.
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending { Direction::Asc } else { Direction::Desc }
    }
}

/// Specifies the ordering of rows at every level of the tree.
///
/// The order is expressed on a canonical [`Field`], so the same order can be
/// applied to levels whose backing columns differ.
///
/// # Example
///
/// ```
/// use dicomtree_lib::model::Field;
/// use dicomtree_lib::query::SortOrder;
///
/// let order = SortOrder::desc(Field::Date);
/// assert_eq!(order.to_sql(), "\"Date\" DESC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortOrder {
    field: Field,
    direction: Direction,
}

impl SortOrder {
    /// Creates an order on a field with the given direction.
    pub fn new(field: Field, direction: Direction) -> Self {
        Self { field, direction }
    }

    /// Creates an ascending order on a field.
    pub fn asc(field: Field) -> Self {
        Self::new(field, Direction::Asc)
    }

    /// Creates a descending order on a field.
    pub fn desc(field: Field) -> Self {
        Self::new(field, Direction::Desc)
    }

    /// Returns the field rows are ordered by.
    pub fn field(&self) -> Field {
        self.field
    }

    /// Returns the direction rows are ordered in.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Renders the `ORDER BY` term, without the keyword.
    pub fn to_sql(&self) -> String {
        format!(
            "{} {}",
            quote_identifier(self.field.label()),
            self.direction.keyword()
        )
    }
}
