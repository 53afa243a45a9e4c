//! SQL statement with bound parameters.

use std::fmt;

/// A statement ready to be handed to an [`Executor`](crate::backend::Executor).
///
/// Parameters are bound positionally (`?1`, `?2`, ...) and never spliced
/// into the SQL text, so key values need no escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    sql: String,
    params: Vec<String>,
}

impl Statement {
    /// Creates a statement with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Binds the next positional parameter.
    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Returns the SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the bound parameters, in placeholder order.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.sql)
        } else {
            write!(f, "{} {:?}", self.sql, self.params)
        }
    }
}

/// Quotes an identifier for use as a column alias.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("Subject ID"), "\"Subject ID\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_bind_appends_params() {
        let stmt = Statement::new("SELECT 1");
        assert!(stmt.params().is_empty());
        let stmt = stmt.bind("x").bind("y");
        assert_eq!(stmt.params(), &["x".to_string(), "y".to_string()]);
        assert_eq!(stmt.to_string(), "SELECT 1 [\"x\", \"y\"]");
    }
}
