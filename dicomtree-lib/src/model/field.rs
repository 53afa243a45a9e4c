//! Canonical display fields

use std::fmt;
use std::str::FromStr;

/// A display column of the model.
///
/// Field names are stable across levels even though the backing columns
/// they come from differ per level. Not every level populates every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Age,
    Scan,
    Date,
    SubjectId,
    Number,
    Institution,
    Referrer,
    Performer,
}

impl Field {
    /// All fields, in column order.
    pub const ALL: [Field; 9] = [
        Field::Name,
        Field::Age,
        Field::Scan,
        Field::Date,
        Field::SubjectId,
        Field::Number,
        Field::Institution,
        Field::Referrer,
        Field::Performer,
    ];

    /// Number of display columns.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the field shown in `column`.
    pub fn from_column(column: usize) -> Option<Field> {
        Self::ALL.get(column).copied()
    }

    /// Returns the column this field is shown in.
    pub fn column(self) -> usize {
        self as usize
    }

    /// Returns the canonical label, which is also the column alias used in
    /// every level's statement.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Age => "Age",
            Field::Scan => "Scan",
            Field::Date => "Date",
            Field::SubjectId => "Subject ID",
            Field::Number => "Number",
            Field::Institution => "Institution",
            Field::Referrer => "Referrer",
            Field::Performer => "Performer",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown field name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    /// Parses a label case-insensitively. Spaces, dashes and underscores are
    /// interchangeable, so `subject-id` and `Subject ID` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalize = |s: &str| {
            s.chars()
                .filter(|c| !matches!(c, ' ' | '-' | '_'))
                .flat_map(char::to_lowercase)
                .collect::<String>()
        };
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|field| normalize(field.label()) == wanted)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_round_trip() {
        for (column, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.column(), column);
            assert_eq!(Field::from_column(column), Some(*field));
        }
        assert_eq!(Field::from_column(Field::COUNT), None);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("Date".parse::<Field>(), Ok(Field::Date));
        assert_eq!("subject-id".parse::<Field>(), Ok(Field::SubjectId));
        assert_eq!("Subject ID".parse::<Field>(), Ok(Field::SubjectId));
        assert_eq!(
            "Modality".parse::<Field>(),
            Err(UnknownField("Modality".to_string()))
        );
    }
}
