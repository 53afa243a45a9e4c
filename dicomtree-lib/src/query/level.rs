//! Hierarchy levels and their statement strategies.

use crate::model::Field;

use super::order::SortOrder;
use super::statement::quote_identifier;
use super::statement::Statement;

/// Alias of the column that links a row to the rows beneath it.
///
/// Every level projects its identifying column under this alias, and a
/// child node reads its key from it.
pub const KEY_FIELD: &str = "UID";

/// Depth of a node in the browser tree.
///
/// A node's level is always its parent's level plus one. The level decides
/// which rows the node owns: the root owns patients, a patient owns studies,
/// a study owns series and a series owns images. Images own nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// The invisible root above all patients.
    Root,
    /// A patient row.
    Patient,
    /// A study row.
    Study,
    /// A series row.
    Series,
    /// An image row (leaf).
    Image,
}

impl Level {
    /// All levels, from the root down.
    pub const ALL: [Level; 5] = [
        Level::Root,
        Level::Patient,
        Level::Study,
        Level::Series,
        Level::Image,
    ];

    /// Returns the depth of this level (the root is 0).
    pub fn depth(self) -> usize {
        self as usize
    }

    /// Returns the level of this level's children, or `None` for leaves.
    pub fn child(self) -> Option<Level> {
        match self {
            Level::Root => Some(Level::Patient),
            Level::Patient => Some(Level::Study),
            Level::Study => Some(Level::Series),
            Level::Series => Some(Level::Image),
            Level::Image => None,
        }
    }

    /// Returns `true` if nodes at this level never own rows.
    pub fn is_leaf(self) -> bool {
        self.child().is_none()
    }

    /// Returns the strategy that lists the rows owned by a node at this level.
    pub fn query(self) -> &'static dyn LevelQuery {
        match self {
            Level::Root => &PATIENTS,
            Level::Patient => &STUDIES,
            Level::Study => &SERIES,
            Level::Series => &IMAGES,
            Level::Image => &LEAF,
        }
    }
}

/// Maps a backing-store column onto a canonical display field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    /// Column name in the backing store.
    pub column: &'static str,
    /// Canonical field the column is exposed as.
    pub field: Field,
}

const fn project(column: &'static str, field: Field) -> Projection {
    Projection { column, field }
}

/// Builds the statement for one level of the hierarchy.
///
/// The set of strategies is closed: one per [`Level`], chosen by
/// [`Level::query`] when a node is created.
pub trait LevelQuery: Send + Sync {
    /// Backing columns and the canonical fields they are exposed as.
    ///
    /// Empty for levels without a statement.
    fn projection(&self) -> &'static [Projection];

    /// Builds the statement listing the rows owned by a node at this level.
    ///
    /// `key` is the owning node's key; it is ignored by the root level.
    /// Returns `None` for levels that own no rows.
    fn build(&self, key: &str, sort: Option<&SortOrder>) -> Option<Statement>;

    /// Returns `true` if the level exposes `field`.
    fn projects(&self, field: Field) -> bool {
        self.projection().iter().any(|p| p.field == field)
    }
}

/// A level whose rows come from one table.
struct TableQuery {
    table: &'static str,
    /// Column exposed as [`KEY_FIELD`].
    key_column: &'static str,
    /// Column holding the parent's key. `None` for the top table.
    link_column: Option<&'static str>,
    projection: &'static [Projection],
}

impl LevelQuery for TableQuery {
    fn projection(&self) -> &'static [Projection] {
        self.projection
    }

    fn build(&self, key: &str, sort: Option<&SortOrder>) -> Option<Statement> {
        let mut columns = vec![format!(
            "{} AS {}",
            self.key_column,
            quote_identifier(KEY_FIELD)
        )];
        columns.extend(
            self.projection
                .iter()
                .map(|p| format!("{} AS {}", p.column, quote_identifier(p.field.label()))),
        );

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.table);
        let mut params = Vec::new();

        if let Some(link) = self.link_column {
            sql.push_str(&format!(" WHERE {} = ?1", link));
            params.push(key.to_string());
        }

        if let Some(order) = sort.filter(|o| self.projects(o.field())) {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.to_sql());
        }

        Some(
            params
                .into_iter()
                .fold(Statement::new(sql), |stmt, param| stmt.bind(param)),
        )
    }
}

/// Images own no rows.
struct LeafQuery;

impl LevelQuery for LeafQuery {
    fn projection(&self) -> &'static [Projection] {
        &[]
    }

    fn build(&self, _key: &str, _sort: Option<&SortOrder>) -> Option<Statement> {
        None
    }
}

static PATIENTS: TableQuery = TableQuery {
    table: "Patients",
    key_column: "UID",
    link_column: None,
    projection: &[
        project("PatientsName", Field::Name),
        project("PatientsAge", Field::Age),
        project("PatientsBirthDate", Field::Date),
        project("PatientID", Field::SubjectId),
    ],
};

static STUDIES: TableQuery = TableQuery {
    table: "Studies",
    key_column: "StudyInstanceUID",
    link_column: Some("PatientsUID"),
    projection: &[
        project("StudyDescription", Field::Name),
        project("ModalitiesInStudy", Field::Scan),
        project("StudyDate", Field::Date),
        project("AccessionNumber", Field::Number),
        project("ReferringPhysician", Field::Institution),
        project("ReferringPhysician", Field::Referrer),
        project("PerformingPysiciansName", Field::Performer),
    ],
};

static SERIES: TableQuery = TableQuery {
    table: "Series",
    key_column: "SeriesInstanceUID",
    link_column: Some("StudyInstanceUID"),
    projection: &[
        project("SeriesDescription", Field::Name),
        project("BodyPartExamined", Field::Scan),
        project("SeriesDate", Field::Date),
        project("AcquisitionNumber", Field::Number),
    ],
};

static IMAGES: TableQuery = TableQuery {
    table: "Images",
    key_column: "Filename",
    link_column: Some("SeriesInstanceUID"),
    projection: &[
        project("Filename", Field::Name),
        project("SeriesInstanceUID", Field::Date),
    ],
};

static LEAF: LeafQuery = LeafQuery;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_statement_has_no_filter() {
        let stmt = Level::Root.query().build("ignored", None).unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT UID AS \"UID\", PatientsName AS \"Name\", PatientsAge AS \"Age\", \
             PatientsBirthDate AS \"Date\", PatientID AS \"Subject ID\" FROM Patients"
        );
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_child_statement_binds_key() {
        let stmt = Level::Study.query().build("1.2.3", None).unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT SeriesInstanceUID AS \"UID\", SeriesDescription AS \"Name\", \
             BodyPartExamined AS \"Scan\", SeriesDate AS \"Date\", \
             AcquisitionNumber AS \"Number\" FROM Series WHERE StudyInstanceUID = ?1"
        );
        assert_eq!(stmt.params(), &["1.2.3".to_string()]);
    }

    #[test]
    fn test_key_is_never_spliced() {
        let stmt = Level::Patient.query().build("x' OR '1'='1", None).unwrap();
        assert!(!stmt.sql().contains("OR '1'"));
        assert_eq!(stmt.params(), &["x' OR '1'='1".to_string()]);
    }

    #[test]
    fn test_sort_appended_after_filter() {
        let order = SortOrder::desc(Field::Date);
        let stmt = Level::Series.query().build("s1", Some(&order)).unwrap();
        assert!(stmt
            .sql()
            .ends_with("FROM Images WHERE SeriesInstanceUID = ?1 ORDER BY \"Date\" DESC"));
    }

    #[test]
    fn test_sort_skipped_when_field_not_projected() {
        let order = SortOrder::asc(Field::Age);
        let stmt = Level::Patient.query().build("p1", Some(&order)).unwrap();
        assert!(!stmt.sql().contains("ORDER BY"));

        let stmt = Level::Root.query().build("", Some(&order)).unwrap();
        assert!(stmt.sql().ends_with("ORDER BY \"Age\" ASC"));
    }

    #[test]
    fn test_leaf_has_no_statement() {
        assert!(Level::Image.query().build("a.dcm", None).is_none());
        assert!(Level::Image.query().projection().is_empty());
    }

    #[test]
    fn test_level_progression() {
        for pair in Level::ALL.windows(2) {
            assert_eq!(pair[0].child(), Some(pair[1]));
            assert_eq!(pair[0].depth() + 1, pair[1].depth());
        }
        assert!(Level::Image.is_leaf());
    }
}
