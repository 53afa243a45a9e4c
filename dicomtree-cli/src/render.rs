//! Tree walking and output formatting.

use std::collections::BTreeMap;
use std::io;
use std::io::Write;

use serde::Serialize;

use dicomtree_lib::model::Field;
use dicomtree_lib::model::ModelIndex;
use dicomtree_lib::model::Value;
use dicomtree_lib::DicomModel;

/// One row of the browsed tree.
#[derive(Debug, Serialize)]
pub struct Entry {
    /// Hierarchy level of the row.
    pub level: String,
    /// Non-null fields of the row, by label.
    pub fields: BTreeMap<&'static str, Value>,
    /// Rows beneath this one, if the walk went that deep.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Entry>,
    /// `true` if rows beneath this one were left out.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// Walks a model breadth-limited and depth-limited.
pub struct Walker<'a> {
    model: &'a DicomModel,
    depth: usize,
    limit: usize,
}

impl<'a> Walker<'a> {
    pub fn new(model: &'a DicomModel) -> Self {
        Self {
            model,
            depth: 1,
            limit: usize::MAX,
        }
    }

    /// Number of levels to descend, patients being the first.
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Maximum rows listed under each parent.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Collects the top-level rows and their descendants.
    pub fn walk(&self) -> Vec<Entry> {
        self.rows(&ModelIndex::root(), 1)
    }

    fn rows(&self, parent: &ModelIndex, depth: usize) -> Vec<Entry> {
        self.fill(parent);
        let count = self.model.row_count(parent).min(self.limit);
        (0..count)
            .filter_map(|row| self.model.index(row, 0, parent))
            .map(|index| self.entry(&index, depth))
            .collect()
    }

    /// Fetches until `limit` rows are known or the parent is exhausted.
    fn fill(&self, parent: &ModelIndex) {
        while self.model.row_count(parent) < self.limit && self.model.can_fetch_more(parent) {
            if self.model.fetch_more(parent).added() == 0 {
                break;
            }
        }
    }

    fn entry(&self, index: &ModelIndex, depth: usize) -> Entry {
        let level = index
            .node()
            .and_then(|id| self.model.tree().node(id).map(|n| format!("{:?}", n.level())))
            .unwrap_or_default();

        let fields = Field::ALL
            .iter()
            .filter_map(|&field| {
                let value = self.model.field_value(index, field)?;
                (!value.is_null()).then_some((field.label(), value))
            })
            .collect();

        let (children, truncated) = if depth < self.depth {
            let children = self.rows(index, depth + 1);
            let truncated = self.model.row_count(index) > children.len()
                || self.model.can_fetch_more(index);
            (children, truncated)
        } else {
            (Vec::new(), self.model.has_children(index))
        };

        Entry {
            level,
            fields,
            children,
            truncated,
        }
    }
}

/// Writes entries as an indented outline.
pub fn write_text(out: &mut impl Write, entries: &[Entry]) -> io::Result<()> {
    write_level(out, entries, 0)
}

fn write_level(out: &mut impl Write, entries: &[Entry], indent: usize) -> io::Result<()> {
    for entry in entries {
        let name = entry
            .fields
            .get(Field::Name.label())
            .map(Value::to_string)
            .unwrap_or_else(|| "(unnamed)".to_string());
        let details = entry
            .fields
            .iter()
            .filter(|(label, _)| **label != Field::Name.label())
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>();

        write!(out, "{:indent$}{} {}", "", entry.level, name, indent = indent * 2)?;
        if !details.is_empty() {
            write!(out, " [{}]", details.join(", "))?;
        }
        if entry.truncated {
            write!(out, " ...")?;
        }
        writeln!(out)?;

        write_level(out, &entry.children, indent + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicomtree_lib::backend::schema;
    use dicomtree_lib::backend::SqliteExecutor;

    fn model() -> DicomModel {
        let executor = SqliteExecutor::open_in_memory().unwrap();
        schema::create_tables(executor.connection()).unwrap();
        executor
            .connection()
            .execute_batch(
                "
                INSERT INTO Patients (PatientsName, PatientID) VALUES ('Doe^Jane', 'P-1');
                INSERT INTO Patients (PatientsName, PatientID) VALUES ('Roe^Rick', 'P-2');
                INSERT INTO Studies (StudyInstanceUID, PatientsUID, StudyDescription, StudyDate)
                    VALUES ('1.1', 1, 'Head', '20240102'), ('1.2', 1, 'Chest', '20240301');
                ",
            )
            .unwrap();
        let model = DicomModel::default();
        model.set_backing_store(executor);
        model
    }

    #[test]
    fn test_walk_two_levels() {
        let model = model();
        let entries = Walker::new(&model).depth(2).walk();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, "Patient");
        assert_eq!(entries[0].fields["Subject ID"], Value::from("P-1"));
        assert_eq!(entries[0].children.len(), 2);
        assert_eq!(entries[0].children[1].fields["Name"], Value::from("Chest"));
        assert!(!entries[0].truncated);
        assert!(entries[1].children.is_empty());
    }

    #[test]
    fn test_limit_marks_truncation() {
        let model = model();
        let entries = Walker::new(&model).depth(2).limit(1).walk();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].children.len(), 1);
        assert!(entries[0].truncated);
    }

    #[test]
    fn test_text_outline() {
        let model = model();
        let entries = Walker::new(&model).limit(1).walk();

        let mut out = Vec::new();
        write_text(&mut out, &entries).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Patient Doe^Jane [Subject ID: P-1] ...\n"
        );
    }

    #[test]
    fn test_json_skips_empty_children() {
        let model = model();
        let entries = Walker::new(&model).limit(1).walk();

        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "level": "Patient",
                "fields": { "Name": "Doe^Jane", "Subject ID": "P-1" },
                "truncated": true
            }])
        );
    }
}
