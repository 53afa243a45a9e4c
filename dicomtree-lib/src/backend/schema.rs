//! DICOM index database schema.
//!
//! The tables and columns the level statements read. Databases produced by
//! a DICOM indexer carry more columns than these; only the ones listed here
//! are required.

use rusqlite::Connection;

/// Tables read by the browser, from the top level down.
pub const TABLES: [&str; 4] = ["Patients", "Studies", "Series", "Images"];

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS Patients (
        UID INTEGER PRIMARY KEY AUTOINCREMENT,
        PatientsName TEXT,
        PatientID TEXT,
        PatientsBirthDate TEXT,
        PatientsAge TEXT
    );

    CREATE TABLE IF NOT EXISTS Studies (
        StudyInstanceUID TEXT PRIMARY KEY NOT NULL,
        PatientsUID INTEGER NOT NULL,
        StudyDate TEXT,
        StudyDescription TEXT,
        ModalitiesInStudy TEXT,
        AccessionNumber TEXT,
        ReferringPhysician TEXT,
        PerformingPysiciansName TEXT
    );

    CREATE TABLE IF NOT EXISTS Series (
        SeriesInstanceUID TEXT PRIMARY KEY NOT NULL,
        StudyInstanceUID TEXT NOT NULL,
        SeriesDate TEXT,
        SeriesDescription TEXT,
        BodyPartExamined TEXT,
        AcquisitionNumber TEXT
    );

    CREATE TABLE IF NOT EXISTS Images (
        Filename TEXT PRIMARY KEY NOT NULL,
        SeriesInstanceUID TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_studies_patient ON Studies(PatientsUID);
    CREATE INDEX IF NOT EXISTS idx_series_study ON Series(StudyInstanceUID);
    CREATE INDEX IF NOT EXISTS idx_images_series ON Images(SeriesInstanceUID);
";

/// Creates the index tables if they don't exist.
pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_TABLES)
}

/// Returns the index tables missing from `conn`.
pub fn missing_tables(conn: &Connection) -> rusqlite::Result<Vec<&'static str>> {
    let mut stmt = conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    let mut missing = Vec::new();
    for table in TABLES {
        if !stmt.exists([table])? {
            missing.push(table);
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(missing_tables(&conn).unwrap(), TABLES.to_vec());
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
        assert!(missing_tables(&conn).unwrap().is_empty());
    }
}
