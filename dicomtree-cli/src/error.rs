//! CLI error types

use std::io;
use std::path::PathBuf;

use dicomtree_lib::error::QueryError;

/// Errors that end a `dicomtree` run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The database could not be opened or inspected.
    #[error("database error: {0}")]
    Query(#[from] QueryError),

    /// SQLite rejected a schema lookup.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database path does not exist.
    #[error("no such database: {}", .0.display())]
    NotFound(PathBuf),

    /// Writing output failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A logger was already installed.
    #[error("failed to initialize logging: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::NotFound(_) => 2,
            CliError::Io(_) | CliError::Json(_) => 74,
            _ => 1,
        }
    }
}
