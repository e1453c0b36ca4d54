//! Error types for the data-loader crate.
//!
//! The same enum is used for hard failures while reading a dataset and for
//! the soft, per-record failures the rating matrix builder reports and skips.

use thiserror::Error;

/// Errors that can occur while loading, parsing or cross-referencing a dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    ///
    /// Stored as text so the error stays `Clone` and can be collected in
    /// build reports.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Expected number of fields in a line doesn't match actual
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// Referenced entity doesn't exist (e.g., rating for an item missing from the catalog)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: String },
}

impl From<std::io::Error> for DataLoadError {
    fn from(err: std::io::Error) -> Self {
        DataLoadError::IoError(err.to_string())
    }
}

impl DataLoadError {
    /// Shorthand for a missing user reference
    pub fn missing_user(id: &str) -> Self {
        DataLoadError::MissingReference {
            entity: "User".to_string(),
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing item reference
    pub fn missing_item(id: &str) -> Self {
        DataLoadError::MissingReference {
            entity: "Item".to_string(),
            id: id.to_string(),
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
