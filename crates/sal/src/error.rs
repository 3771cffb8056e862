//! Error types for the SAL library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for SAL operations.
#[derive(Debug, Error)]
pub enum SalError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A raw column header has no canonical mapping.
    #[error("No canonical field for header '{header}'; extend the header mapping table")]
    HeaderMapping { header: String },

    /// Two raw headers resolved to the same canonical field.
    #[error("Headers '{first}' and '{second}' both map to canonical field '{field}'")]
    DuplicateField {
        field: String,
        first: String,
        second: String,
    },

    /// A required canonical field is absent from the input.
    #[error("Required field '{field}' is missing from the input headers")]
    MissingField { field: String },

    /// A statute-type label has no canonical category.
    #[error("Row {row}: no statute type for label '{label}'; extend the statute mapping table")]
    StatuteTypeMapping { label: String, row: usize },

    /// Value cannot be written as a Roman numeral.
    #[error("{value} is outside the Roman numeral range 1-3999")]
    NumeralRange { value: u64 },

    /// A field value failed validation during normalization.
    #[error("Row {row}, field '{field}': {message}")]
    InvalidRecord {
        row: usize,
        field: String,
        message: String,
    },

    /// An audit session cannot start over the existing checkpoint.
    #[error("Checkpoint conflict for dataset '{dataset}': {reason}")]
    CheckpointConflict { dataset: String, reason: String },

    /// A record reached generation with a category no formatter handles.
    #[error("Row {row}: no formatter registered for statute type '{statute_type}'")]
    UnreachableState { statute_type: String, row: usize },

    /// A record reached generation without a completed audit.
    #[error("Row {row} has not been audited")]
    NotAudited { row: usize },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Saving or loading persisted state failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid operation for the current state.
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SalError {
    /// Build an [`SalError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SalError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an [`SalError::InvalidRecord`].
    pub fn invalid(row: usize, field: &str, message: impl Into<String>) -> Self {
        SalError::InvalidRecord {
            row,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for SAL operations.
pub type Result<T> = std::result::Result<T, SalError>;
