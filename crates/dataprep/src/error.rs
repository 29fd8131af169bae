//! Error types for the dataprep library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dataprep operations.
#[derive(Debug, Error)]
pub enum DataPrepError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// File format (or save format name) not supported.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Bad directory key, unknown column, or other invalid caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed content after the format was identified.
    #[error("parse error for '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    /// A value in a date column could not be parsed as a timestamp.
    #[error("cannot parse '{value}' in column '{column}' as a date")]
    DateParse { column: String, value: String },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reading or writing a spreadsheet.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Error building a backup archive.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl DataPrepError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a parse failure with the path it occurred on.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for dataprep operations.
pub type Result<T> = std::result::Result<T, DataPrepError>;
