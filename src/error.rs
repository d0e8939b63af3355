//! Error types for status parsing, config reading and output formatting

use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for status operations
#[derive(Error, Debug)]
pub enum StatusError {
    /// Status file could not be opened
    #[error("failed to open file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure in the middle of a scan
    #[error("error reading file after line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single status line could not be decoded
    #[error(transparent)]
    Record(#[from] ParseError),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StatusError {
    /// Whether the scan kept going after this error.
    ///
    /// Recoverable errors only ever show up in a parse outcome's error list.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StatusError::Record(_) | StatusError::Read { .. })
    }
}

/// Result type alias for status operations
pub type Result<T> = std::result::Result<T, StatusError>;

/// A recoverable failure on one line of a status file.
///
/// The record is still appended when a numeric sub-field fails; the field
/// keeps its zero value and this error describes what was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}, field {field}, value {value:?}: {cause}")]
pub struct ParseError {
    /// 1-indexed line number
    pub line: usize,
    /// Field name, or the record type for whole-line rejections
    pub field: &'static str,
    /// Raw offending text
    pub value: String,
    #[source]
    pub cause: FieldError,
}

/// Why a field or line was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("expected at least {expected} fields, got {got}")]
    TooFewFields { expected: usize, got: usize },

    #[error(transparent)]
    InvalidInteger(#[from] ParseIntError),
}
