//! Error types for the Morsel sales pipeline.
//!
//! - [`CsvError`] - Parsing a single source file
//! - [`PipelineError`] - Directory ingestion and artifact I/O
//! - [`ConfigError`] - Environment configuration
//! - [`ServerError`] - HTTP query API
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while parsing one source file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Structurally invalid delimited text.
    #[error("Invalid CSV format: {0}")]
    ParseError(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Header row lacks a required column.
    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    /// A row ends before one of the required columns.
    #[error("Line {line}: missing field '{column}' ({found} of {expected} fields present)")]
    MissingField {
        line: u64,
        column: String,
        expected: usize,
        found: usize,
    },

    /// A retained row holds a value that cannot be converted.
    #[error("Line {line}, column '{column}' (value '{value}'): {message}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
        message: String,
    },
}

impl CsvError {
    pub fn invalid_value(
        line: u64,
        column: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            line,
            column: column.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Coarse classification of pipeline failures.
///
/// Operators need to tell "nothing to report" apart from "something broke".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingResource,
    MalformedInput,
    EmptyResult,
    Io,
}

/// Ingestion orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input directory or artifact does not exist.
    #[error("Input not found: {}", .0.display())]
    MissingResource(PathBuf),

    /// Directory holds no file with a recognized extension.
    #[error("No CSV files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    /// Every file parsed, but none contained the target product.
    #[error("No '{product}' rows found in {files} file(s)")]
    NoMatchingRows { product: String, files: usize },

    /// A source file could not be parsed.
    #[error("Malformed input in {}: {source}", .file.display())]
    Malformed {
        file: PathBuf,
        #[source]
        source: CsvError,
    },

    /// Combined sales exceed the representable decimal range.
    #[error("Total sales of {rows} rows overflow the decimal range")]
    SalesOverflow { rows: usize },

    /// Reading or writing the artifact failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serializing the artifact failed.
    #[error("CSV write error: {0}")]
    WriteError(#[from] csv::Error),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingResource(_) => ErrorKind::MissingResource,
            Self::NoInputFiles(_) | Self::NoMatchingRows { .. } => ErrorKind::EmptyResult,
            Self::Malformed { .. } | Self::SalesOverflow { .. } => ErrorKind::MalformedInput,
            Self::IoError(_) | Self::WriteError(_) => ErrorKind::Io,
        }
    }

    /// Process exit code for the standalone ingestion command.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::EmptyResult => 2,
            ErrorKind::MissingResource => 3,
            ErrorKind::MalformedInput | ErrorKind::Io => 1,
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({message})")]
    InvalidVar {
        var: &'static str,
        value: String,
        message: String,
    },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinct() {
        let empty = PipelineError::NoMatchingRows {
            product: "pink morsel".into(),
            files: 3,
        };
        let malformed = PipelineError::Malformed {
            file: PathBuf::from("data/a.csv"),
            source: CsvError::MissingColumn("price".into()),
        };
        let missing = PipelineError::MissingResource(PathBuf::from("nowhere"));

        assert_eq!(empty.kind(), ErrorKind::EmptyResult);
        assert_eq!(malformed.kind(), ErrorKind::MalformedInput);
        assert_eq!(missing.kind(), ErrorKind::MissingResource);

        assert_eq!(empty.exit_code(), 2);
        assert_eq!(malformed.exit_code(), 1);
        assert_eq!(missing.exit_code(), 3);
    }

    #[test]
    fn test_invalid_value_format() {
        let err = CsvError::invalid_value(5, "price", "$abc", "not a decimal");
        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("column 'price'"));
        assert!(msg.contains("value '$abc'"));
    }

    #[test]
    fn test_sales_overflow_is_malformed_input() {
        let err = PipelineError::SalesOverflow { rows: 2 };
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_malformed_wraps_file_name() {
        let err = PipelineError::Malformed {
            file: PathBuf::from("daily_sales_data_0.csv"),
            source: CsvError::EmptyFile,
        };
        let msg = err.to_string();
        assert!(msg.contains("daily_sales_data_0.csv"));
        assert!(msg.contains("empty"));
    }
}
