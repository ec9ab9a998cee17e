use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// Result alias used across the library
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that stop a report run
///
/// Malformed rows are not represented here: they are skipped and counted,
/// never surfaced as errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("[E{:04}] Cannot open input file {}", ErrorCode::INPUT_OPEN_FAILED, .path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[E{:04}] Column '{column}' not found in header of {}", ErrorCode::INPUT_MISSING_COLUMN, .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("[E{:04}] Failed to read CSV data from {}", ErrorCode::INPUT_READ_FAILED, .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("[E{:04}] Failed to write chunk file {}", ErrorCode::CHUNK_WRITE_FAILED, .path.display())]
    ChunkWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[E{:04}] Failed to write report to {}", ErrorCode::REPORT_WRITE_FAILED, .path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[E{:04}] Aggregation of chunk {chunk} did not complete: {message}", ErrorCode::WORKER_FAILED)]
    WorkerFailed { chunk: usize, message: String },

    #[error("[E{:04}] Invalid configuration for '{field}': {reason}", ErrorCode::CONFIG_INVALID_VALUE)]
    InvalidConfig { field: String, reason: String },

    #[error("[E{:04}] Failed to load configuration from {}: {reason}", ErrorCode::CONFIG_PARSE_ERROR, .path.display())]
    ConfigLoad { path: PathBuf, reason: String },
}

impl ReportError {
    /// Stable numeric code for this error
    pub fn code(&self) -> u16 {
        match self {
            Self::InputOpen { .. } => ErrorCode::INPUT_OPEN_FAILED,
            Self::MissingColumn { .. } => ErrorCode::INPUT_MISSING_COLUMN,
            Self::Csv { .. } => ErrorCode::INPUT_READ_FAILED,
            Self::ChunkWrite { .. } => ErrorCode::CHUNK_WRITE_FAILED,
            Self::ReportWrite { .. } => ErrorCode::REPORT_WRITE_FAILED,
            Self::WorkerFailed { .. } => ErrorCode::WORKER_FAILED,
            Self::InvalidConfig { .. } => ErrorCode::CONFIG_INVALID_VALUE,
            Self::ConfigLoad { .. } => ErrorCode::CONFIG_PARSE_ERROR,
        }
    }

    pub fn input_open(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::InputOpen {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn missing_column(path: impl AsRef<Path>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            path: path.as_ref().to_path_buf(),
            column: column.into(),
        }
    }

    pub fn csv(path: impl AsRef<Path>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error was caused by an input file that could not be opened
    pub fn is_input_missing(&self) -> bool {
        matches!(self, Self::InputOpen { .. })
    }
}
