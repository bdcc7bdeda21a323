//! Error types for watchwrap

use thiserror::Error;

/// Errors that can occur while loading an export or computing analytics
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse export: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    /// The view holds no rows a computation needs. Callers should treat this
    /// as "nothing to show", not as a failure of the export.
    #[error("No data: {0}")]
    NoData(String),
}

impl ComputeError {
    /// Whether this error means "the current view is empty"
    pub fn is_no_data(&self) -> bool {
        matches!(self, ComputeError::NoData(_))
    }
}
