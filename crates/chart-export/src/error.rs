//! Error types for matrix export.

use thiserror::Error;

/// Errors that can occur while writing or reading exported matrices.
#[derive(Debug, Error)]
pub enum ExportError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML could not be produced.
    #[error("write error: {0}")]
    WriteError(String),

    /// A transform document is malformed or has no usable matrix.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The matrix holds NaN or infinite entries.
    #[error("matrix has non-finite entries")]
    NonFinite,
}

impl ExportError {
    /// Returns `true` for malformed input documents.
    #[inline]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError(_))
    }
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
