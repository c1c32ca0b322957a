//! Error types for plane I/O.

use std::io;
use thiserror::Error;

/// Errors that can occur while decoding or encoding planes.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Missing, corrupt, or channel-incomplete image file.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// The image could not be written.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Plane or label shapes disagree.
    #[error(transparent)]
    Core(#[from] chart_core::Error),
}

impl IoError {
    /// Returns `true` for decode failures.
    #[inline]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::DecodeError(_))
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
