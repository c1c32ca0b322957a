//! Error types for chart-core operations.
//!
//! The [`Error`] enum covers every failure mode of the calibration core:
//! - Layout validation ([`InvalidConfiguration`](Error::InvalidConfiguration))
//! - Plane and label shape checks
//! - Matrix fitting preconditions ([`InsufficientSamples`](Error::InsufficientSamples),
//!   [`DegenerateFit`](Error::DegenerateFit))
//!
//! # Usage
//!
//! ```rust
//! use chart_core::{Error, Result};
//!
//! fn check_rows(rows: u32) -> Result<()> {
//!     if rows == 0 {
//!         return Err(Error::invalid_configuration("rows must be positive"));
//!     }
//!     Ok(())
//! }
//! assert!(check_rows(0).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building labels, sampling patches or fitting.
#[derive(Debug, Error)]
pub enum Error {
    /// Chart layout parameters are out of range.
    ///
    /// Checked before any geometry is computed: non-positive rows/cols,
    /// non-finite sample fraction, or squeeze at or below -1.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Two planes (or a plane and a label image) differ in size.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First width
        a_width: usize,
        /// First height
        a_height: usize,
        /// Second width
        b_width: usize,
        /// Second height
        b_height: usize,
    },

    /// Buffer length does not agree with the stated dimensions, or a
    /// dimension is zero.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// A label value exceeds the patch count of its label image.
    #[error("label {label} out of range (max {max})")]
    LabelOutOfRange {
        /// Offending label
        label: u32,
        /// Largest permitted label
        max: u32,
    },

    /// Too few valid patches remain for a 3x3 fit.
    #[error("insufficient samples: {found} valid patches, need at least {required}")]
    InsufficientSamples {
        /// Valid patches after rejection
        found: usize,
        /// Minimum needed
        required: usize,
    },

    /// The valid patches do not span RGB space, so the fit has no unique
    /// solution.
    #[error("degenerate fit: {0}")]
    DegenerateFit(String),

    /// I/O error while reading configuration files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an [`Error::InvalidConfiguration`] error.
    #[inline]
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (usize, usize), b: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: usize, height: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DegenerateFit`] error.
    #[inline]
    pub fn degenerate_fit(msg: impl Into<String>) -> Self {
        Self::DegenerateFit(msg.into())
    }

    /// Returns `true` for layout validation failures.
    #[inline]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }

    /// Returns `true` if the error came from the matrix fit preconditions.
    #[inline]
    pub fn is_fit_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientSamples { .. } | Self::DegenerateFit(_)
        )
    }

    /// Returns `true` for shape errors.
    #[inline]
    pub fn is_dimension_error(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. } | Self::InvalidDimensions { .. }
        )
    }
}
