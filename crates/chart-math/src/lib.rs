//! # chart-math
//!
//! Math utilities for chart-based color calibration.
//!
//! - [`Mat3`] - 3x3 `f64` color matrix
//! - [`least_squares`] - Fit `b ≈ M · a` over many RGB correspondences
//!
//! # Design
//!
//! Matrices are stored **row-major** and act on **column vectors**:
//!
//! ```text
//! result = matrix * rgb
//! ```
//!
//! This is the convention of Nuke's ColorMatrix node and of CLF `Matrix`
//! elements, so a fitted matrix can be exported without transposition.
//! The solver works in `f64` through [`glam::DMat3`].
//!
//! # Usage
//!
//! ```rust
//! use chart_math::{least_squares, Mat3};
//!
//! let front = [[0.2, 0.1, 0.1], [0.1, 0.3, 0.1], [0.1, 0.1, 0.4], [0.5, 0.5, 0.5]];
//! let target: Vec<[f64; 3]> = front.iter().map(|&c| Mat3::scale(2.0).transform(c)).collect();
//!
//! let m = least_squares(&front, &target).unwrap();
//! assert!(m.max_abs_diff(&Mat3::scale(2.0)) < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod lstsq;
mod mat3;

pub use lstsq::*;
pub use mat3::*;
