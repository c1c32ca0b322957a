//! # chart-core
//!
//! Core types for deriving color matrices from photographed reference charts.
//!
//! This crate provides the foundational types used throughout the chartmatrix
//! workspace:
//!
//! - [`Plane`] - One color channel of an image as a row-major `f32` grid
//! - [`RgbPlanes`] - Three equal-shaped planes forming an RGB image
//! - [`LabelImage`] - Per-pixel patch identifiers (0 = no patch)
//! - [`ChartLayout`] - Validated chart grid and sampling parameters
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. The matrix crates do not use
//! it; image data and matrices meet in `chart-ops`:
//!
//! ```text
//! crate          depended on by
//! chart-core     chart-io, chart-ops, chart-cli
//! chart-math     chart-ops, chart-export
//! chart-io       chart-cli
//! chart-ops      chart-cli
//! chart-export   chart-cli
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use chart_core::{ChartLayout, Plane};
//!
//! let layout = ChartLayout::new(4, 6, 0.4, 0.0, 0.0).unwrap();
//! assert_eq!(layout.patch_count(), 24);
//!
//! let plane = Plane::filled(24, 16, 1.0);
//! assert_eq!(plane.dimensions(), (24, 16));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod labels;
pub mod layout;
pub mod plane;

pub use error::{Error, Result};
pub use labels::LabelImage;
pub use layout::ChartLayout;
pub use plane::{Plane, RgbPlanes};

/// Prelude module for convenient imports.
///
/// ```
/// use chart_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::labels::LabelImage;
    pub use crate::layout::ChartLayout;
    pub use crate::plane::{Plane, RgbPlanes};
}
