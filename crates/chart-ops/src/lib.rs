//! # chart-ops
//!
//! Chart patch operations for color matrix calibration.
//!
//! A reference chart (for example a 4x6 color checker) is shot twice, once
//! through the camera being matched (*front*) and once as the reference
//! (*target*). This crate turns those two images into a 3x3 matrix.
//!
//! # Modules
//!
//! - [`patch_map`] - Pixel to patch labeling from a [`ChartLayout`]
//! - [`sampler`] - Per-patch averaging and broadcast
//! - [`fit`] - Least-squares color matrix fitting
//! - [`apply`] - Applying a matrix to an image
//!
//! # Pipeline
//!
//! ```rust
//! use chart_core::{ChartLayout, RgbPlanes};
//! use chart_ops::{compute_labels, fit, sample_chart};
//!
//! let layout = ChartLayout::new(4, 6, 0.4, 0.0, 0.0)?;
//! let front = RgbPlanes::from_fn(240, 160, |x, y| {
//!     let patch = (y / 40 * 6 + x / 40) as f32;
//!     [0.05 + patch * 0.03, 0.1 + (patch * 0.7).sin().abs() * 0.5, 0.6 - patch * 0.02]
//! });
//! let target = chart_ops::apply_matrix(&front, &chart_math::Mat3::scale(1.5))?;
//!
//! let labels = compute_labels(240, 160, &layout)?;
//! let result = fit(&sample_chart(&front, &labels)?, &sample_chart(&target, &labels)?)?;
//! assert!(result.matrix.max_abs_diff(&chart_math::Mat3::scale(1.5)) < 1e-4);
//! # Ok::<(), chart_core::Error>(())
//! ```
//!
//! Label `0` ([`LabelImage::UNASSIGNED`]) marks pixels between patches.
//! Every consumer here skips it explicitly.
//!
//! # Features
//!
//! - `parallel` (default) - Label rows, sample channels and apply matrices
//!   with rayon. Results are identical with the feature off.
//!
//! # Dependencies
//!
//! - [`chart_core`] - Planes, labels, layout, errors
//! - [`chart_math`] - Matrix type and least-squares solver
//! - `rayon` - Optional parallelism

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod apply;
pub mod fit;
pub mod patch_map;
pub mod sampler;

pub use apply::apply_matrix;
pub use fit::{ColorFit, MIN_PATCHES, PatchSampleSet, fit, fit_samples};
pub use patch_map::{PatchGrid, compute_labels};
pub use sampler::{PatchAverages, PatchReport, average_by_label, broadcast, sample_chart};

pub use chart_core::{ChartLayout, LabelImage};
