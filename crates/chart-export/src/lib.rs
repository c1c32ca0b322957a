//! # chart-export
//!
//! Writers for fitted chart matrices.
//!
//! - [`nuke`] - `ColorMatrix` node text for Nuke scripts
//! - [`clf`] - Academy Common LUT Format `ProcessList` with one `Matrix`
//!
//! Both write the nine entries row-major as plain decimal text. Values are
//! printed with the shortest representation that parses back to the same
//! `f64`, so a written matrix reads back bit-identical.
//!
//! # Example
//!
//! ```rust,no_run
//! use chart_export::{clf, nuke};
//! use chart_math::Mat3;
//!
//! let m = Mat3::from_rows([[1.08, -0.05, -0.03], [-0.01, 0.99, 0.02], [0.0, -0.14, 1.14]]);
//! nuke::write_color_matrix("chart.nk", &m)?;
//! clf::write_transform_document("chart.clf", &m)?;
//! # Ok::<(), chart_export::ExportError>(())
//! ```
//!
//! # Dependencies
//!
//! - `quick-xml` - CLF reading and writing
//! - `rand` - Document ids

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod clf;
pub mod nuke;

pub use error::{ExportError, ExportResult};
pub use clf::{ProcessList, read_matrix_clf, to_transform_document, write_transform_document};
pub use nuke::{to_compositing_script, write_color_matrix};

/// Shortest round-trip decimal text; negative zero prints as `0`.
pub(crate) fn format_value(v: f64) -> String {
    if v == 0.0 { "0".to_string() } else { v.to_string() }
}
