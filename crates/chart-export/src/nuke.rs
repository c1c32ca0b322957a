//! Nuke `ColorMatrix` node export.
//!
//! The node can be pasted straight into a Nuke node graph:
//!
//! ```text
//! ColorMatrix {
//!  matrix {
//!      {1.1 -0.05 -0.05}
//!      {0 1 0}
//!      {0 0.02 0.98}
//!    }
//!  name ChartMatrix
//!  label "fitted from chart"
//! }
//! ```
//!
//! Nuke's ColorMatrix multiplies column vectors by a row-major matrix, the
//! same convention as [`Mat3`], so rows are written as-is.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chart_math::Mat3;
use tracing::debug;

use crate::{ExportError, ExportResult, format_value};

/// Node name written into the script.
pub const NODE_NAME: &str = "ChartMatrix";

/// Descriptive label shown on the node.
pub const NODE_LABEL: &str = "fitted from chart";

/// Renders `m` as a Nuke `ColorMatrix` node.
///
/// # Example
///
/// ```rust
/// use chart_export::nuke::to_compositing_script;
/// use chart_math::Mat3;
///
/// let script = to_compositing_script(&Mat3::scale(2.0));
/// assert!(script.contains("{2 0 0}"));
/// ```
pub fn to_compositing_script(m: &Mat3) -> String {
    let mut out = String::from("ColorMatrix {\n matrix {\n");
    for row in (0..3).map(|i| m.row(i)) {
        let values: Vec<String> = row.iter().map(|&v| format_value(v)).collect();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "     {{{}}}", values.join(" "));
    }
    out.push_str("   }\n");
    let _ = writeln!(out, " name {NODE_NAME}");
    let _ = writeln!(out, " label \"{NODE_LABEL}\"");
    out.push_str("}\n");
    out
}

/// Writes a Nuke `ColorMatrix` node to `path`.
///
/// # Errors
///
/// Returns [`ExportError::NonFinite`] for a matrix with NaN or infinite
/// entries and [`ExportError::Io`] if the file cannot be written.
pub fn write_color_matrix<P: AsRef<Path>>(path: P, m: &Mat3) -> ExportResult<()> {
    if !m.is_finite() {
        return Err(ExportError::NonFinite);
    }
    let path = path.as_ref();
    fs::write(path, to_compositing_script(m))?;
    debug!(path = %path.display(), "Wrote Nuke ColorMatrix");
    Ok(())
}
