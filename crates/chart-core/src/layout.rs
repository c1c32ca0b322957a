//! Chart layout configuration.
//!
//! A [`ChartLayout`] describes the patch grid of a reference chart that has
//! been cropped to fill the image, plus the sampling window and a simple
//! keystone correction:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `rows`, `cols` | Patch grid size |
//! | `sample_fraction` | Half-width of the centered sampling window, in cell units |
//! | `x_squeeze`, `y_squeeze` | Pre-warp that stretches coordinates about the image center |
//!
//! Layouts are validated on construction and on deserialization, so every
//! `ChartLayout` value in the program is usable for geometry.
//!
//! # YAML
//!
//! ```yaml
//! rows: 4
//! cols: 6
//! sample_fraction: 0.4
//! x_squeeze: 0.025
//! y_squeeze: 0.095
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Validated chart grid and sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LayoutFile")]
pub struct ChartLayout {
    rows: u32,
    cols: u32,
    sample_fraction: f64,
    x_squeeze: f64,
    y_squeeze: f64,
}

/// Unvalidated on-disk form.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutFile {
    rows: u32,
    cols: u32,
    sample_fraction: f64,
    #[serde(default)]
    x_squeeze: f64,
    #[serde(default)]
    y_squeeze: f64,
}

impl TryFrom<LayoutFile> for ChartLayout {
    type Error = Error;

    fn try_from(f: LayoutFile) -> Result<Self> {
        ChartLayout::new(f.rows, f.cols, f.sample_fraction, f.x_squeeze, f.y_squeeze)
    }
}

impl ChartLayout {
    /// Creates a validated layout.
    ///
    /// `sample_fraction` may be any finite value: `>= 0.5` keeps whole cells,
    /// `<= 0` rejects every pixel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when `rows` or `cols` is zero,
    /// a value is not finite, or a squeeze is `<= -1` (the pre-warp would
    /// fold the image onto itself).
    ///
    /// # Example
    ///
    /// ```rust
    /// use chart_core::ChartLayout;
    ///
    /// assert!(ChartLayout::new(4, 6, 0.4, 0.025, 0.095).is_ok());
    /// assert!(ChartLayout::new(0, 6, 0.4, 0.0, 0.0).is_err());
    /// ```
    pub fn new(rows: u32, cols: u32, sample_fraction: f64, x_squeeze: f64, y_squeeze: f64) -> Result<Self> {
        let layout = Self {
            rows,
            cols,
            sample_fraction,
            x_squeeze,
            y_squeeze,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Re-checks every invariant.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::invalid_configuration(format!(
                "chart grid must have positive rows and cols, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.rows.checked_mul(self.cols).is_none() {
            return Err(Error::invalid_configuration(format!(
                "chart grid {}x{} has too many patches",
                self.rows, self.cols
            )));
        }
        if !self.sample_fraction.is_finite() {
            return Err(Error::invalid_configuration(format!(
                "sample_fraction must be finite, got {}",
                self.sample_fraction
            )));
        }
        for (name, squeeze) in [("x_squeeze", self.x_squeeze), ("y_squeeze", self.y_squeeze)] {
            if !squeeze.is_finite() || squeeze <= -1.0 {
                return Err(Error::invalid_configuration(format!(
                    "{name} must be finite and greater than -1, got {squeeze}"
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a YAML layout.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s)
            .map_err(|e| Error::invalid_configuration(format!("layout: {e}")))
    }

    /// Reads and validates a YAML layout file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Patch rows.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Patch columns.
    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Half-width of the centered sampling window in cell units.
    #[inline]
    pub fn sample_fraction(&self) -> f64 {
        self.sample_fraction
    }

    /// Horizontal pre-warp.
    #[inline]
    pub fn x_squeeze(&self) -> f64 {
        self.x_squeeze
    }

    /// Vertical pre-warp.
    #[inline]
    pub fn y_squeeze(&self) -> f64 {
        self.y_squeeze
    }

    /// Total patches, `rows * cols`.
    #[inline]
    pub fn patch_count(&self) -> u32 {
        self.rows * self.cols
    }

    /// Open interval of in-cell positions that are sampled.
    #[inline]
    pub fn sampling_window(&self) -> (f64, f64) {
        (0.5 - self.sample_fraction, 0.5 + self.sample_fraction)
    }

    /// Label of the patch at grid position `(row, col)`.
    #[inline]
    pub fn label_for(&self, row: u32, col: u32) -> Option<u32> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col + 1)
    }

    /// Grid position `(row, col)` of a patch label.
    ///
    /// Returns `None` for the unassigned label and for labels beyond the grid.
    #[inline]
    pub fn grid_position(&self, label: u32) -> Option<(u32, u32)> {
        if label == 0 || label > self.patch_count() {
            return None;
        }
        let index = label - 1;
        Some((index / self.cols, index % self.cols))
    }
}
