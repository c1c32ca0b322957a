//! Per-pixel patch identifiers.
//!
//! A [`LabelImage`] has the same dimensions as the planes it describes.
//! Each value is either [`LabelImage::UNASSIGNED`] (0, the pixel belongs to
//! no patch) or a patch label in `1..=patch_count`, numbered row-major over
//! the chart grid:
//!
//! ```text
//! label = patch_row * cols + patch_col + 1
//! ```
//!
//! Label images depend only on geometry, so one can be reused for every
//! image of the same size.

use crate::{Error, Result};

/// Row-major grid of patch labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelImage {
    width: usize,
    height: usize,
    patch_count: u32,
    labels: Vec<u32>,
}

impl LabelImage {
    /// Label carried by pixels outside every patch's sampling window.
    pub const UNASSIGNED: u32 = 0;

    /// Wraps a row-major label buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] if the buffer length is wrong
    /// - [`Error::LabelOutOfRange`] if any label exceeds `patch_count`
    pub fn from_vec(width: usize, height: usize, patch_count: u32, labels: Vec<u32>) -> Result<Self> {
        if labels.len() != width * height {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} labels, got {}", width * height, labels.len()),
            ));
        }
        if let Some(&label) = labels.iter().find(|&&l| l > patch_count) {
            return Err(Error::LabelOutOfRange {
                label,
                max: patch_count,
            });
        }
        Ok(Self {
            width,
            height,
            patch_count,
            labels,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of patches (`rows * cols`); labels run `1..=patch_count`.
    #[inline]
    pub fn patch_count(&self) -> u32 {
        self.patch_count
    }

    /// Number of label bins including the unassigned bin.
    #[inline]
    pub fn bins(&self) -> usize {
        self.patch_count as usize + 1
    }

    /// Row-major labels.
    #[inline]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Label at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.labels[y * self.width + x])
        } else {
            None
        }
    }

    /// Pixel count per label, indexed by label value (index 0 counts
    /// unassigned pixels).
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.bins()];
        for &label in &self.labels {
            counts[label as usize] += 1;
        }
        counts
    }

    /// Number of pixels that belong to some patch.
    pub fn assigned_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l != Self::UNASSIGNED)
            .count()
    }

    /// Checks that a plane of `(width, height)` can be read through these labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] when the sizes differ.
    pub fn ensure_dimensions(&self, dims: (usize, usize)) -> Result<()> {
        if dims != self.dimensions() {
            return Err(Error::dimension_mismatch(self.dimensions(), dims));
        }
        Ok(())
    }
}
