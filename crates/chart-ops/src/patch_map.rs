//! Chart patch labeling.
//!
//! Maps every pixel of a chart image to the patch it samples, or to
//! [`LabelImage::UNASSIGNED`] when it lies near a patch border.
//!
//! # Geometry
//!
//! ```text
//! x' = clamp((1 + x_squeeze) * x - x_squeeze * width / 2, 0, width)
//! u  = (x' mod patch_w) / patch_w          patch_w = width / cols
//! col = floor(x' / patch_w)
//! ```
//!
//! and likewise for `y`. A pixel is sampled when both `u` and `v` fall
//! strictly inside `(0.5 - sample_fraction, 0.5 + sample_fraction)`. The
//! squeeze stretches coordinates about the image center so a chart shot
//! with slight keystone still lines up with a regular grid.
//!
//! Labels depend only on `(width, height, layout)`, never on pixel values.

use chart_core::{ChartLayout, LabelImage, Plane, Result, RgbPlanes};
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Which in-cell positions are sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Window {
    /// `sample_fraction >= 0.5`: whole cells.
    Full,
    /// `sample_fraction <= 0`: nothing.
    Empty,
    /// Open interval `(lo, hi)`.
    Open(f64, f64),
}

impl Window {
    #[inline]
    fn contains(&self, t: f64) -> bool {
        match *self {
            Window::Full => true,
            Window::Empty => false,
            Window::Open(lo, hi) => t > lo && t < hi,
        }
    }
}

/// Precomputed grid geometry for one image size and layout.
#[derive(Debug, Clone, Copy)]
pub struct PatchGrid {
    width: f64,
    height: f64,
    patch_w: f64,
    patch_h: f64,
    layout: ChartLayout,
    window: Window,
}

impl PatchGrid {
    /// Prepares the geometry for a `width x height` image.
    ///
    /// # Errors
    ///
    /// Returns [`chart_core::Error::InvalidConfiguration`] if the layout
    /// fails validation.
    pub fn new(width: usize, height: usize, layout: &ChartLayout) -> Result<Self> {
        layout.validate()?;

        let sample = layout.sample_fraction();
        let window = if sample >= 0.5 {
            Window::Full
        } else if sample <= 0.0 {
            Window::Empty
        } else {
            let (lo, hi) = layout.sampling_window();
            Window::Open(lo, hi)
        };

        let (w, h) = (width as f64, height as f64);
        Ok(Self {
            width: w,
            height: h,
            patch_w: w / layout.cols() as f64,
            patch_h: h / layout.rows() as f64,
            layout: *layout,
            window,
        })
    }

    /// Cell size in pixels, `(patch_w, patch_h)`.
    #[inline]
    pub fn cell_size(&self) -> (f64, f64) {
        (self.patch_w, self.patch_h)
    }

    /// Label of pixel `(x, y)`; 0 when the pixel is outside every window.
    #[inline]
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        let layout = &self.layout;
        let Some((col, u)) = axis(x as f64, self.width, layout.x_squeeze(), self.patch_w, layout.cols()) else {
            return LabelImage::UNASSIGNED;
        };
        let Some((row, v)) = axis(y as f64, self.height, layout.y_squeeze(), self.patch_h, layout.rows()) else {
            return LabelImage::UNASSIGNED;
        };
        if self.window.contains(u) && self.window.contains(v) {
            layout.label_for(row, col).unwrap_or(LabelImage::UNASSIGNED)
        } else {
            LabelImage::UNASSIGNED
        }
    }

    fn label_row(&self, y: usize, row: &mut [u32]) {
        for (x, label) in row.iter_mut().enumerate() {
            *label = self.label_at(x, y);
        }
    }
}

/// Warps one coordinate and splits it into `(cell index, in-cell position)`.
///
/// A coordinate clamped onto the far image edge belongs to the last cell.
#[inline]
fn axis(coord: f64, size: f64, squeeze: f64, cell: f64, cells: u32) -> Option<(u32, f64)> {
    if cell <= 0.0 {
        return None;
    }
    let warped = ((1.0 + squeeze) * coord - squeeze * (size / 2.0)).clamp(0.0, size);
    let index = ((warped / cell).floor() as u32).min(cells - 1);
    let frac = (warped % cell) / cell;
    Some((index, frac))
}

/// Computes the label image for a `width x height` chart.
///
/// # Errors
///
/// Returns [`chart_core::Error::InvalidConfiguration`] for an invalid layout.
///
/// # Example
///
/// ```rust
/// use chart_core::ChartLayout;
/// use chart_ops::patch_map::compute_labels;
///
/// let layout = ChartLayout::new(4, 6, 0.5, 0.0, 0.0).unwrap();
/// let labels = compute_labels(24, 16, &layout).unwrap();
/// assert_eq!(labels.get(0, 0), Some(1));
/// assert_eq!(labels.get(23, 15), Some(24));
/// ```
pub fn compute_labels(width: usize, height: usize, layout: &ChartLayout) -> Result<LabelImage> {
    trace!(width, height, ?layout, "compute_labels");
    let grid = PatchGrid::new(width, height, layout)?;
    let (patch_w, patch_h) = grid.cell_size();
    debug!(patch_w, patch_h, rows = layout.rows(), cols = layout.cols(), "Labeling chart patches");

    let mut labels = vec![LabelImage::UNASSIGNED; width * height];
    if width > 0 {
        #[cfg(feature = "parallel")]
        labels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| grid.label_row(y, row));

        #[cfg(not(feature = "parallel"))]
        labels
            .chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| grid.label_row(y, row));
    }

    let labels = LabelImage::from_vec(width, height, layout.patch_count(), labels)?;
    debug!(
        assigned = labels.assigned_count(),
        total = width * height,
        "Labeled chart patches"
    );
    Ok(labels)
}

/// Dims every pixel that no patch samples, leaving sampled pixels intact.
///
/// Useful for checking `sample_fraction` and the squeeze against a real
/// chart photograph.
pub fn preview(planes: &RgbPlanes, labels: &LabelImage, dim: f32) -> Result<RgbPlanes> {
    labels.ensure_dimensions(planes.dimensions())?;
    let (width, height) = planes.dimensions();
    let [r, g, b] = planes.channels().map(|plane| {
        let data = plane
            .data()
            .iter()
            .zip(labels.labels())
            .map(|(&v, &label)| if label == LabelImage::UNASSIGNED { v * dim } else { v })
            .collect();
        Plane::from_vec(width, height, data)
    });
    RgbPlanes::new(r?, g?, b?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(rows: u32, cols: u32, sample: f64, xs: f64, ys: f64) -> ChartLayout {
        ChartLayout::new(rows, cols, sample, xs, ys).unwrap()
    }

    #[test]
    fn test_reference_chart_24x16() {
        // 4x4 pixel cells; u = 0 at each cell's first pixel falls outside (0.1, 0.9).
        let labels = compute_labels(24, 16, &layout(4, 6, 0.4, 0.0, 0.0)).unwrap();
        let counts = labels.counts();
        assert_eq!(counts.len(), 25);
        assert_eq!(counts[0], 24 * 16 - 24 * 9);
        for label in 1..=24 {
            assert_eq!(counts[label], 9, "label {label}");
        }
        assert_eq!(labels.get(0, 0), Some(0));
        assert_eq!(labels.get(1, 1), Some(1));
        assert_eq!(labels.get(3, 3), Some(1));
        assert_eq!(labels.get(4, 1), Some(0));
        assert_eq!(labels.get(5, 1), Some(2));
        assert_eq!(labels.get(1, 5), Some(7));
        assert_eq!(labels.get(23, 15), Some(24));
    }

    #[test]
    fn test_full_window_tiles_image() {
        for (w, h, rows, cols) in [(24, 16, 4, 6), (30, 20, 5, 3), (7, 9, 1, 1), (12, 12, 3, 4)] {
            for sample in [0.5, 0.75, 3.0] {
                let labels = compute_labels(w, h, &layout(rows, cols, sample, 0.0, 0.0)).unwrap();
                let cell_w = w / cols as usize;
                let cell_h = h / rows as usize;
                for y in 0..h {
                    for x in 0..w {
                        let expected = (y / cell_h) as u32 * cols + (x / cell_w) as u32 + 1;
                        assert_eq!(labels.get(x, y), Some(expected), "({x}, {y})");
                    }
                }
                let counts = labels.counts();
                assert_eq!(counts[0], 0);
                assert!(counts[1..].iter().all(|&c| c == cell_w * cell_h));
            }
        }
    }

    #[test]
    fn test_empty_window_excludes_everything() {
        for sample in [0.0, -0.1, -5.0] {
            let labels = compute_labels(24, 16, &layout(4, 6, sample, 0.1, 0.2)).unwrap();
            assert!(labels.labels().iter().all(|&l| l == 0));
        }
    }

    #[test]
    fn test_labels_within_range_with_squeeze() {
        // Large sample fraction and squeeze push many pixels onto the far edge.
        let l = layout(4, 6, 0.9, 0.3, 0.4);
        let labels = compute_labels(37, 23, &l).unwrap();
        assert!(labels.labels().iter().all(|&v| v >= 1 && v <= l.patch_count()));
        assert_eq!(labels.get(36, 22), Some(24));
        assert_eq!(labels.get(0, 0), Some(1));
    }

    #[test]
    fn test_squeeze_pulls_border_into_first_patch() {
        // With squeeze > 0 the outer pixels clamp onto the edge cells.
        let l = layout(4, 6, 0.5, 0.2, 0.2);
        let labels = compute_labels(24, 16, &l).unwrap();
        let grid = PatchGrid::new(24, 16, &l).unwrap();
        assert_eq!(grid.label_at(0, 0), 1);
        assert_eq!(labels.get(0, 0), Some(1));
        // Pixels near the center barely move.
        let flat = compute_labels(24, 16, &layout(4, 6, 0.5, 0.0, 0.0)).unwrap();
        assert_eq!(labels.get(13, 9), flat.get(13, 9));
        assert_eq!(labels.get(13, 9), Some(16));
    }

    #[test]
    fn test_deterministic() {
        let l = layout(4, 6, 0.4, 0.025, 0.095);
        let a = compute_labels(120, 80, &l).unwrap();
        let b = compute_labels(120, 80, &l).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fractional_cells() {
        let labels = compute_labels(25, 17, &layout(4, 6, 0.3, 0.0, 0.0)).unwrap();
        assert!(labels.labels().iter().all(|&v| v <= 24));
        let counts = labels.counts();
        assert!(counts[1..].iter().all(|&c| c > 0));
    }

    #[test]
    fn test_zero_sized_image() {
        let labels = compute_labels(0, 0, &layout(4, 6, 0.4, 0.0, 0.0)).unwrap();
        assert!(labels.labels().is_empty());
        assert_eq!(labels.bins(), 25);
    }

    #[test]
    fn test_preview_dims_unassigned() {
        let l = layout(4, 6, 0.4, 0.0, 0.0);
        let labels = compute_labels(24, 16, &l).unwrap();
        let planes = RgbPlanes::filled(24, 16, [1.0, 2.0, 4.0]);
        let out = preview(&planes, &labels, 0.25).unwrap();
        assert_eq!(out.pixel(0, 0), Some([0.25, 0.5, 1.0]));
        assert_eq!(out.pixel(1, 1), Some([1.0, 2.0, 4.0]));

        let wrong = RgbPlanes::filled(8, 8, [1.0; 3]);
        assert!(preview(&wrong, &labels, 0.25).is_err());
    }
}
