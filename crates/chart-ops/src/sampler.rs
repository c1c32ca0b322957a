//! Per-patch averaging and broadcast.
//!
//! [`average_by_label`] is a weighted bincount: the mean of all plane values
//! sharing a label. Labels no pixel carries have no mean and come back as
//! `None`. [`broadcast`] is the inverse direction, painting each pixel with
//! its label's mean, which turns a noisy chart photograph into a clean
//! synthetic chart.
//!
//! Sums are accumulated in `f64`, so averages of large HDR patches do not
//! lose precision.

use chart_core::{ChartLayout, Error, LabelImage, Plane, Result, RgbPlanes};
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Sum of plane values per label.
fn bin_sums(data: &[f32], labels: &[u32], bins: usize) -> Vec<f64> {
    let mut sums = vec![0.0f64; bins];
    for (&v, &label) in data.iter().zip(labels) {
        sums[label as usize] += v as f64;
    }
    sums
}

fn means(sums: &[f64], counts: &[usize]) -> Vec<Option<f64>> {
    sums.iter()
        .zip(counts)
        .map(|(&sum, &count)| (count > 0).then(|| sum / count as f64))
        .collect()
}

/// Mean plane value per label, indexed by label (index 0 is the mean of
/// unassigned pixels).
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if plane and labels differ in size.
///
/// # Example
///
/// ```rust
/// use chart_core::{LabelImage, Plane};
/// use chart_ops::sampler::average_by_label;
///
/// let plane = Plane::from_vec(4, 1, vec![1.0, 3.0, 5.0, 7.0]).unwrap();
/// let labels = LabelImage::from_vec(4, 1, 2, vec![1, 1, 0, 0]).unwrap();
/// assert_eq!(average_by_label(&plane, &labels).unwrap(), vec![Some(6.0), Some(2.0), None]);
/// ```
pub fn average_by_label(plane: &Plane, labels: &LabelImage) -> Result<Vec<Option<f64>>> {
    labels.ensure_dimensions(plane.dimensions())?;
    let sums = bin_sums(plane.data(), labels.labels(), labels.bins());
    Ok(means(&sums, &labels.counts()))
}

/// Builds a plane where each pixel holds the mean of its label.
///
/// Pixels whose label has no mean receive `NaN`; that only happens when the
/// averages were computed through a different label image.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if `averages` does not have one
/// entry per label bin.
pub fn broadcast(averages: &[Option<f64>], labels: &LabelImage) -> Result<Plane> {
    if averages.len() != labels.bins() {
        return Err(Error::invalid_dimensions(
            labels.width(),
            labels.height(),
            format!("expected {} label averages, got {}", labels.bins(), averages.len()),
        ));
    }
    let lut: Vec<f32> = averages
        .iter()
        .map(|a| a.map_or(f32::NAN, |v| v as f32))
        .collect();
    let data = labels.labels().iter().map(|&l| lut[l as usize]).collect();
    Plane::from_vec(labels.width(), labels.height(), data)
}

/// One patch's summary, suitable for tables and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchReport {
    /// Patch label (`1..=rows*cols`).
    pub label: u32,
    /// Grid row.
    pub row: u32,
    /// Grid column.
    pub col: u32,
    /// Pixels averaged.
    pub pixels: usize,
    /// Mean color, absent when no pixel was sampled.
    pub rgb: Option<[f64; 3]>,
}

/// Per-label mean colors of one chart image.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchAverages {
    channels: [Vec<Option<f64>>; 3],
    counts: Vec<usize>,
}

impl PatchAverages {
    /// Builds averages directly from known patch colors (labels `1..=n`).
    ///
    /// The unassigned bin has no mean. Each patch is recorded as one pixel.
    pub fn from_patches(patches: &[[f64; 3]]) -> Self {
        let patches: Vec<_> = patches.iter().copied().map(Some).collect();
        Self::from_optional_patches(&patches)
    }

    /// Like [`from_patches`](Self::from_patches), with `None` for patches
    /// that have no sample.
    pub fn from_optional_patches(patches: &[Option<[f64; 3]>]) -> Self {
        let mut channels: [Vec<Option<f64>>; 3] = Default::default();
        for (c, channel) in channels.iter_mut().enumerate() {
            channel.push(None);
            channel.extend(patches.iter().map(|p| p.map(|rgb| rgb[c])));
        }
        let counts: Vec<usize> = std::iter::once(0)
            .chain(patches.iter().map(|p| usize::from(p.is_some())))
            .collect();
        Self { channels, counts }
    }

    /// Number of patches (label bins minus the unassigned bin).
    #[inline]
    pub fn patch_count(&self) -> u32 {
        (self.counts.len() - 1) as u32
    }

    /// Number of label bins including the unassigned bin.
    #[inline]
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Mean of one channel (0 = R, 1 = G, 2 = B) per label.
    #[inline]
    pub fn channel(&self, c: usize) -> &[Option<f64>] {
        &self.channels[c]
    }

    /// Pixel counts per label.
    #[inline]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Mean color under `label`, `None` if undefined or out of range.
    pub fn get(&self, label: u32) -> Option<[f64; 3]> {
        let i = label as usize;
        Some([
            (*self.channels[0].get(i)?)?,
            (*self.channels[1].get(i)?)?,
            (*self.channels[2].get(i)?)?,
        ])
    }

    /// Mean color of patch `label`; the unassigned label is never a patch.
    #[inline]
    pub fn patch(&self, label: u32) -> Option<[f64; 3]> {
        if label == LabelImage::UNASSIGNED {
            return None;
        }
        self.get(label)
    }

    /// Mean color of the pixels outside every patch.
    #[inline]
    pub fn unassigned(&self) -> Option<[f64; 3]> {
        self.get(LabelImage::UNASSIGNED)
    }

    /// `(label, mean)` for every patch, skipping the unassigned bin.
    pub fn patches(&self) -> impl Iterator<Item = (u32, Option<[f64; 3]>)> + '_ {
        (1..=self.patch_count()).map(move |label| (label, self.patch(label)))
    }

    /// Labels of patches that received no pixels.
    pub fn empty_patches(&self) -> Vec<u32> {
        self.patches()
            .filter_map(|(label, rgb)| rgb.is_none().then_some(label))
            .collect()
    }

    /// Per-patch summary rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `layout` does not have
    /// exactly one cell per patch.
    pub fn report(&self, layout: &ChartLayout) -> Result<Vec<PatchReport>> {
        if layout.patch_count() != self.patch_count() {
            return Err(Error::invalid_configuration(format!(
                "layout has {} patches, averages have {}",
                layout.patch_count(),
                self.patch_count()
            )));
        }
        self.patches()
            .map(|(label, rgb)| {
                let (row, col) = layout.grid_position(label).ok_or_else(|| {
                    Error::invalid_configuration(format!("patch {label} is outside the layout"))
                })?;
                Ok(PatchReport {
                    label,
                    row,
                    col,
                    pixels: self.counts[label as usize],
                    rgb,
                })
            })
            .collect()
    }

    /// Broadcasts the means back over `labels`, producing a synthetic chart.
    pub fn make_chart(&self, labels: &LabelImage) -> Result<RgbPlanes> {
        trace!(width = labels.width(), height = labels.height(), "make_chart");
        let [r, g, b] = &self.channels;
        RgbPlanes::new(
            broadcast(r, labels)?,
            broadcast(g, labels)?,
            broadcast(b, labels)?,
        )
    }
}

/// Averages all three channels of a chart image under one label image.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the image and labels differ in size.
pub fn sample_chart(planes: &RgbPlanes, labels: &LabelImage) -> Result<PatchAverages> {
    trace!(width = planes.width(), height = planes.height(), "sample_chart");
    labels.ensure_dimensions(planes.dimensions())?;

    let bins = labels.bins();
    let ids = labels.labels();
    let [r, g, b] = planes.channels();

    #[cfg(feature = "parallel")]
    let (sr, (sg, sb)) = rayon::join(
        || bin_sums(r.data(), ids, bins),
        || {
            rayon::join(
                || bin_sums(g.data(), ids, bins),
                || bin_sums(b.data(), ids, bins),
            )
        },
    );

    #[cfg(not(feature = "parallel"))]
    let (sr, (sg, sb)) = (
        bin_sums(r.data(), ids, bins),
        (bin_sums(g.data(), ids, bins), bin_sums(b.data(), ids, bins)),
    );

    let counts = labels.counts();
    let averages = PatchAverages {
        channels: [means(&sr, &counts), means(&sg, &counts), means(&sb, &counts)],
        counts,
    };

    let empty = averages.empty_patches();
    if !empty.is_empty() {
        warn!(?empty, "Patches received no pixels; check sample fraction and squeeze");
    }
    debug!(patches = averages.patch_count(), empty = empty.len(), "Sampled chart");
    Ok(averages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch_map::compute_labels;
    use approx::assert_relative_eq;

    fn reference_labels() -> LabelImage {
        let layout = ChartLayout::new(4, 6, 0.4, 0.0, 0.0).unwrap();
        compute_labels(24, 16, &layout).unwrap()
    }

    #[test]
    fn test_reference_chart_constant_image() {
        let labels = reference_labels();
        let planes = RgbPlanes::filled(24, 16, [1.0, 1.0, 1.0]);
        let avg = sample_chart(&planes, &labels).unwrap();
        assert_eq!(avg.patch_count(), 24);
        for (label, rgb) in avg.patches() {
            assert_eq!(rgb, Some([1.0, 1.0, 1.0]), "label {label}");
        }
        assert!(avg.empty_patches().is_empty());
    }

    #[test]
    fn test_constant_plane_any_layout() {
        let layout = ChartLayout::new(3, 5, 0.3, 0.05, 0.1).unwrap();
        let labels = compute_labels(50, 31, &layout).unwrap();
        let plane = Plane::filled(50, 31, 0.18);
        let avg = average_by_label(&plane, &labels).unwrap();
        let counts = labels.counts();
        for (label, mean) in avg.iter().enumerate() {
            if counts[label] > 0 {
                assert_relative_eq!(mean.unwrap(), 0.18f32 as f64, epsilon = 1e-12);
            } else {
                assert!(mean.is_none());
            }
        }
    }

    #[test]
    fn test_distinct_patch_values() {
        let layout = ChartLayout::new(4, 6, 0.4, 0.0, 0.0).unwrap();
        let labels = compute_labels(24, 16, &layout).unwrap();
        // Each 4x4 cell gets its own value; borders get a different one.
        let planes = RgbPlanes::from_fn(24, 16, |x, y| {
            let patch = (y / 4 * 6 + x / 4) as f32;
            [patch, patch * 2.0, 0.5]
        });
        let avg = sample_chart(&planes, &labels).unwrap();
        assert_eq!(avg.patch(1), Some([0.0, 0.0, 0.5]));
        assert_eq!(avg.patch(24), Some([23.0, 46.0, 0.5]));
        assert_eq!(avg.counts()[7], 9);
    }

    #[test]
    fn test_empty_label_is_none() {
        let plane = Plane::filled(2, 2, 3.0);
        let labels = LabelImage::from_vec(2, 2, 3, vec![1, 1, 3, 3]).unwrap();
        let avg = average_by_label(&plane, &labels).unwrap();
        assert_eq!(avg, vec![None, Some(3.0), None, Some(3.0)]);
    }

    #[test]
    fn test_sample_chart_reports_empty_patches() {
        let labels = LabelImage::from_vec(2, 2, 3, vec![1, 1, 3, 3]).unwrap();
        let avg = sample_chart(&RgbPlanes::filled(2, 2, [1.0, 2.0, 3.0]), &labels).unwrap();
        assert_eq!(avg.empty_patches(), vec![2]);
        assert_eq!(avg.patch(2), None);
        assert_eq!(avg.unassigned(), None);
        assert_eq!(avg.patch(3), Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_broadcast_then_resample_is_idempotent() {
        let layout = ChartLayout::new(4, 6, 0.35, 0.025, 0.095).unwrap();
        let labels = compute_labels(60, 40, &layout).unwrap();
        let planes = RgbPlanes::from_fn(60, 40, |x, y| {
            let n = ((x * 7 + y * 13) % 17) as f32 / 17.0;
            [0.1 + n, 0.2 + n * 0.5, 0.05 + n * n]
        });
        let first = sample_chart(&planes, &labels).unwrap();
        let smoothed = first.make_chart(&labels).unwrap();
        let second = sample_chart(&smoothed, &labels).unwrap();

        assert_eq!(first.counts(), second.counts());
        for c in 0..3 {
            for (a, b) in first.channel(c).iter().zip(second.channel(c)) {
                match (a, b) {
                    (Some(a), Some(b)) => assert_relative_eq!(*a, *b, epsilon = 1e-6),
                    (None, None) => {}
                    other => panic!("definedness changed: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_broadcast_label_zero_takes_unassigned_mean() {
        let labels = LabelImage::from_vec(3, 1, 1, vec![0, 1, 0]).unwrap();
        let plane = broadcast(&[Some(0.25), Some(4.0)], &labels).unwrap();
        assert_eq!(plane.data(), &[0.25, 4.0, 0.25]);
    }

    #[test]
    fn test_broadcast_checks_length() {
        let labels = LabelImage::from_vec(2, 1, 2, vec![0, 2]).unwrap();
        assert!(broadcast(&[Some(1.0), Some(2.0)], &labels).is_err());
    }

    #[test]
    fn test_broadcast_undefined_is_nan() {
        let labels = LabelImage::from_vec(2, 1, 1, vec![0, 1]).unwrap();
        let plane = broadcast(&[Some(1.0), None], &labels).unwrap();
        assert_eq!(plane.data()[0], 1.0);
        assert!(plane.data()[1].is_nan());
    }

    #[test]
    fn test_dimension_mismatch() {
        let labels = reference_labels();
        let plane = Plane::filled(16, 24, 1.0);
        assert!(average_by_label(&plane, &labels).unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_from_patches_and_report() {
        let layout = ChartLayout::new(1, 2, 0.4, 0.0, 0.0).unwrap();
        let avg = PatchAverages::from_patches(&[[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]);
        assert_eq!(avg.patch_count(), 2);
        assert_eq!(avg.patch(0), None);
        assert_eq!(avg.patch(2), Some([0.4, 0.5, 0.6]));

        let report = avg.report(&layout).unwrap();
        assert_eq!(report[1].row, 0);
        assert_eq!(report[1].col, 1);
        assert_eq!(report[1].pixels, 1);

        let json = serde_json::to_value(&report[0]).unwrap();
        assert_eq!(json["label"], 1);
        assert_eq!(json["rgb"][2], 0.3);
    }

    #[test]
    fn test_report_needs_matching_layout() {
        let avg = PatchAverages::from_patches(&[[0.5; 3]; 24]);
        let small = ChartLayout::new(2, 3, 0.4, 0.0, 0.0).unwrap();
        assert!(avg.report(&small).unwrap_err().is_configuration_error());

        let transposed = ChartLayout::new(6, 4, 0.4, 0.0, 0.0).unwrap();
        let report = avg.report(&transposed).unwrap();
        assert_eq!(report.len(), 24);
        assert_eq!((report[23].row, report[23].col), (5, 3));
        // Every patch maps to its own cell.
        let mut cells: Vec<_> = report.iter().map(|p| (p.row, p.col)).collect();
        cells.sort_unstable();
        cells.dedup();
        assert_eq!(cells.len(), 24);
    }

    #[test]
    fn test_from_optional_patches() {
        let avg = PatchAverages::from_optional_patches(&[Some([1.0; 3]), None]);
        assert_eq!(avg.counts(), &[0, 1, 0]);
        assert_eq!(avg.empty_patches(), vec![2]);
    }
}
