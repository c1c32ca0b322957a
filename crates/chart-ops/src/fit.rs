//! 3x3 color matrix fitting from paired chart samples.
//!
//! Given the per-patch means of the same chart shot two ways (a *front*
//! capture and a *target* reference), [`fit`] finds the matrix `M` that
//! best maps one to the other in the least-squares sense:
//!
//! ```text
//! target_k ≈ M · front_k      for every valid patch k
//! ```
//!
//! The fit is strictly linear: no offset and no normalization, so the
//! matrix preserves black and can be dropped into any linear pipeline.
//!
//! # Rejection
//!
//! A patch pair is left out when either side has no mean, when any of the
//! six values is non-finite, or when the smallest of the six values is
//! `<= 0`. Crushed or clipped-to-black patches would otherwise pull the
//! fit toward zero. Rejections are logged and returned, never fatal.

use chart_core::{Error, Result};
use chart_math::{Mat3, Solve, rms_residual, solve_least_squares};
use tracing::{debug, info, trace, warn};

use crate::sampler::PatchAverages;

/// Minimum number of valid patches for a 3x3 fit.
pub const MIN_PATCHES: usize = 3;

/// Index-aligned front/target samples with rejected patches filtered out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchSampleSet {
    labels: Vec<u32>,
    front: Vec<[f64; 3]>,
    target: Vec<[f64; 3]>,
    rejected: Vec<u32>,
}

/// Returns `true` if a front/target pair may enter the fit.
pub fn is_valid_pair(front: &[f64; 3], target: &[f64; 3]) -> bool {
    front
        .iter()
        .chain(target)
        .all(|v| v.is_finite() && *v > 0.0)
}

impl PatchSampleSet {
    /// Pairs two sets of patch averages label by label.
    ///
    /// The unassigned label is skipped; labels `1..=N` are compared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the two sets come from
    /// layouts with different patch counts.
    pub fn pair(front: &PatchAverages, target: &PatchAverages) -> Result<Self> {
        if front.patch_count() != target.patch_count() {
            return Err(Error::invalid_configuration(format!(
                "front has {} patches, target has {}",
                front.patch_count(),
                target.patch_count()
            )));
        }
        let pairs = front
            .patches()
            .map(|(label, f)| (label, f, target.patch(label)));
        Ok(Self::collect(pairs))
    }

    /// Builds a set from raw pairs, labeled `1..=n` in order.
    pub fn from_pairs(front: &[[f64; 3]], target: &[[f64; 3]]) -> Self {
        let pairs = front
            .iter()
            .zip(target)
            .zip(1u32..)
            .map(|((f, t), label)| (label, Some(*f), Some(*t)));
        Self::collect(pairs)
    }

    fn collect(pairs: impl Iterator<Item = (u32, Option<[f64; 3]>, Option<[f64; 3]>)>) -> Self {
        let mut set = Self::default();
        for (label, front, target) in pairs {
            match (front, target) {
                (Some(f), Some(t)) if is_valid_pair(&f, &t) => {
                    set.labels.push(label);
                    set.front.push(f);
                    set.target.push(t);
                }
                _ => {
                    warn!(label, ?front, ?target, "Rejecting patch pair");
                    set.rejected.push(label);
                }
            }
        }
        set
    }

    /// Labels of the pairs kept for fitting.
    #[inline]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Front samples of the kept pairs.
    #[inline]
    pub fn front(&self) -> &[[f64; 3]] {
        &self.front
    }

    /// Target samples of the kept pairs.
    #[inline]
    pub fn target(&self) -> &[[f64; 3]] {
        &self.target
    }

    /// Labels of the rejected pairs.
    #[inline]
    pub fn rejected(&self) -> &[u32] {
        &self.rejected
    }

    /// Number of pairs kept.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if no pair was kept.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of pairs rejected.
    #[inline]
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Kept plus rejected pairs.
    #[inline]
    pub fn total(&self) -> usize {
        self.len() + self.rejected_count()
    }
}

/// Result of a matrix fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorFit {
    /// Fitted matrix, `target = matrix · front`.
    pub matrix: Mat3,
    /// Number of patch pairs used.
    pub used: usize,
    /// Labels of the pairs left out.
    pub rejected: Vec<u32>,
    /// RMS residual over the used pairs and all channels.
    pub rms_error: f64,
}

/// Fits a matrix over an already-paired sample set.
///
/// # Errors
///
/// - [`Error::InsufficientSamples`] with fewer than [`MIN_PATCHES`] valid pairs
/// - [`Error::DegenerateFit`] if the front samples do not span RGB
pub fn fit_samples(samples: &PatchSampleSet) -> Result<ColorFit> {
    trace!(valid = samples.len(), rejected = samples.rejected_count(), "fit_samples");

    if samples.len() < MIN_PATCHES {
        return Err(Error::InsufficientSamples {
            found: samples.len(),
            required: MIN_PATCHES,
        });
    }

    let matrix = match solve_least_squares(samples.front(), samples.target()) {
        Solve::Solved(m) => m,
        Solve::Underdetermined => {
            return Err(Error::InsufficientSamples {
                found: samples.len(),
                required: MIN_PATCHES,
            });
        }
        Solve::RankDeficient => {
            return Err(Error::degenerate_fit(format!(
                "{} front samples do not span RGB",
                samples.len()
            )));
        }
    };

    let rms_error = rms_residual(&matrix, samples.front(), samples.target());
    debug!(?matrix, rms_error, "Solved color matrix");
    if !samples.rejected().is_empty() {
        info!(
            used = samples.len(),
            rejected = samples.rejected_count(),
            "Fitted with some patches rejected"
        );
    }

    Ok(ColorFit {
        matrix,
        used: samples.len(),
        rejected: samples.rejected().to_vec(),
        rms_error,
    })
}

/// Fits the matrix mapping `front` patch colors onto `target` patch colors.
///
/// # Example
///
/// ```rust
/// use chart_math::Mat3;
/// use chart_ops::fit::fit;
/// use chart_ops::sampler::PatchAverages;
///
/// let front = PatchAverages::from_patches(&[
///     [0.4, 0.1, 0.1], [0.1, 0.4, 0.1], [0.1, 0.1, 0.4], [0.3, 0.3, 0.3],
/// ]);
/// let target = PatchAverages::from_patches(&[
///     [0.8, 0.2, 0.2], [0.2, 0.8, 0.2], [0.2, 0.2, 0.8], [0.6, 0.6, 0.6],
/// ]);
/// let result = fit(&front, &target).unwrap();
/// assert!(result.matrix.max_abs_diff(&Mat3::scale(2.0)) < 1e-9);
/// ```
pub fn fit(front: &PatchAverages, target: &PatchAverages) -> Result<ColorFit> {
    fit_samples(&PatchSampleSet::pair(front, target)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// 24 colors in `[0.3, 0.9]`, so mildly cross-talking matrices keep
    /// every target channel positive.
    fn spread_samples() -> Vec<[f64; 3]> {
        let mut out = Vec::new();
        for i in 0..24 {
            let t = i as f64;
            out.push([
                0.3 + 0.6 * ((t * 0.37).sin() * 0.5 + 0.5),
                0.3 + 0.6 * ((t * 0.71 + 1.0).sin() * 0.5 + 0.5),
                0.3 + 0.6 * ((t * 1.13 + 2.0).sin() * 0.5 + 0.5),
            ]);
        }
        out
    }

    #[test]
    fn test_recovers_known_matrix() {
        let k = Mat3::from_rows([
            [1.12, -0.08, -0.04],
            [-0.03, 0.97, 0.06],
            [0.01, -0.11, 1.10],
        ]);
        let front = spread_samples();
        let target: Vec<_> = front.iter().map(|&c| k.transform(c)).collect();
        assert!(target.iter().flatten().all(|&v| v > 0.0));
        let samples = PatchSampleSet::from_pairs(&front, &target);
        assert_eq!(samples.rejected_count(), 0);
        let result = fit_samples(&samples).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(result.matrix.m[i][j], k.m[i][j], epsilon = 1e-4);
            }
        }
        assert_eq!(result.used, 24);
        assert!(result.rejected.is_empty());
        assert!(result.rms_error < 1e-9);
    }

    #[test]
    fn test_rejects_zero_value() {
        let pairs = PatchSampleSet::from_pairs(
            &[[0.0, 1.0, 1.0], [0.5, 0.2, 0.1]],
            &[[1.0, 1.0, 1.0], [0.4, 0.2, 0.1]],
        );
        assert_eq!(pairs.rejected(), &[1]);
        assert_eq!(pairs.labels(), &[2]);
        assert!(!is_valid_pair(&[0.0, 1.0, 1.0], &[1.0, 1.0, 1.0]));
        assert!(!is_valid_pair(&[0.5, 0.5, 0.5], &[1.0, -0.01, 1.0]));
        assert!(!is_valid_pair(&[0.5, f64::NAN, 0.5], &[1.0, 1.0, 1.0]));
        assert!(is_valid_pair(&[1e-6, 1.0, 1.0], &[1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_rejected_patch_excluded_from_fit() {
        let mut front = spread_samples();
        let k = Mat3::diagonal(1.5, 1.0, 0.75);
        let mut target: Vec<_> = front.iter().map(|&c| k.transform(c)).collect();
        // A wildly wrong pair that would skew the fit if it were used.
        front[5] = [0.0, 1.0, 1.0];
        target[5] = [1.0, 1.0, 1.0];

        let samples = PatchSampleSet::from_pairs(&front, &target);
        let result = fit_samples(&samples).unwrap();
        assert_eq!(result.rejected, vec![6]);
        assert_eq!(result.used, samples.total() - samples.rejected_count());
        assert!(result.matrix.max_abs_diff(&k) < 1e-9);
    }

    #[test]
    fn test_scaled_identity_well_spread() {
        let front = [[1.0, 0.2, 0.2], [0.2, 1.0, 0.2], [0.2, 0.2, 1.0], [2.0, 2.0, 2.0]];
        let target: Vec<_> = front.iter().map(|c| c.map(|v| v * 2.0)).collect();
        let result = fit_samples(&PatchSampleSet::from_pairs(&front, &target)).unwrap();
        assert!(result.matrix.max_abs_diff(&Mat3::scale(2.0)) < 1e-9);
    }

    #[test]
    fn test_unbalanced_channel_scales_fit() {
        // Raw camera data can be orders of magnitude apart per channel.
        for scale in [300.0, 1000.0] {
            let front: Vec<[f64; 3]> = spread_samples()
                .into_iter()
                .map(|[r, g, b]| [r * scale, g, b / scale])
                .collect();
            let target: Vec<_> = front.iter().map(|c| c.map(|v| v * 2.0)).collect();
            let result = fit_samples(&PatchSampleSet::from_pairs(&front, &target)).unwrap();
            assert_eq!(result.used, 24);
            assert!(result.matrix.max_abs_diff(&Mat3::scale(2.0)) < 1e-6);
        }
    }

    #[test]
    fn test_gray_only_samples_are_degenerate() {
        // Neutral patches only constrain row sums; the matrix is not unique.
        let front = [[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]];
        let target: Vec<_> = front.iter().map(|c| c.map(|v| v * 2.0)).collect();
        let err = fit_samples(&PatchSampleSet::from_pairs(&front, &target)).unwrap_err();
        assert!(matches!(err, Error::DegenerateFit(_)));
        assert!(err.is_fit_error());
    }

    #[test]
    fn test_insufficient_after_rejection() {
        let front = [[0.5, 0.1, 0.1], [0.1, 0.5, 0.1], [0.0, 0.1, 0.5], [0.2, 0.2, -1.0]];
        let target = front;
        let err = fit_samples(&PatchSampleSet::from_pairs(&front, &target)).unwrap_err();
        match err {
            Error::InsufficientSamples { found, required } => {
                assert_eq!(found, 2);
                assert_eq!(required, MIN_PATCHES);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fit_from_averages_skips_undefined() {
        let mut front: Vec<Option<[f64; 3]>> = spread_samples().into_iter().map(Some).collect();
        let k = Mat3::scale(0.8);
        let mut target: Vec<Option<[f64; 3]>> =
            front.iter().map(|c| c.map(|c| k.transform(c))).collect();
        front[0] = None;
        target[3] = None;

        let result = fit(
            &PatchAverages::from_optional_patches(&front),
            &PatchAverages::from_optional_patches(&target),
        )
        .unwrap();
        assert_eq!(result.rejected, vec![1, 4]);
        assert_eq!(result.used, 22);
        assert!(result.matrix.max_abs_diff(&k) < 1e-9);
    }

    #[test]
    fn test_patch_count_mismatch() {
        let a = PatchAverages::from_patches(&[[0.5; 3]; 24]);
        let b = PatchAverages::from_patches(&[[0.5; 3]; 12]);
        assert!(fit(&a, &b).unwrap_err().is_configuration_error());
    }
}
