//! Linear least squares for 3x3 color matrices.
//!
//! Given `n` correspondences `a_k -> b_k`, find `M` minimizing
//! `Σ |M·a_k − b_k|²`. Writing the samples as rows of `A` and `B`
//! (`n x 3` each) this is the row-vector system `B ≈ A · X` with `M = Xᵀ`,
//! solved through the normal equations
//!
//! ```text
//! X = (AᵀA)⁻¹ AᵀB
//! ```
//!
//! Each output channel is an independent 3-parameter regression sharing the
//! same `AᵀA`, so solving all three at once is the same as solving them one
//! at a time. No offset term is fitted.

use glam::{DMat3, DVec3};

use crate::Mat3;

/// Determinant of the unit-diagonal `AᵀA` below which the samples are
/// treated as rank-deficient.
pub const RANK_EPSILON: f64 = 1e-12;

/// Outcome of a least-squares solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solve {
    /// Unique minimizer.
    Solved(Mat3),
    /// Fewer than three samples were given.
    Underdetermined,
    /// The samples do not span three dimensions (collinear or coplanar
    /// through the origin), so infinitely many matrices fit equally well.
    RankDeficient,
}

/// Fits `M` with `b_k ≈ M · a_k` for every sample pair.
///
/// Returns `None` when the system is underdetermined or rank-deficient;
/// use [`solve_least_squares`] to tell the two apart.
///
/// # Example
///
/// ```rust
/// use chart_math::{least_squares, Mat3};
///
/// let k = Mat3::from_rows([[0.9, 0.1, 0.0], [0.05, 1.1, -0.05], [0.0, 0.2, 0.8]]);
/// let a = [[1.0, 0.2, 0.1], [0.1, 1.0, 0.3], [0.2, 0.1, 1.0], [0.5, 0.5, 0.5]];
/// let b: Vec<[f64; 3]> = a.iter().map(|&v| k.transform(v)).collect();
///
/// let m = least_squares(&a, &b).unwrap();
/// assert!(m.max_abs_diff(&k) < 1e-9);
/// ```
pub fn least_squares(a: &[[f64; 3]], b: &[[f64; 3]]) -> Option<Mat3> {
    match solve_least_squares(a, b) {
        Solve::Solved(m) => Some(m),
        Solve::Underdetermined | Solve::RankDeficient => None,
    }
}

/// Fits `M` with `b_k ≈ M · a_k`, reporting why a solve failed.
///
/// Only the first `min(a.len(), b.len())` pairs are used.
pub fn solve_least_squares(a: &[[f64; 3]], b: &[[f64; 3]]) -> Solve {
    let n = a.len().min(b.len());
    if n < 3 {
        return Solve::Underdetermined;
    }

    // AᵀA = Σ a aᵀ, AᵀB = Σ a bᵀ
    let mut ata = DMat3::ZERO;
    let mut atb = DMat3::ZERO;
    for (ak, bk) in a.iter().zip(b).take(n) {
        let av = DVec3::from_array(*ak);
        let bv = DVec3::from_array(*bk);
        ata += DMat3::from_cols(av * av.x, av * av.y, av * av.z);
        atb += DMat3::from_cols(av * bv.x, av * bv.y, av * bv.z);
    }

    let Some((s, corr)) = normalize(&ata) else {
        return Solve::RankDeficient;
    };
    let det = corr.determinant();
    if !det.is_finite() || det < RANK_EPSILON {
        return Solve::RankDeficient;
    }

    // AᵀA = S⁻¹·C·S⁻¹, so X = S·C⁻¹·S·AᵀB
    let x = s * corr.inverse() * (s * atb);
    let m = Mat3::from_glam(x.transpose());
    if m.is_finite() {
        Solve::Solved(m)
    } else {
        Solve::RankDeficient
    }
}

/// Root-mean-square residual `|M·a_k − b_k|` over all samples and channels.
pub fn rms_residual(m: &Mat3, a: &[[f64; 3]], b: &[[f64; 3]]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(ak, bk)| {
            let p = m.transform(*ak);
            (0..3).map(|c| (p[c] - bk[c]).powi(2)).sum::<f64>()
        })
        .sum();
    (sum / (3 * n) as f64).sqrt()
}

/// Rescales `AᵀA` to unit diagonal: returns `S = diag(1/√aᵢᵢ)` and
/// `C = S·AᵀA·S`.
///
/// `det(C)` lies in `[0, 1]` and does not change when an input channel is
/// multiplied by a constant, so the rank test and the inverse see the same
/// system for `[r, g, b]` and `[1000·r, g, b/1000]`. A zero or non-finite
/// diagonal (a channel that is zero in every sample) gives `None`.
fn normalize(ata: &DMat3) -> Option<(DMat3, DMat3)> {
    let diag = DVec3::new(ata.x_axis.x, ata.y_axis.y, ata.z_axis.z);
    if !diag.is_finite() || diag.min_element() <= 0.0 {
        return None;
    }
    let s = DMat3::from_diagonal(DVec3::new(
        diag.x.sqrt().recip(),
        diag.y.sqrt().recip(),
        diag.z.sqrt().recip(),
    ));
    Some((s, s * *ata * s))
}
