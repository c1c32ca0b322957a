//! Applying a fitted color matrix to an image.

use chart_core::{Plane, Result, RgbPlanes};
use chart_math::Mat3;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Transforms every pixel as `rgb' = m · rgb`.
///
/// Computation runs in `f64` per pixel; non-finite inputs propagate.
pub fn apply_matrix(planes: &RgbPlanes, m: &Mat3) -> Result<RgbPlanes> {
    let (width, height) = planes.dimensions();
    trace!(width, height, ?m, "apply_matrix");

    let [r, g, b] = planes.channels().map(Plane::data);
    let mut out = vec![[0.0f32; 3]; width * height];

    let transform = |(i, px): (usize, &mut [f32; 3])| {
        *px = m.transform_f32([r[i], g[i], b[i]]);
    };

    #[cfg(feature = "parallel")]
    out.par_iter_mut().enumerate().for_each(transform);

    #[cfg(not(feature = "parallel"))]
    out.iter_mut().enumerate().for_each(transform);

    let mut channels: [Vec<f32>; 3] = Default::default();
    for c in &mut channels {
        c.reserve_exact(out.len());
    }
    for px in &out {
        for (c, &v) in channels.iter_mut().zip(px) {
            c.push(v);
        }
    }
    let [r, g, b] = channels;
    RgbPlanes::new(
        Plane::from_vec(width, height, r)?,
        Plane::from_vec(width, height, g)?,
        Plane::from_vec(width, height, b)?,
    )
}
