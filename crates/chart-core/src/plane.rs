//! Single-channel planes and RGB plane triples.
//!
//! A [`Plane`] stores one color channel in **row-major** order, top-to-bottom:
//!
//! ```text
//! Memory: [v v v v ...]  <- Row 0
//!         [v v v v ...]  <- Row 1
//! ```
//!
//! [`RgbPlanes`] bundles three planes and guarantees they share dimensions,
//! which is what the labeling and sampling stages rely on.

use crate::{Error, Result};

/// One color channel of an image as a 2-D grid of `f32` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    /// Creates a plane with every value set to `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wraps an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} values, got {}", width * height, data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a plane by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Plane width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Row-major pixel values.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at `(x, y)`, or `None` outside the plane.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }
}

/// Three equal-shaped planes holding the R, G and B channels of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbPlanes {
    r: Plane,
    g: Plane,
    b: Plane,
}

impl RgbPlanes {
    /// Bundles three planes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the planes differ in size.
    pub fn new(r: Plane, g: Plane, b: Plane) -> Result<Self> {
        for other in [&g, &b] {
            if other.dimensions() != r.dimensions() {
                return Err(Error::dimension_mismatch(r.dimensions(), other.dimensions()));
            }
        }
        Ok(Self { r, g, b })
    }

    /// Builds an image where every pixel has the same color.
    pub fn filled(width: usize, height: usize, rgb: [f32; 3]) -> Self {
        Self {
            r: Plane::filled(width, height, rgb[0]),
            g: Plane::filled(width, height, rgb[1]),
            b: Plane::filled(width, height, rgb[2]),
        }
    }

    /// Builds an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> [f32; 3]) -> Self {
        let mut r = Vec::with_capacity(width * height);
        let mut g = Vec::with_capacity(width * height);
        let mut b = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                r.push(px[0]);
                g.push(px[1]);
                b.push(px[2]);
            }
        }
        Self {
            r: Plane { width, height, data: r },
            g: Plane { width, height, data: g },
            b: Plane { width, height, data: b },
        }
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.r.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.r.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        self.r.dimensions()
    }

    /// The three planes in R, G, B order.
    #[inline]
    pub fn channels(&self) -> [&Plane; 3] {
        [&self.r, &self.g, &self.b]
    }

    /// RGB triple at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; 3]> {
        Some([self.r.get(x, y)?, self.g.get(x, y)?, self.b.get(x, y)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_len_check() {
        assert!(Plane::from_vec(4, 4, vec![0.0; 16]).is_ok());
        let err = Plane::from_vec(4, 4, vec![0.0; 15]).unwrap_err();
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_row_major_layout() {
        let plane = Plane::from_fn(3, 2, |x, y| (y * 10 + x) as f32);
        assert_eq!(plane.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(plane.get(2, 1), Some(12.0));
        assert_eq!(plane.get(3, 0), None);
    }

    #[test]
    fn test_out_of_range_reads_are_none() {
        let plane = Plane::from_fn(3, 2, |x, y| (y * 10 + x) as f32);
        assert_eq!(plane.get(0, 2), None);
        assert_eq!(plane.get(0, usize::MAX), None);
        assert_eq!(plane.get(usize::MAX, 0), None);

        let img = RgbPlanes::filled(3, 2, [1.0, 2.0, 3.0]);
        assert_eq!(img.pixel(2, 1), Some([1.0, 2.0, 3.0]));
        assert_eq!(img.pixel(0, 2), None);
    }

    #[test]
    fn test_rgb_planes_shape_check() {
        let plane = |w, h| Plane::filled(w, h, 0.0);
        let ok = RgbPlanes::new(plane(4, 2), plane(4, 2), plane(4, 2));
        assert!(ok.is_ok());

        let bad = RgbPlanes::new(plane(4, 2), plane(4, 2), plane(2, 4));
        assert!(matches!(bad, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_rgb_from_fn() {
        let img = RgbPlanes::from_fn(2, 2, |x, y| [x as f32, y as f32, 1.0]);
        assert_eq!(img.pixel(1, 0), Some([1.0, 0.0, 1.0]));
        assert_eq!(img.pixel(0, 1), Some([0.0, 1.0, 1.0]));
        assert_eq!(img.dimensions(), (2, 2));
    }
}
