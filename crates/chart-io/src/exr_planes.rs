//! OpenEXR decode to planes and encode from planes.
//!
//! Reading takes the first layer carrying `R`, `G` and `B` channels (any
//! sample type, converted to `f32`). Writing produces a single RGB layer of
//! 32-bit float samples with lossless ZIP compression.

use std::path::Path;

use chart_core::{Plane, RgbPlanes};
use tracing::{debug, trace};

use crate::{IoError, IoResult};

/// Reads the R, G and B channels of an EXR file into three planes.
///
/// # Errors
///
/// Returns [`IoError::DecodeError`] if the file is missing, corrupt, or has
/// no layer with all of R, G and B.
pub fn read_planes<P: AsRef<Path>>(path: P) -> IoResult<RgbPlanes> {
    use exr::prelude::*;

    let path = path.as_ref();
    trace!(path = %path.display(), "read_planes");

    let image = read_first_rgba_layer_from_file(
        path,
        |resolution, _| {
            let width = resolution.width();
            let size = width * resolution.height();
            (width, vec![[0.0f32; 3]; size])
        },
        |(width, buffer), position, (r, g, b, _a): (f32, f32, f32, f32)| {
            let idx = position.y() * *width + position.x();
            if idx < buffer.len() {
                buffer[idx] = [r, g, b];
            }
        },
    )
    .map_err(|e| IoError::DecodeError(format!("{}: {}", path.display(), e)))?;

    let width = image.layer_data.size.width();
    let height = image.layer_data.size.height();
    let (_, ref pixels) = image.layer_data.channel_data.pixels;

    let mut r = Vec::with_capacity(pixels.len());
    let mut g = Vec::with_capacity(pixels.len());
    let mut b = Vec::with_capacity(pixels.len());
    for px in pixels {
        r.push(px[0]);
        g.push(px[1]);
        b.push(px[2]);
    }

    debug!(width, height, "decoded EXR planes");

    Ok(RgbPlanes::new(
        Plane::from_vec(width, height, r)?,
        Plane::from_vec(width, height, g)?,
        Plane::from_vec(width, height, b)?,
    )?)
}

/// Writes three planes as the R, G and B channels of an EXR file.
///
/// # Errors
///
/// Returns [`IoError::EncodeError`] if the file cannot be written.
pub fn write_planes<P: AsRef<Path>>(path: P, planes: &RgbPlanes) -> IoResult<()> {
    use exr::prelude::*;

    let path = path.as_ref();
    let (width, height) = planes.dimensions();
    trace!(path = %path.display(), width, height, "write_planes");

    if width == 0 || height == 0 {
        return Err(IoError::EncodeError(format!(
            "{}: cannot encode an empty {}x{} image",
            path.display(),
            width,
            height
        )));
    }

    let [r, g, b] = planes.channels().map(Plane::data);
    let layer = Layer::new(
        (width, height),
        LayerAttributes::named("RGB"),
        Encoding::SMALL_LOSSLESS,
        SpecificChannels::rgb(|pos: Vec2<usize>| {
            let idx = pos.y() * width + pos.x();
            (r[idx], g[idx], b[idx])
        }),
    );

    Image::from_layer(layer)
        .write()
        .to_file(path)
        .map_err(|e| IoError::EncodeError(format!("{}: {}", path.display(), e)))?;

    debug!(width, height, "encoded EXR planes");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.exr");

        let planes = RgbPlanes::from_fn(24, 16, |x, y| {
            [x as f32 / 24.0, y as f32 / 16.0, 0.18 + (x * y) as f32 * 1e-3]
        });
        write_planes(&path, &planes).expect("Failed to write EXR");

        let loaded = read_planes(&path).expect("Failed to read EXR");
        assert_eq!(loaded.dimensions(), (24, 16));
        for (orig, load) in planes.channels().iter().zip(loaded.channels()) {
            for (a, b) in orig.data().iter().zip(load.data()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_hdr_values_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdr.exr");
        let planes = RgbPlanes::filled(4, 4, [12.5, -0.25, 1.0e4]);
        write_planes(&path, &planes).unwrap();
        let loaded = read_planes(&path).unwrap();
        assert_eq!(loaded.pixel(3, 3), Some([12.5, -0.25, 1.0e4]));
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_planes(dir.path().join("missing.exr")).unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.exr");
        std::fs::write(&path, b"not an exr file at all").unwrap();
        assert!(read_planes(&path).unwrap_err().is_decode_error());
    }

    #[test]
    fn test_unwritable_path_is_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.exr");
        let err = write_planes(&path, &RgbPlanes::filled(2, 2, [1.0; 3])).unwrap_err();
        assert!(matches!(err, IoError::EncodeError(_)));
    }
}
