//! # chart-io
//!
//! OpenEXR plane I/O for chart calibration.
//!
//! Charts are photographed and linearized into scene-referred floating-point
//! images, so the only container this crate handles is OpenEXR. Images are
//! exchanged as [`RgbPlanes`]: three equal-shaped `f32` planes. Alpha is
//! ignored on read and not written.
//!
//! # Example
//!
//! ```rust,no_run
//! use chart_io::{read_planes, write_planes};
//!
//! let planes = read_planes("front.exr")?;
//! println!("{}x{}", planes.width(), planes.height());
//! write_planes("copy.exr", &planes)?;
//! # Ok::<(), chart_io::IoError>(())
//! ```
//!
//! # Dependencies
//!
//! - [`exr`] - Pure-Rust OpenEXR codec
//! - [`chart_core`] - Plane types

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod exr_planes;

pub use error::{IoError, IoResult};
pub use exr_planes::{read_planes, write_planes};

pub use chart_core::{Plane, RgbPlanes};
