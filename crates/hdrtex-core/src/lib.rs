//! # hdrtex-core
//!
//! Pixel model and pixel planes shared by the HDR texture codecs.
//!
//! - [`Pixel`], [`Rgba32F`], [`Rgba16F`], [`Rgba32U`] - Pixel layouts and conversions
//! - [`ColorModel`] - Which native layout a plane stores
//! - [`Plane`] - Strided byte raster with aliasing sub-views
//! - [`Rect`] - Bounds and intersections
//!
//! ## Display Bridge
//!
//! Every pixel can be read as premultiplied 16-bit RGBA through
//! [`Pixel::to_display_rgba16`], which is what UI code and 8/16-bit
//! encoders consume. HDR values outside [0, 1] are only clamped on that
//! path; planes keep them as stored.
//!
//! ```rust
//! use hdrtex_core::prelude::*;
//!
//! let mut plane = Plane::new(ColorModel::Rgba16F, Rect::from_size(2, 2))?;
//! plane.set(0, 0, Pixel::Float32x4(Rgba32F::new(8.0, 0.0, 0.0, 1.0)));
//! assert_eq!(plane.display_at(0, 0), [65535, 0, 0, 65535]);
//! # Ok::<(), hdrtex_core::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! hdrtex-core (this crate)
//!    ^
//!    |
//!    +-- hdrtex-io (DDS and OpenEXR codecs)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod pixel;
pub mod plane;
pub mod rect;

pub use error::*;
pub use pixel::{ChannelMut, ColorModel, Pixel, Rgba16F, Rgba32F, Rgba32U, DISPLAY_MAX};
pub use plane::{GraySetting, ImageSink, ImageSource, Plane};
pub use rect::*;

/// Prelude module for convenient imports.
///
/// ```
/// use hdrtex_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::pixel::{ColorModel, Pixel, Rgba16F, Rgba32F, Rgba32U};
    pub use crate::plane::{GraySetting, ImageSink, ImageSource, Plane};
    pub use crate::rect::Rect;
}
