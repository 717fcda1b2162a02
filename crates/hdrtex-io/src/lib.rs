//! # hdrtex-io
//!
//! DDS and OpenEXR codecs for editing HDR lookup textures.
//!
//! - **DDS** - Legacy and DXT10 surfaces, BC1/BC3/BC4/BC5/BC7, arrays,
//!   cube maps and mip chains
//! - **EXR** - Single-part scanline files, uncompressed or ZIP/ZIPS
//!
//! Both codecs write only the HDR color models: 32-bit float, 16-bit float
//! and 32-bit normalized unsigned RGBA.
//!
//! # Architecture
//!
//! - [`ImageReader`] - Trait for format readers
//! - [`ImageWriter`] - Trait for format writers
//! - [`registry::FormatRegistry`] - Signature and extension dispatch
//! - [`read`] / [`write`] - High-level functions with format auto-detection
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hdrtex_core::{ColorModel, Plane};
//!
//! // Read any supported format (auto-detected)
//! let plane = hdrtex_io::read("lut.dds")?;
//!
//! // Save it as EXR, converting to float first
//! let mut hdr = Plane::new(ColorModel::Rgba32F, plane.bounds())?;
//! for (x, y) in plane.bounds().iter_coords() {
//!     hdr.set(x, y, plane.stored_at(x, y));
//! }
//! hdrtex_io::write("lut.exr", &hdr)?;
//! # Ok::<(), hdrtex_io::IoError>(())
//! ```
//!
//! # Format-Specific Usage
//!
//! ```rust,no_run
//! use hdrtex_io::dds::DdsReader;
//! use hdrtex_io::exr::{Compression, ExrWriter};
//! use hdrtex_io::{ImageReader, ImageWriter};
//!
//! let tex = DdsReader::new().with_mipmaps(true).read("lut.dds")?;
//! let stacked = tex.stack_layers()?;
//!
//! ExrWriter::new()
//!     .with_compression(Compression::Zips)
//!     .write("lut.exr", &stacked)?;
//! # Ok::<(), hdrtex_io::IoError>(())
//! ```
//!
//! # Feature Flags
//!
//! - `dds` - DirectDraw Surface support (default)
//! - `exr` - OpenEXR support (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use std::path::Path;

use hdrtex_core::{ImageSource, Plane};

pub mod detect;
pub mod error;
pub mod registry;
pub mod traits;

#[cfg(feature = "dds")]
pub mod dds;

#[cfg(feature = "exr")]
pub mod exr;

pub use detect::Format;
pub use error::{ErrorKind, IoError, IoResult};
pub use traits::{ImageConfig, ImageReader, ImageWriter};

/// Reads an image file into a plane, detecting the format.
///
/// Magic bytes win over the extension. DDS files yield the first image's
/// top mip level; EXR files are fully decoded.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] when neither signature nor extension is
/// recognized, plus any codec error.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Plane> {
    registry::FormatRegistry::global().read(path.as_ref())
}

/// Decodes an in-memory file into a plane, detecting the format by signature.
pub fn decode(data: &[u8]) -> IoResult<Plane> {
    registry::FormatRegistry::global().decode(data)
}

/// Writes an image, choosing the format by the path's extension.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] for unknown extensions or non-HDR images
/// written as EXR; [`IoError::EncodeError`] for non-HDR images written as DDS.
pub fn write<P: AsRef<Path>>(path: P, image: &dyn ImageSource) -> IoResult<()> {
    registry::FormatRegistry::global().write(path.as_ref(), image)
}

/// Encodes an image into memory in the given format.
pub fn encode(format: Format, image: &dyn ImageSource) -> IoResult<Vec<u8>> {
    registry::FormatRegistry::global().encode(format, image)
}
