//! DirectDraw Surface (DDS) format support.
//!
//! # Reading
//!
//! - Legacy uncompressed surfaces described by RGB, luminance and alpha masks
//! - BC1 (DXT1), BC3 (DXT5), BC4 (ATI1), BC5 (ATI2) and BC7 block compression
//! - DXT10-extended uncompressed float, half, unorm and uint surfaces
//! - Texture arrays, cube maps and volume textures, with their mip chains
//!
//! DXT3/BC2, BC7 sRGB and YUV surfaces are recognized and rejected.
//!
//! # Writing
//!
//! Only the HDR models (`Rgba32F`, `Rgba16F`, `Rgba32U`) are written, always
//! as a single uncompressed DXT10 surface with one mip level.
//!
//! # Example
//!
//! ```no_run
//! use hdrtex_io::dds::{self, DdsReader};
//! use hdrtex_io::ImageReader;
//!
//! let info = dds::read_info("lut.dds")?;
//! println!("{}x{} {}, {} images", info.width(), info.height(), info.color_model, info.num_images);
//!
//! let tex = DdsReader::new().with_mipmaps(true).read("lut.dds")?;
//! for (i, mip) in tex.images()[0].mipmaps().iter().enumerate() {
//!     println!("mip {i}: {}x{}", mip.width, mip.height);
//! }
//! # Ok::<(), hdrtex_io::IoError>(())
//! ```

pub mod bc;
pub mod bc7;
mod decode;
pub mod header;
mod info;
mod uncompressed;
mod writer;

pub use decode::{decode, Dds, DdsImage, MipMap};
pub use header::{DxgiFormat, FourCC};
pub use info::{decode_info, DdsInfo, Decoder};
pub use writer::dxgi_format_for;

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Write};
use std::path::Path;

use hdrtex_core::ImageSource;

use crate::traits::{ImageConfig, ImageReader, ImageWriter};
use crate::IoResult;

// ============================================================================
// Free functions
// ============================================================================

/// Reads the header of a DDS file without decoding pixels.
pub fn read_info<P: AsRef<Path>>(path: P) -> IoResult<DdsInfo> {
    let file = File::open(path.as_ref())?;
    decode_info(BufReader::new(file))
}

/// Reads DDS header info from memory.
pub fn read_info_from_memory(data: &[u8]) -> IoResult<DdsInfo> {
    decode_info(Cursor::new(data))
}

/// Header-only read: color model and dimensions.
pub fn decode_config<R: Read>(reader: R) -> IoResult<ImageConfig> {
    decode_info(reader).map(|info| info.config())
}

/// Reads a DDS file, top mip level only for single-image files.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Dds> {
    DdsReader::new().read(path)
}

/// Writes an HDR image as a DDS file.
pub fn write<P: AsRef<Path>>(path: P, image: &dyn ImageSource) -> IoResult<()> {
    DdsWriter::new().write(path, image)
}

// ============================================================================
// Reader
// ============================================================================

/// Options for reading DDS files.
#[derive(Debug, Clone, Default)]
pub struct DdsReaderOptions {
    /// Decode the full mip chain even for single-image files.
    ///
    /// Files with more than one image always decode every level.
    pub read_mipmaps: bool,
}

/// DDS file reader.
#[derive(Debug, Clone, Default)]
pub struct DdsReader {
    options: DdsReaderOptions,
}

impl DdsReader {
    /// Creates a reader with default options.
    pub fn new() -> Self {
        Self::with_options(DdsReaderOptions::default())
    }

    /// Creates a reader with the given options.
    pub fn with_options(options: DdsReaderOptions) -> Self {
        Self { options }
    }

    /// Sets whether every mip level is decoded.
    pub fn with_mipmaps(mut self, read_mipmaps: bool) -> Self {
        self.options.read_mipmaps = read_mipmaps;
        self
    }
}

impl ImageReader for DdsReader {
    type Output = Dds;

    fn decode<R: Read>(&self, reader: R) -> IoResult<Dds> {
        decode(reader, self.options.read_mipmaps)
    }
}

// ============================================================================
// Writer
// ============================================================================

/// HDR DDS writer.
#[derive(Debug, Clone, Default)]
pub struct DdsWriter;

impl DdsWriter {
    /// Creates a writer.
    pub fn new() -> Self {
        Self
    }
}

impl ImageWriter for DdsWriter {
    fn encode<W: Write>(&self, w: W, image: &dyn ImageSource) -> IoResult<()> {
        writer::encode(w, image)
    }
}
