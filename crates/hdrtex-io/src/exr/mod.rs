//! OpenEXR format support.
//!
//! Single-part scanline files only. Blocks stored uncompressed, or with
//! ZIPS or ZIP compression, are decoded; headers naming any other scheme
//! parse, but their compressed blocks fail to decode.
//!
//! Channels are matched to RGBA by name, so the alphabetical `A, B, G, R`
//! order written by most tools maps back to `R, G, B, A`. Files without an
//! `A` channel decode as opaque.
//!
//! # Example
//!
//! ```no_run
//! use hdrtex_io::exr::{self, Compression, ExrWriter};
//! use hdrtex_io::ImageWriter;
//!
//! let exr = exr::read("lut.exr")?;
//! let plane = exr.to_image()?;
//!
//! ExrWriter::new()
//!     .with_compression(Compression::None)
//!     .write("lut_raw.exr", &plane)?;
//! # Ok::<(), hdrtex_io::IoError>(())
//! ```

pub mod header;
mod image;
pub mod scanline;
mod writer;
pub mod zip;

pub use header::{Box2i, Channel, Compression, Header, LineOrder, PixelType};
pub use image::Exr;
pub use scanline::{BlockLayout, ScanLine};
pub use writer::CHANNEL_ORDER;

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use hdrtex_core::ImageSource;

use crate::traits::{ImageConfig, ImageReader, ImageWriter};
use crate::{IoError, IoResult};

/// Decodes an EXR stream, keeping blocks in stored form.
pub fn decode<R: Read>(mut reader: R) -> IoResult<Exr> {
    Exr::read(&mut reader)
}

/// Reads only the header: color model of the first channel and data window
/// size.
pub fn decode_info<R: Read>(mut reader: R) -> IoResult<ImageConfig> {
    let header = Header::read(&mut reader)?;
    let color_model = header
        .color_model()
        .ok_or_else(|| IoError::DecodeError("no channels".into()))?;
    Ok(ImageConfig {
        color_model,
        width: header.width() as u32,
        height: header.height() as u32,
    })
}

/// Header-only read of a file.
pub fn read_info<P: AsRef<Path>>(path: P) -> IoResult<ImageConfig> {
    let file = File::open(path.as_ref())?;
    decode_info(BufReader::new(file))
}

/// Reads an EXR file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Exr> {
    ExrReader::new().read(path)
}

/// Writes an HDR image as a ZIP-compressed EXR file.
pub fn write<P: AsRef<Path>>(path: P, image: &dyn ImageSource) -> IoResult<()> {
    ExrWriter::new().write(path, image)
}

/// EXR file reader.
#[derive(Debug, Clone, Default)]
pub struct ExrReader;

impl ExrReader {
    /// Creates a reader.
    pub fn new() -> Self {
        Self
    }
}

impl ImageReader for ExrReader {
    type Output = Exr;

    fn decode<R: Read>(&self, reader: R) -> IoResult<Exr> {
        decode(reader)
    }
}

/// Options for writing EXR files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExrWriterOptions {
    /// Block compression: None, ZIPS or ZIP.
    pub compression: Compression,
}

impl Default for ExrWriterOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Zip,
        }
    }
}

/// EXR file writer.
#[derive(Debug, Clone, Default)]
pub struct ExrWriter {
    options: ExrWriterOptions,
}

impl ExrWriter {
    /// Creates a writer using ZIP compression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with the given options.
    pub fn with_options(options: ExrWriterOptions) -> Self {
        Self { options }
    }

    /// Sets the block compression.
    ///
    /// Schemes other than None, ZIPS and ZIP are rejected when writing.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.options.compression = compression;
        self
    }
}

impl ImageWriter for ExrWriter {
    fn encode<W: Write>(&self, w: W, image: &dyn ImageSource) -> IoResult<()> {
        writer::encode(w, image, self.options.compression)
    }
}
