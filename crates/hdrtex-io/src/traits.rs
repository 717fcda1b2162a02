//! Reader and writer traits implemented by each codec.
//!
//! Codecs only implement the stream methods; path and memory variants are
//! provided on top of them.

use crate::IoResult;
use hdrtex_core::{ColorModel, ImageSource};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

/// Header-only description of an image: enough to size a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConfig {
    /// Color model the decoder would produce.
    pub color_model: ColorModel,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Trait for format readers.
///
/// # Example
///
/// ```rust,ignore
/// use hdrtex_io::{ImageReader, IoResult};
/// use std::io::Read;
///
/// struct MyFormatReader;
///
/// impl ImageReader for MyFormatReader {
///     type Output = MyImage;
///
///     fn decode<R: Read>(&self, reader: R) -> IoResult<MyImage> {
///         // Parse the stream
///     }
/// }
/// ```
pub trait ImageReader {
    /// Decoded container type.
    type Output;

    /// Decodes a container from a byte stream.
    fn decode<R: Read>(&self, reader: R) -> IoResult<Self::Output>;

    /// Reads a container from a file path.
    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<Self::Output> {
        let file = File::open(path.as_ref())?;
        self.decode(BufReader::new(file))
    }

    /// Reads a container from memory.
    fn read_from_memory(&self, data: &[u8]) -> IoResult<Self::Output> {
        self.decode(Cursor::new(data))
    }
}

/// Trait for format writers.
pub trait ImageWriter {
    /// Encodes an image into a byte stream.
    fn encode<W: Write>(&self, writer: W, image: &dyn ImageSource) -> IoResult<()>;

    /// Writes an image to a file path.
    fn write<P: AsRef<Path>>(&self, path: P, image: &dyn ImageSource) -> IoResult<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.encode(&mut writer, image)?;
        writer.flush()?;
        Ok(())
    }

    /// Encodes an image into memory.
    fn write_to_memory(&self, image: &dyn ImageSource) -> IoResult<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(&mut out, image)?;
        Ok(out)
    }
}
