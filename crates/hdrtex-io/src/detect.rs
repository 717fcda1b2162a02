//! Format detection utilities.
//!
//! Detects container formats from file extensions and magic bytes. Only
//! `.dds` and `.exr` are recognized.

use crate::IoResult;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// DDS magic: `"DDS "`.
pub const DDS_MAGIC: [u8; 4] = *b"DDS ";

/// OpenEXR magic: 20000630 as little-endian u32.
pub const EXR_MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

/// Supported container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// DirectDraw Surface.
    Dds,
    /// OpenEXR.
    Exr,
    /// Unknown/unsupported format.
    Unknown,
}

impl Format {
    /// Detects format from file path (magic bytes, then extension).
    pub fn detect<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();

        if let Ok(format) = Self::from_magic_bytes(path) {
            if format != Format::Unknown {
                return Ok(format);
            }
        }

        Ok(Self::from_extension(path))
    }

    /// Detects format from file extension only.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("dds") => Format::Dds,
            Some("exr") => Format::Exr,
            _ => Format::Unknown,
        }
    }

    /// Detects format from the first bytes of a file.
    pub fn from_magic_bytes<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut header = [0u8; 4];

        let bytes_read = file.read(&mut header)?;
        Ok(Self::from_bytes(&header[..bytes_read]))
    }

    /// Detects format from raw bytes (magic number check).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes.first_chunk::<4>() {
            Some(m) if *m == DDS_MAGIC => Format::Dds,
            Some(m) if *m == EXR_MAGIC => Format::Exr,
            _ => Format::Unknown,
        }
    }

    /// Returns the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Dds => "dds",
            Format::Exr => "exr",
            Format::Unknown => "",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Dds => "image/vnd-ms.dds",
            Format::Exr => "image/x-exr",
            Format::Unknown => "application/octet-stream",
        }
    }
}
