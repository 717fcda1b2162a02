//! Format registry for magic-byte and extension dispatch.
//!
//! The registry maps file extensions and signatures to codec entry points,
//! so callers can load or save a [`Plane`] without naming the format.
//!
//! # Architecture
//!
//! [`FormatRegistry::global()`] returns a lazily built instance holding the
//! codecs enabled by Cargo features. Entries are plain function pointers;
//! nothing in the registry is mutable once built.
//!
//! # Example
//!
//! ```rust
//! use hdrtex_io::registry::FormatRegistry;
//!
//! let registry = FormatRegistry::global();
//! assert!(registry.supports_extension("DDS"));
//!
//! let header = [0x76, 0x2F, 0x31, 0x01]; // EXR magic
//! assert_eq!(registry.detect_format(&header), Some("OpenEXR"));
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use hdrtex_core::{ImageSource, Plane};
use tracing::debug;

use crate::detect::Format;
use crate::traits::ImageConfig;
use crate::{IoError, IoResult};

/// Format information entry in the registry.
#[derive(Debug, Clone)]
pub struct FormatInfo {
    /// Human-readable format name.
    pub name: &'static str,
    /// Container format.
    pub format: Format,
    /// File extensions without dots, lowercase.
    pub extensions: &'static [&'static str],
    /// Checks whether header bytes carry this format's signature.
    pub can_read: fn(&[u8]) -> bool,
    /// Decodes a whole file from memory into its primary plane.
    pub read_memory: fn(&[u8]) -> IoResult<Plane>,
    /// Decodes only the header.
    pub read_config: fn(&[u8]) -> IoResult<ImageConfig>,
    /// Writes an image to a path.
    pub write_path: fn(&Path, &dyn ImageSource) -> IoResult<()>,
    /// Encodes an image into memory.
    pub write_memory: fn(&dyn ImageSource) -> IoResult<Vec<u8>>,
}

/// Central registry of codec entry points.
///
/// # Thread Safety
///
/// Immutable after construction; the global instance can be shared across
/// threads.
#[derive(Debug, Default)]
pub struct FormatRegistry {
    formats: HashMap<&'static str, Arc<FormatInfo>>,
    by_extension: HashMap<&'static str, &'static str>,
}

impl FormatRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the global registry with the built-in codecs.
    pub fn global() -> &'static FormatRegistry {
        static INSTANCE: OnceLock<FormatRegistry> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            let mut registry = FormatRegistry::new();
            registry.register_builtin_formats();
            registry
        })
    }

    /// Registers the codecs enabled by Cargo features.
    fn register_builtin_formats(&mut self) {
        #[cfg(feature = "dds")]
        self.register(FormatInfo {
            name: "DDS",
            format: Format::Dds,
            extensions: &["dds"],
            can_read: |h| Format::from_bytes(h) == Format::Dds,
            read_memory: |d| {
                use crate::ImageReader;
                crate::dds::DdsReader::new()
                    .read_from_memory(d)
                    .map(crate::dds::Dds::into_plane)
            },
            read_config: |d| crate::dds::decode_config(d),
            write_path: |p, i| crate::dds::write(p, i),
            write_memory: |i| {
                use crate::ImageWriter;
                crate::dds::DdsWriter::new().write_to_memory(i)
            },
        });

        #[cfg(feature = "exr")]
        self.register(FormatInfo {
            name: "OpenEXR",
            format: Format::Exr,
            extensions: &["exr"],
            can_read: |h| Format::from_bytes(h) == Format::Exr,
            read_memory: |d| {
                use crate::ImageReader;
                crate::exr::ExrReader::new().read_from_memory(d)?.to_image()
            },
            read_config: |d| crate::exr::decode_info(d),
            write_path: |p, i| crate::exr::write(p, i),
            write_memory: |i| {
                use crate::ImageWriter;
                crate::exr::ExrWriter::new().write_to_memory(i)
            },
        });
    }

    /// Registers a format, replacing any entry of the same name.
    pub fn register(&mut self, info: FormatInfo) {
        let name = info.name;
        for ext in info.extensions {
            self.by_extension.insert(ext, name);
        }
        self.formats.insert(name, Arc::new(info));
    }

    /// Iterates over registered format names.
    pub fn format_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.formats.keys().copied()
    }

    /// Format info by name.
    pub fn get(&self, name: &str) -> Option<&FormatInfo> {
        self.formats.get(name).map(|arc| arc.as_ref())
    }

    /// Format info by container format.
    pub fn get_by_format(&self, format: Format) -> Option<&FormatInfo> {
        self.formats
            .values()
            .find(|info| info.format == format)
            .map(|arc| arc.as_ref())
    }

    /// Format info by file extension, case-insensitive.
    pub fn get_by_extension(&self, ext: &str) -> Option<&FormatInfo> {
        let ext_lower = ext.to_lowercase();
        self.by_extension
            .get(ext_lower.as_str())
            .and_then(|name| self.formats.get(name))
            .map(|arc| arc.as_ref())
    }

    /// Checks if an extension is supported.
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.by_extension.contains_key(ext.to_lowercase().as_str())
    }

    /// Detects the format from header bytes.
    pub fn detect_format(&self, header: &[u8]) -> Option<&'static str> {
        self.formats
            .iter()
            .find(|(_, info)| (info.can_read)(header))
            .map(|(name, _)| *name)
    }

    fn detect(&self, data: &[u8]) -> IoResult<&FormatInfo> {
        self.detect_format(data)
            .and_then(|name| self.get(name))
            .ok_or_else(|| IoError::UnsupportedFormat("unrecognized file signature".into()))
    }

    /// Decodes an in-memory file by its signature.
    ///
    /// DDS files yield the first image's top mip level.
    pub fn decode(&self, data: &[u8]) -> IoResult<Plane> {
        let info = self.detect(data)?;
        debug!(format = info.name, len = data.len(), "decoding");
        (info.read_memory)(data)
    }

    /// Header-only read of an in-memory file.
    pub fn decode_config(&self, data: &[u8]) -> IoResult<ImageConfig> {
        (self.detect(data)?.read_config)(data)
    }

    /// Reads a file, detecting the format by signature, then by extension.
    pub fn read(&self, path: &Path) -> IoResult<Plane> {
        let data = std::fs::read(path)?;
        if let Some(info) = self.detect_format(&data).and_then(|name| self.get(name)) {
            return (info.read_memory)(&data);
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match self.get_by_extension(ext) {
            Some(info) => (info.read_memory)(&data),
            None => Err(IoError::UnsupportedFormat(format!(
                "no codec for {}",
                path.display()
            ))),
        }
    }

    /// Encodes an image in the given format.
    pub fn encode(&self, format: Format, image: &dyn ImageSource) -> IoResult<Vec<u8>> {
        let info = self
            .get_by_format(format)
            .ok_or_else(|| IoError::UnsupportedFormat(format!("no writer for {format:?}")))?;
        (info.write_memory)(image)
    }

    /// Writes an image, choosing the format by the path's extension.
    pub fn write(&self, path: &Path, image: &dyn ImageSource) -> IoResult<()> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match self.get_by_extension(ext) {
            Some(info) => (info.write_path)(path, image),
            None => Err(IoError::UnsupportedFormat(if ext.is_empty() {
                "unknown".to_string()
            } else {
                ext.to_string()
            })),
        }
    }
}
