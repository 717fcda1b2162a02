//! Scanline blocks: a group of rows stored, and compressed, together.

use std::borrow::Cow;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::header::Compression;
use super::zip;
use crate::{IoError, IoResult};

/// Sample layout of an uncompressed block.
///
/// Within a block, each row stores every channel in turn, and each channel
/// stores every column in turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// Columns per row.
    pub width: usize,
    /// Channels per row.
    pub channels: usize,
    /// Bytes per sample.
    pub sample_size: usize,
}

impl BlockLayout {
    /// Bytes from one channel of a row to the next.
    pub fn channel_stride(&self) -> usize {
        self.width * self.sample_size
    }

    /// Bytes from one row to the next.
    pub fn row_stride(&self) -> usize {
        self.channel_stride() * self.channels
    }

    /// Byte offset of a sample, `line` rows into the block.
    pub fn sample_offset(&self, line: usize, channel: usize, column: usize) -> usize {
        line * self.row_stride() + channel * self.channel_stride() + column * self.sample_size
    }
}

/// One scanline block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLine {
    /// First row of the block, in data window coordinates.
    pub y: i32,
    /// Stored payload size in bytes.
    pub size: u32,
    /// Stored payload.
    pub data: Vec<u8>,
    /// Whether `data` is in its stored, compressed form.
    pub compressed: bool,
    /// Rows covered.
    pub line_count: u32,
}

impl ScanLine {
    /// Wraps raw, uncompressed rows.
    pub fn new(y: i32, line_count: u32, data: Vec<u8>) -> Self {
        Self {
            y,
            size: data.len() as u32,
            data,
            compressed: false,
            line_count,
        }
    }

    /// Reads `y`, `size` and the payload.
    ///
    /// `line_count_at` maps the block's first row to the rows it covers, and
    /// `raw_size` maps a row count to its uncompressed byte size. A payload
    /// smaller than that size is taken to be compressed.
    pub fn read<R: Read>(
        r: &mut R,
        line_count_at: impl FnOnce(i32) -> IoResult<u32>,
        raw_size: impl FnOnce(u32) -> usize,
    ) -> IoResult<Self> {
        let y = r
            .read_i32::<LittleEndian>()
            .map_err(IoError::reading("scanline block header"))?;
        let size = r
            .read_u32::<LittleEndian>()
            .map_err(IoError::reading("scanline block header"))?;
        let line_count = line_count_at(y)?;

        let mut data = Vec::new();
        r.by_ref().take(size as u64).read_to_end(&mut data)?;
        if data.len() < size as usize {
            return Err(IoError::Truncated(format!(
                "scanline block at y={y} ({} of {size} bytes)",
                data.len()
            )));
        }

        Ok(Self {
            y,
            size,
            compressed: (size as usize) < raw_size(line_count),
            data,
            line_count,
        })
    }

    /// Writes `y`, the payload size and the payload.
    pub fn write<W: Write>(&self, w: &mut W) -> IoResult<()> {
        w.write_i32::<LittleEndian>(self.y)?;
        w.write_u32::<LittleEndian>(self.data.len() as u32)?;
        w.write_all(&self.data)?;
        Ok(())
    }

    /// Bytes this block takes in the file.
    pub fn stored_len(&self) -> u64 {
        8 + self.data.len() as u64
    }

    /// Whether row `y` lies in this block.
    pub fn contains_row(&self, y: i32) -> bool {
        let y = y as i64;
        y >= self.y as i64 && y < self.y as i64 + self.line_count as i64
    }

    /// Byte offset of a sample in the uncompressed payload.
    ///
    /// `column` counts from the data window's left edge and `y` is a data
    /// window row. Returns `None` when the sample lies outside the block or
    /// the payload is still compressed.
    pub fn offset(&self, column: usize, y: i32, channel: usize, layout: &BlockLayout) -> Option<usize> {
        if !self.contains_row(y) || column >= layout.width || channel >= layout.channels {
            return None;
        }
        if self.compressed {
            return None;
        }
        let line = (y as i64 - self.y as i64) as usize;
        Some(layout.sample_offset(line, channel, column))
    }

    /// Uncompressed payload, inflating a copy if needed.
    ///
    /// A payload already at `raw_size` bytes is stored raw even when marked
    /// compressed; writers keep raw bytes when deflating does not help.
    ///
    /// # Errors
    ///
    /// [`IoError::UnsupportedFormat`] for schemes other than None, ZIPS and
    /// ZIP; [`IoError::DecodeError`] for malformed payloads.
    pub fn raw_data(&self, compression: Compression, raw_size: usize) -> IoResult<Cow<'_, [u8]>> {
        if !self.compressed || self.data.len() == raw_size {
            return Ok(Cow::Borrowed(&self.data));
        }
        match compression {
            Compression::None => Ok(Cow::Borrowed(&self.data)),
            Compression::Zips | Compression::Zip => {
                zip::decompress(&self.data, raw_size).map(Cow::Owned)
            }
            other => Err(unsupported(other)),
        }
    }

    /// Replaces a compressed payload by its uncompressed bytes.
    ///
    /// Does nothing for blocks that are not compressed.
    pub fn decompress(&mut self, compression: Compression, raw_size: usize) -> IoResult<()> {
        if !self.compressed {
            return Ok(());
        }
        if let Cow::Owned(data) = self.raw_data(compression, raw_size)? {
            self.data = data;
        }
        self.size = self.data.len() as u32;
        self.compressed = false;
        Ok(())
    }

    /// Compresses the payload in place.
    ///
    /// The compressed bytes are only kept when smaller than the raw ones.
    /// Either way the block is marked compressed and `size` is updated to the
    /// payload length. Does nothing for blocks that are already compressed.
    ///
    /// # Errors
    ///
    /// [`IoError::UnsupportedFormat`] for schemes other than None, ZIPS and ZIP.
    pub fn compress(&mut self, compression: Compression) -> IoResult<()> {
        if self.compressed {
            return Ok(());
        }
        match compression {
            Compression::None => {}
            Compression::Zips | Compression::Zip => {
                let packed = zip::compress(&self.data);
                if packed.len() < self.data.len() {
                    self.data = packed;
                }
            }
            other => return Err(unsupported(other)),
        }
        self.size = self.data.len() as u32;
        self.compressed = true;
        Ok(())
    }
}

fn unsupported(compression: Compression) -> IoError {
    IoError::UnsupportedFormat(format!("unimplemented compression scheme: {compression}"))
}
