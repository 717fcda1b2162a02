//! Decoded EXR container and pixel reconstruction.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use half::f16;
use hdrtex_core::{ColorModel, Pixel, Plane, Rect};
use tracing::{trace, warn};

use super::header::{Header, PixelType};
use super::scanline::{BlockLayout, ScanLine};
use crate::{IoError, IoResult};

/// A single-part scanline EXR file with its blocks still in stored form.
#[derive(Debug, Clone)]
pub struct Exr {
    /// Parsed header.
    pub header: Header,
    /// Offset table as read; blocks are read sequentially.
    pub offsets: Vec<u64>,
    scanlines: Vec<ScanLine>,
}

impl Exr {
    /// Reads header, offset table and every scanline block.
    ///
    /// # Errors
    ///
    /// Everything [`Header::read`] rejects, [`IoError::InvalidFile`] for
    /// blocks outside the data window or repeating a row already read, and
    /// [`IoError::Truncated`] when the stream ends early. Blocks may arrive in
    /// any order.
    pub fn read<R: Read>(r: &mut R) -> IoResult<Self> {
        let header = Header::read(r)?;
        let count = header.block_count();

        let mut offsets = Vec::new();
        offsets
            .try_reserve_exact(count)
            .map_err(|e| hdrtex_core::Error::allocation_failed(count as u64 * 8, e.to_string()))?;
        offsets.resize(count, 0);
        r.read_u64_into::<LittleEndian>(&mut offsets)
            .map_err(IoError::reading("offset table"))?;

        let lines = header.compression.line_count();
        let window = header.data_window;
        let row_size = header.width() * header.pixel_size();

        // one block per index; with exactly `count` reads this also rules
        // out gaps
        let mut seen = vec![false; count];
        let mut scanlines = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let block = ScanLine::read(
                r,
                |y| {
                    let first = y as i64 - window.y_min as i64;
                    if first < 0 || y > window.y_max || first % lines as i64 != 0 {
                        return Err(IoError::InvalidFile(format!(
                            "scanline block at y={y} outside data window {}..={}",
                            window.y_min, window.y_max
                        )));
                    }
                    Ok((window.y_max as i64 - y as i64 + 1).min(lines as i64) as u32)
                },
                |n| n as usize * row_size,
            )?;
            let index = ((block.y as i64 - window.y_min as i64) / lines as i64) as usize;
            if std::mem::replace(&mut seen[index], true) {
                return Err(IoError::InvalidFile(format!(
                    "duplicate scanline block at y={}",
                    block.y
                )));
            }
            trace!(
                y = block.y,
                size = block.size,
                lines = block.line_count,
                compressed = block.compressed,
                "read EXR block"
            );
            scanlines.push(block);
        }

        Ok(Self {
            header,
            offsets,
            scanlines,
        })
    }

    /// Scanline blocks in file order.
    pub fn scanlines(&self) -> &[ScanLine] {
        &self.scanlines
    }

    /// Data window width in pixels.
    pub fn width(&self) -> usize {
        self.header.width()
    }

    /// Data window height in pixels.
    pub fn height(&self) -> usize {
        self.header.height()
    }

    /// Data window as a rectangle.
    pub fn bounds(&self) -> Rect {
        let dw = self.header.data_window;
        Rect::new(dw.x_min, dw.y_min, self.width() as i32, self.height() as i32)
    }

    /// Color model of the first channel.
    pub fn color_model(&self) -> ColorModel {
        self.header
            .color_model()
            .unwrap_or(ColorModel::Rgba32F)
    }

    fn layout(&self, sample_type: PixelType) -> BlockLayout {
        BlockLayout {
            width: self.width(),
            channels: self.header.channels.len(),
            sample_size: sample_type.size(),
        }
    }

    fn raw_size(&self, block: &ScanLine) -> usize {
        block.line_count as usize * self.width() * self.header.pixel_size()
    }

    /// RGBA slot of every channel, warning once per unmapped channel.
    fn slots(&self) -> Vec<Option<usize>> {
        self.header
            .channels
            .iter()
            .map(|c| {
                let slot = c.slot();
                if slot.is_none() {
                    warn!(channel = %c.name, "ignoring EXR channel not named R, G, B or A");
                }
                slot
            })
            .collect()
    }

    /// Decompresses every block in place.
    ///
    /// Later [`pixel_at`](Self::pixel_at) calls then read without inflating.
    pub fn decompress_all(&mut self) -> IoResult<()> {
        let compression = self.header.compression;
        let row_size = self.width() * self.header.pixel_size();
        for block in &mut self.scanlines {
            block.decompress(compression, block.line_count as usize * row_size)?;
        }
        Ok(())
    }

    /// Decodes every block into a plane covering the data window.
    ///
    /// Channels named `R`, `G`, `B` and `A` fill the matching slots in any
    /// order. A missing alpha channel reads as fully opaque.
    ///
    /// # Errors
    ///
    /// [`IoError::DecodeError`] for mixed channel types or malformed blocks,
    /// [`IoError::UnsupportedFormat`] for compression schemes other than
    /// None, ZIPS and ZIP.
    pub fn to_image(&self) -> IoResult<Plane> {
        let sample_type = self.header.uniform_pixel_type()?;
        let model = sample_type.color_model();
        let sample = sample_type.size();
        let bounds = self.bounds();
        let layout = self.layout(sample_type);
        let slots = self.slots();

        let bpp = 4 * sample;
        let mut opaque = [0u8; 16];
        Pixel::opaque_black(model).write_le_bytes(&mut opaque);
        let mut pix = hdrtex_core::plane::allocate(bpp, bounds)?;
        for px in pix.chunks_exact_mut(bpp) {
            px.copy_from_slice(&opaque[..bpp]);
        }

        let width = layout.width;
        for block in &self.scanlines {
            let data = block.raw_data(self.header.compression, self.raw_size(block))?;
            for line in 0..block.line_count as i32 {
                let y = block.y + line;
                let row = (y - bounds.y) as usize;
                for (channel, slot) in slots.iter().enumerate() {
                    let Some(slot) = *slot else { continue };
                    for column in 0..width {
                        let o = layout.sample_offset(line as usize, channel, column);
                        let src = data.get(o..o + sample).ok_or_else(|| short_block(block))?;
                        let dst = (row * width + column) * bpp + slot * sample;
                        pix[dst..dst + sample].copy_from_slice(src);
                    }
                }
            }
        }

        let plane = Plane::from_raw(model, bounds, width * bpp, pix)?;
        Ok(plane)
    }

    /// Reads one pixel, decompressing only the block that holds it.
    ///
    /// `(x, y)` are data window coordinates. Points outside the data window
    /// read as the zero pixel.
    ///
    /// # Errors
    ///
    /// [`IoError::DecodeError`] if a channel's pixel type differs from the
    /// first channel's, or the owning block is malformed.
    pub fn pixel_at(&self, x: i32, y: i32) -> IoResult<Pixel> {
        let sample_type = self.header.uniform_pixel_type()?;
        let model = sample_type.color_model();
        let bounds = self.bounds();
        if !bounds.contains(x, y) {
            return Ok(Pixel::zero(model));
        }
        let Some(block) = self.scanlines.iter().find(|b| b.contains_row(y)) else {
            return Err(IoError::DecodeError(format!("no scanline block holds row {y}")));
        };

        let data = block.raw_data(self.header.compression, self.raw_size(block))?;
        let layout = self.layout(sample_type);
        let line = (y - block.y) as usize;
        let column = (x - bounds.x) as usize;

        let mut pixel = Pixel::opaque_black(model);
        for (i, channel) in self.header.channels.iter().enumerate() {
            let Some(dst) = pixel.channel_mut(&channel.name) else {
                continue;
            };
            let o = layout.sample_offset(line, i, column);
            let src = data.get(o..).ok_or_else(|| short_block(block))?;
            if !dst.set_le(src) {
                return Err(short_block(block));
            }
        }
        Ok(pixel)
    }

    /// Every pixel as `[r, g, b, a]` floats, one `Vec` per row.
    ///
    /// Half and float samples are widened; unsigned samples are divided by
    /// `u32::MAX`. A missing alpha channel reads as 1.0.
    pub fn pixels(&self) -> IoResult<Vec<Vec<[f32; 4]>>> {
        let plane = self.to_image()?;
        let bounds = plane.bounds();
        let rows = (bounds.y..bounds.bottom())
            .map(|y| {
                (bounds.x..bounds.right())
                    .map(|x| to_f32x4(plane.stored_at(x, y)))
                    .collect()
            })
            .collect();
        Ok(rows)
    }
}

fn to_f32x4(px: Pixel) -> [f32; 4] {
    match px {
        Pixel::Float32x4(p) => [p.r, p.g, p.b, p.a],
        Pixel::Float16x4(p) => [p.r, p.g, p.b, p.a].map(f16::to_f32),
        Pixel::UInt32x4(p) => [p.r, p.g, p.b, p.a].map(|v| (v as f64 / u32::MAX as f64) as f32),
        other => {
            let [r, g, b, a] = other.to_display_rgba16();
            [r, g, b, a].map(|v| v as f32 / 65535.0)
        }
    }
}

fn short_block(block: &ScanLine) -> IoError {
    IoError::DecodeError(format!(
        "scanline block at y={} is shorter than its {} rows",
        block.y, block.line_count
    ))
}
