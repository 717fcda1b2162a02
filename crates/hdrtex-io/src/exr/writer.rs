//! Scanline EXR writer.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use hdrtex_core::ImageSource;
use tracing::debug;

use super::header::{Box2i, Channel, Compression, Header, PixelType};
use super::scanline::{BlockLayout, ScanLine};
use crate::{IoError, IoResult};

/// Channel names in the order they are written.
pub const CHANNEL_ORDER: [&str; 4] = ["A", "B", "G", "R"];

/// Writes `image` as a single-part scanline EXR.
///
/// Four channels are always written, in [`CHANNEL_ORDER`], with the sample
/// type of the image's HDR model. The data and display windows both cover
/// the image bounds.
///
/// # Errors
///
/// - [`IoError::UnsupportedFormat`] if the image model is not HDR or the
///   compression is not None, ZIPS or ZIP
/// - [`IoError::EncodeError`] for empty images
pub fn encode<W: Write>(mut w: W, image: &dyn ImageSource, compression: Compression) -> IoResult<()> {
    let model = image.color_model();
    let pixel_type = PixelType::for_model(model).ok_or_else(|| {
        IoError::UnsupportedFormat(format!("writing {model} images as EXR"))
    })?;
    if !compression.is_supported() {
        return Err(IoError::UnsupportedFormat(format!(
            "unimplemented compression scheme: {compression}"
        )));
    }

    let bounds = image.bounds();
    if bounds.is_empty() {
        return Err(IoError::EncodeError(format!("empty image {bounds}")));
    }

    let channels = CHANNEL_ORDER
        .iter()
        .map(|name| Channel::new(*name, pixel_type))
        .collect();
    let data_window = Box2i {
        x_min: bounds.x,
        y_min: bounds.y,
        x_max: bounds.right() - 1,
        y_max: bounds.bottom() - 1,
    };
    let header = Header::new(channels, compression, data_window);

    let sample = pixel_type.size();
    let layout = BlockLayout {
        width: bounds.width as usize,
        channels: CHANNEL_ORDER.len(),
        sample_size: sample,
    };
    let lines = compression.line_count() as i32;

    let mut blocks = Vec::with_capacity(header.block_count());
    let mut px_bytes = [0u8; 16];
    for y0 in (bounds.y..bounds.bottom()).step_by(lines as usize) {
        let line_count = lines.min(bounds.bottom() - y0);
        let mut data = vec![0u8; line_count as usize * layout.row_stride()];
        for line in 0..line_count {
            for (column, x) in (bounds.x..bounds.right()).enumerate() {
                model
                    .convert(image.stored_at(x, y0 + line))
                    .write_le_bytes(&mut px_bytes);
                for channel in 0..CHANNEL_ORDER.len() {
                    // A,B,G,R in the file; R,G,B,A in the pixel
                    let src = (3 - channel) * sample;
                    let dst = layout.sample_offset(line as usize, channel, column);
                    data[dst..dst + sample].copy_from_slice(&px_bytes[src..src + sample]);
                }
            }
        }
        let mut block = ScanLine::new(y0, line_count as u32, data);
        block.compress(compression)?;
        blocks.push(block);
    }

    let mut head = Vec::new();
    header.write(&mut head)?;
    let mut offset = head.len() as u64 + 8 * blocks.len() as u64;

    w.write_all(&head)?;
    for block in &blocks {
        w.write_u64::<LittleEndian>(offset)?;
        offset += block.stored_len();
    }
    for block in &blocks {
        block.write(&mut w)?;
    }

    debug!(
        width = bounds.width,
        height = bounds.height,
        %pixel_type,
        %compression,
        blocks = blocks.len(),
        "wrote EXR"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdrtex_core::{ColorModel, Pixel, Plane, Rect, Rgba32F};

    #[test]
    fn test_layout_and_offsets() {
        let mut plane = Plane::new(ColorModel::Rgba32F, Rect::from_size(2, 1)).unwrap();
        plane.set(1, 0, Pixel::Float32x4(Rgba32F::new(1.0, 2.0, 3.0, 4.0)));
        let mut out = Vec::new();
        encode(&mut out, &plane, Compression::None).unwrap();

        // one block of 4 channels x 2 columns x 4 bytes, then y and size
        let block_len = 8 + 32;
        let table = out.len() - block_len - 8;
        let offset = u64::from_le_bytes(out[table..table + 8].try_into().unwrap());
        assert_eq!(offset as usize, table + 8);

        let data = &out[table + 16..];
        let sample = |i: usize| f32::from_le_bytes(data[i * 4..i * 4 + 4].try_into().unwrap());
        // A plane first, R plane last, column 1 of each
        assert_eq!(sample(1), 4.0);
        assert_eq!(sample(3), 3.0);
        assert_eq!(sample(5), 2.0);
        assert_eq!(sample(7), 1.0);
    }

    #[test]
    fn test_rejects_ldr_and_unsupported_compression() {
        let ldr = Plane::new(ColorModel::Rgba8, Rect::from_size(1, 1)).unwrap();
        assert!(matches!(
            encode(Vec::new(), &ldr, Compression::Zip),
            Err(IoError::UnsupportedFormat(_))
        ));

        let hdr = Plane::new(ColorModel::Rgba16F, Rect::from_size(1, 1)).unwrap();
        assert!(matches!(
            encode(Vec::new(), &hdr, Compression::Piz),
            Err(IoError::UnsupportedFormat(_))
        ));

        let empty = Plane::new(ColorModel::Rgba32F, Rect::from_size(0, 0)).unwrap();
        assert!(matches!(
            encode(Vec::new(), &empty, Compression::Zip),
            Err(IoError::EncodeError(_))
        ));
    }
}
