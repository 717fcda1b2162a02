//! BC1, BC3, BC4 and BC5 block decoding.
//!
//! Interpolation uses the exact DX9 rounding (integer division, no bias).
//! Layouts follow the Direct3D block compression documentation:
//! <https://learn.microsoft.com/en-us/windows/win32/direct3d10/d3d10-graphics-programming-guide-resources-block-compression>

use hdrtex_core::{Pixel, Plane};

use crate::{IoError, IoResult};

/// Decoded 4x4 tile, row-major, RGBA8.
pub type Block = [[u8; 4]; 16];

/// An RGB565 endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color565(u16);

impl Color565 {
    /// Wraps a raw little-endian value.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Red expanded to 8 bits.
    #[inline]
    pub const fn red(self) -> u8 {
        let r = ((self.0 >> 11) & 0x1f) as u8;
        (r << 3) | (r >> 2)
    }

    /// Green expanded to 8 bits.
    #[inline]
    pub const fn green(self) -> u8 {
        let g = ((self.0 >> 5) & 0x3f) as u8;
        (g << 2) | (g >> 4)
    }

    /// Blue expanded to 8 bits.
    #[inline]
    pub const fn blue(self) -> u8 {
        let b = (self.0 & 0x1f) as u8;
        (b << 3) | (b >> 2)
    }

    fn rgba(self) -> [u8; 4] {
        [self.red(), self.green(), self.blue(), 255]
    }
}

fn mix(a: [u8; 4], b: [u8; 4], wa: u32, wb: u32, div: u32) -> [u8; 4] {
    let c = |i: usize| ((wa * a[i] as u32 + wb * b[i] as u32) / div) as u8;
    [c(0), c(1), c(2), 255]
}

/// Decodes the 8-byte color half of a BC1/BC2/BC3 block.
///
/// With `force_four_color` the endpoint order is ignored, as BC3 requires.
pub fn decode_color_block(src: &[u8; 8], force_four_color: bool) -> Block {
    let c0_raw = u16::from_le_bytes([src[0], src[1]]);
    let c1_raw = u16::from_le_bytes([src[2], src[3]]);
    let indices = u32::from_le_bytes([src[4], src[5], src[6], src[7]]);

    let c0 = Color565::from_raw(c0_raw).rgba();
    let c1 = Color565::from_raw(c1_raw).rgba();

    let dict = if force_four_color || c0_raw > c1_raw {
        [c0, c1, mix(c0, c1, 2, 1, 3), mix(c0, c1, 1, 2, 3)]
    } else {
        // three colors plus transparent black
        [c0, c1, mix(c0, c1, 1, 1, 2), [0, 0, 0, 0]]
    };

    let mut out = [[0u8; 4]; 16];
    for (i, px) in out.iter_mut().enumerate() {
        *px = dict[((indices >> (2 * i)) & 0x3) as usize];
    }
    out
}

/// Decodes an 8-byte BC4 block (also the alpha half of BC3).
pub fn decode_alpha_block(src: &[u8; 8]) -> [u8; 16] {
    let a0 = src[0] as u32;
    let a1 = src[1] as u32;

    let mut table = [0u8; 8];
    table[0] = a0 as u8;
    table[1] = a1 as u8;
    if a0 > a1 {
        for i in 1..7u32 {
            table[i as usize + 1] = (((7 - i) * a0 + i * a1) / 7) as u8;
        }
    } else {
        for i in 1..5u32 {
            table[i as usize + 1] = (((5 - i) * a0 + i * a1) / 5) as u8;
        }
        table[6] = 0;
        table[7] = 255;
    }

    // 48 bits of 3-bit indices, LSB first
    let bits = src[2..8]
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64);

    let mut out = [0u8; 16];
    for (i, a) in out.iter_mut().enumerate() {
        *a = table[((bits >> (3 * i)) & 0x7) as usize];
    }
    out
}

/// BC1 / DXT1.
pub fn decode_bc1(src: &[u8; 8]) -> Block {
    decode_color_block(src, false)
}

/// BC3 / DXT5: alpha block followed by a four-color block.
pub fn decode_bc3(src: &[u8; 16]) -> Block {
    let (alpha, color) = split_halves(src);
    let mut out = decode_color_block(&color, true);
    for (px, a) in out.iter_mut().zip(decode_alpha_block(&alpha)) {
        px[3] = a;
    }
    out
}

/// BC4 / ATI1: one channel, broadcast to gray.
pub fn decode_bc4(src: &[u8; 8]) -> Block {
    decode_alpha_block(src).map(|v| [v, v, v, 255])
}

/// BC5 / ATI2: red and green from two BC4 blocks.
///
/// Blue is rebuilt as the Z of a unit tangent-space normal, `A` is opaque.
pub fn decode_bc5(src: &[u8; 16]) -> Block {
    let (red, green) = split_halves(src);
    let red = decode_alpha_block(&red);
    let green = decode_alpha_block(&green);

    let mut out = [[0u8; 4]; 16];
    for (i, px) in out.iter_mut().enumerate() {
        *px = [red[i], green[i], normal_z(red[i], green[i]), 255];
    }
    out
}

fn normal_z(r: u8, g: u8) -> u8 {
    let nx = r as f32 / 255.0 * 2.0 - 1.0;
    let ny = g as f32 / 255.0 * 2.0 - 1.0;
    let nz = (1.0 - nx * nx - ny * ny).max(0.0).sqrt();
    ((nz + 1.0) / 2.0 * 255.0).round() as u8
}

fn split_halves(src: &[u8; 16]) -> ([u8; 8], [u8; 8]) {
    (
        std::array::from_fn(|i| src[i]),
        std::array::from_fn(|i| src[i + 8]),
    )
}

/// Number of bytes a `width` x `height` surface of `block_size` blocks occupies.
pub fn surface_size(width: usize, height: usize, block_size: usize) -> IoResult<usize> {
    width
        .div_ceil(4)
        .checked_mul(height.div_ceil(4))
        .and_then(|n| n.checked_mul(block_size))
        .ok_or_else(|| {
            IoError::Core(hdrtex_core::Error::allocation_failed(
                u64::MAX,
                "block surface size overflows",
            ))
        })
}

/// Decodes a block-compressed surface into `plane`.
///
/// Tiles are visited left to right, top to bottom; partial edge tiles are
/// clipped to the plane bounds. `decode` turns one block into RGBA8 texels
/// and `to_pixel` maps each texel to the plane's model.
pub fn decode_surface<const N: usize>(
    data: &[u8],
    plane: &mut Plane,
    decode: impl Fn(&[u8; N]) -> Block,
    to_pixel: impl Fn([u8; 4]) -> Pixel,
) -> IoResult<()> {
    let width = plane.width().max(0) as usize;
    let height = plane.height().max(0) as usize;
    let origin = plane.bounds();
    let expected = surface_size(width, height, N)?;
    if data.len() < expected {
        return Err(IoError::Truncated(format!(
            "block data ({} of {} bytes)",
            data.len(),
            expected
        )));
    }

    let blocks_x = width.div_ceil(4);
    for (i, chunk) in data[..expected].chunks_exact(N).enumerate() {
        let Ok(block) = <&[u8; N]>::try_from(chunk) else {
            continue;
        };
        let texels = decode(block);
        let bx = (i % blocks_x) * 4;
        let by = (i / blocks_x) * 4;
        for (t, texel) in texels.iter().enumerate() {
            let x = bx + t % 4;
            let y = by + t / 4;
            if x < width && y < height {
                plane.set(origin.x + x as i32, origin.y + y as i32, to_pixel(*texel));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color565_expand() {
        let c = Color565::from_raw(0xF800);
        assert_eq!((c.red(), c.green(), c.blue()), (255, 0, 0));
        let c = Color565::from_raw(0x07E0);
        assert_eq!((c.red(), c.green(), c.blue()), (0, 255, 0));
        let c = Color565::from_raw(0x0010);
        // 16 of 31: (16 << 3) | (16 >> 2)
        assert_eq!(c.blue(), 132);
    }

    #[test]
    fn test_bc1_solid_red() {
        let block = [0x00, 0xF8, 0x00, 0x00, 0, 0, 0, 0];
        for px in decode_bc1(&block) {
            assert_eq!(px, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn test_bc1_four_color_interpolation() {
        // c0 = white, c1 = black, indices 0,1,2,3 repeated
        let block = [0xff, 0xff, 0x00, 0x00, 0xe4, 0xe4, 0xe4, 0xe4];
        let out = decode_bc1(&block);
        assert_eq!(out[0], [255, 255, 255, 255]);
        assert_eq!(out[1], [0, 0, 0, 255]);
        assert_eq!(out[2], [170, 170, 170, 255]);
        assert_eq!(out[3], [85, 85, 85, 255]);
    }

    #[test]
    fn test_bc1_transparent_variant() {
        // c0 = black <= c1 = white: three-color mode
        let block = [0x00, 0x00, 0xff, 0xff, 0xe4, 0, 0, 0];
        let out = decode_bc1(&block);
        assert_eq!(out[2], [127, 127, 127, 255]);
        assert_eq!(out[3], [0, 0, 0, 0]);
    }

    #[test]
    fn test_bc3_ignores_endpoint_order() {
        let mut block = [0u8; 16];
        block[0] = 255;
        block[1] = 255;
        block[8..16].copy_from_slice(&[0x00, 0x00, 0xff, 0xff, 0x03, 0, 0, 0]);
        let out = decode_bc3(&block);
        // index 3 in four-color mode is (c0 + 2*c1) / 3
        assert_eq!(out[0], [170, 170, 170, 255]);
        assert_eq!(out[1], [0, 0, 0, 255]);
    }

    #[test]
    fn test_alpha_eight_entry_table() {
        // a0=255 > a1=0; pixel 0 index 2, pixel 1 index 7
        let idx: u64 = 2 | (7 << 3);
        let mut block = [255, 0, 0, 0, 0, 0, 0, 0];
        block[2..8].copy_from_slice(&idx.to_le_bytes()[..6]);
        let out = decode_alpha_block(&block);
        assert_eq!(out[0], 218);
        assert_eq!(out[1], 36);
        assert_eq!(out[2], 255);
    }

    #[test]
    fn test_alpha_six_entry_table() {
        // a0=0 <= a1=100; indices 6 and 7 are the constants
        let idx: u64 = 6 | (7 << 3) | (2 << 6);
        let mut block = [0, 100, 0, 0, 0, 0, 0, 0];
        block[2..8].copy_from_slice(&idx.to_le_bytes()[..6]);
        let out = decode_alpha_block(&block);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 255);
        assert_eq!(out[2], 20);
    }

    #[test]
    fn test_alpha_index_spanning_bytes() {
        // pixel 2 occupies bits 6..9
        let idx: u64 = 5 << 6;
        let mut block = [255, 0, 0, 0, 0, 0, 0, 0];
        block[2..8].copy_from_slice(&idx.to_le_bytes()[..6]);
        let out = decode_alpha_block(&block);
        assert_eq!(out[2], ((3 * 255) / 7) as u8);
    }

    #[test]
    fn test_bc4_gray() {
        let out = decode_bc4(&[77, 0, 0, 0, 0, 0, 0, 0]);
        assert!(out.iter().all(|px| *px == [77, 77, 77, 255]));
    }

    #[test]
    fn test_bc5_flat_normal() {
        // r = g = 128 is the straight-up normal
        let mut block = [0u8; 16];
        block[0] = 128;
        block[8] = 128;
        let out = decode_bc5(&block);
        assert_eq!(out[0][..2], [128, 128]);
        assert_eq!(out[0][2], 255);
        assert_eq!(out[0][3], 255);
    }

    #[test]
    fn test_surface_clips_edges() {
        let mut plane = Plane::new(hdrtex_core::ColorModel::Rgba8, hdrtex_core::Rect::from_size(5, 3)).unwrap();
        // 2x1 blocks: left red, right green
        let mut data = vec![0x00, 0xF8, 0x00, 0x00, 0, 0, 0, 0];
        data.extend_from_slice(&[0xE0, 0x07, 0x00, 0x00, 0, 0, 0, 0]);
        decode_surface::<8>(&data, &mut plane, decode_bc1, Pixel::Rgba8).unwrap();
        assert_eq!(plane.at(3, 2), Pixel::Rgba8([255, 0, 0, 255]));
        assert_eq!(plane.at(4, 0), Pixel::Rgba8([0, 255, 0, 255]));
    }

    #[test]
    fn test_surface_truncated() {
        let mut plane = Plane::new(hdrtex_core::ColorModel::Rgba8, hdrtex_core::Rect::from_size(8, 4)).unwrap();
        let err = decode_surface::<8>(&[0u8; 12], &mut plane, decode_bc1, Pixel::Rgba8).unwrap_err();
        assert!(matches!(err, IoError::Truncated(_)));
    }
}
