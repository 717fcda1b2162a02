//! Uncompressed DDS surfaces: legacy bit-mask layouts and DXGI formats.

use half::f16;
use hdrtex_core::{ColorModel, Pixel, Plane, Rgba16F, Rgba32F};

use super::header::{DxgiFormat, PixelFormat, PixelFormatFlags};
use crate::{IoError, IoResult};

/// One channel described by a bit mask.
#[derive(Debug, Clone, Copy)]
struct MaskedChannel {
    mask: u32,
    shift: u32,
    max: u64,
}

impl MaskedChannel {
    fn new(mask: u32) -> Option<Self> {
        if mask == 0 {
            return None;
        }
        let shift = mask.trailing_zeros();
        Some(Self {
            mask,
            shift,
            max: (mask >> shift) as u64,
        })
    }

    /// Extracts the channel and rescales it to `0..=target`.
    fn scaled(&self, value: u32, target: u64) -> u64 {
        let v = ((value & self.mask) >> self.shift) as u64;
        (v * target + self.max / 2) / self.max
    }
}

/// Channel masks of a legacy uncompressed pixel format.
#[derive(Debug, Clone, Copy)]
pub struct MaskLayout {
    bytes_per_pixel: usize,
    r: Option<MaskedChannel>,
    g: Option<MaskedChannel>,
    b: Option<MaskedChannel>,
    a: Option<MaskedChannel>,
    luminance: bool,
}

impl MaskLayout {
    /// Builds the layout from a pixel format.
    ///
    /// # Errors
    ///
    /// [`IoError::UnsupportedFormat`] unless the bit count is 8, 16, 24 or 32.
    pub fn new(pf: &PixelFormat) -> IoResult<Self> {
        let bytes_per_pixel = match pf.rgb_bit_count {
            8 | 16 | 24 | 32 => pf.rgb_bit_count as usize / 8,
            other => {
                return Err(IoError::UnsupportedFormat(format!(
                    "{other}-bit uncompressed surface"
                )));
            }
        };
        let has_alpha = pf
            .flags
            .intersects(PixelFormatFlags::ALPHA_PIXELS | PixelFormatFlags::ALPHA);
        Ok(Self {
            bytes_per_pixel,
            r: MaskedChannel::new(pf.r_bit_mask),
            g: MaskedChannel::new(pf.g_bit_mask),
            b: MaskedChannel::new(pf.b_bit_mask),
            a: if has_alpha {
                MaskedChannel::new(pf.a_bit_mask)
            } else {
                None
            },
            luminance: pf.flags.contains(PixelFormatFlags::LUMINANCE),
        })
    }

    /// Bytes of one stored pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    fn pixel(&self, model: ColorModel, raw: &[u8]) -> Pixel {
        let mut word = [0u8; 4];
        word[..raw.len()].copy_from_slice(raw);
        let v = u32::from_le_bytes(word);

        let chan = |c: Option<MaskedChannel>, target: u64| c.map(|c| c.scaled(v, target));
        match model {
            ColorModel::Gray8 => Pixel::Gray8(chan(self.r, 0xff).unwrap_or(0) as u8),
            ColorModel::Gray16 => Pixel::Gray16(chan(self.r, 0xffff).unwrap_or(0) as u16),
            _ => {
                let r = chan(self.r, 0xff).unwrap_or(0) as u8;
                // luminance+alpha surfaces carry only the R mask
                let fallback = if self.luminance { r } else { 0 };
                let g = chan(self.g, 0xff).map_or(fallback, |g| g as u8);
                let b = chan(self.b, 0xff).map_or(fallback, |b| b as u8);
                let a = chan(self.a, 0xff).map_or(255, |a| a as u8);
                Pixel::Rgba8([r, g, b, a])
            }
        }
    }
}

/// Decodes a legacy bit-mask surface into `plane`.
pub fn decode_masked(data: &[u8], layout: &MaskLayout, plane: &mut Plane) -> IoResult<()> {
    let model = plane.model();
    decode_rows(data, layout.bytes_per_pixel, plane, |raw| {
        layout.pixel(model, raw)
    })
}

/// Decodes an uncompressed DXGI surface into `plane`.
///
/// `plane` must use the model the DXGI format classifies to.
pub fn decode_dxgi(data: &[u8], format: DxgiFormat, plane: &mut Plane) -> IoResult<()> {
    let bpp = format
        .bytes_per_pixel()
        .ok_or_else(|| IoError::UnsupportedFormat(format!("{format} is not an uncompressed format")))?;
    decode_rows(data, bpp, plane, |raw| dxgi_pixel(format, raw))
}

fn decode_rows(
    data: &[u8],
    bpp: usize,
    plane: &mut Plane,
    to_pixel: impl Fn(&[u8]) -> Pixel,
) -> IoResult<()> {
    let bounds = plane.bounds();
    let width = bounds.width.max(0) as usize;
    let expected = hdrtex_core::plane::buffer_len(bpp, bounds)?;
    if data.len() < expected {
        return Err(IoError::Truncated(format!(
            "surface data ({} of {} bytes)",
            data.len(),
            expected
        )));
    }
    if width == 0 {
        return Ok(());
    }
    for (i, raw) in data[..expected].chunks_exact(bpp).enumerate() {
        let x = bounds.x + (i % width) as i32;
        let y = bounds.y + (i / width) as i32;
        plane.set(x, y, to_pixel(raw));
    }
    Ok(())
}

fn unit_to_u16(v: f32) -> u16 {
    (v.clamp(0.0, 1.0) * 65535.0).round() as u16
}

fn dxgi_pixel(format: DxgiFormat, raw: &[u8]) -> Pixel {
    let u16_at = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
    let f32_at = |i: usize| f32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
    let unorm16 = |i: usize| f16::from_f32(u16_at(i) as f32 / 65535.0);

    match format {
        DxgiFormat::R32G32B32A32Float => Pixel::from_le_bytes(ColorModel::Rgba32F, raw),
        DxgiFormat::R32G32B32A32UInt => Pixel::from_le_bytes(ColorModel::Rgba32U, raw),
        DxgiFormat::R16G16B16A16Float => Pixel::from_le_bytes(ColorModel::Rgba16F, raw),
        DxgiFormat::R32G32B32Float => {
            Some(Rgba32F::new(f32_at(0), f32_at(4), f32_at(8), 1.0).into())
        }
        DxgiFormat::R16G16B16A16UNorm => Some(
            Rgba16F {
                r: unorm16(0),
                g: unorm16(2),
                b: unorm16(4),
                a: unorm16(6),
            }
            .into(),
        ),
        DxgiFormat::R32G32Float => Some(Pixel::Rgba16([
            unit_to_u16(f32_at(0)),
            unit_to_u16(f32_at(4)),
            0,
            0xffff,
        ])),
        DxgiFormat::R32Float => Some(Pixel::Gray16(unit_to_u16(f32_at(0)))),
        DxgiFormat::R16UNorm => Some(Pixel::Gray16(u16_at(0))),
        DxgiFormat::R8UNorm => Some(Pixel::Gray8(raw[0])),
        DxgiFormat::R8G8B8A8UNorm => Pixel::from_le_bytes(ColorModel::Rgba8, raw),
        _ => None,
    }
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdrtex_core::Rect;

    fn rgb_format(bits: u32, r: u32, g: u32, b: u32, a: u32) -> PixelFormat {
        PixelFormat {
            size: PixelFormat::SIZE,
            flags: if a != 0 {
                PixelFormatFlags::RGB | PixelFormatFlags::ALPHA_PIXELS
            } else {
                PixelFormatFlags::RGB
            },
            rgb_bit_count: bits,
            r_bit_mask: r,
            g_bit_mask: g,
            b_bit_mask: b,
            a_bit_mask: a,
            ..Default::default()
        }
    }

    #[test]
    fn test_bgra8() {
        let pf = rgb_format(32, 0x00ff0000, 0x0000ff00, 0x000000ff, 0xff000000);
        let layout = MaskLayout::new(&pf).unwrap();
        let mut plane = Plane::new(ColorModel::Rgba8, Rect::from_size(2, 1)).unwrap();
        // stored B, G, R, A
        decode_masked(&[10, 20, 30, 40, 1, 2, 3, 4], &layout, &mut plane).unwrap();
        assert_eq!(plane.at(0, 0), Pixel::Rgba8([30, 20, 10, 40]));
        assert_eq!(plane.at(1, 0), Pixel::Rgba8([3, 2, 1, 4]));
    }

    #[test]
    fn test_rgb565_scaling() {
        let pf = rgb_format(16, 0xf800, 0x07e0, 0x001f, 0);
        let layout = MaskLayout::new(&pf).unwrap();
        let mut plane = Plane::new(ColorModel::Rgba8, Rect::from_size(1, 1)).unwrap();
        decode_masked(&0xf81fu16.to_le_bytes(), &layout, &mut plane).unwrap();
        assert_eq!(plane.at(0, 0), Pixel::Rgba8([255, 0, 255, 255]));
    }

    #[test]
    fn test_luminance_alpha() {
        let pf = PixelFormat {
            flags: PixelFormatFlags::LUMINANCE | PixelFormatFlags::ALPHA_PIXELS,
            rgb_bit_count: 16,
            r_bit_mask: 0x00ff,
            a_bit_mask: 0xff00,
            ..Default::default()
        };
        let layout = MaskLayout::new(&pf).unwrap();
        let mut plane = Plane::new(ColorModel::Rgba8, Rect::from_size(1, 1)).unwrap();
        decode_masked(&[90, 128], &layout, &mut plane).unwrap();
        assert_eq!(plane.at(0, 0), Pixel::Rgba8([90, 90, 90, 128]));
    }

    #[test]
    fn test_gray16_luminance() {
        let pf = PixelFormat {
            flags: PixelFormatFlags::LUMINANCE,
            rgb_bit_count: 16,
            r_bit_mask: 0xffff,
            ..Default::default()
        };
        let layout = MaskLayout::new(&pf).unwrap();
        let mut plane = Plane::new(ColorModel::Gray16, Rect::from_size(1, 1)).unwrap();
        decode_masked(&0x1234u16.to_le_bytes(), &layout, &mut plane).unwrap();
        assert_eq!(plane.at(0, 0), Pixel::Gray16(0x1234));
    }

    #[test]
    fn test_odd_bit_count_rejected() {
        let pf = rgb_format(12, 0xf00, 0x0f0, 0x00f, 0);
        assert!(matches!(
            MaskLayout::new(&pf),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_dxgi_rgba32f_exact() {
        let mut data = Vec::new();
        for v in [1.5f32, -0.25, 8.0, 0.5] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut plane = Plane::new(ColorModel::Rgba32F, Rect::from_size(1, 1)).unwrap();
        decode_dxgi(&data, DxgiFormat::R32G32B32A32Float, &mut plane).unwrap();
        assert_eq!(
            plane.at(0, 0),
            Pixel::Float32x4(Rgba32F::new(1.5, -0.25, 8.0, 0.5))
        );
    }

    #[test]
    fn test_dxgi_rgb32f_opaque() {
        let mut data = Vec::new();
        for v in [0.1f32, 0.2, 0.3] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut plane = Plane::new(ColorModel::Rgba32F, Rect::from_size(1, 1)).unwrap();
        decode_dxgi(&data, DxgiFormat::R32G32B32Float, &mut plane).unwrap();
        assert_eq!(plane.at(0, 0), Pixel::Float32x4(Rgba32F::new(0.1, 0.2, 0.3, 1.0)));
    }

    #[test]
    fn test_dxgi_rg32f_and_r32f() {
        let mut data = Vec::new();
        for v in [2.0f32, 0.5] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let mut plane = Plane::new(ColorModel::Rgba16, Rect::from_size(1, 1)).unwrap();
        decode_dxgi(&data, DxgiFormat::R32G32Float, &mut plane).unwrap();
        assert_eq!(plane.at(0, 0), Pixel::Rgba16([65535, 32768, 0, 65535]));

        let mut plane = Plane::new(ColorModel::Gray16, Rect::from_size(1, 1)).unwrap();
        decode_dxgi(&(-1.0f32).to_le_bytes(), DxgiFormat::R32Float, &mut plane).unwrap();
        assert_eq!(plane.at(0, 0), Pixel::Gray16(0));
    }

    #[test]
    fn test_dxgi_unorm16_to_half() {
        let data: Vec<u8> = [65535u16, 0, 65535, 65535]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut plane = Plane::new(ColorModel::Rgba16F, Rect::from_size(1, 1)).unwrap();
        decode_dxgi(&data, DxgiFormat::R16G16B16A16UNorm, &mut plane).unwrap();
        let Pixel::Float16x4(p) = plane.at(0, 0) else {
            panic!("expected half pixel");
        };
        assert_eq!(p.r, f16::ONE);
        assert_eq!(p.g, f16::ZERO);
    }

    #[test]
    fn test_truncated_surface() {
        let mut plane = Plane::new(ColorModel::Rgba32F, Rect::from_size(2, 2)).unwrap();
        let err = decode_dxgi(&[0u8; 48], DxgiFormat::R32G32B32A32Float, &mut plane).unwrap_err();
        assert!(matches!(err, IoError::Truncated(_)));
    }
}
