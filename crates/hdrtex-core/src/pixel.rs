//! Pixel types and color models.
//!
//! A [`Pixel`] is a small closed sum type: the three HDR layouts the editor
//! works in, plus the 8/16-bit layouts that legacy DDS textures decode to.
//!
//! | Model | Variant | Bytes | Channels |
//! |-------|---------|-------|----------|
//! | [`ColorModel::Rgba32F`] | [`Pixel::Float32x4`] | 16 | f32 R,G,B,A |
//! | [`ColorModel::Rgba16F`] | [`Pixel::Float16x4`] | 8 | f16 R,G,B,A |
//! | [`ColorModel::Rgba32U`] | [`Pixel::UInt32x4`] | 16 | u32 R,G,B,A |
//! | [`ColorModel::Rgba16`] | [`Pixel::Rgba16`] | 8 | u16 R,G,B,A |
//! | [`ColorModel::Rgba8`] | [`Pixel::Rgba8`] | 4 | u8 R,G,B,A |
//! | [`ColorModel::Gray16`] | [`Pixel::Gray16`] | 2 | u16 Y |
//! | [`ColorModel::Gray8`] | [`Pixel::Gray8`] | 1 | u8 Y |
//!
//! Color channels are stored straight (not premultiplied). Reading a pixel
//! for display goes through [`Pixel::to_display_rgba16`], which clamps,
//! premultiplies and scales to 16 bits.
//!
//! # Memory Layout
//!
//! Every layout is little-endian, channels in R, G, B, A order.
//!
//! # Dependencies
//!
//! - `half` crate for `f16` support
//!
//! # Used By
//!
//! - [`crate::plane::Plane`] - per-pixel encode/decode
//! - `hdrtex-io` - EXR channel decode loops, DDS/EXR writers

use half::f16;

/// Largest value of a 16-bit display channel.
pub const DISPLAY_MAX: u32 = 0xffff;

const U32_MAX_F: f32 = 4294967295.0;

/// Color model of a plane: which native layout its bytes use.
///
/// `YCbCr` and `YCbCrA` only appear when classifying legacy DDS headers;
/// no plane can be allocated with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorModel {
    /// 8-bit grayscale.
    Gray8,
    /// 16-bit grayscale.
    Gray16,
    /// 8-bit straight-alpha RGBA.
    Rgba8,
    /// 16-bit straight-alpha RGBA.
    Rgba16,
    /// Half-float RGBA (HDR).
    Rgba16F,
    /// Single-float RGBA (HDR).
    Rgba32F,
    /// 32-bit normalized unsigned RGBA (HDR).
    Rgba32U,
    /// Luma/chroma without alpha.
    YCbCr,
    /// Luma/chroma with alpha.
    YCbCrA,
}

impl ColorModel {
    /// Size of one pixel in bytes, `None` for models without a plane layout.
    pub const fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            ColorModel::Gray8 => Some(1),
            ColorModel::Gray16 => Some(2),
            ColorModel::Rgba8 => Some(4),
            ColorModel::Rgba16 | ColorModel::Rgba16F => Some(8),
            ColorModel::Rgba32F | ColorModel::Rgba32U => Some(16),
            ColorModel::YCbCr | ColorModel::YCbCrA => None,
        }
    }

    /// Returns `true` for the three HDR models the writers accept.
    pub const fn is_hdr(self) -> bool {
        matches!(
            self,
            ColorModel::Rgba16F | ColorModel::Rgba32F | ColorModel::Rgba32U
        )
    }

    /// Short human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            ColorModel::Gray8 => "Gray8",
            ColorModel::Gray16 => "Gray16",
            ColorModel::Rgba8 => "RGBA8",
            ColorModel::Rgba16 => "RGBA16",
            ColorModel::Rgba16F => "RGBA16F",
            ColorModel::Rgba32F => "RGBA32F",
            ColorModel::Rgba32U => "RGBA32U",
            ColorModel::YCbCr => "YCbCr",
            ColorModel::YCbCrA => "YCbCrA",
        }
    }

    /// Converts a pixel of any model into this model.
    ///
    /// Same-variant pixels pass through untouched and f16/f32 convert
    /// directly, so HDR values outside [0, 1] survive. Everything else goes
    /// through the 16-bit premultiplied display form and is un-premultiplied.
    ///
    /// `YCbCr` models have no pixel variant; they return the input as is.
    pub fn convert(self, pixel: Pixel) -> Pixel {
        match self {
            ColorModel::Gray8 => match pixel {
                Pixel::Gray8(_) => pixel,
                _ => {
                    let [r, g, b, _] = pixel.to_display_rgba16();
                    Pixel::Gray8((luma16(r, g, b) >> 8) as u8)
                }
            },
            ColorModel::Gray16 => match pixel {
                Pixel::Gray16(_) => pixel,
                _ => {
                    let [r, g, b, _] = pixel.to_display_rgba16();
                    Pixel::Gray16(luma16(r, g, b) as u16)
                }
            },
            ColorModel::Rgba8 => match pixel {
                Pixel::Rgba8(_) => pixel,
                _ => {
                    let [r, g, b, a] = unpremultiply16(pixel.to_display_rgba16());
                    Pixel::Rgba8([(r >> 8) as u8, (g >> 8) as u8, (b >> 8) as u8, (a >> 8) as u8])
                }
            },
            ColorModel::Rgba16 => match pixel {
                Pixel::Rgba16(_) => pixel,
                _ => {
                    let [r, g, b, a] = unpremultiply16(pixel.to_display_rgba16());
                    Pixel::Rgba16([r as u16, g as u16, b as u16, a as u16])
                }
            },
            ColorModel::Rgba32F => match pixel {
                Pixel::Float32x4(_) => pixel,
                Pixel::Float16x4(p) => Pixel::Float32x4(p.to_rgba32f()),
                _ => {
                    let [r, g, b, a] = unpremultiply_f32(pixel.to_display_rgba16());
                    Pixel::Float32x4(Rgba32F::new(r, g, b, a))
                }
            },
            ColorModel::Rgba16F => match pixel {
                Pixel::Float16x4(_) => pixel,
                Pixel::Float32x4(p) => Pixel::Float16x4(p.to_rgba16f()),
                _ => {
                    let [r, g, b, a] = unpremultiply_f32(pixel.to_display_rgba16());
                    Pixel::Float16x4(Rgba32F::new(r, g, b, a).to_rgba16f())
                }
            },
            ColorModel::Rgba32U => match pixel {
                Pixel::UInt32x4(_) => pixel,
                _ => {
                    let [r, g, b, a] = unpremultiply_f32(pixel.to_display_rgba16());
                    Pixel::UInt32x4(Rgba32U {
                        r: (r * U32_MAX_F) as u32,
                        g: (g * U32_MAX_F) as u32,
                        b: (b * U32_MAX_F) as u32,
                        a: (a * U32_MAX_F) as u32,
                    })
                }
            },
            ColorModel::YCbCr | ColorModel::YCbCrA => pixel,
        }
    }
}

impl std::fmt::Display for ColorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Four single-precision float channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba32F {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Rgba32F {
    /// Creates a pixel from its four channels.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Narrows every channel to half precision.
    pub fn to_rgba16f(self) -> Rgba16F {
        Rgba16F {
            r: f16::from_f32(self.r),
            g: f16::from_f32(self.g),
            b: f16::from_f32(self.b),
            a: f16::from_f32(self.a),
        }
    }

    /// Mutable access to a channel by its single-letter name.
    ///
    /// Returns `None` for anything other than `"R"`, `"G"`, `"B"`, `"A"`.
    pub fn channel_mut(&mut self, name: &str) -> Option<&mut f32> {
        match name {
            "R" => Some(&mut self.r),
            "G" => Some(&mut self.g),
            "B" => Some(&mut self.b),
            "A" => Some(&mut self.a),
            _ => None,
        }
    }
}

/// Four half-precision float channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba16F {
    /// Red
    pub r: f16,
    /// Green
    pub g: f16,
    /// Blue
    pub b: f16,
    /// Alpha
    pub a: f16,
}

impl Rgba16F {
    /// Widens every channel to single precision.
    pub fn to_rgba32f(self) -> Rgba32F {
        Rgba32F::new(self.r.to_f32(), self.g.to_f32(), self.b.to_f32(), self.a.to_f32())
    }

    /// Mutable access to a channel by its single-letter name.
    pub fn channel_mut(&mut self, name: &str) -> Option<&mut f16> {
        match name {
            "R" => Some(&mut self.r),
            "G" => Some(&mut self.g),
            "B" => Some(&mut self.b),
            "A" => Some(&mut self.a),
            _ => None,
        }
    }
}

/// Four 32-bit unsigned channels, normalized by `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba32U {
    /// Red
    pub r: u32,
    /// Green
    pub g: u32,
    /// Blue
    pub b: u32,
    /// Alpha
    pub a: u32,
}

impl Rgba32U {
    /// Mutable access to a channel by its single-letter name.
    pub fn channel_mut(&mut self, name: &str) -> Option<&mut u32> {
        match name {
            "R" => Some(&mut self.r),
            "G" => Some(&mut self.g),
            "B" => Some(&mut self.b),
            "A" => Some(&mut self.a),
            _ => None,
        }
    }
}

/// Mutable reference to one channel of an HDR pixel.
///
/// Lets sample-decoding loops fill a pixel channel by name without matching
/// on the pixel layout themselves.
#[derive(Debug)]
pub enum ChannelMut<'a> {
    /// Half-float channel.
    F16(&'a mut f16),
    /// Single-float channel.
    F32(&'a mut f32),
    /// Unsigned channel.
    U32(&'a mut u32),
}

impl ChannelMut<'_> {
    /// Width of the channel's native sample in bytes.
    pub fn sample_size(&self) -> usize {
        match self {
            ChannelMut::F16(_) => 2,
            ChannelMut::F32(_) | ChannelMut::U32(_) => 4,
        }
    }

    /// Stores a little-endian sample. Returns `false` if `bytes` is too short.
    pub fn set_le(self, bytes: &[u8]) -> bool {
        match self {
            ChannelMut::F16(v) => match bytes.first_chunk::<2>() {
                Some(b) => {
                    *v = f16::from_le_bytes(*b);
                    true
                }
                None => false,
            },
            ChannelMut::F32(v) => match bytes.first_chunk::<4>() {
                Some(b) => {
                    *v = f32::from_le_bytes(*b);
                    true
                }
                None => false,
            },
            ChannelMut::U32(v) => match bytes.first_chunk::<4>() {
                Some(b) => {
                    *v = u32::from_le_bytes(*b);
                    true
                }
                None => false,
            },
        }
    }
}

/// A single pixel in one of the supported native layouts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pixel {
    /// 8-bit gray.
    Gray8(u8),
    /// 16-bit gray.
    Gray16(u16),
    /// 8-bit straight-alpha RGBA.
    Rgba8([u8; 4]),
    /// 16-bit straight-alpha RGBA.
    Rgba16([u16; 4]),
    /// Half-float RGBA.
    Float16x4(Rgba16F),
    /// Single-float RGBA.
    Float32x4(Rgba32F),
    /// 32-bit normalized unsigned RGBA.
    UInt32x4(Rgba32U),
}

impl Default for Pixel {
    fn default() -> Self {
        Pixel::Float32x4(Rgba32F::default())
    }
}

impl Pixel {
    /// The all-zero pixel of a model (transparent black).
    pub fn zero(model: ColorModel) -> Pixel {
        match model {
            ColorModel::Gray8 => Pixel::Gray8(0),
            ColorModel::Gray16 => Pixel::Gray16(0),
            ColorModel::Rgba8 => Pixel::Rgba8([0; 4]),
            ColorModel::Rgba16 => Pixel::Rgba16([0; 4]),
            ColorModel::Rgba16F => Pixel::Float16x4(Rgba16F::default()),
            ColorModel::Rgba32U => Pixel::UInt32x4(Rgba32U::default()),
            ColorModel::Rgba32F | ColorModel::YCbCr | ColorModel::YCbCrA => {
                Pixel::Float32x4(Rgba32F::default())
            }
        }
    }

    /// Opaque black in an HDR model: color channels zero, alpha at maximum.
    ///
    /// Non-HDR models fall back to [`Pixel::zero`].
    pub fn opaque_black(model: ColorModel) -> Pixel {
        match model {
            ColorModel::Rgba16F => Pixel::Float16x4(Rgba16F {
                a: f16::ONE,
                ..Default::default()
            }),
            ColorModel::Rgba32F => Pixel::Float32x4(Rgba32F::new(0.0, 0.0, 0.0, 1.0)),
            ColorModel::Rgba32U => Pixel::UInt32x4(Rgba32U {
                a: u32::MAX,
                ..Default::default()
            }),
            other => Pixel::zero(other),
        }
    }

    /// Color model this pixel belongs to.
    pub const fn model(&self) -> ColorModel {
        match self {
            Pixel::Gray8(_) => ColorModel::Gray8,
            Pixel::Gray16(_) => ColorModel::Gray16,
            Pixel::Rgba8(_) => ColorModel::Rgba8,
            Pixel::Rgba16(_) => ColorModel::Rgba16,
            Pixel::Float16x4(_) => ColorModel::Rgba16F,
            Pixel::Float32x4(_) => ColorModel::Rgba32F,
            Pixel::UInt32x4(_) => ColorModel::Rgba32U,
        }
    }

    /// Premultiplied 16-bit RGBA for display.
    ///
    /// Each channel is clamped to [0, 1] in its native range, RGB is
    /// multiplied by alpha, and the result is scaled to 65535. Never fails.
    ///
    /// ```rust
    /// use hdrtex_core::{Pixel, Rgba32F};
    ///
    /// let px = Pixel::Float32x4(Rgba32F::new(4.0, 0.5, -1.0, 0.5));
    /// assert_eq!(px.to_display_rgba16(), [32767, 16383, 0, 32767]);
    /// ```
    pub fn to_display_rgba16(&self) -> [u32; 4] {
        match *self {
            Pixel::Gray8(y) => {
                let y = y as u32 * 0x101;
                [y, y, y, DISPLAY_MAX]
            }
            Pixel::Gray16(y) => {
                let y = y as u32;
                [y, y, y, DISPLAY_MAX]
            }
            Pixel::Rgba8([r, g, b, a]) => {
                let a = a as u32 * 0x101;
                let scale = |c: u8| (c as u32 * 0x101) * a / DISPLAY_MAX;
                [scale(r), scale(g), scale(b), a]
            }
            Pixel::Rgba16([r, g, b, a]) => {
                let a = a as u32;
                let scale = |c: u16| c as u32 * a / DISPLAY_MAX;
                [scale(r), scale(g), scale(b), a]
            }
            Pixel::Float16x4(p) => premultiply_f32(p.to_rgba32f()),
            Pixel::Float32x4(p) => premultiply_f32(p),
            Pixel::UInt32x4(p) => {
                let r = p.r as f32 / U32_MAX_F;
                let g = p.g as f32 / U32_MAX_F;
                let b = p.b as f32 / U32_MAX_F;
                let a = p.a as f32 / U32_MAX_F;
                [
                    (r * a * 65535.0) as u32,
                    (g * a * 65535.0) as u32,
                    (b * a * 65535.0) as u32,
                    (a * 65535.0) as u32,
                ]
            }
        }
    }

    /// Alpha as a float in the pixel's native scale (1.0 is opaque).
    pub fn alpha(&self) -> f32 {
        match *self {
            Pixel::Gray8(_) | Pixel::Gray16(_) => 1.0,
            Pixel::Rgba8([_, _, _, a]) => a as f32 / 255.0,
            Pixel::Rgba16([_, _, _, a]) => a as f32 / 65535.0,
            Pixel::Float16x4(p) => p.a.to_f32(),
            Pixel::Float32x4(p) => p.a,
            Pixel::UInt32x4(p) => {
                if p.a == u32::MAX {
                    1.0
                } else {
                    p.a as f32 / U32_MAX_F
                }
            }
        }
    }

    /// Mutable access to a named channel of an HDR pixel.
    ///
    /// Returns `None` for unknown channel names and for non-HDR pixels;
    /// callers skip such channels.
    pub fn channel_mut(&mut self, name: &str) -> Option<ChannelMut<'_>> {
        match self {
            Pixel::Float16x4(p) => p.channel_mut(name).map(ChannelMut::F16),
            Pixel::Float32x4(p) => p.channel_mut(name).map(ChannelMut::F32),
            Pixel::UInt32x4(p) => p.channel_mut(name).map(ChannelMut::U32),
            _ => None,
        }
    }

    /// Decodes a pixel of `model` from its little-endian bytes.
    ///
    /// Returns `None` if the model has no layout or `bytes` is too short.
    pub fn from_le_bytes(model: ColorModel, bytes: &[u8]) -> Option<Pixel> {
        let bpp = model.bytes_per_pixel()?;
        let s = bytes.get(..bpp)?;
        let u16_at = |i: usize| u16::from_le_bytes([s[i], s[i + 1]]);
        let u32_at = |i: usize| u32::from_le_bytes([s[i], s[i + 1], s[i + 2], s[i + 3]]);
        Some(match model {
            ColorModel::Gray8 => Pixel::Gray8(s[0]),
            ColorModel::Gray16 => Pixel::Gray16(u16_at(0)),
            ColorModel::Rgba8 => Pixel::Rgba8([s[0], s[1], s[2], s[3]]),
            ColorModel::Rgba16 => Pixel::Rgba16([u16_at(0), u16_at(2), u16_at(4), u16_at(6)]),
            ColorModel::Rgba16F => Pixel::Float16x4(Rgba16F {
                r: f16::from_bits(u16_at(0)),
                g: f16::from_bits(u16_at(2)),
                b: f16::from_bits(u16_at(4)),
                a: f16::from_bits(u16_at(6)),
            }),
            ColorModel::Rgba32F => Pixel::Float32x4(Rgba32F::new(
                f32::from_bits(u32_at(0)),
                f32::from_bits(u32_at(4)),
                f32::from_bits(u32_at(8)),
                f32::from_bits(u32_at(12)),
            )),
            ColorModel::Rgba32U => Pixel::UInt32x4(Rgba32U {
                r: u32_at(0),
                g: u32_at(4),
                b: u32_at(8),
                a: u32_at(12),
            }),
            ColorModel::YCbCr | ColorModel::YCbCrA => return None,
        })
    }

    /// Writes the pixel's native little-endian bytes into `out`.
    ///
    /// Returns the number of bytes written, or `None` if `out` is too short.
    pub fn write_le_bytes(&self, out: &mut [u8]) -> Option<usize> {
        let bpp = self.model().bytes_per_pixel()?;
        let out = out.get_mut(..bpp)?;
        match *self {
            Pixel::Gray8(y) => out[0] = y,
            Pixel::Gray16(y) => out.copy_from_slice(&y.to_le_bytes()),
            Pixel::Rgba8(c) => out.copy_from_slice(&c),
            Pixel::Rgba16(c) => {
                for (dst, v) in out.chunks_exact_mut(2).zip(c) {
                    dst.copy_from_slice(&v.to_le_bytes());
                }
            }
            Pixel::Float16x4(p) => {
                for (dst, v) in out.chunks_exact_mut(2).zip([p.r, p.g, p.b, p.a]) {
                    dst.copy_from_slice(&v.to_le_bytes());
                }
            }
            Pixel::Float32x4(p) => {
                for (dst, v) in out.chunks_exact_mut(4).zip([p.r, p.g, p.b, p.a]) {
                    dst.copy_from_slice(&v.to_le_bytes());
                }
            }
            Pixel::UInt32x4(p) => {
                for (dst, v) in out.chunks_exact_mut(4).zip([p.r, p.g, p.b, p.a]) {
                    dst.copy_from_slice(&v.to_le_bytes());
                }
            }
        }
        Some(bpp)
    }
}

impl From<Rgba32F> for Pixel {
    fn from(p: Rgba32F) -> Self {
        Pixel::Float32x4(p)
    }
}

impl From<Rgba16F> for Pixel {
    fn from(p: Rgba16F) -> Self {
        Pixel::Float16x4(p)
    }
}

impl From<Rgba32U> for Pixel {
    fn from(p: Rgba32U) -> Self {
        Pixel::UInt32x4(p)
    }
}

fn premultiply_f32(p: Rgba32F) -> [u32; 4] {
    let r = p.r.clamp(0.0, 1.0);
    let g = p.g.clamp(0.0, 1.0);
    let b = p.b.clamp(0.0, 1.0);
    let a = p.a.clamp(0.0, 1.0);
    [
        (r * a * 65535.0) as u32,
        (g * a * 65535.0) as u32,
        (b * a * 65535.0) as u32,
        (a * 65535.0) as u32,
    ]
}

// Rec.601 weights in 16.16 fixed point, applied to premultiplied channels.
fn luma16(r: u32, g: u32, b: u32) -> u32 {
    (19595 * r + 38470 * g + 7471 * b + (1 << 15)) >> 16
}

fn unpremultiply16([r, g, b, a]: [u32; 4]) -> [u32; 4] {
    match a {
        DISPLAY_MAX => [r, g, b, a],
        0 => [0; 4],
        _ => [
            r * DISPLAY_MAX / a,
            g * DISPLAY_MAX / a,
            b * DISPLAY_MAX / a,
            a,
        ],
    }
}

fn unpremultiply_f32([r, g, b, a]: [u32; 4]) -> [f32; 4] {
    let a = a as f32 / 65535.0;
    if a > 0.0 {
        [
            r as f32 / 65535.0 / a,
            g as f32 / 65535.0 / a,
            b as f32 / 65535.0 / a,
            a,
        ]
    } else {
        [0.0, 0.0, 0.0, a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_display_clamps_and_premultiplies() {
        let px = Pixel::Float32x4(Rgba32F::new(2.0, 0.25, -3.0, 1.0));
        assert_eq!(px.to_display_rgba16(), [65535, 16383, 0, 65535]);

        let half = Pixel::Float32x4(Rgba32F::new(1.0, 1.0, 1.0, 0.5));
        assert_eq!(half.to_display_rgba16(), [32767, 32767, 32767, 32767]);
    }

    #[test]
    fn test_display_uint() {
        let px = Pixel::UInt32x4(Rgba32U {
            r: u32::MAX,
            g: 0,
            b: u32::MAX,
            a: u32::MAX,
        });
        assert_eq!(px.to_display_rgba16(), [65535, 0, 65535, 65535]);
    }

    #[test]
    fn test_display_ldr() {
        assert_eq!(Pixel::Gray8(0xff).to_display_rgba16(), [65535; 4]);
        assert_eq!(
            Pixel::Rgba8([255, 0, 0, 255]).to_display_rgba16(),
            [65535, 0, 0, 65535]
        );
        assert_eq!(Pixel::Rgba8([255, 255, 255, 0]).to_display_rgba16(), [0; 4]);
    }

    #[test]
    fn test_channel_mut_unknown_is_none() {
        let mut px = Rgba32F::default();
        assert!(px.channel_mut("Y").is_none());
        *px.channel_mut("G").unwrap() = 3.5;
        assert_eq!(px.g, 3.5);

        let mut p = Pixel::Gray8(1);
        assert!(p.channel_mut("R").is_none());
    }

    #[test]
    fn test_channel_mut_set_le() {
        let mut px = Pixel::opaque_black(ColorModel::Rgba16F);
        let ch = px.channel_mut("B").unwrap();
        assert_eq!(ch.sample_size(), 2);
        assert!(ch.set_le(&f16::from_f32(0.75).to_le_bytes()));
        match px {
            Pixel::Float16x4(p) => {
                assert_eq!(p.b.to_f32(), 0.75);
                assert_eq!(p.a, f16::ONE);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_convert_keeps_hdr_range() {
        let src = Pixel::Float32x4(Rgba32F::new(12.5, -0.25, 0.5, 1.0));
        let Pixel::Float16x4(h) = ColorModel::Rgba16F.convert(src) else {
            panic!("wrong variant");
        };
        assert_eq!(h.r.to_f32(), 12.5);
        assert_eq!(h.g.to_f32(), -0.25);

        let Pixel::Float32x4(back) = ColorModel::Rgba32F.convert(Pixel::Float16x4(h)) else {
            panic!("wrong variant");
        };
        assert_eq!(back, Rgba32F::new(12.5, -0.25, 0.5, 1.0));
    }

    #[test]
    fn test_convert_ldr_to_float_unpremultiplies() {
        let Pixel::Float32x4(p) = ColorModel::Rgba32F.convert(Pixel::Rgba8([255, 0, 0, 255]))
        else {
            panic!("wrong variant");
        };
        assert_relative_eq!(p.r, 1.0);
        assert_relative_eq!(p.a, 1.0);
        assert_eq!(p.g, 0.0);
    }

    #[test]
    fn test_convert_to_gray() {
        assert_eq!(
            ColorModel::Gray8.convert(Pixel::Rgba8([255, 255, 255, 255])),
            Pixel::Gray8(255)
        );
        assert_eq!(
            ColorModel::Gray16.convert(Pixel::Gray8(0)),
            Pixel::Gray16(0)
        );
    }

    #[test]
    fn test_le_bytes_layout() {
        let px = Pixel::Float32x4(Rgba32F::new(1.0, 2.0, 3.0, 4.0));
        let mut buf = [0u8; 16];
        assert_eq!(px.write_le_bytes(&mut buf), Some(16));
        assert_eq!(&buf[4..8], &2.0f32.to_le_bytes());
        assert_eq!(Pixel::from_le_bytes(ColorModel::Rgba32F, &buf), Some(px));

        let mut short = [0u8; 3];
        assert_eq!(px.write_le_bytes(&mut short), None);
        assert_eq!(Pixel::from_le_bytes(ColorModel::Rgba32F, &short), None);
        assert_eq!(Pixel::from_le_bytes(ColorModel::YCbCr, &buf), None);
    }

    #[test]
    fn test_alpha() {
        assert_eq!(Pixel::opaque_black(ColorModel::Rgba32U).alpha(), 1.0);
        assert_eq!(Pixel::zero(ColorModel::Rgba16F).alpha(), 0.0);
        assert_eq!(Pixel::Gray16(3).alpha(), 1.0);
    }
}
