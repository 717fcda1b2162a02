//! Dense 2-D pixel planes with shared, aliasable storage.
//!
//! A [`Plane`] is a byte buffer plus a stride, bounds and a color model.
//! Pixel `(x, y)` starts at
//! `offset + (y - bounds.y) * stride + (x - bounds.x) * bytes_per_pixel`
//! and every channel is little-endian.
//!
//! # Aliasing
//!
//! [`Plane::sub_image`] returns a view onto the same backing buffer, so a
//! write through either plane is visible through the other. The buffer is
//! reference-counted and guarded by a `RwLock`; overlapping writers across
//! threads still need outside coordination to get a meaningful result.
//!
//! ```rust
//! use hdrtex_core::{ColorModel, Pixel, Plane, Rect, Rgba32F};
//!
//! let parent = Plane::new(ColorModel::Rgba32F, Rect::from_size(4, 4)).unwrap();
//! let mut view = parent.sub_image(Rect::new(2, 2, 8, 8));
//! assert_eq!(view.bounds(), Rect::new(2, 2, 2, 2));
//!
//! let red = Pixel::Float32x4(Rgba32F::new(1.0, 0.0, 0.0, 1.0));
//! view.set(3, 3, red);
//! assert_eq!(parent.at(3, 3), red);
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use half::f16;

use crate::error::{Error, Result};
use crate::pixel::{ColorModel, Pixel, Rgba16F, Rgba32F, Rgba32U};
use crate::rect::Rect;

/// Single-channel preview applied by [`Plane::at`].
///
/// Stored bytes are never touched; only reads are transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraySetting {
    /// Pixels are returned as stored.
    #[default]
    None,
    /// Red copied into green and blue, alpha forced opaque.
    Red,
    /// Green copied into red and blue, alpha forced opaque.
    Green,
    /// Blue copied into red and green, alpha forced opaque.
    Blue,
    /// Alpha copied into red, green and blue, alpha forced opaque.
    Alpha,
    /// Colors kept, alpha forced opaque.
    NoAlpha,
}

impl GraySetting {
    /// Applies the preview transform to one pixel.
    ///
    /// Gray pixels have a single channel and pass through unchanged.
    pub fn apply(self, pixel: Pixel) -> Pixel {
        if self == GraySetting::None {
            return pixel;
        }
        match pixel {
            Pixel::Gray8(_) | Pixel::Gray16(_) => pixel,
            Pixel::Rgba8(c) => Pixel::Rgba8(self.apply4(c, u8::MAX)),
            Pixel::Rgba16(c) => Pixel::Rgba16(self.apply4(c, u16::MAX)),
            Pixel::Float16x4(p) => {
                let [r, g, b, a] = self.apply4([p.r, p.g, p.b, p.a], f16::ONE);
                Pixel::Float16x4(Rgba16F { r, g, b, a })
            }
            Pixel::Float32x4(p) => {
                let [r, g, b, a] = self.apply4([p.r, p.g, p.b, p.a], 1.0);
                Pixel::Float32x4(Rgba32F::new(r, g, b, a))
            }
            Pixel::UInt32x4(p) => {
                let [r, g, b, a] = self.apply4([p.r, p.g, p.b, p.a], u32::MAX);
                Pixel::UInt32x4(Rgba32U { r, g, b, a })
            }
        }
    }

    fn apply4<T: Copy>(self, [r, g, b, a]: [T; 4], max: T) -> [T; 4] {
        match self {
            GraySetting::None => [r, g, b, a],
            GraySetting::Red => [r, r, r, max],
            GraySetting::Green => [g, g, g, max],
            GraySetting::Blue => [b, b, b, max],
            GraySetting::Alpha => [a, a, a, max],
            GraySetting::NoAlpha => [r, g, b, max],
        }
    }
}

/// Read access shared by every image the codecs consume.
pub trait ImageSource {
    /// Native color model.
    fn color_model(&self) -> ColorModel;

    /// Pixel bounds.
    fn bounds(&self) -> Rect;

    /// Pixel at `(x, y)`, zero outside the bounds.
    fn at(&self, x: i32, y: i32) -> Pixel;

    /// Pixel at `(x, y)` without any preview transform. Encoders read this.
    fn stored_at(&self, x: i32, y: i32) -> Pixel {
        self.at(x, y)
    }
}

/// Write access for images the codecs fill.
pub trait ImageSink: ImageSource {
    /// Stores a pixel, converting it to the native model. No-op outside the bounds.
    fn set(&mut self, x: i32, y: i32, pixel: Pixel);
}

/// Computes the byte size of a `bytes_per_pixel` buffer covering `bounds`.
///
/// Fails on negative dimensions and when the product does not fit in the
/// address space. Nothing is allocated.
///
/// ```rust
/// use hdrtex_core::{plane::buffer_len, Rect};
///
/// assert_eq!(buffer_len(16, Rect::from_size(3, 2)).unwrap(), 96);
/// assert!(buffer_len(16, Rect::from_size(i32::MAX, i32::MAX)).is_err());
/// ```
pub fn buffer_len(bytes_per_pixel: usize, bounds: Rect) -> Result<usize> {
    if bounds.width < 0 || bounds.height < 0 {
        return Err(Error::invalid_dimensions(
            bounds.width,
            bounds.height,
            "negative extent",
        ));
    }
    let requested = (bytes_per_pixel as u64)
        .checked_mul(bounds.width as u64)
        .and_then(|n| n.checked_mul(bounds.height as u64))
        .ok_or_else(|| Error::allocation_failed(u64::MAX, "size overflows 64 bits"))?;
    if requested > isize::MAX as u64 {
        return Err(Error::allocation_failed(
            requested,
            "exceeds addressable memory",
        ));
    }
    usize::try_from(requested)
        .map_err(|_| Error::allocation_failed(requested, "exceeds addressable memory"))
}

/// Allocates a zeroed buffer for `bytes_per_pixel` pixels covering `bounds`.
///
/// Allocator refusal is reported as [`Error::AllocationFailed`] rather than
/// aborting the process.
pub fn allocate(bytes_per_pixel: usize, bounds: Rect) -> Result<Vec<u8>> {
    let len = buffer_len(bytes_per_pixel, bounds)?;
    let mut pix = Vec::new();
    pix.try_reserve_exact(len)
        .map_err(|e| Error::allocation_failed(len as u64, e.to_string()))?;
    pix.resize(len, 0);
    Ok(pix)
}

/// A rectangular pixel buffer in one native [`ColorModel`].
pub struct Plane {
    pix: Arc<RwLock<Vec<u8>>>,
    offset: usize,
    stride: usize,
    bounds: Rect,
    model: ColorModel,
    bpp: usize,
    gray: GraySetting,
}

impl Plane {
    /// Allocates a zeroed plane.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedFormat`] for models without a pixel layout
    /// - [`Error::InvalidDimensions`] / [`Error::AllocationFailed`] from [`allocate`]
    pub fn new(model: ColorModel, bounds: Rect) -> Result<Self> {
        let bpp = model
            .bytes_per_pixel()
            .ok_or_else(|| Error::unsupported_format(model.name()))?;
        let pix = allocate(bpp, bounds)?;
        Ok(Self {
            pix: Arc::new(RwLock::new(pix)),
            offset: 0,
            stride: bpp * bounds.width.max(0) as usize,
            bounds,
            model,
            bpp,
            gray: GraySetting::None,
        })
    }

    /// Wraps an existing byte buffer.
    ///
    /// `pix` must hold `height` rows of `stride` bytes, the last of which
    /// only needs `width * bytes_per_pixel` bytes.
    pub fn from_raw(model: ColorModel, bounds: Rect, stride: usize, pix: Vec<u8>) -> Result<Self> {
        let bpp = model
            .bytes_per_pixel()
            .ok_or_else(|| Error::unsupported_format(model.name()))?;
        let row_len = buffer_len(bpp, Rect::from_size(bounds.width, 1.min(bounds.height)))?;
        let min_stride = bpp * bounds.width.max(0) as usize;
        if stride < min_stride {
            return Err(Error::InvalidStride {
                stride,
                min_stride,
                width: bounds.width,
            });
        }
        let expected = if bounds.is_empty() {
            0
        } else {
            (bounds.height as usize - 1)
                .checked_mul(stride)
                .and_then(|n| n.checked_add(row_len))
                .ok_or_else(|| Error::allocation_failed(u64::MAX, "size overflows"))?
        };
        if pix.len() < expected {
            return Err(Error::BufferTooSmall {
                expected,
                got: pix.len(),
            });
        }
        Ok(Self {
            pix: Arc::new(RwLock::new(pix)),
            offset: 0,
            stride,
            bounds,
            model,
            bpp,
            gray: GraySetting::None,
        })
    }

    /// Native color model.
    #[inline]
    pub fn model(&self) -> ColorModel {
        self.model
    }

    /// Pixel bounds.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Bytes between vertically adjacent pixels.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> i32 {
        self.bounds.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bounds.height
    }

    /// Size of one native pixel in bytes.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.bpp
    }

    /// Active preview transform.
    #[inline]
    pub fn gray(&self) -> GraySetting {
        self.gray
    }

    /// Sets the preview transform used by [`Plane::at`].
    pub fn set_gray(&mut self, gray: GraySetting) {
        self.gray = gray;
    }

    /// Returns `true` if both planes share one backing buffer.
    pub fn shares_buffer(&self, other: &Plane) -> bool {
        Arc::ptr_eq(&self.pix, &other.pix)
    }

    /// Index of the first byte of pixel `(x, y)` in the backing buffer.
    ///
    /// The point must lie inside the bounds.
    pub fn pix_offset(&self, x: i32, y: i32) -> usize {
        self.offset
            + (y - self.bounds.y) as usize * self.stride
            + (x - self.bounds.x) as usize * self.bpp
    }

    /// Pixel at `(x, y)` with the preview transform applied.
    ///
    /// Points outside the bounds read as the zero pixel.
    pub fn at(&self, x: i32, y: i32) -> Pixel {
        self.gray.apply(self.stored_at(x, y))
    }

    /// Pixel at `(x, y)` exactly as stored.
    pub fn stored_at(&self, x: i32, y: i32) -> Pixel {
        if !self.bounds.contains(x, y) {
            return Pixel::zero(self.model);
        }
        let i = self.pix_offset(x, y);
        let pix = self.pix.read().unwrap_or_else(PoisonError::into_inner);
        pix.get(i..)
            .and_then(|s| Pixel::from_le_bytes(self.model, s))
            .unwrap_or_else(|| Pixel::zero(self.model))
    }

    /// Premultiplied 16-bit display color at `(x, y)`.
    pub fn display_at(&self, x: i32, y: i32) -> [u32; 4] {
        self.at(x, y).to_display_rgba16()
    }

    /// Stores `pixel` at `(x, y)`, converting it to the native model.
    ///
    /// Points outside the bounds are ignored.
    pub fn set(&mut self, x: i32, y: i32, pixel: Pixel) {
        if !self.bounds.contains(x, y) {
            return;
        }
        let pixel = self.model.convert(pixel);
        let i = self.pix_offset(x, y);
        let mut pix = self.pix.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(dst) = pix.get_mut(i..) {
            pixel.write_le_bytes(dst);
        }
    }

    /// View of the part of this plane inside `rect`.
    ///
    /// The view aliases this plane's buffer and keeps its stride. A rectangle
    /// that does not overlap the bounds yields a detached empty plane.
    pub fn sub_image(&self, rect: Rect) -> Plane {
        let Some(r) = self.bounds.intersect(&rect) else {
            return Plane {
                pix: Arc::new(RwLock::new(Vec::new())),
                offset: 0,
                stride: 0,
                bounds: Rect::default(),
                model: self.model,
                bpp: self.bpp,
                gray: self.gray,
            };
        };
        Plane {
            pix: Arc::clone(&self.pix),
            offset: self.pix_offset(r.x, r.y),
            stride: self.stride,
            bounds: r,
            model: self.model,
            bpp: self.bpp,
            gray: self.gray,
        }
    }

    /// Returns `true` if every stored alpha is at least 1.0.
    ///
    /// Empty planes are opaque.
    pub fn is_opaque(&self) -> bool {
        self.bounds
            .iter_coords()
            .all(|(x, y)| self.stored_at(x, y).alpha() >= 1.0)
    }

    /// Copies the plane's pixels into a tightly packed row-major buffer.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        if self.bounds.is_empty() {
            return Vec::new();
        }
        let row = self.bpp * self.bounds.width as usize;
        let pix = self.pix.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = Vec::with_capacity(row * self.bounds.height as usize);
        for y in 0..self.bounds.height as usize {
            let start = self.offset + y * self.stride;
            if let Some(src) = pix.get(start..start + row) {
                out.extend_from_slice(src);
            }
        }
        out
    }
}

impl ImageSource for Plane {
    fn color_model(&self) -> ColorModel {
        self.model
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn at(&self, x: i32, y: i32) -> Pixel {
        Plane::at(self, x, y)
    }

    fn stored_at(&self, x: i32, y: i32) -> Pixel {
        Plane::stored_at(self, x, y)
    }
}

impl ImageSink for Plane {
    fn set(&mut self, x: i32, y: i32, pixel: Pixel) {
        Plane::set(self, x, y, pixel)
    }
}

impl fmt::Debug for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plane")
            .field("model", &self.model)
            .field("bounds", &self.bounds)
            .field("stride", &self.stride)
            .field("offset", &self.offset)
            .field("gray", &self.gray)
            .finish_non_exhaustive()
    }
}
