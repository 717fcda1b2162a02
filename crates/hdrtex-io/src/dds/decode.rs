//! Decoded DDS container and the mip-level decode loop.

use std::io::Read;

use hdrtex_core::{ColorModel, ImageSource, Pixel, Plane, Rect};
use tracing::trace;

use super::bc::{self, decode_bc1, decode_bc3, decode_bc4, decode_bc5};
use super::bc7::decode_bc7;
use super::info::{decode_info, DdsInfo, Decoder};
use super::uncompressed::{decode_dxgi, decode_masked, MaskLayout};
use crate::{IoError, IoResult};

/// One mip level.
#[derive(Debug)]
pub struct MipMap {
    /// Decoded pixels.
    pub plane: Plane,
    /// Level width in pixels.
    pub width: u32,
    /// Level height in pixels.
    pub height: u32,
}

/// One image of a DDS file: an array slice, cube face or volume slice.
#[derive(Debug)]
pub struct DdsImage {
    mipmaps: Vec<MipMap>,
}

impl DdsImage {
    /// Mip levels, largest first. Never empty.
    pub fn mipmaps(&self) -> &[MipMap] {
        &self.mipmaps
    }

    /// Top mip level.
    pub fn plane(&self) -> &Plane {
        &self.mipmaps[0].plane
    }
}

/// A decoded DDS file.
///
/// Acts as an image through its first image's top mip level.
#[derive(Debug)]
pub struct Dds {
    /// Classified header.
    pub info: DdsInfo,
    images: Vec<DdsImage>,
}

impl Dds {
    /// Images in file order. Never empty.
    pub fn images(&self) -> &[DdsImage] {
        &self.images
    }

    /// Number of decoded images.
    pub fn num_images(&self) -> usize {
        self.images.len()
    }

    /// Top mip level of the first image.
    pub fn plane(&self) -> &Plane {
        self.images[0].plane()
    }

    /// Consumes the container, returning the first image's top mip level.
    pub fn into_plane(self) -> Plane {
        let mut images = self.images;
        images.swap_remove(0).mipmaps.swap_remove(0).plane
    }

    /// Stacks every image vertically into a single-image, single-mip DDS.
    ///
    /// Images are appended in file order below one another. Images whose
    /// width differs from the first are skipped, and the stacked plane keeps
    /// room for all of them, so skipped slots stay zero at the bottom.
    pub fn stack_layers(&self) -> IoResult<Dds> {
        let first = self.plane();
        let model = first.model();
        let bpp = first.bytes_per_pixel();
        let width = first.width();
        let height = i32::try_from(self.images.len())
            .ok()
            .and_then(|n| n.checked_mul(first.height()))
            .ok_or_else(|| {
                hdrtex_core::Error::invalid_dimensions(width, i32::MAX, "stacked height overflows")
            })?;
        let bounds = Rect::from_size(width, height);

        let mut pix = hdrtex_core::plane::allocate(bpp, bounds)?;
        let mut offset = 0;
        for layer in &self.images {
            let plane = layer.plane();
            if plane.width() != width {
                continue;
            }
            let src = plane.to_packed_bytes();
            let n = src.len().min(pix.len() - offset);
            pix[offset..offset + n].copy_from_slice(&src[..n]);
            offset += n;
        }

        let stride = bpp * width.max(0) as usize;
        let plane = Plane::from_raw(model, bounds, stride, pix)?;

        let mut info = self.info.clone();
        info.header.height = height as u32;
        info.header.mipmap_count = 1;
        info.num_images = 1;
        info.num_mipmaps = 1;
        info.is_cubemap = false;
        if let Some(ext) = info.dxt10.as_mut() {
            ext.array_size = 1;
        }

        Ok(Dds {
            info,
            images: vec![DdsImage {
                mipmaps: vec![MipMap {
                    plane,
                    width: width as u32,
                    height: height as u32,
                }],
            }],
        })
    }
}

impl ImageSource for Dds {
    fn color_model(&self) -> ColorModel {
        self.plane().model()
    }

    fn bounds(&self) -> Rect {
        self.plane().bounds()
    }

    fn at(&self, x: i32, y: i32) -> Pixel {
        self.plane().at(x, y)
    }

    fn stored_at(&self, x: i32, y: i32) -> Pixel {
        self.plane().stored_at(x, y)
    }
}

/// Decodes a DDS stream.
///
/// Only the top mip level is read unless `read_mipmaps` is set or the file
/// holds more than one image.
///
/// # Errors
///
/// Everything [`decode_info`] rejects, plus [`IoError::UnsupportedFormat`]
/// for classified-but-undecodable surfaces, [`IoError::Truncated`] when the
/// surface data runs out and [`IoError::DecodeError`] if an image yields no
/// mip level.
pub fn decode<R: Read>(mut reader: R, read_mipmaps: bool) -> IoResult<Dds> {
    let info = decode_info(&mut reader)?;
    if let Decoder::Unsupported(reason) = info.decoder {
        return Err(IoError::UnsupportedFormat(reason.to_string()));
    }

    let layout = match info.decoder {
        Decoder::Masked => Some(MaskLayout::new(&info.header.pixel_format)?),
        _ => None,
    };

    let mips_to_read = if read_mipmaps || info.num_images > 1 {
        info.num_mipmaps
    } else {
        1
    };

    let mut images = Vec::with_capacity(info.num_images.min(64) as usize);
    for image in 0..info.num_images {
        let (mut width, mut height) = (info.header.width, info.header.height);
        let mut mipmaps = Vec::new();
        for level in 0..mips_to_read {
            if width == 0 || height == 0 {
                break;
            }
            let plane = decode_level(&mut reader, &info, layout.as_ref(), width, height)?;
            trace!(image, level, width, height, "decoded DDS mip level");
            mipmaps.push(MipMap {
                plane,
                width,
                height,
            });
            width /= 2;
            height /= 2;
        }
        if mipmaps.is_empty() {
            return Err(IoError::DecodeError(format!(
                "image {image} has no mip levels"
            )));
        }
        images.push(DdsImage { mipmaps });
    }

    Ok(Dds { info, images })
}

fn decode_level<R: Read>(
    reader: &mut R,
    info: &DdsInfo,
    layout: Option<&MaskLayout>,
    width: u32,
    height: u32,
) -> IoResult<Plane> {
    let w = i32::try_from(width).map_err(|_| {
        hdrtex_core::Error::invalid_dimensions(i32::MAX, 0, format!("width {width} too large"))
    })?;
    let h = i32::try_from(height).map_err(|_| {
        hdrtex_core::Error::invalid_dimensions(0, i32::MAX, format!("height {height} too large"))
    })?;
    let bounds = Rect::from_size(w, h);

    let len = match (info.decoder, layout) {
        (Decoder::Masked, Some(layout)) => {
            hdrtex_core::plane::buffer_len(layout.bytes_per_pixel(), bounds)?
        }
        (Decoder::Dxgi(format), _) => {
            let bpp = format.bytes_per_pixel().ok_or_else(|| {
                IoError::UnsupportedFormat(format!("{format} is not an uncompressed format"))
            })?;
            hdrtex_core::plane::buffer_len(bpp, bounds)?
        }
        (decoder, _) => match decoder.block_size() {
            Some(block) => bc::surface_size(width as usize, height as usize, block)?,
            None => {
                return Err(IoError::DecodeError(format!(
                    "no surface layout for {decoder:?}"
                )));
            }
        },
    };

    let data = read_surface(reader, len)?;
    let mut plane = Plane::new(info.color_model, bounds)?;
    match (info.decoder, layout) {
        (Decoder::Masked, Some(layout)) => decode_masked(&data, layout, &mut plane)?,
        (Decoder::Dxgi(format), _) => decode_dxgi(&data, format, &mut plane)?,
        (Decoder::Bc1, _) => bc::decode_surface::<8>(&data, &mut plane, decode_bc1, Pixel::Rgba8)?,
        (Decoder::Bc3, _) => bc::decode_surface::<16>(&data, &mut plane, decode_bc3, Pixel::Rgba8)?,
        (Decoder::Bc4, _) => {
            bc::decode_surface::<8>(&data, &mut plane, decode_bc4, |px| Pixel::Gray8(px[0]))?
        }
        (Decoder::Bc5, _) => bc::decode_surface::<16>(&data, &mut plane, decode_bc5, Pixel::Rgba8)?,
        (Decoder::Bc7, _) => bc::decode_surface::<16>(&data, &mut plane, decode_bc7, Pixel::Rgba8)?,
        (decoder, _) => {
            return Err(IoError::DecodeError(format!(
                "no surface layout for {decoder:?}"
            )));
        }
    }
    Ok(plane)
}

/// Up-front reservation cap; larger surfaces grow as bytes arrive.
const SURFACE_RESERVE: usize = 1 << 20;

/// Reads `len` bytes of surface data. The buffer only grows with bytes the
/// stream actually delivers, so a header claiming a huge surface over a
/// short stream fails as truncated without a large allocation.
fn read_surface<R: Read>(reader: &mut R, len: usize) -> IoResult<Vec<u8>> {
    let mut data = Vec::new();
    let reserve = len.min(SURFACE_RESERVE);
    data.try_reserve_exact(reserve)
        .map_err(|e| hdrtex_core::Error::allocation_failed(reserve as u64, e.to_string()))?;
    reader.by_ref().take(len as u64).read_to_end(&mut data)?;
    if data.len() < len {
        return Err(IoError::Truncated(format!(
            "surface data ({} of {} bytes)",
            data.len(),
            len
        )));
    }
    Ok(data)
}
