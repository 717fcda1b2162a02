//! Header classification: which color model and decoder a DDS file needs,
//! and how many images and mip levels it holds.

use std::io::Read;

use hdrtex_core::ColorModel;
use tracing::debug;

use super::header::{Caps, Caps2, DxgiFormat, Dxt10Header, FourCC, Header, PixelFormatFlags};
use crate::traits::ImageConfig;
use crate::{IoError, IoResult};

/// Surface decoder selected from the header.
///
/// Every recognized layout maps to exactly one variant. Layouts that can be
/// described but not decoded end up in [`Decoder::Unsupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// Legacy uncompressed surface described by the pixel format bit masks.
    Masked,
    /// Uncompressed DXGI surface.
    Dxgi(DxgiFormat),
    /// BC1 / DXT1.
    Bc1,
    /// BC3 / DXT5.
    Bc3,
    /// BC4 / ATI1, one channel.
    Bc4,
    /// BC5 / ATI2, two channels.
    Bc5,
    /// BC7, all eight modes.
    Bc7,
    /// Classified but not decodable.
    Unsupported(&'static str),
}

impl Decoder {
    /// Bytes per 4x4 block for block-compressed decoders.
    pub fn block_size(self) -> Option<usize> {
        match self {
            Decoder::Bc1 | Decoder::Bc4 => Some(8),
            Decoder::Bc3 | Decoder::Bc5 | Decoder::Bc7 => Some(16),
            _ => None,
        }
    }
}

/// Everything the decode loop needs to know about a DDS file.
#[derive(Debug, Clone)]
pub struct DdsInfo {
    /// Legacy header.
    pub header: Header,
    /// Extension header, present when the FourCC is `DX10`.
    pub dxt10: Option<Dxt10Header>,
    /// Surface decoder.
    pub decoder: Decoder,
    /// Color model of the decoded planes.
    pub color_model: ColorModel,
    /// Mip levels per image, at least 1.
    pub num_mipmaps: u32,
    /// Images (array slices, cube faces or volume slices), at least 1.
    pub num_images: u32,
    /// True for cube maps.
    pub is_cubemap: bool,
}

impl DdsInfo {
    /// Top-level width in pixels.
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Top-level height in pixels.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Header-only summary.
    pub fn config(&self) -> ImageConfig {
        ImageConfig {
            color_model: self.color_model,
            width: self.header.width,
            height: self.header.height,
        }
    }
}

/// Reads the headers and classifies the file. The stream is left at the
/// first byte of surface data.
///
/// # Errors
///
/// - [`IoError::InvalidFile`] / [`IoError::Truncated`] on a malformed header
/// - [`IoError::UnsupportedFormat`] for DXT3/BC2, BC7 sRGB, unknown FourCC or
///   DXGI formats and non-2D DXT10 resources
/// - [`IoError::DecodeError`] when the header declares no images or no mips
pub fn decode_info<R: Read>(mut reader: R) -> IoResult<DdsInfo> {
    let header = Header::read(&mut reader)?;
    let pf = &header.pixel_format;

    let mut is_cubemap = header.caps2.contains(Caps2::CUBEMAP);
    let is_volume = header.caps2.contains(Caps2::VOLUME) && header.depth > 0;
    let mut dxt10 = None;

    let (color_model, decoder) = if pf.flags.contains(PixelFormatFlags::RGB) {
        (ColorModel::Rgba8, Decoder::Masked)
    } else if pf.flags.contains(PixelFormatFlags::YUV) {
        let model = if pf.flags.contains(PixelFormatFlags::ALPHA_PIXELS) {
            ColorModel::YCbCrA
        } else {
            ColorModel::YCbCr
        };
        (model, Decoder::Unsupported("YUV surfaces are not decoded"))
    } else if pf.flags.contains(PixelFormatFlags::LUMINANCE) {
        let gray = !pf.flags.contains(PixelFormatFlags::ALPHA_PIXELS)
            && pf.g_bit_mask == 0
            && pf.b_bit_mask == 0;
        let model = match (gray, pf.rgb_bit_count > 8) {
            (true, true) => ColorModel::Gray16,
            (true, false) => ColorModel::Gray8,
            (false, _) => ColorModel::Rgba8,
        };
        (model, Decoder::Masked)
    } else if pf.flags.contains(PixelFormatFlags::FOURCC) {
        match pf.four_cc {
            FourCC::ATI1 => (ColorModel::Gray8, Decoder::Bc4),
            FourCC::ATI2 => (ColorModel::Rgba8, Decoder::Bc5),
            FourCC::DXT1 => (ColorModel::Rgba8, Decoder::Bc1),
            FourCC::DXT3 => return Err(dxt3_unsupported()),
            FourCC::DXT5 => (ColorModel::Rgba8, Decoder::Bc3),
            FourCC::DX10 => {
                let ext = Dxt10Header::read(&mut reader)?;
                if ext.resource_dimension != Dxt10Header::DIMENSION_TEXTURE_2D {
                    return Err(IoError::UnsupportedFormat(format!(
                        "DXT10 resource dimension {} (only 2D textures)",
                        ext.resource_dimension
                    )));
                }
                let classified = classify_dxgi(ext.dxgi_format)?;
                is_cubemap |= ext.is_cube();
                dxt10 = Some(ext);
                classified
            }
            other => {
                return Err(IoError::UnsupportedFormat(format!(
                    "unknown FourCC {other}"
                )));
            }
        }
    } else {
        return Err(IoError::UnsupportedFormat(format!(
            "pixel format flags {:#x} name no known layout",
            pf.flags.bits()
        )));
    };

    let mut num_images = dxt10.map_or(1, |ext| ext.array_size);
    if is_cubemap {
        num_images = header.caps2.face_count();
    }
    if is_volume {
        num_images = header.depth;
    }
    if num_images == 0 {
        return Err(IoError::DecodeError("invalid image header: no images".into()));
    }

    let mut num_mipmaps = 1;
    if header.caps.contains(Caps::MIPMAP)
        && (header.caps.contains(Caps::TEXTURE) || header.caps2.contains(Caps2::CUBEMAP))
    {
        num_mipmaps = header.mipmap_count;
    }
    if num_mipmaps == 0 {
        return Err(IoError::DecodeError(
            "invalid image header: base image mipmap (mip 0) missing".into(),
        ));
    }

    debug!(
        width = header.width,
        height = header.height,
        model = %color_model,
        ?decoder,
        num_images,
        num_mipmaps,
        "classified DDS header"
    );

    Ok(DdsInfo {
        header,
        dxt10,
        decoder,
        color_model,
        num_mipmaps,
        num_images,
        is_cubemap,
    })
}

fn dxt3_unsupported() -> IoError {
    IoError::UnsupportedFormat("DXT3/BC2 compression".into())
}

fn classify_dxgi(format: DxgiFormat) -> IoResult<(ColorModel, Decoder)> {
    use DxgiFormat::*;

    let model = match format {
        R32G32B32A32Float | R32G32B32Float => ColorModel::Rgba32F,
        R32G32B32A32UInt => ColorModel::Rgba32U,
        R16G16B16A16Float | R16G16B16A16UNorm => ColorModel::Rgba16F,
        R32G32Float => ColorModel::Rgba16,
        R32Float | R16UNorm => ColorModel::Gray16,
        R8UNorm => ColorModel::Gray8,
        R8G8B8A8UNorm => ColorModel::Rgba8,
        Bc1UNorm => return Ok((ColorModel::Rgba8, Decoder::Bc1)),
        Bc2UNorm => return Err(dxt3_unsupported()),
        Bc3UNorm => return Ok((ColorModel::Rgba8, Decoder::Bc3)),
        Bc4UNorm => return Ok((ColorModel::Gray8, Decoder::Bc4)),
        Bc5UNorm => return Ok((ColorModel::Rgba8, Decoder::Bc5)),
        Bc7UNorm => return Ok((ColorModel::Rgba8, Decoder::Bc7)),
        Bc7UNormSrgb => {
            return Err(IoError::UnsupportedFormat("BC7 sRGB compression".into()));
        }
        Other(v) => {
            return Err(IoError::UnsupportedFormat(format!("DXGI format {v}")));
        }
    };
    Ok((model, Decoder::Dxgi(format)))
}
