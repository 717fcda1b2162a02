//! HDR DDS writer: uncompressed DXT10 surfaces, one image, one mip level.

use std::io::Write;

use hdrtex_core::{ColorModel, ImageSource};
use tracing::debug;

use super::header::{
    Caps, DdsFlags, DxgiFormat, Dxt10Header, FourCC, Header, PixelFormat, PixelFormatFlags,
};
use crate::{IoError, IoResult};

/// DXGI format a model is stored as, if the model is HDR.
pub fn dxgi_format_for(model: ColorModel) -> Option<DxgiFormat> {
    match model {
        ColorModel::Rgba32F => Some(DxgiFormat::R32G32B32A32Float),
        ColorModel::Rgba32U => Some(DxgiFormat::R32G32B32A32UInt),
        ColorModel::Rgba16F => Some(DxgiFormat::R16G16B16A16Float),
        _ => None,
    }
}

/// Writes `image` as a DX10-extended DDS.
///
/// # Errors
///
/// [`IoError::EncodeError`] if the image model is not one of the three HDR
/// models; I/O errors from `w`.
pub fn encode<W: Write>(mut w: W, image: &dyn ImageSource) -> IoResult<()> {
    let model = image.color_model();
    let format = dxgi_format_for(model).ok_or_else(|| {
        IoError::EncodeError(format!(
            "image does not have an HDR color model ({model})"
        ))
    })?;
    let bounds = image.bounds();
    let width = bounds.width.max(0) as u32;
    let height = bounds.height.max(0) as u32;

    let header = Header {
        size: Header::SIZE,
        flags: DdsFlags::CAPS
            | DdsFlags::HEIGHT
            | DdsFlags::WIDTH
            | DdsFlags::PIXEL_FORMAT
            | DdsFlags::MIPMAP_COUNT,
        height,
        width,
        mipmap_count: 1,
        pixel_format: PixelFormat {
            size: PixelFormat::SIZE,
            flags: PixelFormatFlags::FOURCC,
            four_cc: FourCC::DX10,
            ..Default::default()
        },
        caps: Caps::COMPLEX | Caps::MIPMAP | Caps::TEXTURE,
        ..Default::default()
    };
    let ext = Dxt10Header {
        dxgi_format: format,
        resource_dimension: Dxt10Header::DIMENSION_TEXTURE_2D,
        misc_flag: 0,
        array_size: 1,
        misc_flags2: 0,
    };

    header.write(&mut w)?;
    ext.write(&mut w)?;

    let bpp = model.bytes_per_pixel().unwrap_or(16);
    let mut row = vec![0u8; bpp * width as usize];
    for y in bounds.y..bounds.bottom() {
        for (x, dst) in (bounds.x..bounds.right()).zip(row.chunks_exact_mut(bpp)) {
            // sources may hand out pixels in another layout
            let px = model.convert(image.stored_at(x, y));
            px.write_le_bytes(dst);
        }
        w.write_all(&row)?;
    }

    debug!(width, height, %format, "wrote DDS");
    Ok(())
}
