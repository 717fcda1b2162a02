//! DDS codec tests against synthetic files.

use std::io::Cursor;

use hdrtex_core::{ColorModel, ImageSource, Pixel, Plane, Rect, Rgba32F};
use hdrtex_io::dds::header::{
    Caps, Caps2, DdsFlags, Dxt10Header, DxgiFormat, FourCC, Header, PixelFormat, PixelFormatFlags,
};
use hdrtex_io::dds::{self, DdsReader, DdsWriter};
use hdrtex_io::{ErrorKind, ImageReader, ImageWriter, IoError};

fn header(width: u32, height: u32, pixel_format: PixelFormat) -> Header {
    Header {
        size: Header::SIZE,
        flags: DdsFlags::CAPS | DdsFlags::HEIGHT | DdsFlags::WIDTH | DdsFlags::PIXEL_FORMAT,
        width,
        height,
        pixel_format: PixelFormat {
            size: PixelFormat::SIZE,
            ..pixel_format
        },
        caps: Caps::TEXTURE,
        ..Default::default()
    }
}

fn four_cc(code: FourCC) -> PixelFormat {
    PixelFormat {
        flags: PixelFormatFlags::FOURCC,
        four_cc: code,
        ..Default::default()
    }
}

fn dx10(format: DxgiFormat, array_size: u32) -> Dxt10Header {
    Dxt10Header {
        dxgi_format: format,
        resource_dimension: Dxt10Header::DIMENSION_TEXTURE_2D,
        misc_flag: 0,
        array_size,
        misc_flags2: 0,
    }
}

fn file(header: &Header, ext: Option<&Dxt10Header>, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    header.write(&mut out).unwrap();
    if let Some(ext) = ext {
        ext.write(&mut out).unwrap();
    }
    out.extend_from_slice(payload);
    out
}

#[test]
fn bc1_red_block_decodes_opaque_red() {
    // color0 = 0xF800 (red), color1 = 0x0000, all indices 0
    let block = [0x00, 0xF8, 0x00, 0x00, 0, 0, 0, 0];
    let bytes = file(&header(4, 4, four_cc(FourCC::DXT1)), None, &block);

    let tex = DdsReader::new().read_from_memory(&bytes).unwrap();
    assert_eq!(tex.info.color_model, ColorModel::Rgba8);
    for (x, y) in Rect::from_size(4, 4).iter_coords() {
        assert_eq!(tex.at(x, y), Pixel::Rgba8([255, 0, 0, 255]), "texel ({x}, {y})");
    }
}

#[test]
fn bc1_edge_tiles_are_clipped() {
    // a 5x3 surface needs 2x1 blocks
    let red = [0x00, 0xF8, 0x00, 0x00, 0, 0, 0, 0];
    let blue = [0x1F, 0x00, 0x00, 0x00, 0, 0, 0, 0];
    let payload = [red, blue].concat();
    let bytes = file(&header(5, 3, four_cc(FourCC::DXT1)), None, &payload);

    let plane = DdsReader::new().read_from_memory(&bytes).unwrap().into_plane();
    assert_eq!(plane.bounds(), Rect::from_size(5, 3));
    assert_eq!(plane.at(3, 2), Pixel::Rgba8([255, 0, 0, 255]));
    assert_eq!(plane.at(4, 0), Pixel::Rgba8([0, 0, 255, 255]));
}

#[test]
fn dxt3_and_bc2_are_rejected() {
    let bytes = file(&header(4, 4, four_cc(FourCC::DXT3)), None, &[0; 16]);
    let err = dds::read_info_from_memory(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert!(err.to_string().contains("DXT3/BC2"));

    let ext = dx10(DxgiFormat::Bc2UNorm, 1);
    let bytes = file(&header(4, 4, four_cc(FourCC::DX10)), Some(&ext), &[0; 16]);
    let err = dds::read_info_from_memory(&bytes).unwrap_err();
    assert!(err.to_string().contains("DXT3/BC2"));

    let ext = dx10(DxgiFormat::Bc7UNormSrgb, 1);
    let bytes = file(&header(4, 4, four_cc(FourCC::DX10)), Some(&ext), &[0; 16]);
    assert!(matches!(
        DdsReader::new().read_from_memory(&bytes),
        Err(IoError::UnsupportedFormat(_))
    ));
}

#[test]
fn unknown_four_cc_is_rejected() {
    let bytes = file(&header(4, 4, four_cc(FourCC(*b"ETC2"))), None, &[0; 8]);
    let err = dds::read_info_from_memory(&bytes).unwrap_err();
    assert!(err.to_string().contains("unknown FourCC"));
}

#[test]
fn float_round_trip_is_bit_exact() {
    let bounds = Rect::from_size(6, 3);
    let mut plane = Plane::new(ColorModel::Rgba32F, bounds).unwrap();
    let specials = [-2.5f32, 0.0, 1.0e-30, 1.0, 17.75, f32::MAX];
    for (x, y) in bounds.iter_coords() {
        let v = specials[x as usize] * (y + 1) as f32;
        plane.set(x, y, Pixel::Float32x4(Rgba32F::new(v, -v, v * 0.5, 1.0 - v)));
    }

    let bytes = DdsWriter::new().write_to_memory(&plane).unwrap();
    let tex = DdsReader::new().read_from_memory(&bytes).unwrap();
    assert_eq!(tex.info.color_model, ColorModel::Rgba32F);
    assert_eq!(tex.info.num_images, 1);
    assert_eq!(tex.info.num_mipmaps, 1);
    for (x, y) in bounds.iter_coords() {
        let (Pixel::Float32x4(a), Pixel::Float32x4(b)) = (plane.at(x, y), tex.at(x, y)) else {
            panic!("expected float pixels");
        };
        assert_eq!(a.r.to_bits(), b.r.to_bits());
        assert_eq!(a.g.to_bits(), b.g.to_bits());
        assert_eq!(a.b.to_bits(), b.b.to_bits());
        assert_eq!(a.a.to_bits(), b.a.to_bits());
    }
}

#[test]
fn mip_chain_is_read_on_request() {
    let mut h = header(4, 2, four_cc(FourCC::DX10));
    h.flags |= DdsFlags::MIPMAP_COUNT;
    h.caps |= Caps::MIPMAP | Caps::COMPLEX;
    h.mipmap_count = 3;
    let ext = dx10(DxgiFormat::R8G8B8A8UNorm, 1);
    // 4x2 + 2x1; the third level would be 1x0 and ends the chain
    let mut payload = vec![10u8; 4 * 2 * 4];
    payload.extend_from_slice(&[20u8; 2 * 4]);
    let bytes = file(&h, Some(&ext), &payload);

    let top = DdsReader::new().read_from_memory(&bytes).unwrap();
    assert_eq!(top.info.num_mipmaps, 3);
    assert_eq!(top.images()[0].mipmaps().len(), 1);

    let all = DdsReader::new()
        .with_mipmaps(true)
        .read_from_memory(&bytes)
        .unwrap();
    let mips = all.images()[0].mipmaps();
    assert_eq!(mips.len(), 2);
    assert_eq!((mips[1].width, mips[1].height), (2, 1));
    assert_eq!(mips[1].plane.at(1, 0), Pixel::Rgba8([20; 4]));
}

#[test]
fn zero_mip_count_is_rejected() {
    let mut h = header(4, 4, four_cc(FourCC::DXT1));
    h.caps |= Caps::MIPMAP;
    h.mipmap_count = 0;
    let bytes = file(&h, None, &[0; 8]);
    let err = dds::read_info_from_memory(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invariant);
}

fn gray_cubemap() -> Vec<u8> {
    let pf = PixelFormat {
        flags: PixelFormatFlags::LUMINANCE,
        rgb_bit_count: 8,
        r_bit_mask: 0xff,
        ..Default::default()
    };
    let mut h = header(2, 2, pf);
    h.caps |= Caps::COMPLEX;
    h.caps2 = Caps2::CUBEMAP | Caps2::CUBEMAP_ALL_FACES;
    let payload: Vec<u8> = (0..6u8).flat_map(|face| [face * 10; 4]).collect();
    file(&h, None, &payload)
}

#[test]
fn cubemap_faces_are_images() {
    let tex = DdsReader::new().read_from_memory(&gray_cubemap()).unwrap();
    assert!(tex.info.is_cubemap);
    assert_eq!(tex.num_images(), 6);
    assert_eq!(tex.info.color_model, ColorModel::Gray8);
    assert_eq!(tex.images()[5].plane().at(1, 1), Pixel::Gray8(50));
}

#[test]
fn stack_layers_concatenates_faces() {
    let tex = DdsReader::new().read_from_memory(&gray_cubemap()).unwrap();
    let stacked = tex.stack_layers().unwrap();
    assert_eq!(stacked.num_images(), 1);
    assert_eq!(stacked.info.num_images, 1);
    assert_eq!(stacked.bounds(), Rect::from_size(2, 12));
    for face in 0..6 {
        assert_eq!(stacked.at(0, face * 2 + 1), Pixel::Gray8(face as u8 * 10));
    }
}

#[test]
fn writer_rejects_ldr_models() {
    let plane = Plane::new(ColorModel::Gray8, Rect::from_size(2, 2)).unwrap();
    let err = DdsWriter::new().write_to_memory(&plane).unwrap_err();
    assert!(err.to_string().contains("image does not have an HDR color model"));
}

#[test]
fn path_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lut.dds");

    let mut plane = Plane::new(ColorModel::Rgba16F, Rect::from_size(3, 3)).unwrap();
    plane.set(2, 2, Pixel::Float32x4(Rgba32F::new(4.0, 0.25, -1.0, 1.0)));
    dds::write(&path, &plane).unwrap();

    let info = dds::read_info(&path).unwrap();
    assert_eq!(info.config().color_model, ColorModel::Rgba16F);

    let tex = dds::read(&path).unwrap();
    assert_eq!(tex.plane().to_packed_bytes(), plane.to_packed_bytes());

    let config = dds::decode_config(Cursor::new(std::fs::read(&path).unwrap())).unwrap();
    assert_eq!((config.width, config.height), (3, 3));
}

#[test]
fn huge_surface_over_short_stream_is_truncated() {
    // 64 GiB of float texels claimed, a few bytes delivered
    let ext = dx10(DxgiFormat::R32G32B32A32Float, 1);
    let h = header(1 << 16, 1 << 16, four_cc(FourCC::DX10));
    let bytes = file(&h, Some(&ext), &[0; 32]);
    let err = DdsReader::new().read_from_memory(&bytes).unwrap_err();
    assert!(matches!(err, IoError::Truncated(_)), "{err}");
    assert_eq!(err.kind(), ErrorKind::Malformed);
}
