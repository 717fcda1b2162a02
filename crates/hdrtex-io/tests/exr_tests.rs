//! OpenEXR codec tests: round trips and hand-built files.

use std::io::Cursor;

use approx::assert_relative_eq;
use byteorder::{LittleEndian, WriteBytesExt};
use hdrtex_core::{ColorModel, ImageSource, Pixel, Plane, Rect, Rgba32F};
use hdrtex_io::exr::{
    self, zip, Box2i, Channel, Compression, ExrReader, ExrWriter, Header, PixelType, ScanLine,
};
use hdrtex_io::{ErrorKind, ImageReader, ImageWriter, IoError};

fn gradient(model: ColorModel, width: i32, height: i32) -> Plane {
    let bounds = Rect::from_size(width, height);
    let mut plane = Plane::new(model, bounds).unwrap();
    for (x, y) in bounds.iter_coords() {
        let v = (x - 8) as f32 * 0.75 + y as f32 * 3.5;
        plane.set(x, y, Pixel::Float32x4(Rgba32F::new(v, -v, v * v, 0.5)));
    }
    plane
}

/// Builds a file by hand from a header and uncompressed blocks.
fn assemble(header: &Header, blocks: &[ScanLine]) -> Vec<u8> {
    let mut out = Vec::new();
    header.write(&mut out).unwrap();
    let mut offset = out.len() as u64 + 8 * blocks.len() as u64;
    for block in blocks {
        out.write_u64::<LittleEndian>(offset).unwrap();
        offset += block.stored_len();
    }
    for block in blocks {
        block.write(&mut out).unwrap();
    }
    out
}

#[test]
fn float_zip_round_trip() {
    let plane = gradient(ColorModel::Rgba32F, 17, 5);
    let bytes = ExrWriter::new().write_to_memory(&plane).unwrap();

    let exr = ExrReader::new().read_from_memory(&bytes).unwrap();
    assert_eq!(exr.header.compression, Compression::Zip);
    assert_eq!(exr.header.channels.len(), 4);
    let names: Vec<_> = exr.header.channels.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, exr::CHANNEL_ORDER);
    assert_eq!(exr.header.display_window, exr.header.data_window);

    let back = exr.to_image().unwrap();
    assert_eq!(back.model(), ColorModel::Rgba32F);
    assert_eq!(back.bounds(), plane.bounds());
    assert_eq!(back.to_packed_bytes(), plane.to_packed_bytes());

    let rows = exr.pixels().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].len(), 17);
    let Pixel::Float32x4(px) = plane.at(2, 4) else {
        panic!("expected float pixel");
    };
    assert_relative_eq!(rows[4][2][0], px.r);
    assert_relative_eq!(rows[4][2][1], px.g);
    assert_relative_eq!(rows[4][2][3], 0.5);
}

#[test]
fn uncompressed_and_zips_round_trip() {
    let plane = gradient(ColorModel::Rgba16F, 3, 4);
    for compression in [Compression::None, Compression::Zips] {
        let bytes = ExrWriter::new()
            .with_compression(compression)
            .write_to_memory(&plane)
            .unwrap();
        let exr = exr::decode(Cursor::new(&bytes)).unwrap();
        assert_eq!(exr.header.compression, compression);
        assert_eq!(exr.scanlines().len(), 4);
        assert_eq!(
            exr.to_image().unwrap().to_packed_bytes(),
            plane.to_packed_bytes()
        );
    }
}

#[test]
fn offset_table_points_at_blocks() {
    let plane = gradient(ColorModel::Rgba32F, 4, 40);
    let bytes = ExrWriter::new().write_to_memory(&plane).unwrap();
    let exr = ExrReader::new().read_from_memory(&bytes).unwrap();
    // 40 rows in blocks of 16
    assert_eq!(exr.offsets.len(), 3);
    assert_eq!(exr.scanlines()[2].line_count, 8);
    for (offset, block) in exr.offsets.iter().zip(exr.scanlines()) {
        let at = *offset as usize;
        let y = i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
        assert_eq!(y, block.y);
    }
}

#[test]
fn missing_compression_is_reported() {
    let mut bytes = vec![0x76, 0x2F, 0x31, 0x01, 2, 0, 0, 0];
    let mut attr = |name: &str, ty: &str, value: &[u8]| {
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(ty.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    };
    attr("lineOrder", "lineOrder", &[0]);
    attr("pixelAspectRatio", "float", &1.0f32.to_le_bytes());
    bytes.push(0);

    let err = exr::decode_info(Cursor::new(&bytes)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
    let IoError::MissingAttributes(names) = &err else {
        panic!("unexpected error {err}");
    };
    assert!(names.iter().any(|n| n == "compression"));
    assert!(names.iter().any(|n| n == "channels"));
    assert!(!names.iter().any(|n| n == "lineOrder"));
}

#[test]
fn missing_alpha_reads_opaque() {
    let channels = ["B", "G", "R"]
        .into_iter()
        .map(|name| Channel::new(name, PixelType::Float))
        .collect();
    let window = Box2i {
        x_min: 0,
        y_min: 0,
        x_max: 1,
        y_max: 0,
    };
    let header = Header::new(channels, Compression::None, window);

    let mut data = Vec::new();
    // B, G, R planes for two columns
    for v in [0.25f32, 0.5, 2.0, 3.0, -1.0, 4.0] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    let bytes = assemble(&header, &[ScanLine::new(0, 1, data)]);

    let exr = ExrReader::new().read_from_memory(&bytes).unwrap();
    assert_eq!(exr.color_model(), ColorModel::Rgba32F);
    let expected = Pixel::Float32x4(Rgba32F::new(4.0, 3.0, 0.5, 1.0));
    assert_eq!(exr.pixel_at(1, 0).unwrap(), expected);
    assert_eq!(exr.to_image().unwrap().at(1, 0), expected);
    assert_eq!(exr.pixels().unwrap()[0][0], [-1.0, 2.0, 0.25, 1.0]);
}

#[test]
fn mixed_channel_types_fail() {
    let channels = vec![
        Channel::new("G", PixelType::Half),
        Channel::new("R", PixelType::Float),
    ];
    let window = Box2i {
        x_min: 0,
        y_min: 0,
        x_max: 0,
        y_max: 0,
    };
    let header = Header::new(channels, Compression::None, window);
    let bytes = assemble(&header, &[ScanLine::new(0, 1, vec![0; 6])]);

    let exr = ExrReader::new().read_from_memory(&bytes).unwrap();
    assert!(matches!(exr.pixel_at(0, 0), Err(IoError::DecodeError(_))));
    assert!(matches!(exr.to_image(), Err(IoError::DecodeError(_))));
}

#[test]
fn unsupported_scheme_fails_on_compressed_blocks() {
    let channels = vec![Channel::new("R", PixelType::Half)];
    let window = Box2i {
        x_min: 0,
        y_min: 0,
        x_max: 3,
        y_max: 0,
    };
    let header = Header::new(channels, Compression::Piz, window);
    // 3 bytes where 8 are expected: flagged compressed
    let bytes = assemble(&header, &[ScanLine::new(0, 1, vec![1, 2, 3])]);

    let exr = ExrReader::new().read_from_memory(&bytes).unwrap();
    assert!(exr.scanlines()[0].compressed);
    let err = exr.to_image().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert!(err.to_string().contains("PIZ"));
}

#[test]
fn tiled_files_are_unsupported() {
    let plane = gradient(ColorModel::Rgba32F, 2, 2);
    let mut bytes = ExrWriter::new().write_to_memory(&plane).unwrap();
    bytes[5] = 0x02;
    let err = ExrReader::new().read_from_memory(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn zip_transforms_invert() {
    let data: Vec<u8> = (0..257u32).map(|i| (i * 37 % 251) as u8).collect();
    assert_eq!(zip::reorder(&zip::interleave(&data)), data);
    assert_eq!(zip::reconstruct(&zip::deconstruct(&data)), data);

    let packed = zip::compress(&[7u8; 512]);
    assert!(packed.len() < 512);
    assert_eq!(zip::decompress(&packed, 512).unwrap(), vec![7u8; 512]);
}

#[test]
fn writer_rejects_ldr_and_schemes() {
    let ldr = Plane::new(ColorModel::Rgba16, Rect::from_size(2, 2)).unwrap();
    assert_eq!(
        ExrWriter::new().write_to_memory(&ldr).unwrap_err().kind(),
        ErrorKind::Unsupported
    );

    let hdr = gradient(ColorModel::Rgba32F, 2, 2);
    let err = ExrWriter::new()
        .with_compression(Compression::Rle)
        .write_to_memory(&hdr)
        .unwrap_err();
    assert!(err.to_string().contains("unimplemented compression scheme"));
}

#[test]
fn path_round_trip_with_offset_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("window.exr");

    let bounds = Rect::new(-4, 10, 6, 3);
    let mut plane = Plane::new(ColorModel::Rgba32F, bounds).unwrap();
    plane.set(-4, 12, Pixel::Float32x4(Rgba32F::new(9.0, 8.0, 7.0, 6.0)));
    exr::write(&path, &plane).unwrap();

    let info = exr::read_info(&path).unwrap();
    assert_eq!((info.width, info.height), (6, 3));

    let exr = exr::read(&path).unwrap();
    assert_eq!(exr.bounds(), bounds);
    assert_eq!(exr.header.data_window.x_min, -4);
    assert_eq!(exr.pixel_at(-4, 12).unwrap(), plane.at(-4, 12));
    assert_eq!(exr.to_image().unwrap().at(-4, 12), plane.at(-4, 12));
}

/// One-column, two-row float header starting at `y_min`.
fn two_rows(y_min: i32) -> Header {
    let window = Box2i {
        x_min: 0,
        y_min,
        x_max: 0,
        y_max: y_min + 1,
    };
    Header::new(
        vec![Channel::new("R", PixelType::Float)],
        Compression::None,
        window,
    )
}

fn row(y: i32, v: f32) -> ScanLine {
    ScanLine::new(y, 1, v.to_le_bytes().to_vec())
}

#[test]
fn repeated_block_row_is_rejected() {
    let bytes = assemble(&two_rows(0), &[row(0, 1.0), row(0, 2.0)]);
    let err = ExrReader::new().read_from_memory(&bytes).unwrap_err();
    assert!(matches!(err, IoError::InvalidFile(_)), "{err}");
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn blocks_in_any_order_decode() {
    let bytes = assemble(&two_rows(0), &[row(1, 2.0), row(0, 1.0)]);
    let exr = ExrReader::new().read_from_memory(&bytes).unwrap();
    let plane = exr.to_image().unwrap();
    assert_eq!(plane.at(0, 0), Pixel::Float32x4(Rgba32F::new(1.0, 0.0, 0.0, 1.0)));
    assert_eq!(plane.at(0, 1), Pixel::Float32x4(Rgba32F::new(2.0, 0.0, 0.0, 1.0)));
}

#[test]
fn block_outside_window_is_rejected() {
    let bytes = assemble(&two_rows(0), &[row(0, 1.0), row(2, 2.0)]);
    let err = ExrReader::new().read_from_memory(&bytes).unwrap_err();
    assert!(matches!(err, IoError::InvalidFile(_)), "{err}");
}

#[test]
fn missing_block_is_truncated() {
    let header = two_rows(0);
    let mut bytes = Vec::new();
    header.write(&mut bytes).unwrap();
    let start = bytes.len() as u64 + 16;
    bytes.write_u64::<LittleEndian>(start).unwrap();
    bytes.write_u64::<LittleEndian>(start + 12).unwrap();
    row(0, 1.0).write(&mut bytes).unwrap();

    let err = ExrReader::new().read_from_memory(&bytes).unwrap_err();
    assert!(matches!(err, IoError::Truncated(_)), "{err}");
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn short_offset_table_is_rejected() {
    let header = two_rows(0);
    let mut bytes = Vec::new();
    header.write(&mut bytes).unwrap();
    // one entry where two are due; the reader takes the first block's
    // y and size as the second offset
    bytes.write_u64::<LittleEndian>(bytes.len() as u64 + 8).unwrap();
    row(0, 1.0).write(&mut bytes).unwrap();
    row(1, 2.0).write(&mut bytes).unwrap();

    let err = ExrReader::new().read_from_memory(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn window_at_coordinate_limit_is_rejected() {
    let window = Box2i {
        x_min: i32::MAX - 1,
        y_min: 0,
        x_max: i32::MAX,
        y_max: 0,
    };
    let header = Header::new(
        vec![Channel::new("R", PixelType::Float)],
        Compression::None,
        window,
    );
    let bytes = assemble(&header, &[ScanLine::new(0, 1, vec![0; 8])]);

    let err = ExrReader::new().read_from_memory(&bytes).unwrap_err();
    assert!(matches!(err, IoError::InvalidFile(_)), "{err}");
    assert!(exr::decode_info(Cursor::new(&bytes)).is_err());
}

#[test]
fn negative_window_rows_decode() {
    let bytes = assemble(&two_rows(-3), &[row(-3, 5.0), row(-2, -6.0)]);
    let exr = ExrReader::new().read_from_memory(&bytes).unwrap();
    assert_eq!(exr.bounds(), Rect::new(0, -3, 1, 2));
    assert_eq!(
        exr.pixel_at(0, -2).unwrap(),
        Pixel::Float32x4(Rgba32F::new(-6.0, 0.0, 0.0, 1.0))
    );
    assert_eq!(exr.to_image().unwrap().at(0, -3), exr.pixel_at(0, -3).unwrap());
    assert_eq!(exr.pixel_at(0, -4).unwrap(), Pixel::zero(ColorModel::Rgba32F));
}
