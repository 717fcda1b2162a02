//! DDS file header, pixel format and DXT10 extension.
//!
//! Field layouts follow the Microsoft `DDS_HEADER`, `DDS_PIXELFORMAT` and
//! `DDS_HEADER_DXT10` structures, all little-endian.

use std::fmt;
use std::io::{Read, Write};

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::detect::DDS_MAGIC;
use crate::{IoError, IoResult};

bitflags! {
    /// `DDS_HEADER.dwFlags`: which header members hold valid data.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DdsFlags: u32 {
        const CAPS = 0x1;
        const HEIGHT = 0x2;
        const WIDTH = 0x4;
        const PITCH = 0x8;
        const PIXEL_FORMAT = 0x1000;
        const MIPMAP_COUNT = 0x20000;
        const LINEAR_SIZE = 0x80000;
        const DEPTH = 0x800000;
    }

    /// `DDS_HEADER.dwCaps`: surface complexity.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Caps: u32 {
        /// More than one surface (mipmaps, cube faces, volume slices).
        const COMPLEX = 0x8;
        const TEXTURE = 0x1000;
        const MIPMAP = 0x400000;
    }

    /// `DDS_HEADER.dwCaps2`: cube map faces and volume textures.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Caps2: u32 {
        const CUBEMAP = 0x200;
        const CUBEMAP_POSITIVE_X = 0x400;
        const CUBEMAP_NEGATIVE_X = 0x800;
        const CUBEMAP_POSITIVE_Y = 0x1000;
        const CUBEMAP_NEGATIVE_Y = 0x2000;
        const CUBEMAP_POSITIVE_Z = 0x4000;
        const CUBEMAP_NEGATIVE_Z = 0x8000;
        const VOLUME = 0x200000;

        const CUBEMAP_ALL_FACES = Self::CUBEMAP_POSITIVE_X.bits()
            | Self::CUBEMAP_NEGATIVE_X.bits()
            | Self::CUBEMAP_POSITIVE_Y.bits()
            | Self::CUBEMAP_NEGATIVE_Y.bits()
            | Self::CUBEMAP_POSITIVE_Z.bits()
            | Self::CUBEMAP_NEGATIVE_Z.bits();
    }

    /// `DDS_PIXELFORMAT.dwFlags`: what kind of data the surface holds.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PixelFormatFlags: u32 {
        const ALPHA_PIXELS = 0x1;
        const ALPHA = 0x2;
        const FOURCC = 0x4;
        const RGB = 0x40;
        const YUV = 0x200;
        const LUMINANCE = 0x20000;
    }
}

impl Caps2 {
    /// Number of cube faces present.
    pub fn face_count(self) -> u32 {
        (self & Caps2::CUBEMAP_ALL_FACES).bits().count_ones()
    }
}

/// Four-character code identifying a compressed or extended format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const DXT1: Self = FourCC(*b"DXT1");
    pub const DXT3: Self = FourCC(*b"DXT3");
    pub const DXT5: Self = FourCC(*b"DXT5");
    pub const ATI1: Self = FourCC(*b"ATI1");
    pub const ATI2: Self = FourCC(*b"ATI2");
    pub const DX10: Self = FourCC(*b"DX10");
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

/// DXGI pixel formats this codec knows by name.
///
/// Everything else is kept as [`DxgiFormat::Other`] and rejected during
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DxgiFormat {
    R32G32B32A32Float,
    R32G32B32A32UInt,
    R32G32B32Float,
    R16G16B16A16Float,
    R16G16B16A16UNorm,
    R32G32Float,
    R8G8B8A8UNorm,
    R32Float,
    R16UNorm,
    R8UNorm,
    Bc1UNorm,
    Bc2UNorm,
    Bc3UNorm,
    Bc4UNorm,
    Bc5UNorm,
    Bc7UNorm,
    Bc7UNormSrgb,
    Other(u32),
}

impl DxgiFormat {
    /// Maps a raw `DXGI_FORMAT` value.
    pub fn from_u32(v: u32) -> Self {
        match v {
            2 => Self::R32G32B32A32Float,
            3 => Self::R32G32B32A32UInt,
            6 => Self::R32G32B32Float,
            10 => Self::R16G16B16A16Float,
            11 => Self::R16G16B16A16UNorm,
            16 => Self::R32G32Float,
            28 => Self::R8G8B8A8UNorm,
            41 => Self::R32Float,
            56 => Self::R16UNorm,
            61 => Self::R8UNorm,
            71 => Self::Bc1UNorm,
            74 => Self::Bc2UNorm,
            77 => Self::Bc3UNorm,
            80 => Self::Bc4UNorm,
            83 => Self::Bc5UNorm,
            98 => Self::Bc7UNorm,
            99 => Self::Bc7UNormSrgb,
            other => Self::Other(other),
        }
    }

    /// Raw `DXGI_FORMAT` value.
    pub fn to_u32(self) -> u32 {
        match self {
            Self::R32G32B32A32Float => 2,
            Self::R32G32B32A32UInt => 3,
            Self::R32G32B32Float => 6,
            Self::R16G16B16A16Float => 10,
            Self::R16G16B16A16UNorm => 11,
            Self::R32G32Float => 16,
            Self::R8G8B8A8UNorm => 28,
            Self::R32Float => 41,
            Self::R16UNorm => 56,
            Self::R8UNorm => 61,
            Self::Bc1UNorm => 71,
            Self::Bc2UNorm => 74,
            Self::Bc3UNorm => 77,
            Self::Bc4UNorm => 80,
            Self::Bc5UNorm => 83,
            Self::Bc7UNorm => 98,
            Self::Bc7UNormSrgb => 99,
            Self::Other(v) => v,
        }
    }

    /// Bytes per pixel of an uncompressed format, `None` for block formats.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::R32G32B32A32Float | Self::R32G32B32A32UInt => Some(16),
            Self::R32G32B32Float => Some(12),
            Self::R16G16B16A16Float | Self::R16G16B16A16UNorm | Self::R32G32Float => Some(8),
            Self::R8G8B8A8UNorm | Self::R32Float => Some(4),
            Self::R16UNorm => Some(2),
            Self::R8UNorm => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for DxgiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(v) => write!(f, "DXGI_FORMAT({v})"),
            known => write!(f, "{known:?}"),
        }
    }
}

/// `DDS_PIXELFORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelFormat {
    pub size: u32,
    pub flags: PixelFormatFlags,
    pub four_cc: FourCC,
    pub rgb_bit_count: u32,
    pub r_bit_mask: u32,
    pub g_bit_mask: u32,
    pub b_bit_mask: u32,
    pub a_bit_mask: u32,
}

impl PixelFormat {
    /// Serialized size in bytes.
    pub const SIZE: u32 = 32;
}

/// `DDS_HEADER`: the 124 bytes following the magic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Header {
    pub size: u32,
    pub flags: DdsFlags,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mipmap_count: u32,
    pub reserved1: [u32; 11],
    pub pixel_format: PixelFormat,
    pub caps: Caps,
    pub caps2: Caps2,
    pub caps3: u32,
    pub caps4: u32,
    pub reserved2: u32,
}

impl Header {
    /// Serialized size in bytes, excluding the magic.
    pub const SIZE: u32 = 124;

    /// Reads the magic and the header.
    ///
    /// # Errors
    ///
    /// [`IoError::InvalidFile`] on a wrong magic or structure size,
    /// [`IoError::Truncated`] if the stream ends early.
    pub fn read<R: Read>(r: &mut R) -> IoResult<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)
            .map_err(IoError::reading("DDS magic"))?;
        if magic != DDS_MAGIC {
            return Err(IoError::InvalidFile(format!(
                "bad DDS magic {:02x?}",
                magic
            )));
        }

        let mut fields = [0u32; 31];
        r.read_u32_into::<LittleEndian>(&mut fields)
            .map_err(IoError::reading("DDS header"))?;

        if fields[0] != Self::SIZE {
            return Err(IoError::InvalidFile(format!(
                "DDS header size {} (expected {})",
                fields[0],
                Self::SIZE
            )));
        }
        if fields[18] != PixelFormat::SIZE {
            return Err(IoError::InvalidFile(format!(
                "DDS pixel format size {} (expected {})",
                fields[18],
                PixelFormat::SIZE
            )));
        }

        let mut reserved1 = [0u32; 11];
        reserved1.copy_from_slice(&fields[7..18]);

        Ok(Self {
            size: fields[0],
            flags: DdsFlags::from_bits_retain(fields[1]),
            height: fields[2],
            width: fields[3],
            pitch_or_linear_size: fields[4],
            depth: fields[5],
            mipmap_count: fields[6],
            reserved1,
            pixel_format: PixelFormat {
                size: fields[18],
                flags: PixelFormatFlags::from_bits_retain(fields[19]),
                four_cc: FourCC(fields[20].to_le_bytes()),
                rgb_bit_count: fields[21],
                r_bit_mask: fields[22],
                g_bit_mask: fields[23],
                b_bit_mask: fields[24],
                a_bit_mask: fields[25],
            },
            caps: Caps::from_bits_retain(fields[26]),
            caps2: Caps2::from_bits_retain(fields[27]),
            caps3: fields[28],
            caps4: fields[29],
            reserved2: fields[30],
        })
    }

    /// Writes the magic and the header.
    pub fn write<W: Write>(&self, w: &mut W) -> IoResult<()> {
        w.write_all(&DDS_MAGIC)?;
        w.write_u32::<LittleEndian>(self.size)?;
        w.write_u32::<LittleEndian>(self.flags.bits())?;
        w.write_u32::<LittleEndian>(self.height)?;
        w.write_u32::<LittleEndian>(self.width)?;
        w.write_u32::<LittleEndian>(self.pitch_or_linear_size)?;
        w.write_u32::<LittleEndian>(self.depth)?;
        w.write_u32::<LittleEndian>(self.mipmap_count)?;
        for v in self.reserved1 {
            w.write_u32::<LittleEndian>(v)?;
        }
        let pf = &self.pixel_format;
        w.write_u32::<LittleEndian>(pf.size)?;
        w.write_u32::<LittleEndian>(pf.flags.bits())?;
        w.write_all(&pf.four_cc.0)?;
        w.write_u32::<LittleEndian>(pf.rgb_bit_count)?;
        w.write_u32::<LittleEndian>(pf.r_bit_mask)?;
        w.write_u32::<LittleEndian>(pf.g_bit_mask)?;
        w.write_u32::<LittleEndian>(pf.b_bit_mask)?;
        w.write_u32::<LittleEndian>(pf.a_bit_mask)?;
        w.write_u32::<LittleEndian>(self.caps.bits())?;
        w.write_u32::<LittleEndian>(self.caps2.bits())?;
        w.write_u32::<LittleEndian>(self.caps3)?;
        w.write_u32::<LittleEndian>(self.caps4)?;
        w.write_u32::<LittleEndian>(self.reserved2)?;
        Ok(())
    }

    /// Returns `true` when the pixel format announces a DXT10 extension.
    pub fn has_dxt10(&self) -> bool {
        self.pixel_format.flags.contains(PixelFormatFlags::FOURCC)
            && self.pixel_format.four_cc == FourCC::DX10
    }
}

/// `DDS_HEADER_DXT10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dxt10Header {
    pub dxgi_format: DxgiFormat,
    pub resource_dimension: u32,
    pub misc_flag: u32,
    pub array_size: u32,
    pub misc_flags2: u32,
}

impl Dxt10Header {
    /// Serialized size in bytes.
    pub const SIZE: u32 = 20;
    /// `D3D10_RESOURCE_DIMENSION_TEXTURE2D`.
    pub const DIMENSION_TEXTURE_2D: u32 = 3;
    /// `D3D10_RESOURCE_MISC_TEXTURECUBE`.
    pub const MISC_TEXTURE_CUBE: u32 = 0x4;

    /// Reads the 20-byte extension header.
    pub fn read<R: Read>(r: &mut R) -> IoResult<Self> {
        let mut fields = [0u32; 5];
        r.read_u32_into::<LittleEndian>(&mut fields)
            .map_err(IoError::reading("DXT10 header"))?;
        Ok(Self {
            dxgi_format: DxgiFormat::from_u32(fields[0]),
            resource_dimension: fields[1],
            misc_flag: fields[2],
            array_size: fields[3],
            misc_flags2: fields[4],
        })
    }

    /// Writes the 20-byte extension header.
    pub fn write<W: Write>(&self, w: &mut W) -> IoResult<()> {
        w.write_u32::<LittleEndian>(self.dxgi_format.to_u32())?;
        w.write_u32::<LittleEndian>(self.resource_dimension)?;
        w.write_u32::<LittleEndian>(self.misc_flag)?;
        w.write_u32::<LittleEndian>(self.array_size)?;
        w.write_u32::<LittleEndian>(self.misc_flags2)?;
        Ok(())
    }

    /// Returns `true` if the resource is flagged as a cube texture.
    pub fn is_cube(&self) -> bool {
        self.misc_flag & Self::MISC_TEXTURE_CUBE != 0
    }
}
