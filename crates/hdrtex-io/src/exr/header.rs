//! OpenEXR header: magic, version, attribute list and typed header fields.
//!
//! Only single-part scanline files are recognized. Attributes other than the
//! required ones are skipped by their size prefix.

use std::fmt;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use hdrtex_core::ColorModel;
use tracing::{debug, warn};

use crate::detect::EXR_MAGIC;
use crate::{IoError, IoResult};

/// The only file version this codec reads and writes.
pub const VERSION: u8 = 2;

/// Longest attribute, type or channel name accepted, excluding the terminator.
pub const MAX_NAME_LEN: usize = 255;

/// Attributes every EXR header must carry.
pub const REQUIRED_ATTRIBUTES: [&str; 8] = [
    "channels",
    "compression",
    "dataWindow",
    "displayWindow",
    "lineOrder",
    "pixelAspectRatio",
    "screenWindowCenter",
    "screenWindowWidth",
];

// version field flag bits, as seen in bytes 5..8 of the file
const FLAG_TILED: u8 = 0x02;
const FLAG_LONG_NAMES: u8 = 0x04;
const FLAG_DEEP: u8 = 0x08;
const FLAG_MULTIPART: u8 = 0x10;

// ============================================================================
// Field types
// ============================================================================

/// Sample type of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    /// 32-bit unsigned integer.
    UInt,
    /// 16-bit float.
    Half,
    /// 32-bit float.
    Float,
}

impl PixelType {
    /// Parses the on-disk value.
    pub fn from_u32(v: u32) -> IoResult<Self> {
        match v {
            0 => Ok(PixelType::UInt),
            1 => Ok(PixelType::Half),
            2 => Ok(PixelType::Float),
            _ => Err(IoError::InvalidFile(format!("unknown channel pixel type {v}"))),
        }
    }

    /// On-disk value.
    pub const fn to_u32(self) -> u32 {
        match self {
            PixelType::UInt => 0,
            PixelType::Half => 1,
            PixelType::Float => 2,
        }
    }

    /// Bytes per sample.
    pub const fn size(self) -> usize {
        match self {
            PixelType::Half => 2,
            PixelType::UInt | PixelType::Float => 4,
        }
    }

    /// Color model a plane of this sample type decodes to.
    pub const fn color_model(self) -> ColorModel {
        match self {
            PixelType::UInt => ColorModel::Rgba32U,
            PixelType::Half => ColorModel::Rgba16F,
            PixelType::Float => ColorModel::Rgba32F,
        }
    }

    /// Sample type an HDR color model is written as.
    pub const fn for_model(model: ColorModel) -> Option<Self> {
        match model {
            ColorModel::Rgba32U => Some(PixelType::UInt),
            ColorModel::Rgba16F => Some(PixelType::Half),
            ColorModel::Rgba32F => Some(PixelType::Float),
            _ => None,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PixelType::UInt => "uint32",
            PixelType::Half => "float16",
            PixelType::Float => "float32",
        })
    }
}

/// Block compression scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    /// Uncompressed.
    None,
    /// Run length encoding.
    Rle,
    /// Deflate, one scanline per block.
    Zips,
    /// Deflate, 16 scanlines per block.
    #[default]
    Zip,
    /// PIZ wavelet.
    Piz,
    /// Pixar 24-bit deflate.
    Pxr24,
    /// B44.
    B44,
    /// B44 with flat-field optimization.
    B44a,
    /// DreamWorks lossy, 32 scanlines.
    Dwaa,
    /// DreamWorks lossy, 256 scanlines.
    Dwab,
}

impl Compression {
    /// Parses the on-disk value.
    pub fn from_u8(v: u8) -> IoResult<Self> {
        Ok(match v {
            0 => Compression::None,
            1 => Compression::Rle,
            2 => Compression::Zips,
            3 => Compression::Zip,
            4 => Compression::Piz,
            5 => Compression::Pxr24,
            6 => Compression::B44,
            7 => Compression::B44a,
            8 => Compression::Dwaa,
            9 => Compression::Dwab,
            _ => return Err(IoError::InvalidFile(format!("unknown compression {v}"))),
        })
    }

    /// On-disk value.
    pub const fn to_u8(self) -> u8 {
        match self {
            Compression::None => 0,
            Compression::Rle => 1,
            Compression::Zips => 2,
            Compression::Zip => 3,
            Compression::Piz => 4,
            Compression::Pxr24 => 5,
            Compression::B44 => 6,
            Compression::B44a => 7,
            Compression::Dwaa => 8,
            Compression::Dwab => 9,
        }
    }

    /// Scanlines stored per block.
    pub const fn line_count(self) -> u32 {
        match self {
            Compression::None | Compression::Rle | Compression::Zips => 1,
            Compression::Zip | Compression::Pxr24 => 16,
            Compression::Piz | Compression::B44 | Compression::B44a | Compression::Dwaa => 32,
            Compression::Dwab => 256,
        }
    }

    /// Whether blocks in this scheme can be compressed and decompressed here.
    pub const fn is_supported(self) -> bool {
        matches!(self, Compression::None | Compression::Zips | Compression::Zip)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::None => "no compression",
            Compression::Rle => "run length encoding",
            Compression::Zips => "zip (single scanline)",
            Compression::Zip => "zip (multi scanline)",
            Compression::Piz => "PIZ wavelet compression",
            Compression::Pxr24 => "Pixar 24 bit deflate",
            Compression::B44 => "B44",
            Compression::B44a => "B44A",
            Compression::Dwaa => "DreamWorks Animation 32 scanline",
            Compression::Dwab => "DreamWorks Animation 256 scanline",
        })
    }
}

/// Order of scanline blocks in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineOrder {
    /// Top to bottom.
    #[default]
    IncreasingY,
    /// Bottom to top.
    DecreasingY,
    /// Any order.
    RandomY,
}

impl LineOrder {
    /// Parses the on-disk value.
    pub fn from_u8(v: u8) -> IoResult<Self> {
        match v {
            0 => Ok(LineOrder::IncreasingY),
            1 => Ok(LineOrder::DecreasingY),
            2 => Ok(LineOrder::RandomY),
            _ => Err(IoError::InvalidFile(format!("unknown line order {v}"))),
        }
    }

    /// On-disk value.
    pub const fn to_u8(self) -> u8 {
        match self {
            LineOrder::IncreasingY => 0,
            LineOrder::DecreasingY => 1,
            LineOrder::RandomY => 2,
        }
    }
}

impl fmt::Display for LineOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineOrder::IncreasingY => "increasing y",
            LineOrder::DecreasingY => "decreasing y",
            LineOrder::RandomY => "random y",
        })
    }
}

/// Inclusive integer rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Box2i {
    /// Left column.
    pub x_min: i32,
    /// Top row.
    pub y_min: i32,
    /// Right column, inclusive.
    pub x_max: i32,
    /// Bottom row, inclusive.
    pub y_max: i32,
}

impl Box2i {
    /// Columns covered. Zero or negative when the box is empty.
    pub fn width(&self) -> i64 {
        self.x_max as i64 - self.x_min as i64 + 1
    }

    /// Rows covered. Zero or negative when the box is empty.
    pub fn height(&self) -> i64 {
        self.y_max as i64 - self.y_min as i64 + 1
    }

    fn read(r: &mut impl Read) -> std::io::Result<Self> {
        let mut v = [0i32; 4];
        r.read_i32_into::<LittleEndian>(&mut v)?;
        Ok(Self {
            x_min: v[0],
            y_min: v[1],
            x_max: v[2],
            y_max: v[3],
        })
    }

    fn to_bytes(self) -> Vec<u8> {
        [self.x_min, self.y_min, self.x_max, self.y_max]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }
}

/// One entry of the channel list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Channel name, `R`, `G`, `B` or `A` for the channels this codec maps.
    pub name: String,
    /// Sample type.
    pub pixel_type: PixelType,
    /// Perceptually linear hint.
    pub p_linear: u8,
    /// Horizontal subsampling.
    pub x_sampling: i32,
    /// Vertical subsampling.
    pub y_sampling: i32,
}

impl Channel {
    /// Full-resolution channel.
    pub fn new(name: impl Into<String>, pixel_type: PixelType) -> Self {
        Self {
            name: name.into(),
            pixel_type,
            p_linear: 0,
            x_sampling: 1,
            y_sampling: 1,
        }
    }

    /// RGBA slot the channel fills, by name.
    pub fn slot(&self) -> Option<usize> {
        match self.name.as_str() {
            "R" => Some(0),
            "G" => Some(1),
            "B" => Some(2),
            "A" => Some(3),
            _ => None,
        }
    }
}

// ============================================================================
// Header
// ============================================================================

/// Parsed single-part scanline header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Channels in file order (usually sorted by name).
    pub channels: Vec<Channel>,
    /// Block compression.
    pub compression: Compression,
    /// Pixels stored in the file.
    pub data_window: Box2i,
    /// Pixels meant to be shown.
    pub display_window: Box2i,
    /// Block order.
    pub line_order: LineOrder,
    /// Width over height of one pixel.
    pub pixel_aspect_ratio: f32,
    /// Screen window center.
    pub screen_window_center: [f32; 2],
    /// Screen window width.
    pub screen_window_width: f32,
}

impl Header {
    /// Header for a full-resolution image covering `data_window`.
    ///
    /// Display window equals the data window; aspect ratio and screen window
    /// width are 1, the screen window is centered at the origin.
    pub fn new(channels: Vec<Channel>, compression: Compression, data_window: Box2i) -> Self {
        Self {
            channels,
            compression,
            data_window,
            display_window: data_window,
            line_order: LineOrder::IncreasingY,
            pixel_aspect_ratio: 1.0,
            screen_window_center: [0.0, 0.0],
            screen_window_width: 1.0,
        }
    }

    /// Data window width in pixels.
    pub fn width(&self) -> usize {
        self.data_window.width().max(0) as usize
    }

    /// Data window height in pixels.
    pub fn height(&self) -> usize {
        self.data_window.height().max(0) as usize
    }

    /// Bytes of one pixel across all channels.
    pub fn pixel_size(&self) -> usize {
        self.channels.iter().map(|c| c.pixel_type.size()).sum()
    }

    /// Number of scanline blocks, and offset table entries.
    pub fn block_count(&self) -> usize {
        self.height().div_ceil(self.compression.line_count() as usize)
    }

    /// Color model of the first channel.
    pub fn color_model(&self) -> Option<ColorModel> {
        self.channels.first().map(|c| c.pixel_type.color_model())
    }

    /// Sample type shared by every channel.
    ///
    /// # Errors
    ///
    /// [`IoError::DecodeError`] if the header has no channels or a channel's
    /// type differs from the first.
    pub fn uniform_pixel_type(&self) -> IoResult<PixelType> {
        let first = self
            .channels
            .first()
            .ok_or_else(|| IoError::DecodeError("no channels".into()))?;
        for channel in &self.channels[1..] {
            if channel.pixel_type != first.pixel_type {
                return Err(IoError::DecodeError(format!(
                    "channel {} had pixel type {}, expected {}",
                    channel.name, channel.pixel_type, first.pixel_type
                )));
            }
        }
        Ok(first.pixel_type)
    }

    /// Reads magic, version and the attribute list.
    ///
    /// Stops right after the attribute terminator; the offset table follows.
    ///
    /// # Errors
    ///
    /// - [`IoError::InvalidFile`] for bad magic, version or attribute values
    /// - [`IoError::UnsupportedFormat`] for tiled, deep, multipart or
    ///   subsampled files
    /// - [`IoError::MissingAttributes`] naming every absent required attribute
    /// - [`IoError::Truncated`] if the stream ends early
    pub fn read<R: Read>(r: &mut R) -> IoResult<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)
            .map_err(IoError::reading("EXR magic"))?;
        if magic != EXR_MAGIC {
            return Err(IoError::InvalidFile(format!(
                "invalid EXR magic {}",
                u32::from_le_bytes(magic)
            )));
        }

        let mut version = [0u8; 4];
        r.read_exact(&mut version)
            .map_err(IoError::reading("EXR version"))?;
        if version[0] != VERSION {
            return Err(IoError::InvalidFile(format!(
                "unsupported EXR version {}",
                version[0]
            )));
        }
        check_flags(version[1])?;
        if version[2] != 0 || version[3] != 0 {
            return Err(IoError::InvalidFile(format!(
                "unsupported flags in EXR {:02x} {:02x} {:02x}",
                version[1], version[2], version[3]
            )));
        }

        let mut channels = None;
        let mut compression = None;
        let mut data_window = None;
        let mut display_window = None;
        let mut line_order = None;
        let mut pixel_aspect_ratio = None;
        let mut screen_window_center = None;
        let mut screen_window_width = None;

        loop {
            let name = read_name(r, "attribute name")?;
            if name.is_empty() {
                break;
            }
            let type_name = read_name(r, "attribute type")?;
            let size = r
                .read_u32::<LittleEndian>()
                .map_err(IoError::reading("attribute size"))?;
            let value = read_value(r, &name, size)?;
            let mut v = Cursor::new(value.as_slice());
            let short = IoError::reading(&name);

            match name.as_str() {
                "channels" => channels = Some(read_channels(&mut v)?),
                "compression" => {
                    compression = Some(Compression::from_u8(v.read_u8().map_err(short)?)?)
                }
                "dataWindow" => data_window = Some(Box2i::read(&mut v).map_err(short)?),
                "displayWindow" => display_window = Some(Box2i::read(&mut v).map_err(short)?),
                "lineOrder" => line_order = Some(LineOrder::from_u8(v.read_u8().map_err(short)?)?),
                "pixelAspectRatio" => {
                    pixel_aspect_ratio = Some(v.read_f32::<LittleEndian>().map_err(short)?)
                }
                "screenWindowCenter" => {
                    let mut c = [0f32; 2];
                    v.read_f32_into::<LittleEndian>(&mut c).map_err(short)?;
                    screen_window_center = Some(c);
                }
                "screenWindowWidth" => {
                    screen_window_width = Some(v.read_f32::<LittleEndian>().map_err(short)?)
                }
                _ => warn!(name = %name, type_name = %type_name, size, "skipping EXR attribute"),
            }
        }

        let present = [
            channels.is_some(),
            compression.is_some(),
            data_window.is_some(),
            display_window.is_some(),
            line_order.is_some(),
            pixel_aspect_ratio.is_some(),
            screen_window_center.is_some(),
            screen_window_width.is_some(),
        ];
        let missing: Vec<String> = REQUIRED_ATTRIBUTES
            .iter()
            .zip(present)
            .filter(|(_, p)| !p)
            .map(|(name, _)| name.to_string())
            .collect();

        let (
            Some(channels),
            Some(compression),
            Some(data_window),
            Some(display_window),
            Some(line_order),
            Some(pixel_aspect_ratio),
            Some(screen_window_center),
            Some(screen_window_width),
        ) = (
            channels,
            compression,
            data_window,
            display_window,
            line_order,
            pixel_aspect_ratio,
            screen_window_center,
            screen_window_width,
        )
        else {
            return Err(IoError::MissingAttributes(missing));
        };

        let header = Header {
            channels,
            compression,
            data_window,
            display_window,
            line_order,
            pixel_aspect_ratio,
            screen_window_center,
            screen_window_width,
        };
        header.validate()?;

        debug!(
            width = header.width(),
            height = header.height(),
            channels = header.channels.len(),
            compression = %header.compression,
            line_order = %header.line_order,
            "read EXR header"
        );
        Ok(header)
    }

    fn validate(&self) -> IoResult<()> {
        let dw = self.data_window;
        if dw.width() < 1 || dw.height() < 1 {
            return Err(IoError::InvalidFile(format!(
                "empty data window ({}, {}) - ({}, {})",
                dw.x_min, dw.y_min, dw.x_max, dw.y_max
            )));
        }
        if dw.x_max == i32::MAX || dw.y_max == i32::MAX {
            return Err(IoError::InvalidFile(format!(
                "data window edge ({}, {}) leaves no room for an exclusive bound",
                dw.x_max, dw.y_max
            )));
        }
        if dw.width() > i32::MAX as i64 || dw.height() > i32::MAX as i64 {
            return Err(hdrtex_core::Error::invalid_dimensions(
                i32::MAX,
                i32::MAX,
                "data window too large",
            )
            .into());
        }
        if self.channels.is_empty() {
            return Err(IoError::DecodeError("no channels".into()));
        }
        if let Some(c) = self
            .channels
            .iter()
            .find(|c| c.x_sampling != 1 || c.y_sampling != 1)
        {
            return Err(IoError::UnsupportedFormat(format!(
                "subsampled channel {} ({}x{})",
                c.name, c.x_sampling, c.y_sampling
            )));
        }
        Ok(())
    }

    /// Writes magic, version and the required attributes.
    pub fn write<W: Write>(&self, w: &mut W) -> IoResult<()> {
        w.write_all(&EXR_MAGIC)?;
        w.write_all(&[VERSION, 0, 0, 0])?;

        let mut chlist = Vec::new();
        for c in &self.channels {
            chlist.extend_from_slice(c.name.as_bytes());
            chlist.push(0);
            chlist.write_u32::<LittleEndian>(c.pixel_type.to_u32())?;
            chlist.extend_from_slice(&[c.p_linear, 0, 0, 0]);
            chlist.write_i32::<LittleEndian>(c.x_sampling)?;
            chlist.write_i32::<LittleEndian>(c.y_sampling)?;
        }
        chlist.push(0);

        let center: Vec<u8> = self
            .screen_window_center
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();

        write_attribute(w, "channels", "chlist", &chlist)?;
        write_attribute(w, "compression", "compression", &[self.compression.to_u8()])?;
        write_attribute(w, "dataWindow", "box2i", &self.data_window.to_bytes())?;
        write_attribute(w, "displayWindow", "box2i", &self.display_window.to_bytes())?;
        write_attribute(w, "lineOrder", "lineOrder", &[self.line_order.to_u8()])?;
        write_attribute(w, "pixelAspectRatio", "float", &self.pixel_aspect_ratio.to_le_bytes())?;
        write_attribute(w, "screenWindowCenter", "v2f", &center)?;
        write_attribute(w, "screenWindowWidth", "float", &self.screen_window_width.to_le_bytes())?;
        w.write_u8(0)?;
        Ok(())
    }
}

fn check_flags(flags: u8) -> IoResult<()> {
    let feature = if flags & FLAG_MULTIPART != 0 {
        "multipart"
    } else if flags & FLAG_DEEP != 0 {
        "deep data"
    } else if flags & FLAG_TILED != 0 {
        "tiled"
    } else if flags & FLAG_LONG_NAMES != 0 {
        "long attribute names"
    } else if flags != 0 {
        return Err(IoError::InvalidFile(format!(
            "unsupported flags in EXR {flags:02x}"
        )));
    } else {
        return Ok(());
    };
    Err(IoError::UnsupportedFormat(format!("{feature} EXR files")))
}

/// Reads a null-terminated name.
fn read_name<R: Read>(r: &mut R, what: &str) -> IoResult<String> {
    let mut bytes = Vec::new();
    loop {
        let b = r.read_u8().map_err(IoError::reading(what))?;
        if b == 0 {
            break;
        }
        if bytes.len() == MAX_NAME_LEN {
            return Err(IoError::InvalidFile(format!(
                "{what} longer than {MAX_NAME_LEN} bytes"
            )));
        }
        bytes.push(b);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_value<R: Read>(r: &mut R, name: &str, size: u32) -> IoResult<Vec<u8>> {
    let mut value = Vec::new();
    r.by_ref().take(size as u64).read_to_end(&mut value)?;
    if value.len() < size as usize {
        return Err(IoError::Truncated(format!("attribute {name}")));
    }
    Ok(value)
}

fn read_channels(v: &mut Cursor<&[u8]>) -> IoResult<Vec<Channel>> {
    let mut channels = Vec::with_capacity(4);
    loop {
        let name = read_name(v, "channel name")?;
        if name.is_empty() {
            break;
        }
        let short = IoError::reading("channel list");
        let pixel_type = PixelType::from_u32(v.read_u32::<LittleEndian>().map_err(short)?)?;
        let mut linear = [0u8; 4];
        v.read_exact(&mut linear)
            .map_err(IoError::reading("channel list"))?;
        let x_sampling = v
            .read_i32::<LittleEndian>()
            .map_err(IoError::reading("channel list"))?;
        let y_sampling = v
            .read_i32::<LittleEndian>()
            .map_err(IoError::reading("channel list"))?;
        channels.push(Channel {
            name,
            pixel_type,
            p_linear: linear[0],
            x_sampling,
            y_sampling,
        });
    }
    Ok(channels)
}

fn write_attribute<W: Write>(w: &mut W, name: &str, type_name: &str, value: &[u8]) -> IoResult<()> {
    w.write_all(name.as_bytes())?;
    w.write_u8(0)?;
    w.write_all(type_name.as_bytes())?;
    w.write_u8(0)?;
    w.write_u32::<LittleEndian>(value.len() as u32)?;
    w.write_all(value)?;
    Ok(())
}
