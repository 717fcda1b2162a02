//! BC7 block decoding, all eight modes.
//!
//! Bit layout, partition and anchor tables follow the Direct3D 11 BC7
//! format description:
//! <https://learn.microsoft.com/en-us/windows/win32/direct3d11/bc7-format-mode-reference>

use super::bc::Block;

/// Static description of one BC7 mode.
#[derive(Debug, Clone, Copy)]
struct Mode {
    subsets: usize,
    partition_bits: u32,
    rotation_bits: u32,
    index_select_bits: u32,
    color_bits: u32,
    alpha_bits: u32,
    /// One p-bit per endpoint.
    endpoint_pbits: bool,
    /// One p-bit per subset, shared by both endpoints.
    shared_pbits: bool,
    index_bits: u32,
    index2_bits: u32,
}

#[allow(clippy::too_many_arguments)]
const fn mode(
    subsets: usize,
    partition_bits: u32,
    rotation_bits: u32,
    index_select_bits: u32,
    color_bits: u32,
    alpha_bits: u32,
    endpoint_pbits: bool,
    shared_pbits: bool,
    index_bits: u32,
    index2_bits: u32,
) -> Mode {
    Mode {
        subsets,
        partition_bits,
        rotation_bits,
        index_select_bits,
        color_bits,
        alpha_bits,
        endpoint_pbits,
        shared_pbits,
        index_bits,
        index2_bits,
    }
}

const MODES: [Mode; 8] = [
    mode(3, 4, 0, 0, 4, 0, true, false, 3, 0),
    mode(2, 6, 0, 0, 6, 0, false, true, 3, 0),
    mode(3, 6, 0, 0, 5, 0, false, false, 2, 0),
    mode(2, 6, 0, 0, 7, 0, true, false, 2, 0),
    mode(1, 0, 2, 1, 5, 6, false, false, 2, 3),
    mode(1, 0, 2, 0, 7, 8, false, false, 2, 2),
    mode(1, 0, 0, 0, 7, 7, true, false, 4, 0),
    mode(2, 6, 0, 0, 5, 5, true, false, 2, 0),
];

const WEIGHTS2: [u32; 4] = [0, 21, 43, 64];
const WEIGHTS3: [u32; 8] = [0, 9, 18, 27, 37, 46, 55, 64];
const WEIGHTS4: [u32; 16] = [0, 4, 9, 13, 17, 21, 26, 30, 34, 38, 43, 47, 51, 55, 60, 64];

/// Two-subset partitions; bit `i` is the subset of texel `i`.
const PARTITIONS2: [u16; 64] = [
    0xcccc, 0x8888, 0xeeee, 0xecc8, 0xc880, 0xfeec, 0xfec8, 0xec80,
    0xc800, 0xffec, 0xfe80, 0xe800, 0xffe8, 0xff00, 0xfff0, 0xf000,
    0xf710, 0x008e, 0x7100, 0x08ce, 0x008c, 0x7310, 0x3100, 0x8cce,
    0x088c, 0x3110, 0x6666, 0x366c, 0x17e8, 0x0ff0, 0x718e, 0x399c,
    0xaaaa, 0xf0f0, 0x5a5a, 0x33cc, 0x3c3c, 0x55aa, 0x9696, 0xa55a,
    0x73ce, 0x13c8, 0x324c, 0x3bdc, 0x6996, 0xc33c, 0x9966, 0x0660,
    0x0272, 0x04e4, 0x4e40, 0x2720, 0xc936, 0x936c, 0x39c6, 0x639c,
    0x9336, 0x9cc6, 0x817e, 0xe718, 0xccf0, 0x0fcc, 0x7744, 0xee22,
];

/// Three-subset partitions; bits `2i..2i+2` are the subset of texel `i`.
const PARTITIONS3: [u32; 64] = [
    0xaa685050, 0x6a5a5040, 0x5a5a4200, 0x5450a0a8,
    0xa5a50000, 0xa0a05050, 0x5555a0a0, 0x5a5a5050,
    0xaa550000, 0xaa555500, 0xaaaa5500, 0x90909090,
    0x94949494, 0xa4a4a4a4, 0xa9a59450, 0x2a0a4250,
    0xa5945040, 0x0a425054, 0xa5a5a500, 0x55a0a0a0,
    0xa8a85454, 0x6a6a4040, 0xa4a45000, 0x1a1a0500,
    0x0050a4a4, 0xaaa59090, 0x14696914, 0x69691400,
    0xa08585a0, 0xaa821414, 0x50a4a450, 0x6a5a0200,
    0xa9a58000, 0x5090a0a8, 0xa8a09050, 0x24242424,
    0x00aa5500, 0x24924924, 0x24499224, 0x50a50a50,
    0x500aa550, 0xaaaa4444, 0x66660000, 0xa5a0a5a0,
    0x50a050a0, 0x69286928, 0x44aaaa44, 0x66666600,
    0xaa444444, 0x54a854a8, 0x95809580, 0x96969600,
    0xa85454a8, 0x80959580, 0xaa141414, 0x96960000,
    0xaaaa1414, 0xa05050a0, 0xa0a5a5a0, 0x96000000,
    0x40804080, 0xa9a8a9a8, 0xaaaaaa44, 0x2a4a5254,
];

/// Anchor texel of subset 1 in two-subset partitions.
const ANCHORS2: [u8; 64] = [
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15,
    15, 2, 8, 2, 2, 8, 8, 15, 2, 8, 2, 2, 8, 8, 2, 2,
    15, 15, 6, 8, 2, 8, 15, 15, 2, 8, 2, 2, 2, 15, 15, 6,
    6, 2, 6, 8, 15, 15, 2, 2, 15, 15, 15, 15, 15, 2, 2, 15,
];

/// Anchor texel of subset 1 in three-subset partitions.
const ANCHORS3_1: [u8; 64] = [
    3, 3, 15, 15, 8, 3, 15, 15, 8, 8, 6, 6, 6, 5, 3, 3,
    3, 3, 8, 15, 3, 3, 6, 10, 5, 8, 8, 6, 8, 5, 15, 15,
    8, 15, 3, 5, 6, 10, 8, 15, 15, 3, 15, 5, 15, 15, 15, 15,
    3, 15, 5, 5, 5, 8, 5, 10, 5, 10, 8, 13, 15, 12, 3, 3,
];

/// Anchor texel of subset 2 in three-subset partitions.
const ANCHORS3_2: [u8; 64] = [
    15, 8, 8, 3, 15, 15, 3, 8, 15, 15, 15, 15, 15, 15, 15, 8,
    15, 8, 15, 3, 15, 8, 15, 8, 3, 15, 6, 10, 15, 15, 10, 8,
    15, 3, 15, 10, 10, 8, 9, 10, 6, 15, 8, 15, 3, 6, 6, 8,
    15, 3, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 3, 15, 15, 8,
];

struct BitReader {
    bits: u128,
    pos: u32,
}

impl BitReader {
    fn read(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        let v = (self.bits >> self.pos) as u32 & ((1u32 << n) - 1);
        self.pos += n;
        v
    }
}

fn subset_of(m: &Mode, partition: usize, texel: usize) -> usize {
    match m.subsets {
        2 => ((PARTITIONS2[partition] >> texel) & 1) as usize,
        3 => ((PARTITIONS3[partition] >> (2 * texel)) & 3) as usize,
        _ => 0,
    }
}

fn is_anchor(m: &Mode, partition: usize, texel: usize) -> bool {
    texel == 0
        || match m.subsets {
            2 => ANCHORS2[partition] as usize == texel,
            3 => {
                ANCHORS3_1[partition] as usize == texel || ANCHORS3_2[partition] as usize == texel
            }
            _ => false,
        }
}

/// Expands a `prec`-bit value (4..=8) to 8 bits by bit replication.
fn unquantize(v: u32, prec: u32) -> u8 {
    let v = v << (8 - prec);
    (v | (v >> prec)) as u8
}

fn interpolate(e0: u8, e1: u8, index: u32, index_bits: u32) -> u8 {
    let w = match index_bits {
        2 => WEIGHTS2[index as usize & 3],
        3 => WEIGHTS3[index as usize & 7],
        _ => WEIGHTS4[index as usize & 15],
    };
    (((64 - w) * e0 as u32 + w * e1 as u32 + 32) >> 6) as u8
}

/// Decodes one 16-byte BC7 block into RGBA8 texels.
///
/// Blocks with a reserved mode (first byte zero) decode to transparent black.
pub fn decode_bc7(src: &[u8; 16]) -> Block {
    if src[0] == 0 {
        return [[0; 4]; 16];
    }
    let mode_index = src[0].trailing_zeros();
    let m = &MODES[mode_index as usize];
    let mut r = BitReader {
        bits: u128::from_le_bytes(*src),
        pos: mode_index + 1,
    };

    let partition = r.read(m.partition_bits) as usize;
    let rotation = r.read(m.rotation_bits);
    let index_select = r.read(m.index_select_bits);

    let endpoints = m.subsets * 2;
    let mut raw = [[0u32; 4]; 6];
    for ch in 0..3 {
        for ep in raw.iter_mut().take(endpoints) {
            ep[ch] = r.read(m.color_bits);
        }
    }
    if m.alpha_bits > 0 {
        for ep in raw.iter_mut().take(endpoints) {
            ep[3] = r.read(m.alpha_bits);
        }
    }

    let mut pbits = [0u32; 6];
    if m.endpoint_pbits {
        for p in pbits.iter_mut().take(endpoints) {
            *p = r.read(1);
        }
    } else if m.shared_pbits {
        for s in 0..m.subsets {
            let p = r.read(1);
            pbits[2 * s] = p;
            pbits[2 * s + 1] = p;
        }
    }
    let has_pbit = m.endpoint_pbits || m.shared_pbits;

    let mut colors = [[0u8; 4]; 6];
    for e in 0..endpoints {
        for ch in 0..4 {
            let bits = if ch < 3 { m.color_bits } else { m.alpha_bits };
            colors[e][ch] = if bits == 0 {
                255
            } else if has_pbit {
                unquantize((raw[e][ch] << 1) | pbits[e], bits + 1)
            } else {
                unquantize(raw[e][ch], bits)
            };
        }
    }

    let mut indices = [0u32; 16];
    for (texel, idx) in indices.iter_mut().enumerate() {
        let anchor = is_anchor(m, partition, texel) as u32;
        *idx = r.read(m.index_bits - anchor);
    }
    let mut indices2 = [0u32; 16];
    if m.index2_bits > 0 {
        for (texel, idx) in indices2.iter_mut().enumerate() {
            let anchor = (texel == 0) as u32;
            *idx = r.read(m.index2_bits - anchor);
        }
    }

    let mut out = [[0u8; 4]; 16];
    for (texel, px) in out.iter_mut().enumerate() {
        let s = subset_of(m, partition, texel);
        let (e0, e1) = (colors[2 * s], colors[2 * s + 1]);

        let (color_idx, color_bits, alpha_idx, alpha_bits) = if m.index2_bits == 0 {
            (indices[texel], m.index_bits, indices[texel], m.index_bits)
        } else if index_select == 0 {
            (indices[texel], m.index_bits, indices2[texel], m.index2_bits)
        } else {
            (indices2[texel], m.index2_bits, indices[texel], m.index_bits)
        };

        for ch in 0..3 {
            px[ch] = interpolate(e0[ch], e1[ch], color_idx, color_bits);
        }
        px[3] = interpolate(e0[3], e1[3], alpha_idx, alpha_bits);

        match rotation {
            1 => px.swap(0, 3),
            2 => px.swap(1, 3),
            3 => px.swap(2, 3),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BitWriter {
        bits: u128,
        pos: u32,
    }

    impl BitWriter {
        fn new() -> Self {
            Self { bits: 0, pos: 0 }
        }

        fn put(&mut self, v: u32, n: u32) -> &mut Self {
            self.bits |= (v as u128) << self.pos;
            self.pos += n;
            self
        }

        fn finish(&self) -> [u8; 16] {
            assert_eq!(self.pos, 128, "block must be exactly 128 bits");
            self.bits.to_le_bytes()
        }
    }

    /// Mode 6 block with one endpoint pair and explicit indices.
    fn mode6(e0: [u32; 4], e1: [u32; 4], p: [u32; 2], indices: [u32; 16]) -> [u8; 16] {
        let mut w = BitWriter::new();
        w.put(1 << 6, 7);
        for ch in 0..4 {
            w.put(e0[ch], 7).put(e1[ch], 7);
        }
        w.put(p[0], 1).put(p[1], 1);
        for (i, idx) in indices.iter().enumerate() {
            w.put(*idx, if i == 0 { 3 } else { 4 });
        }
        w.finish()
    }

    #[test]
    fn test_reserved_mode() {
        assert_eq!(decode_bc7(&[0u8; 16]), [[0u8; 4]; 16]);
    }

    #[test]
    fn test_mode6_solid() {
        let block = mode6([127, 0, 0, 127], [127, 0, 0, 127], [1, 1], [0; 16]);
        for px in decode_bc7(&block) {
            assert_eq!(px, [255, 1, 1, 255]);
        }
    }

    #[test]
    fn test_mode6_interpolation() {
        let mut idx = [0u32; 16];
        idx[0] = 7;
        idx[1] = 15;
        idx[2] = 8;
        let block = mode6([0, 0, 0, 127], [127, 0, 0, 127], [0, 1], idx);
        let out = decode_bc7(&block);
        // e0.r = 0, e1.r = (127 << 1 | 1) = 255
        assert_eq!(out[0][0], 120);
        assert_eq!(out[1][0], 255);
        assert_eq!(out[2][0], 135);
        assert_eq!(out[3][0], 0);
    }

    #[test]
    fn test_mode5_rotation() {
        let mut w = BitWriter::new();
        w.put(1 << 5, 6);
        w.put(1, 2); // rotation: swap A and R
        w.put(127, 7).put(127, 7); // R
        w.put(0, 7).put(0, 7); // G
        w.put(0, 7).put(0, 7); // B
        w.put(0, 8).put(0, 8); // A
        w.put(0, 31).put(0, 31);
        let out = decode_bc7(&w.finish());
        assert_eq!(out[5], [0, 0, 0, 255]);
    }

    #[test]
    fn test_mode4_index_select() {
        // isb = 1: color uses the 3-bit set, alpha the 2-bit set
        let mut w = BitWriter::new();
        w.put(1 << 4, 5);
        w.put(0, 2).put(1, 1);
        w.put(0, 5).put(31, 5); // R
        w.put(0, 5).put(0, 5); // G
        w.put(0, 5).put(0, 5); // B
        w.put(63, 6).put(0, 6); // A
        // 2-bit set: texel 0 has 1 bit
        w.put(1, 1);
        for _ in 1..16 {
            w.put(3, 2);
        }
        // 3-bit set: texel 0 has 2 bits
        w.put(3, 2);
        for _ in 1..16 {
            w.put(7, 3);
        }
        let out = decode_bc7(&w.finish());
        // texel 0: color index 3 of 3-bit weights (27), alpha index 1 of 2-bit (21)
        assert_eq!(out[0][0], ((27 * 255 + 32) >> 6) as u8);
        assert_eq!(out[0][3], (((64 - 21) * 255 + 32) >> 6) as u8);
        // other texels: full e1 color, full e1 alpha
        assert_eq!(out[9], [255, 0, 0, 0]);
    }

    #[test]
    fn test_two_subset_partition_split() {
        // mode 1, partition 13 (0xff00): top two rows subset 0, bottom subset 1
        let mut w = BitWriter::new();
        w.put(1 << 1, 2);
        w.put(13, 6);
        // endpoints: subset 0 black, subset 1 white (R, G, B for 4 endpoints)
        for _ in 0..3 {
            w.put(0, 6).put(0, 6).put(63, 6).put(63, 6);
        }
        w.put(0, 1).put(1, 1); // shared p-bits
        // 14 three-bit indices plus two anchors of two bits
        w.put(0, 46);
        let out = decode_bc7(&w.finish());
        assert_eq!(out[0], [0, 0, 0, 255]);
        assert_eq!(out[7], [0, 0, 0, 255]);
        assert_eq!(out[8], [255, 255, 255, 255]);
        assert_eq!(out[15], [255, 255, 255, 255]);
    }

    #[test]
    fn test_partition_tables_consistent() {
        for p in 0..64 {
            assert_eq!((PARTITIONS2[p] >> ANCHORS2[p]) & 1, 1, "partition {p}");
            assert_eq!((PARTITIONS3[p] >> (2 * ANCHORS3_1[p] as u32)) & 3, 1);
            assert_eq!((PARTITIONS3[p] >> (2 * ANCHORS3_2[p] as u32)) & 3, 2);
            assert_eq!(PARTITIONS2[p] & 1, 0);
            assert_eq!(PARTITIONS3[p] & 3, 0);
        }
    }

    #[test]
    fn test_unquantize() {
        assert_eq!(unquantize(31, 5), 255);
        assert_eq!(unquantize(0, 5), 0);
        assert_eq!(unquantize(16, 5), 132);
        assert_eq!(unquantize(200, 8), 200);
    }
}
