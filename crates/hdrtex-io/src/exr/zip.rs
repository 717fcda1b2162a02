//! ZIP and ZIPS block coding.
//!
//! Before deflating, the bytes of a block are split into even and odd
//! halves ([`reorder`]) and delta encoded with a bias of 128
//! ([`deconstruct`]). Decoding runs [`reconstruct`] then [`interleave`]
//! on the inflated bytes.

use crate::{IoError, IoResult};

/// zlib level used for written blocks.
pub const ZIP_LEVEL: u8 = 6;

/// Undoes the byte delta: `out[i] = out[i - 1] + in[i] - 128`.
pub fn reconstruct(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev = 0u8;
    for (i, &d) in data.iter().enumerate() {
        prev = if i == 0 {
            d
        } else {
            prev.wrapping_add(d).wrapping_sub(128)
        };
        out.push(prev);
    }
    out
}

/// Delta encodes bytes against their raw predecessor, biased by 128.
pub fn deconstruct(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    if let Some(&first) = data.first() {
        out.push(first);
    }
    for pair in data.windows(2) {
        out.push(pair[1].wrapping_sub(pair[0]).wrapping_add(128));
    }
    out
}

/// Merges the two halves back: the first `ceil(len / 2)` bytes land on
/// even indices, the rest on odd ones.
pub fn interleave(data: &[u8]) -> Vec<u8> {
    let (even, odd) = data.split_at(data.len().div_ceil(2));
    let mut out = Vec::with_capacity(data.len());
    for (i, &e) in even.iter().enumerate() {
        out.push(e);
        if let Some(&o) = odd.get(i) {
            out.push(o);
        }
    }
    out
}

/// Splits bytes into even-indexed then odd-indexed halves.
pub fn reorder(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    out.extend(data.iter().step_by(2));
    out.extend(data.iter().skip(1).step_by(2));
    out
}

/// Inflates a zlib stream and undoes the predictor and byte split.
///
/// # Errors
///
/// [`IoError::DecodeError`] if the stream is malformed or inflates to
/// anything other than `expected_size` bytes.
pub fn decompress(data: &[u8], expected_size: usize) -> IoResult<Vec<u8>> {
    let options = zune_inflate::DeflateOptions::default()
        .set_limit(expected_size)
        .set_size_hint(expected_size);
    let mut decoder = zune_inflate::DeflateDecoder::new_with_options(data, options);
    let inflated = decoder
        .decode_zlib()
        .map_err(|e| IoError::DecodeError(format!("zlib-compressed data malformed: {e:?}")))?;
    if inflated.len() != expected_size {
        return Err(IoError::DecodeError(format!(
            "block inflated to {} bytes, expected {expected_size}",
            inflated.len()
        )));
    }
    Ok(interleave(&reconstruct(&inflated)))
}

/// Splits, delta encodes and deflates a block.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let predicted = deconstruct(&reorder(data));
    miniz_oxide::deflate::compress_to_vec_zlib(&predicted, ZIP_LEVEL)
}
