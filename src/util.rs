//! Byte and text helpers shared by the format readers.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Read a big-endian u16 at `offset`, failing with `TruncatedInput` instead of
/// panicking when the slice is too short.
#[inline]
pub fn be_u16(data: &[u8], offset: usize) -> Result<u16> {
    let bytes = data
        .get(offset..offset.checked_add(2).ok_or(Error::TruncatedInput)?)
        .ok_or(Error::TruncatedInput)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read a big-endian u32 at `offset`.
#[inline]
pub fn be_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes = data
        .get(offset..offset.checked_add(4).ok_or(Error::TruncatedInput)?)
        .ok_or(Error::TruncatedInput)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Slice `[start, start + len)` out of `data`, or `TruncatedInput`.
#[inline]
pub fn slice(data: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    let end = start.checked_add(len).ok_or(Error::TruncatedInput)?;
    data.get(start..end).ok_or(Error::TruncatedInput)
}

/// Cut a fixed-width field at its first NUL byte.
pub fn trim_nul(bytes: &[u8]) -> &[u8] {
    match memchr::memchr(0, bytes) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Decode bytes to a string.
///
/// Tries UTF-8 first, then the hinted encoding label, then Windows-1252,
/// which old Mobipocket files use when they are not UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Decode a metadata value: drop NUL padding, decode, trim whitespace.
/// Returns `None` when nothing is left.
pub fn metadata_string(bytes: &[u8], hint_encoding: Option<&str>) -> Option<String> {
    let text = decode_text(trim_nul(bytes), hint_encoding);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
