//! Low-level byte reading utilities.
//!
//! Every read is bounds-checked against the buffer and fails with
//! [`ShpError::OutOfBounds`] instead of reading past its end.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::types::error::{Result, ShpError};

/// Borrow `len` bytes starting at `pos`.
pub fn slice(buf: &[u8], pos: usize, len: usize) -> Result<&[u8]> {
    pos.checked_add(len)
        .and_then(|end| buf.get(pos..end))
        .ok_or(ShpError::OutOfBounds {
            offset: pos,
            len,
            available: buf.len(),
        })
}

pub fn read_u8(buf: &[u8], pos: usize) -> Result<u8> {
    Ok(slice(buf, pos, 1)?[0])
}

pub fn read_u16_le(buf: &[u8], pos: usize) -> Result<u16> {
    Ok(LittleEndian::read_u16(slice(buf, pos, 2)?))
}

pub fn read_u32_le(buf: &[u8], pos: usize) -> Result<u32> {
    Ok(LittleEndian::read_u32(slice(buf, pos, 4)?))
}

pub fn read_u32_be(buf: &[u8], pos: usize) -> Result<u32> {
    Ok(BigEndian::read_u32(slice(buf, pos, 4)?))
}

pub fn read_f64_le(buf: &[u8], pos: usize) -> Result<f64> {
    Ok(LittleEndian::read_f64(slice(buf, pos, 8)?))
}

/// Read `buf[start..stop]` as single-byte characters, dropping NUL bytes.
pub fn read_string(buf: &[u8], start: usize, stop: usize) -> Result<String> {
    let bytes = slice(buf, start, stop.saturating_sub(start))?;
    Ok(bytes
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| b as char)
        .collect())
}

/// Decode `buf[start..stop]` as UTF-8 with sequences of one to three bytes.
///
/// A multi-byte sequence cut off by `stop` is an error, as is a four-byte lead.
/// Continuation bits are not validated.
pub fn read_utf8_string(buf: &[u8], start: usize, stop: usize) -> Result<String> {
    let bytes = slice(buf, start, stop.saturating_sub(start))?;
    let mut s = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as u32;
        let (code, width) = if c < 0x80 {
            (c, 1)
        } else if (0xC0..0xE0).contains(&c) {
            let c1 = *bytes.get(i + 1).ok_or_else(|| {
                ShpError::UnsupportedEncoding(format!(
                    "two-byte character truncated at offset {}",
                    start + i
                ))
            })? as u32;
            (((c & 0x1F) << 6) | (c1 & 0x3F), 2)
        } else if c >= 0xF0 {
            return Err(ShpError::UnsupportedEncoding(format!(
                "four-byte character at offset {}",
                start + i
            )));
        } else {
            if i + 2 >= bytes.len() {
                return Err(ShpError::UnsupportedEncoding(format!(
                    "three-byte character truncated at offset {}",
                    start + i
                )));
            }
            let c1 = bytes[i + 1] as u32;
            let c2 = bytes[i + 2] as u32;
            (((c & 0x0F) << 12) | ((c1 & 0x3F) << 6) | (c2 & 0x3F), 3)
        };
        s.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
        i += width;
    }

    Ok(s)
}
