//! Modified UTF-8 decoding for constant-pool identifiers.
//!
//! Almost every identifier in a class file is plain ASCII, so decoding is gated
//! on a word-at-a-time scan for set high bits. Spans that pass the scan are
//! borrowed as-is; everything else goes through the full modified UTF-8 decoder
//! (two-byte NUL, surrogate pairs encoded as two three-byte sequences).

use std::borrow::Cow;

use crate::error::{Error, Result};

const HIGH_BITS: u64 = 0x8080_8080_8080_8080;

/// Returns `true` iff every byte of `buffer[offset..offset + length]` has its
/// high bit clear.
///
/// Out-of-range spans are reported as [`Error::SpanOutOfBounds`].
pub fn is_ascii_only(buffer: &[u8], offset: usize, length: usize) -> Result<bool> {
    Ok(is_ascii_span(span(buffer, offset, length)?))
}

/// Word-at-a-time ASCII check over an explicit span.
///
/// ORs `span.len() >> 3` native-endian 8-byte words together and then folds in
/// the trailing 0-7 bytes one at a time.
pub fn is_ascii_span(span: &[u8]) -> bool {
    let words = span.len() >> 3;
    let (head, tail) = span.split_at(words << 3);

    let mut acc = 0u64;
    for chunk in head.chunks_exact(8) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        acc |= u64::from_ne_bytes(word);
    }
    if acc & HIGH_BITS != 0 {
        return false;
    }

    let mut rest = 0u8;
    for byte in tail {
        rest |= byte;
    }
    rest & 0x80 == 0
}

/// Byte-by-byte reference implementation of [`is_ascii_span`].
pub fn is_ascii_only_scalar(span: &[u8]) -> bool {
    span.iter().all(|byte| byte & 0x80 == 0)
}

fn span(buffer: &[u8], offset: usize, length: usize) -> Result<&[u8]> {
    offset
        .checked_add(length)
        .and_then(|end| buffer.get(offset..end))
        .ok_or(Error::SpanOutOfBounds {
            offset,
            len: length,
            buffer_len: buffer.len(),
        })
}

/// Decode a modified UTF-8 constant.
///
/// Pure-ASCII input is returned borrowed.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<Cow<'_, str>> {
    if is_ascii_span(bytes) {
        return std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|err| Error::InvalidModifiedUtf8 {
                offset: err.valid_up_to(),
            });
    }
    decode_slow(bytes).map(Cow::Owned)
}

fn decode_slow(bytes: &[u8]) -> Result<String> {
    // (code unit, byte offset it started at)
    let mut units: Vec<(u16, usize)> = Vec::with_capacity(bytes.len());
    let mut idx = 0usize;

    while idx < bytes.len() {
        let start = idx;
        let b0 = bytes[idx];
        let unit = if b0 & 0x80 == 0 {
            idx += 1;
            u16::from(b0)
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = continuation(bytes, idx + 1, start)?;
            idx += 2;
            (u16::from(b0 & 0x1F) << 6) | b1
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = continuation(bytes, idx + 1, start)?;
            let b2 = continuation(bytes, idx + 2, start)?;
            idx += 3;
            (u16::from(b0 & 0x0F) << 12) | (b1 << 6) | b2
        } else {
            // Four-byte forms do not exist in modified UTF-8.
            return Err(Error::InvalidModifiedUtf8 { offset: start });
        };
        units.push((unit, start));
    }

    let mut out = String::with_capacity(units.len());
    let mut offsets = units.iter().map(|(_, offset)| *offset);
    for decoded in char::decode_utf16(units.iter().map(|(unit, _)| *unit)) {
        let offset = offsets.next().unwrap_or(bytes.len());
        match decoded {
            Ok(ch) => {
                if ch.len_utf16() == 2 {
                    // The low surrogate's offset is consumed along with the pair.
                    offsets.next();
                }
                out.push(ch);
            }
            Err(_) => return Err(Error::InvalidModifiedUtf8 { offset }),
        }
    }
    Ok(out)
}

fn continuation(bytes: &[u8], idx: usize, start: usize) -> Result<u16> {
    match bytes.get(idx) {
        Some(b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
        _ => Err(Error::InvalidModifiedUtf8 { offset: start }),
    }
}
