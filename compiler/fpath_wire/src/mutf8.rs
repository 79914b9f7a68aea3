//! Modified UTF-8.
//!
//! The string payload uses the same variant as Java's `DataOutput.writeUTF`:
//!
//! - U+0000 is written as the two-byte sequence `C0 80`, so encoded strings
//!   never contain a zero byte.
//! - Supplementary characters (above U+FFFF) are split into a UTF-16
//!   surrogate pair and each surrogate is written as a three-byte sequence.
//! - Everything else matches standard UTF-8.

/// Decoding failure, carrying the offset of the offending byte
/// relative to the start of the payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Mutf8Error {
    pub offset: usize,
}

/// Number of bytes `s` occupies once encoded.
pub fn encoded_len(s: &str) -> usize {
    s.chars().map(char_len).sum()
}

/// Encoded width of a single character.
#[inline]
pub fn char_len(c: char) -> usize {
    match c as u32 {
        0 => 2,
        1..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        _ => 6,
    }
}

/// Append the encoding of `s` to `out`.
pub fn encode_into(s: &str, out: &mut Vec<u8>) {
    out.reserve(encoded_len(s));
    for c in s.chars() {
        let code = c as u32;
        match code {
            0 => out.extend_from_slice(&[0xC0, 0x80]),
            1..=0x7F => out.push(code as u8),
            0x80..=0x7FF => push_two(code, out),
            0x800..=0xFFFF => push_three(code, out),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    push_three(u32::from(*unit), out);
                }
            }
        }
    }
}

/// Encode `s` into a fresh buffer.
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(s));
    encode_into(s, &mut out);
    out
}

/// Decode a complete payload.
pub fn decode(bytes: &[u8]) -> Result<String, Mutf8Error> {
    // Fast path: pure ASCII without NUL is identical in both encodings.
    if bytes.iter().all(|&b| b != 0 && b < 0x80) {
        return String::from_utf8(bytes.to_vec()).map_err(|_| Mutf8Error { offset: 0 });
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            units.push(u16::from(b));
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = continuation(bytes, i + 1)?;
            units.push((u16::from(b & 0x1F) << 6) | u16::from(b2 & 0x3F));
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = continuation(bytes, i + 1)?;
            let b3 = continuation(bytes, i + 2)?;
            units.push(
                (u16::from(b & 0x0F) << 12) | (u16::from(b2 & 0x3F) << 6) | u16::from(b3 & 0x3F),
            );
            i += 3;
        } else {
            return Err(Mutf8Error { offset: i });
        }
    }

    // Unpaired surrogates are malformed; report the payload start since the
    // unit index no longer maps to a byte offset.
    String::from_utf16(&units).map_err(|_| Mutf8Error { offset: 0 })
}

fn continuation(bytes: &[u8], at: usize) -> Result<u8, Mutf8Error> {
    match bytes.get(at) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(b),
        _ => Err(Mutf8Error { offset: at }),
    }
}

#[inline]
fn push_two(code: u32, out: &mut Vec<u8>) {
    out.push(0xC0 | ((code >> 6) & 0x1F) as u8);
    out.push(0x80 | (code & 0x3F) as u8);
}

#[inline]
fn push_three(code: u32, out: &mut Vec<u8>) {
    out.push(0xE0 | ((code >> 12) & 0x0F) as u8);
    out.push(0x80 | ((code >> 6) & 0x3F) as u8);
    out.push(0x80 | (code & 0x3F) as u8);
}
