//! Variable-length zigzag integer encoding.
//!
//! Integers are encoded as zigzag-mapped unsigned values in little-endian
//! base-128 varint form: each byte carries 7 bits of payload, the high bit
//! flags a continuation. Zigzag maps small-magnitude signed values to
//! small unsigned values so they encode in few bytes.

use crate::error::DecodeError;

/// Decode an unsigned varint from the front of `data`, advancing the slice
/// past the consumed bytes.
///
/// # Errors
///
/// Returns [`DecodeError::UnexpectedEof`] if the input ends mid-varint and
/// [`DecodeError::InvalidVarint`] if the encoding exceeds 64 bits.
pub fn decode_varint(data: &mut &[u8]) -> Result<u64, DecodeError> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let (&byte, rest) = data.split_first().ok_or(DecodeError::UnexpectedEof)?;
        *data = rest;
        if shift >= 64 {
            return Err(DecodeError::InvalidVarint);
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// Decode a zigzag-encoded signed integer, advancing the slice.
///
/// # Errors
///
/// Same conditions as [`decode_varint`].
pub fn decode_zigzag(data: &mut &[u8]) -> Result<i64, DecodeError> {
    let encoded = decode_varint(data)?;
    Ok(((encoded >> 1) as i64) ^ -((encoded & 1) as i64))
}

/// Encode an unsigned varint onto the end of `out`.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Encode a signed integer in zigzag varint form onto the end of `out`.
pub fn encode_zigzag(value: i64, out: &mut Vec<u8>) {
    encode_varint(((value << 1) ^ (value >> 63)) as u64, out);
}
