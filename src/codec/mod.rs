//! Binary wire-format codec.
//!
//! Implements the Avro-style binary encoding: zigzag varint integers,
//! little-endian IEEE 754 floats, length-prefixed bytes and strings, and
//! block-structured arrays and maps with a zero-count terminator.

mod decode;
mod encode;
pub mod varint;

pub use decode::{
    decode_block_count, decode_boolean, decode_bytes, decode_double, decode_enum_index,
    decode_fixed, decode_float, decode_int, decode_long, decode_null, decode_string,
    decode_union_branch, decode_value, skip_value, MAX_BLOCK_ITEMS,
};
pub use encode::encode_value;

pub(crate) use decode::decode_len;
