//! Schema-driven binary decoding.
//!
//! All decoders take a `&mut &[u8]` cursor and advance it past the bytes
//! they consume, so callers can decode a sequence of values from one
//! buffer.

use crate::codec::varint::decode_zigzag;
use crate::error::DecodeError;
use crate::schema::{Names, Schema};
use crate::value::Value;

/// Upper bound on the declared item count of a single array or map block.
///
/// A corrupt or hostile block count is rejected before any storage is
/// reserved for it.
pub const MAX_BLOCK_ITEMS: usize = 1 << 28;

/// Decode a null value. Consumes no bytes.
pub fn decode_null(_data: &mut &[u8]) -> Result<(), DecodeError> {
    Ok(())
}

/// Decode a boolean from a single byte.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidData`] for any byte other than 0 or 1.
pub fn decode_boolean(data: &mut &[u8]) -> Result<bool, DecodeError> {
    let (&byte, rest) = data.split_first().ok_or(DecodeError::UnexpectedEof)?;
    *data = rest;
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DecodeError::InvalidData(format!(
            "invalid boolean byte {:#04x}",
            other
        ))),
    }
}

/// Decode a zigzag varint int.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidData`] if the decoded value does not fit
/// in 32 bits.
pub fn decode_int(data: &mut &[u8]) -> Result<i32, DecodeError> {
    let value = decode_zigzag(data)?;
    i32::try_from(value)
        .map_err(|_| DecodeError::InvalidData(format!("int value {} out of range", value)))
}

/// Decode a zigzag varint long.
pub fn decode_long(data: &mut &[u8]) -> Result<i64, DecodeError> {
    decode_zigzag(data)
}

/// Decode a little-endian IEEE 754 single-precision float.
pub fn decode_float(data: &mut &[u8]) -> Result<f32, DecodeError> {
    let (bytes, rest) = data
        .split_first_chunk::<4>()
        .ok_or(DecodeError::UnexpectedEof)?;
    *data = rest;
    Ok(f32::from_le_bytes(*bytes))
}

/// Decode a little-endian IEEE 754 double-precision float.
pub fn decode_double(data: &mut &[u8]) -> Result<f64, DecodeError> {
    let (bytes, rest) = data
        .split_first_chunk::<8>()
        .ok_or(DecodeError::UnexpectedEof)?;
    *data = rest;
    Ok(f64::from_le_bytes(*bytes))
}

pub(crate) fn decode_len(data: &mut &[u8]) -> Result<usize, DecodeError> {
    let len = decode_zigzag(data)?;
    let len = usize::try_from(len)
        .map_err(|_| DecodeError::InvalidData(format!("negative length {}", len)))?;
    if len > data.len() {
        return Err(DecodeError::UnexpectedEof);
    }
    Ok(len)
}

/// Decode a length-prefixed byte sequence.
pub fn decode_bytes(data: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = decode_len(data)?;
    let (bytes, rest) = data.split_at(len);
    let out = bytes.to_vec();
    *data = rest;
    Ok(out)
}

/// Decode a length-prefixed UTF-8 string.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidUtf8`] if the payload is not valid UTF-8.
pub fn decode_string(data: &mut &[u8]) -> Result<String, DecodeError> {
    Ok(String::from_utf8(decode_bytes(data)?)?)
}

/// Decode `size` raw bytes of a fixed.
pub fn decode_fixed(data: &mut &[u8], size: usize) -> Result<Vec<u8>, DecodeError> {
    if size > data.len() {
        return Err(DecodeError::UnexpectedEof);
    }
    let (bytes, rest) = data.split_at(size);
    let out = bytes.to_vec();
    *data = rest;
    Ok(out)
}

/// Decode the item count of one array or map block, advancing past the
/// optional byte-length that follows a negative count.
///
/// A zero count terminates the container. Counts above `limit` are
/// rejected before any storage is reserved for them.
pub fn decode_block_count(data: &mut &[u8], limit: usize) -> Result<usize, DecodeError> {
    let mut count = decode_zigzag(data)?;
    if count < 0 {
        // Negative count: the magnitude is the item count and a byte
        // length for the whole block follows. The byte length enables
        // skipping; decoders consume items one by one regardless.
        count = count
            .checked_neg()
            .ok_or_else(|| DecodeError::InvalidData("block count out of range".to_string()))?;
        decode_zigzag(data)?;
    }
    let count = usize::try_from(count)
        .map_err(|_| DecodeError::InvalidData("block count out of range".to_string()))?;
    if count > limit {
        return Err(DecodeError::Allocation {
            requested: count,
            limit,
        });
    }
    Ok(count)
}

/// Decode a complete value under `schema`.
///
/// `names` resolves references to named types that occur inside the
/// schema.
pub fn decode_value(
    data: &mut &[u8],
    schema: &Schema,
    names: &Names,
) -> Result<Value, DecodeError> {
    Ok(match schema {
        Schema::Null => {
            decode_null(data)?;
            Value::Null
        }
        Schema::Boolean => Value::Boolean(decode_boolean(data)?),
        Schema::Int => Value::Int(decode_int(data)?),
        Schema::Long => Value::Long(decode_long(data)?),
        Schema::Float => Value::Float(decode_float(data)?),
        Schema::Double => Value::Double(decode_double(data)?),
        Schema::Bytes => Value::Bytes(decode_bytes(data)?),
        Schema::String => Value::String(decode_string(data)?),
        Schema::Fixed(f) => Value::Fixed(decode_fixed(data, f.size)?),
        Schema::Enum(e) => {
            let index = decode_enum_index(data, e.symbols.len())?;
            Value::Enum(index, e.symbols[index].clone())
        }
        Schema::Array(items) => {
            let mut out = Vec::new();
            loop {
                let count = decode_block_count(data, MAX_BLOCK_ITEMS)?;
                if count == 0 {
                    break;
                }
                out.reserve(count);
                for _ in 0..count {
                    out.push(decode_value(data, items, names)?);
                }
            }
            Value::Array(out)
        }
        Schema::Map(values) => {
            let mut out = Vec::new();
            loop {
                let count = decode_block_count(data, MAX_BLOCK_ITEMS)?;
                if count == 0 {
                    break;
                }
                out.reserve(count);
                for _ in 0..count {
                    let key = decode_string(data)?;
                    out.push((key, decode_value(data, values, names)?));
                }
            }
            Value::Map(out)
        }
        Schema::Record(r) => {
            let mut fields = Vec::with_capacity(r.fields.len());
            for field in &r.fields {
                fields.push((field.name.clone(), decode_value(data, &field.schema, names)?));
            }
            Value::Record(fields)
        }
        Schema::Union(branches) => {
            let branch = decode_union_branch(data, branches.len())?;
            Value::Union(
                branch,
                Box::new(decode_value(data, &branches[branch], names)?),
            )
        }
        Schema::Named(_) => {
            let target = names
                .deref(schema)
                .map_err(|e| DecodeError::InvalidData(e.to_string()))?;
            decode_value(data, target, names)?
        }
    })
}

/// Decode an enum's symbol index, checked against the symbol count.
pub fn decode_enum_index(data: &mut &[u8], symbols: usize) -> Result<usize, DecodeError> {
    let index = decode_zigzag(data)?;
    usize::try_from(index)
        .ok()
        .filter(|&i| i < symbols)
        .ok_or_else(|| {
            DecodeError::InvalidData(format!(
                "enum index {} out of range for {} symbols",
                index, symbols
            ))
        })
}

/// Decode a union's branch discriminant, checked against the branch count.
pub fn decode_union_branch(data: &mut &[u8], branches: usize) -> Result<usize, DecodeError> {
    let branch = decode_zigzag(data)?;
    usize::try_from(branch)
        .ok()
        .filter(|&b| b < branches)
        .ok_or_else(|| {
            DecodeError::InvalidData(format!(
                "union branch {} out of range for {} branches",
                branch, branches
            ))
        })
}

/// Skip over a complete value under `schema` without materializing it.
pub fn skip_value(data: &mut &[u8], schema: &Schema, names: &Names) -> Result<(), DecodeError> {
    match schema {
        Schema::Null => {}
        Schema::Boolean => {
            decode_boolean(data)?;
        }
        Schema::Int => {
            decode_int(data)?;
        }
        Schema::Long => {
            decode_long(data)?;
        }
        Schema::Float => {
            decode_float(data)?;
        }
        Schema::Double => {
            decode_double(data)?;
        }
        Schema::Bytes | Schema::String => {
            let len = decode_len(data)?;
            *data = &data[len..];
        }
        Schema::Fixed(f) => {
            if f.size > data.len() {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[f.size..];
        }
        Schema::Enum(e) => {
            decode_enum_index(data, e.symbols.len())?;
        }
        Schema::Array(items) => loop {
            let count = decode_block_count(data, MAX_BLOCK_ITEMS)?;
            if count == 0 {
                break;
            }
            for _ in 0..count {
                skip_value(data, items, names)?;
            }
        },
        Schema::Map(values) => loop {
            let count = decode_block_count(data, MAX_BLOCK_ITEMS)?;
            if count == 0 {
                break;
            }
            for _ in 0..count {
                let len = decode_len(data)?;
                *data = &data[len..];
                skip_value(data, values, names)?;
            }
        },
        Schema::Record(r) => {
            for field in &r.fields {
                skip_value(data, &field.schema, names)?;
            }
        }
        Schema::Union(branches) => {
            let branch = decode_union_branch(data, branches.len())?;
            skip_value(data, &branches[branch], names)?;
        }
        Schema::Named(_) => {
            let target = names
                .deref(schema)
                .map_err(|e| DecodeError::InvalidData(e.to_string()))?;
            skip_value(data, target, names)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumSchema, FieldSchema, FixedSchema, RecordSchema};

    // ========================================================================
    // Scalar decoding tests
    // ========================================================================

    #[test]
    fn test_decode_boolean() {
        let mut data: &[u8] = &[0x01, 0x00, 0x02];
        assert!(decode_boolean(&mut data).unwrap());
        assert!(!decode_boolean(&mut data).unwrap());
        assert!(decode_boolean(&mut data).is_err());
    }

    #[test]
    fn test_decode_float_and_double() {
        let mut data: &[u8] = &1.25f32.to_le_bytes();
        assert_eq!(decode_float(&mut data).unwrap(), 1.25);

        let mut data: &[u8] = &(-7.5f64).to_le_bytes();
        assert_eq!(decode_double(&mut data).unwrap(), -7.5);
    }

    #[test]
    fn test_decode_string_and_bytes() {
        // len 3 ("abc"), then len 2 (0xca 0xfe)
        let mut data: &[u8] = &[0x06, b'a', b'b', b'c', 0x04, 0xca, 0xfe];
        assert_eq!(decode_string(&mut data).unwrap(), "abc");
        assert_eq!(decode_bytes(&mut data).unwrap(), vec![0xca, 0xfe]);
    }

    #[test]
    fn test_decode_string_length_past_end() {
        let mut data: &[u8] = &[0x20, b'x'];
        assert!(matches!(
            decode_string(&mut data),
            Err(DecodeError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_decode_int_out_of_range() {
        let mut encoded = Vec::new();
        crate::codec::varint::encode_zigzag(i64::from(i32::MAX) + 1, &mut encoded);
        let mut data: &[u8] = &encoded;
        assert!(decode_int(&mut data).is_err());
    }

    // ========================================================================
    // Container decoding tests
    // ========================================================================

    #[test]
    fn test_decode_array_with_blocks() {
        // Two blocks of one int each, then terminator.
        let mut data: &[u8] = &[0x02, 0x02, 0x02, 0x04, 0x00];
        let names = Names::new();
        let value = decode_value(&mut data, &Schema::Array(Box::new(Schema::Int)), &names).unwrap();
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(2)]));
        assert!(data.is_empty());
    }

    #[test]
    fn test_decode_array_negative_block_count() {
        // Count -2 (so byte length follows), 2 bytes of items, terminator.
        let mut data: &[u8] = &[0x03, 0x04, 0x02, 0x04, 0x00];
        let names = Names::new();
        let value = decode_value(&mut data, &Schema::Array(Box::new(Schema::Int)), &names).unwrap();
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_decode_map() {
        let mut data = Vec::new();
        crate::codec::varint::encode_zigzag(1, &mut data);
        crate::codec::varint::encode_zigzag(1, &mut data); // key length
        data.push(b'k');
        data.push(0x01); // boolean true
        data.push(0x00); // terminator
        let mut cursor: &[u8] = &data;
        let names = Names::new();
        let value =
            decode_value(&mut cursor, &Schema::Map(Box::new(Schema::Boolean)), &names).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![("k".to_string(), Value::Boolean(true))])
        );
    }

    #[test]
    fn test_decode_block_count_guard() {
        let mut data = Vec::new();
        crate::codec::varint::encode_zigzag((MAX_BLOCK_ITEMS as i64) + 1, &mut data);
        let mut cursor: &[u8] = &data;
        assert!(matches!(
            decode_block_count(&mut cursor, MAX_BLOCK_ITEMS),
            Err(DecodeError::Allocation { .. })
        ));
    }

    #[test]
    fn test_decode_record_and_union() {
        let schema = Schema::Record(RecordSchema::new(
            "Pair",
            vec![
                FieldSchema::new("a", Schema::Long),
                FieldSchema::new(
                    "b",
                    Schema::Union(vec![Schema::Null, Schema::String]),
                ),
            ],
        ));
        // a = 10, b = branch 1 "hi"
        let mut data: &[u8] = &[0x14, 0x02, 0x04, b'h', b'i'];
        let names = Names::new();
        let value = decode_value(&mut data, &schema, &names).unwrap();
        assert_eq!(
            value,
            Value::Record(vec![
                ("a".to_string(), Value::Long(10)),
                (
                    "b".to_string(),
                    Value::Union(1, Box::new(Value::String("hi".to_string())))
                ),
            ])
        );
    }

    #[test]
    fn test_decode_union_branch_out_of_range() {
        let schema = Schema::Union(vec![Schema::Null, Schema::Int]);
        let mut data: &[u8] = &[0x04];
        let names = Names::new();
        assert!(decode_value(&mut data, &schema, &names).is_err());
    }

    #[test]
    fn test_decode_enum_index_out_of_range() {
        let schema = Schema::Enum(EnumSchema::new("E", vec!["A".into(), "B".into()]));
        let mut data: &[u8] = &[0x04];
        let names = Names::new();
        assert!(decode_value(&mut data, &schema, &names).is_err());
    }

    // ========================================================================
    // Skipping tests
    // ========================================================================

    #[test]
    fn test_skip_scalar_leaves_rest() {
        let names = Names::new();
        let mut data: &[u8] = &[0x14, 0xff];
        skip_value(&mut data, &Schema::Long, &names).unwrap();
        assert_eq!(data, &[0xff]);
    }

    #[test]
    fn test_skip_nested_record() {
        let schema = Schema::Record(RecordSchema::new(
            "R",
            vec![
                FieldSchema::new("s", Schema::String),
                FieldSchema::new("f", Schema::Fixed(FixedSchema::new("f2", 2))),
            ],
        ));
        let mut data: &[u8] = &[0x02, b'x', 0xaa, 0xbb, 0x99];
        let names = Names::new();
        skip_value(&mut data, &schema, &names).unwrap();
        assert_eq!(data, &[0x99]);
    }

    #[test]
    fn test_skip_array_negative_block() {
        let mut data: &[u8] = &[0x03, 0x04, 0x02, 0x04, 0x00, 0x77];
        let names = Names::new();
        skip_value(&mut data, &Schema::Array(Box::new(Schema::Int)), &names).unwrap();
        assert_eq!(data, &[0x77]);
    }
}
