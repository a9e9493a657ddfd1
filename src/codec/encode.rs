//! Schema-driven binary encoding.

use crate::codec::varint::encode_zigzag;
use crate::error::EncodeError;
use crate::schema::{Names, Schema};
use crate::value::Value;

/// Encode `value` under `schema` onto the end of `out`.
///
/// `names` resolves references to named types that occur inside the
/// schema.
///
/// # Errors
///
/// Returns [`EncodeError::TypeMismatch`] when the value's shape does not
/// match the schema, [`EncodeError::BranchOutOfRange`] for a union value
/// whose discriminant exceeds the schema's branch count, and
/// [`EncodeError::UnknownName`] for a dangling named-type reference.
pub fn encode_value(
    value: &Value,
    schema: &Schema,
    names: &Names,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let mismatch = || {
        EncodeError::TypeMismatch(format!(
            "cannot encode {} value as {}",
            value.type_name(),
            schema.type_name()
        ))
    };

    match (value, schema) {
        (Value::Null, Schema::Null) => {}
        (Value::Boolean(b), Schema::Boolean) => out.push(u8::from(*b)),
        (Value::Int(v), Schema::Int) => encode_zigzag(i64::from(*v), out),
        (Value::Long(v), Schema::Long) => encode_zigzag(*v, out),
        (Value::Float(v), Schema::Float) => out.extend_from_slice(&v.to_le_bytes()),
        (Value::Double(v), Schema::Double) => out.extend_from_slice(&v.to_le_bytes()),
        (Value::Bytes(b), Schema::Bytes) => {
            encode_zigzag(b.len() as i64, out);
            out.extend_from_slice(b);
        }
        (Value::String(s), Schema::String) => {
            encode_zigzag(s.len() as i64, out);
            out.extend_from_slice(s.as_bytes());
        }
        (Value::Fixed(b), Schema::Fixed(f)) => {
            if b.len() != f.size {
                return Err(EncodeError::TypeMismatch(format!(
                    "fixed {} expects {} bytes, value has {}",
                    f.fullname(),
                    f.size,
                    b.len()
                )));
            }
            out.extend_from_slice(b);
        }
        (Value::Enum(index, _), Schema::Enum(e)) => {
            if *index >= e.symbols.len() {
                return Err(EncodeError::TypeMismatch(format!(
                    "enum index {} out of range for {} symbols of {}",
                    index,
                    e.symbols.len(),
                    e.fullname()
                )));
            }
            encode_zigzag(*index as i64, out);
        }
        (Value::Array(items), Schema::Array(item_schema)) => {
            if !items.is_empty() {
                encode_zigzag(items.len() as i64, out);
                for item in items {
                    encode_value(item, item_schema, names, out)?;
                }
            }
            encode_zigzag(0, out);
        }
        (Value::Map(entries), Schema::Map(value_schema)) => {
            if !entries.is_empty() {
                encode_zigzag(entries.len() as i64, out);
                for (key, entry) in entries {
                    encode_zigzag(key.len() as i64, out);
                    out.extend_from_slice(key.as_bytes());
                    encode_value(entry, value_schema, names, out)?;
                }
            }
            encode_zigzag(0, out);
        }
        (Value::Record(fields), Schema::Record(r)) => {
            if fields.len() != r.fields.len() {
                return Err(EncodeError::TypeMismatch(format!(
                    "record {} expects {} fields, value has {}",
                    r.fullname(),
                    r.fields.len(),
                    fields.len()
                )));
            }
            for (field_schema, (_, field_value)) in r.fields.iter().zip(fields) {
                encode_value(field_value, &field_schema.schema, names, out)?;
            }
        }
        (Value::Union(branch, inner), Schema::Union(branches)) => {
            let branch_schema =
                branches
                    .get(*branch)
                    .ok_or(EncodeError::BranchOutOfRange {
                        branch: *branch,
                        size: branches.len(),
                    })?;
            encode_zigzag(*branch as i64, out);
            encode_value(inner, branch_schema, names, out)?;
        }
        (value, Schema::Named(name)) => {
            let target = names
                .get(name)
                .ok_or_else(|| EncodeError::UnknownName(name.clone()))?;
            encode_value(value, target, names, out)?;
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}
