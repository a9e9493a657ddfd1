//! Read-through adapter that decodes writer-encoded data into
//! reader-shaped values.

use crate::codec::{
    decode_block_count, decode_boolean, decode_double, decode_enum_index, decode_float,
    decode_int, decode_len, decode_long, decode_union_branch, skip_value,
};
use crate::error::DecodeError;
use crate::resolve::graph::{FieldAction, NodeId, NodeKind, Promotion, Resolver, ScalarKind};
use crate::value::Value;

/// A reusable destination for decoding through a [`Resolver`].
///
/// Each call to [`read`](ResolvedValue::read) overwrites the held value in
/// place, reusing the storage the previous read allocated. Strings, byte
/// buffers, arrays and maps keep their capacity across reads, so decoding
/// a stream of similar values settles into zero fresh allocation.
#[derive(Debug)]
pub struct ResolvedValue<'r> {
    resolver: &'r Resolver,
    dest: Value,
}

impl<'r> ResolvedValue<'r> {
    /// New destination bound to a resolver. Holds null until the first
    /// read.
    pub fn new(resolver: &'r Resolver) -> Self {
        ResolvedValue {
            resolver,
            dest: Value::Null,
        }
    }

    /// Decode one value from the front of `data`, advancing the cursor,
    /// and return the decoded value.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`]; on error the held value is partially
    /// overwritten and should be reset before reuse.
    pub fn read(&mut self, data: &mut &[u8]) -> Result<&Value, DecodeError> {
        self.resolver
            .read_node(self.resolver.root, data, &mut self.dest)?;
        Ok(&self.dest)
    }

    /// The most recently decoded value.
    pub fn value(&self) -> &Value {
        &self.dest
    }

    /// Zero the held value in place, keeping container capacity.
    pub fn reset(&mut self) {
        self.dest.reset();
    }

    /// Consume the adapter, keeping the decoded value.
    pub fn into_value(self) -> Value {
        self.dest
    }
}

impl Resolver {
    fn read_node(
        &self,
        id: NodeId,
        data: &mut &[u8],
        dest: &mut Value,
    ) -> Result<(), DecodeError> {
        let node = self.node(id);
        // A node resolved against a union reader stores through the
        // selected branch.
        let dest = match node.reader_union_branch {
            Some(branch) => dest.set_branch(branch),
            None => dest,
        };
        match &node.kind {
            NodeKind::Scalar { kind, promotion } => read_scalar(*kind, *promotion, data, dest)?,
            NodeKind::Enum { mapping, symbols } => {
                let writer_index = decode_enum_index(data, mapping.len())?;
                let reader_index = mapping[writer_index].ok_or_else(|| {
                    DecodeError::InvalidData(format!(
                        "writer enum symbol {} is not a reader symbol",
                        writer_index
                    ))
                })?;
                match dest {
                    Value::Enum(index, symbol) => {
                        *index = reader_index;
                        symbol.clear();
                        symbol.push_str(&symbols[reader_index]);
                    }
                    _ => *dest = Value::Enum(reader_index, symbols[reader_index].clone()),
                }
            }
            NodeKind::Fixed { size } => {
                if *size > data.len() {
                    return Err(DecodeError::UnexpectedEof);
                }
                let (bytes, rest) = data.split_at(*size);
                match dest {
                    Value::Fixed(buf) => {
                        buf.clear();
                        buf.extend_from_slice(bytes);
                    }
                    _ => *dest = Value::Fixed(bytes.to_vec()),
                }
                *data = rest;
            }
            NodeKind::Array { items } => {
                if !matches!(dest, Value::Array(_)) {
                    *dest = Value::Array(Vec::new());
                }
                let Value::Array(out) = dest else { unreachable!() };
                let mut len = 0;
                loop {
                    let count = decode_block_count(data, self.max_block_items)?;
                    if count == 0 {
                        break;
                    }
                    out.reserve(count.saturating_sub(out.len() - len));
                    for _ in 0..count {
                        if len == out.len() {
                            out.push(Value::Null);
                        }
                        self.read_node(*items, data, &mut out[len])?;
                        len += 1;
                    }
                }
                out.truncate(len);
            }
            NodeKind::Map { values } => {
                if !matches!(dest, Value::Map(_)) {
                    *dest = Value::Map(Vec::new());
                }
                let Value::Map(entries) = dest else { unreachable!() };
                let mut len = 0;
                loop {
                    let count = decode_block_count(data, self.max_block_items)?;
                    if count == 0 {
                        break;
                    }
                    for _ in 0..count {
                        if len == entries.len() {
                            entries.push((String::new(), Value::Null));
                        }
                        let key = read_str(data)?;
                        entries[len].0.clear();
                        entries[len].0.push_str(key);
                        self.read_node(*values, data, &mut entries[len].1)?;
                        len += 1;
                    }
                }
                entries.truncate(len);
            }
            NodeKind::Record {
                actions,
                reader_fields,
                defaults,
            } => {
                let fields = match dest {
                    Value::Record(fields) if fields.len() == reader_fields.len() => fields,
                    _ => {
                        *dest = Value::Record(
                            reader_fields
                                .iter()
                                .map(|name| (name.clone(), Value::Null))
                                .collect(),
                        );
                        let Value::Record(fields) = dest else { unreachable!() };
                        fields
                    }
                };
                for (index, value) in defaults {
                    fields[*index].1 = value.clone();
                }
                for action in actions {
                    match action {
                        FieldAction::Read {
                            child,
                            reader_index,
                        } => self.read_node(*child, data, &mut fields[*reader_index].1)?,
                        FieldAction::Skip { schema } => {
                            skip_value(data, schema, &self.writer_names)?
                        }
                    }
                }
            }
            NodeKind::WriterUnion { branches, reader } => {
                let branch = decode_union_branch(data, branches.len())?;
                match branches[branch] {
                    Some(child) => self.read_node(child, data, dest)?,
                    None => {
                        return Err(DecodeError::IncompatibleBranch {
                            branch,
                            reader: reader.clone(),
                        })
                    }
                }
            }
            NodeKind::Link { target } => {
                let target = target.ok_or_else(|| {
                    DecodeError::InvalidData("link without a target".to_string())
                })?;
                self.read_node(target, data, dest)?;
            }
        }
        Ok(())
    }
}

fn read_str<'a>(data: &mut &'a [u8]) -> Result<&'a str, DecodeError> {
    let len = decode_len(data)?;
    let (bytes, rest) = data.split_at(len);
    let s = std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::InvalidData(format!("invalid utf-8 string: {}", e)))?;
    *data = rest;
    Ok(s)
}

fn read_scalar(
    kind: ScalarKind,
    promotion: Option<Promotion>,
    data: &mut &[u8],
    dest: &mut Value,
) -> Result<(), DecodeError> {
    match kind {
        ScalarKind::Null => *dest = Value::Null,
        ScalarKind::Boolean => *dest = Value::Boolean(decode_boolean(data)?),
        ScalarKind::Int => {
            let v = decode_int(data)?;
            *dest = match promotion {
                None => Value::Int(v),
                Some(Promotion::IntToLong) => Value::Long(i64::from(v)),
                Some(Promotion::IntToFloat) => Value::Float(v as f32),
                Some(Promotion::IntToDouble) => Value::Double(f64::from(v)),
                Some(other) => return Err(invalid_promotion(other)),
            };
        }
        ScalarKind::Long => {
            let v = decode_long(data)?;
            *dest = match promotion {
                None => Value::Long(v),
                Some(Promotion::LongToFloat) => Value::Float(v as f32),
                Some(Promotion::LongToDouble) => Value::Double(v as f64),
                Some(other) => return Err(invalid_promotion(other)),
            };
        }
        ScalarKind::Float => {
            let v = decode_float(data)?;
            *dest = match promotion {
                None => Value::Float(v),
                Some(Promotion::FloatToDouble) => Value::Double(f64::from(v)),
                Some(other) => return Err(invalid_promotion(other)),
            };
        }
        ScalarKind::Double => *dest = Value::Double(decode_double(data)?),
        ScalarKind::Bytes => {
            let len = decode_len(data)?;
            let (bytes, rest) = data.split_at(len);
            match dest {
                Value::Bytes(buf) => {
                    buf.clear();
                    buf.extend_from_slice(bytes);
                }
                _ => *dest = Value::Bytes(bytes.to_vec()),
            }
            *data = rest;
        }
        ScalarKind::String => {
            let s = read_str(data)?;
            match dest {
                Value::String(out) => {
                    out.clear();
                    out.push_str(s);
                }
                _ => *dest = Value::String(s.to_string()),
            }
        }
    }
    Ok(())
}

fn invalid_promotion(promotion: Promotion) -> DecodeError {
    DecodeError::InvalidData(format!(
        "promotion {:?} does not apply to the decoded type",
        promotion
    ))
}
