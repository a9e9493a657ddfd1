//! Generic in-memory representation of decoded data.
//!
//! [`Value`] is the polymorphic container the codec decodes into and the
//! resolver writes through. It exposes scalar accessors plus structural
//! navigation (by index, by name, by union branch) over every schema kind.

use serde_json::Value as JsonValue;

use crate::error::SchemaError;
use crate::schema::{Names, Schema};

/// A generic value holding decoded data for any schema kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null value.
    #[default]
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Byte sequence.
    Bytes(Vec<u8>),
    /// Unicode string.
    String(String),
    /// Fixed-size byte array.
    Fixed(Vec<u8>),
    /// Enum symbol: index into the reader's symbol list, plus the symbol.
    Enum(usize, String),
    /// Array of values.
    Array(Vec<Value>),
    /// Map from string keys to values, in insertion order.
    Map(Vec<(String, Value)>),
    /// Record as (field name, field value) pairs, in schema order.
    Record(Vec<(String, Value)>),
    /// Union: selected branch index and the branch's value.
    Union(usize, Box<Value>),
}

impl Value {
    /// Human-readable name of the value's kind, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Fixed(_) => "fixed",
            Value::Enum(..) => "enum",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Union(..) => "union",
        }
    }

    /// Number of children: fields of a record, elements of an array,
    /// entries of a map. `None` for non-container kinds.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            Value::Record(fields) => Some(fields.len()),
            _ => None,
        }
    }

    /// True if this is a container with no children.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Get a child by index, with its name where children are named.
    pub fn get_by_index(&self, index: usize) -> Option<(&Value, Option<&str>)> {
        match self {
            Value::Array(items) => items.get(index).map(|v| (v, None)),
            Value::Map(entries) => entries.get(index).map(|(k, v)| (v, Some(k.as_str()))),
            Value::Record(fields) => fields.get(index).map(|(k, v)| (v, Some(k.as_str()))),
            _ => None,
        }
    }

    /// Get a child by name (record fields, map keys), with its index.
    pub fn get_by_name(&self, name: &str) -> Option<(&Value, usize)> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .position(|(k, _)| k == name)
                .map(|i| (&entries[i].1, i)),
            Value::Record(fields) => fields
                .iter()
                .position(|(k, _)| k == name)
                .map(|i| (&fields[i].1, i)),
            _ => None,
        }
    }

    /// Currently selected union branch, if this is a union.
    pub fn discriminant(&self) -> Option<usize> {
        match self {
            Value::Union(branch, _) => Some(*branch),
            _ => None,
        }
    }

    /// Value of the currently selected union branch, if this is a union.
    pub fn current_branch(&self) -> Option<&Value> {
        match self {
            Value::Union(_, inner) => Some(inner),
            _ => None,
        }
    }

    /// Select a union branch in place and return the branch value for
    /// writing. If the value is already a union with this discriminant the
    /// existing branch value is reused; otherwise the value becomes a union
    /// with a null branch value.
    pub fn set_branch(&mut self, branch: usize) -> &mut Value {
        if !matches!(self, Value::Union(current, _) if *current == branch) {
            *self = Value::Union(branch, Box::new(Value::Null));
        }
        match self {
            Value::Union(_, inner) => inner,
            _ => unreachable!(),
        }
    }

    /// Append a null element to an array and return it for writing.
    /// Turns a non-array value into an empty array first.
    pub fn append(&mut self) -> &mut Value {
        if !matches!(self, Value::Array(_)) {
            *self = Value::Array(Vec::new());
        }
        match self {
            Value::Array(items) => {
                items.push(Value::Null);
                let last = items.len() - 1;
                &mut items[last]
            }
            _ => unreachable!(),
        }
    }

    /// Add an entry to a map and return its value for writing.
    /// Turns a non-map value into an empty map first.
    pub fn add(&mut self, key: impl Into<String>) -> &mut Value {
        if !matches!(self, Value::Map(_)) {
            *self = Value::Map(Vec::new());
        }
        match self {
            Value::Map(entries) => {
                entries.push((key.into(), Value::Null));
                let last = entries.len() - 1;
                &mut entries[last].1
            }
            _ => unreachable!(),
        }
    }

    /// Reset the value to its zero state in place, retaining container
    /// allocations where possible so the storage can be reused.
    pub fn reset(&mut self) {
        match self {
            Value::Null => {}
            Value::Boolean(b) => *b = false,
            Value::Int(v) => *v = 0,
            Value::Long(v) => *v = 0,
            Value::Float(v) => *v = 0.0,
            Value::Double(v) => *v = 0.0,
            Value::Bytes(b) => b.clear(),
            Value::String(s) => s.clear(),
            Value::Fixed(b) => b.iter_mut().for_each(|byte| *byte = 0),
            Value::Enum(index, _) => *index = 0,
            Value::Array(items) => items.clear(),
            Value::Map(entries) => entries.clear(),
            Value::Record(fields) => {
                for (_, v) in fields.iter_mut() {
                    v.reset();
                }
            }
            Value::Union(_, inner) => inner.reset(),
        }
    }
}

/// Build the zero/default value for a schema.
///
/// Unions zero to branch 0, enums to symbol 0, fixed to all-zero bytes,
/// records to the zero value of every field. Fails for a recursive type
/// that offers no way out of the cycle (such a type has no finite value at
/// all).
pub fn zero_value(schema: &Schema, names: &Names) -> Result<Value, SchemaError> {
    zero_value_guarded(schema, names, &mut Vec::new())
}

fn zero_value_guarded(
    schema: &Schema,
    names: &Names,
    in_progress: &mut Vec<String>,
) -> Result<Value, SchemaError> {
    Ok(match schema {
        Schema::Null => Value::Null,
        Schema::Boolean => Value::Boolean(false),
        Schema::Int => Value::Int(0),
        Schema::Long => Value::Long(0),
        Schema::Float => Value::Float(0.0),
        Schema::Double => Value::Double(0.0),
        Schema::Bytes => Value::Bytes(Vec::new()),
        Schema::String => Value::String(String::new()),
        Schema::Fixed(f) => Value::Fixed(vec![0; f.size]),
        Schema::Enum(e) => {
            let symbol = e.symbols.first().ok_or_else(|| {
                SchemaError::InvalidSchema(format!("enum {} has no symbols", e.fullname()))
            })?;
            Value::Enum(0, symbol.clone())
        }
        Schema::Array(_) => Value::Array(Vec::new()),
        Schema::Map(_) => Value::Map(Vec::new()),
        Schema::Record(r) => {
            let fullname = r.fullname();
            if in_progress.contains(&fullname) {
                return Err(SchemaError::InvalidSchema(format!(
                    "recursive type {} has no finite zero value",
                    fullname
                )));
            }
            in_progress.push(fullname);
            let mut fields = Vec::with_capacity(r.fields.len());
            for field in &r.fields {
                let v = zero_value_guarded(&field.schema, names, in_progress)?;
                fields.push((field.name.clone(), v));
            }
            in_progress.pop();
            Value::Record(fields)
        }
        Schema::Union(branches) => {
            let first = branches.first().ok_or_else(|| {
                SchemaError::InvalidSchema("union has no branches".to_string())
            })?;
            Value::Union(0, Box::new(zero_value_guarded(first, names, in_progress)?))
        }
        Schema::Named(_) => {
            let target = names.deref(schema)?;
            zero_value_guarded(target, names, in_progress)?
        }
    })
}

/// Convert a JSON default value into a [`Value`] under a schema.
///
/// Used when tolerant-mode record resolution meets a reader field that is
/// absent from the writer but carries a declared default. Per the Avro
/// convention, a union default matches the union's first branch.
pub fn value_from_json(
    json: &JsonValue,
    schema: &Schema,
    names: &Names,
) -> Result<Value, SchemaError> {
    let bad = |what: &str| {
        SchemaError::InvalidSchema(format!(
            "default value {} does not match schema {}",
            what,
            schema.type_name()
        ))
    };

    Ok(match (json, schema) {
        (JsonValue::Null, Schema::Null) => Value::Null,
        (JsonValue::Bool(b), Schema::Boolean) => Value::Boolean(*b),
        (JsonValue::Number(n), Schema::Int) => {
            let v = n.as_i64().ok_or_else(|| bad("number"))?;
            let v = i32::try_from(v).map_err(|_| bad("out-of-range int"))?;
            Value::Int(v)
        }
        (JsonValue::Number(n), Schema::Long) => {
            Value::Long(n.as_i64().ok_or_else(|| bad("number"))?)
        }
        (JsonValue::Number(n), Schema::Float) => {
            Value::Float(n.as_f64().ok_or_else(|| bad("number"))? as f32)
        }
        (JsonValue::Number(n), Schema::Double) => {
            Value::Double(n.as_f64().ok_or_else(|| bad("number"))?)
        }
        (JsonValue::String(s), Schema::String) => Value::String(s.clone()),
        // Bytes and fixed defaults are ISO-8859-1 strings in schema JSON.
        (JsonValue::String(s), Schema::Bytes) => Value::Bytes(s.bytes().collect()),
        (JsonValue::String(s), Schema::Fixed(f)) => {
            let bytes: Vec<u8> = s.bytes().collect();
            if bytes.len() != f.size {
                return Err(bad("fixed of wrong size"));
            }
            Value::Fixed(bytes)
        }
        (JsonValue::String(s), Schema::Enum(e)) => {
            let index = e
                .symbol_index(s)
                .ok_or_else(|| bad("unknown enum symbol"))?;
            Value::Enum(index, s.clone())
        }
        (JsonValue::Array(arr), Schema::Array(items)) => {
            let values: Result<Vec<Value>, SchemaError> = arr
                .iter()
                .map(|item| value_from_json(item, items, names))
                .collect();
            Value::Array(values?)
        }
        (JsonValue::Object(obj), Schema::Map(values)) => {
            let entries: Result<Vec<(String, Value)>, SchemaError> = obj
                .iter()
                .map(|(k, v)| Ok((k.clone(), value_from_json(v, values, names)?)))
                .collect();
            Value::Map(entries?)
        }
        (JsonValue::Object(obj), Schema::Record(r)) => {
            let mut fields = Vec::with_capacity(r.fields.len());
            for field in &r.fields {
                let v = match obj.get(&field.name) {
                    Some(json) => value_from_json(json, &field.schema, names)?,
                    None => match &field.default {
                        Some(json) => value_from_json(json, &field.schema, names)?,
                        None => zero_value(&field.schema, names)?,
                    },
                };
                fields.push((field.name.clone(), v));
            }
            Value::Record(fields)
        }
        (json, Schema::Union(branches)) => {
            let first = branches
                .first()
                .ok_or_else(|| SchemaError::InvalidSchema("union has no branches".to_string()))?;
            Value::Union(0, Box::new(value_from_json(json, first, names)?))
        }
        (json, Schema::Named(_)) => {
            let target = names.deref(schema)?;
            value_from_json(json, target, names)?
        }
        _ => return Err(bad("value")),
    })
}
