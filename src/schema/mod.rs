//! Avro schema types and the named-type registry.
//!
//! This module defines the schema type system (primitives, records, enums,
//! arrays, maps, unions, fixed, and `Named` back-references for recursive
//! types) together with [`Names`], the registry used to dereference named
//! types while encoding, decoding, and skipping values.

mod names;
mod types;

pub use names::Names;
pub use types::{EnumSchema, FieldSchema, FixedSchema, RecordSchema, Schema};
