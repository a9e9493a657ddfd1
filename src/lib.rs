//! Schema-driven binary serialization with writer/reader schema
//! resolution.
//!
//! Data is encoded under a *writer* schema and can later be decoded under
//! a different but compatible *reader* schema. The [`Resolver`] compiles
//! the reconciliation of the two schemas once; a [`ResolvedValue`] then
//! decodes any number of writer-encoded values directly into the reader's
//! shape, applying numeric widening, record field reordering, default
//! values, union branch mapping and enum symbol remapping on the fly.
//!
//! ```
//! use jetbridge::{FieldSchema, RecordSchema, Resolver, ResolvedValue, Schema, Value};
//! use jetbridge::{encode_value, Names};
//!
//! // The writer stored an int; the reader wants a long.
//! let writer = Schema::Record(RecordSchema::new(
//!     "Point",
//!     vec![FieldSchema::new("x", Schema::Int)],
//! ));
//! let reader = Schema::Record(RecordSchema::new(
//!     "Point",
//!     vec![FieldSchema::new("x", Schema::Long)],
//! ));
//!
//! let mut data = Vec::new();
//! let value = Value::Record(vec![("x".to_string(), Value::Int(7))]);
//! encode_value(&value, &writer, &Names::from_schema(&writer), &mut data).unwrap();
//!
//! let resolver = Resolver::new(&writer, &reader).unwrap();
//! let mut reading = ResolvedValue::new(&resolver);
//! let mut cursor: &[u8] = &data;
//! assert_eq!(
//!     reading.read(&mut cursor).unwrap(),
//!     &Value::Record(vec![("x".to_string(), Value::Long(7))])
//! );
//! ```

pub mod codec;
pub mod error;
pub mod resolve;
pub mod schema;
pub mod value;

pub use codec::{decode_value, encode_value, skip_value};
pub use error::{DecodeError, EncodeError, SchemaError};
pub use resolve::{ResolvedValue, Resolver, ResolverBuilder};
pub use schema::{EnumSchema, FieldSchema, FixedSchema, Names, RecordSchema, Schema};
pub use value::{zero_value, Value};
