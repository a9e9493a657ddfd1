//! Registry of named types for dereferencing `Named` schema links.
//!
//! Decoding, encoding, and skipping all need to follow a `Named` reference
//! to its target definition. This registry collects every named type
//! (record, enum, fixed) reachable from a root schema, keyed by fully
//! qualified name.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::schema::Schema;

/// A registry of named types, keyed by fully qualified name.
#[derive(Debug, Clone, Default)]
pub struct Names {
    named: HashMap<String, Schema>,
}

impl Names {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry by extracting all named types reachable from a
    /// root schema.
    pub fn from_schema(schema: &Schema) -> Self {
        let mut names = Self::new();
        names.extract(schema);
        names
    }

    /// Register all named types from an additional schema.
    pub fn add_schema(&mut self, schema: &Schema) {
        self.extract(schema);
    }

    /// Get a named type from the registry.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.named.get(name)
    }

    /// Follow `Named` references until a concrete schema is reached.
    ///
    /// A schema that is not a `Named` reference is returned as-is. Named
    /// targets are themselves concrete definitions, so at most one hop is
    /// ever taken.
    pub fn deref<'a>(&'a self, schema: &'a Schema) -> Result<&'a Schema, SchemaError> {
        match schema {
            Schema::Named(name) => self
                .get(name)
                .ok_or_else(|| SchemaError::UnknownName(name.clone())),
            other => Ok(other),
        }
    }

    fn extract(&mut self, schema: &Schema) {
        match schema {
            Schema::Record(record) => {
                self.named.insert(record.fullname(), schema.clone());
                for field in &record.fields {
                    self.extract(&field.schema);
                }
            }
            Schema::Enum(e) => {
                self.named.insert(e.fullname(), schema.clone());
            }
            Schema::Fixed(f) => {
                self.named.insert(f.fullname(), schema.clone());
            }
            Schema::Array(items) => self.extract(items),
            Schema::Map(values) => self.extract(values),
            Schema::Union(branches) => {
                for branch in branches {
                    self.extract(branch);
                }
            }
            // Primitives and Named references define nothing.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, RecordSchema};

    fn tree_schema() -> Schema {
        Schema::Record(RecordSchema::new(
            "Tree",
            vec![
                FieldSchema::new("value", Schema::Long),
                FieldSchema::new(
                    "children",
                    Schema::Array(Box::new(Schema::Named("Tree".to_string()))),
                ),
            ],
        ))
    }

    #[test]
    fn test_from_schema_registers_recursive_record() {
        let schema = tree_schema();
        let names = Names::from_schema(&schema);
        assert!(names.get("Tree").is_some());
    }

    #[test]
    fn test_deref_follows_named_reference() {
        let schema = tree_schema();
        let names = Names::from_schema(&schema);
        let link = Schema::Named("Tree".to_string());
        let target = names.deref(&link).unwrap();
        assert!(matches!(target, Schema::Record(_)));
    }

    #[test]
    fn test_deref_unknown_name_errors() {
        let names = Names::new();
        let link = Schema::Named("Ghost".to_string());
        assert!(matches!(
            names.deref(&link),
            Err(SchemaError::UnknownName(_))
        ));
    }

    #[test]
    fn test_deref_concrete_schema_is_identity() {
        let names = Names::new();
        let schema = Schema::Int;
        let out = names.deref(&schema).unwrap();
        assert_eq!(out, &Schema::Int);
    }
}
