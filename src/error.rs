//! Error types for schema resolution and binary coding

use thiserror::Error;

/// Errors raised while building a resolver for a (writer, reader) schema pair.
///
/// Every variant is a build-time failure: once a resolver has been built
/// successfully, none of these can occur during reads.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The writer and reader schemas cannot be reconciled.
    #[error("Incompatible schemas: {0}")]
    Incompatible(String),
    /// A `Named` reference points at a type that was never defined.
    #[error("Unknown named type: {0}")]
    UnknownName(String),
    /// The schema itself is malformed (empty union, bad default value, ...).
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

/// Errors that can occur while decoding binary data.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("Unexpected end of input")]
    UnexpectedEof,
    /// Invalid varint encoding
    #[error("Invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// The data selects a writer union branch that has no compatible
    /// counterpart in the reader schema.
    #[error("Writer union branch {branch} is incompatible with reader schema {reader}")]
    IncompatibleBranch {
        /// Zero-based discriminant read from the wire.
        branch: usize,
        /// Type name of the reader schema the branch could not be stored into.
        reader: String,
    },
    /// A single array/map block claims more elements than the configured
    /// limit allows. Kept separate from `InvalidData` so callers can tell
    /// "bad data" from "would exhaust memory".
    #[error("Block claims {requested} elements, more than the limit of {limit}")]
    Allocation {
        /// Element count read from the wire.
        requested: usize,
        /// Configured `max_block_items` limit.
        limit: usize,
    },
}

/// Errors that can occur while encoding a value under a schema.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value's shape doesn't match the schema.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// A `Named` reference points at a type that was never defined.
    #[error("Unknown named type: {0}")]
    UnknownName(String),
    /// A union value selects a branch the schema doesn't have.
    #[error("Union branch {branch} out of range for {size}-branch union")]
    BranchOutOfRange {
        /// Branch selected by the value.
        branch: usize,
        /// Number of branches in the union schema.
        size: usize,
    },
}
