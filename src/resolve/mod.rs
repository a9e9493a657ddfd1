//! Writer-to-reader schema resolution.
//!
//! A [`Resolver`] is compiled once from a writer/reader schema pair and
//! reused for every value: it precomputes, per position in the writer
//! schema, how the encoded bytes map onto the reader's shape (numeric
//! widening, union branch selection, record field reordering and
//! skipping, enum symbol remapping). A [`ResolvedValue`] then decodes
//! writer-encoded bytes directly into reader-shaped values, reusing its
//! storage across reads.

mod builder;
mod graph;
mod memoize;
mod read;

pub use builder::{ResolverBuilder, DEFAULT_MAX_BLOCK_ITEMS};
pub use graph::{InstanceSize, Resolver};
pub use read::ResolvedValue;
