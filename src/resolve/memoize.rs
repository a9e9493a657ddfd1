//! Memoization of (writer, reader) schema pairs during resolver
//! construction.

use std::collections::HashMap;

use crate::resolve::graph::NodeId;
use crate::schema::Schema;

/// Key identifying one (writer, reader) schema pair by node identity.
///
/// Keys are the addresses of the schema nodes within the trees handed to
/// the builder, so two structurally identical but distinct nodes memoize
/// separately. This is what lets construction terminate on recursive
/// schemas: revisiting the same pair of tree positions is the recursion,
/// anything else is a fresh sub-problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MemoKey(usize, usize);

impl MemoKey {
    pub(crate) fn new(writer: &Schema, reader: &Schema) -> Self {
        MemoKey(writer as *const Schema as usize, reader as *const Schema as usize)
    }
}

/// Table mapping schema pairs to the resolver node built (or being built)
/// for them.
///
/// An entry is inserted *before* the pair's children are resolved, so a
/// recursive reference back to an in-progress pair finds the placeholder
/// instead of recursing forever. Entries for failed pairs are removed so
/// a later attempt in another context is not poisoned.
#[derive(Debug, Default)]
pub(crate) struct Memo {
    entries: HashMap<MemoKey, NodeId>,
}

impl Memo {
    pub(crate) fn new() -> Self {
        Memo {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, writer: &Schema, reader: &Schema) -> Option<NodeId> {
        self.entries.get(&MemoKey::new(writer, reader)).copied()
    }

    pub(crate) fn insert(&mut self, writer: &Schema, reader: &Schema, node: NodeId) {
        self.entries.insert(MemoKey::new(writer, reader), node);
    }

    pub(crate) fn remove(&mut self, writer: &Schema, reader: &Schema) {
        self.entries.remove(&MemoKey::new(writer, reader));
    }
}
