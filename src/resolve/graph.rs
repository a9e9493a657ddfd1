//! Resolved-schema graph: the nodes a resolver executes at read time.
//!
//! Construction (in [`builder`](super::builder)) turns a writer/reader
//! schema pair into a graph of [`ResolverNode`]s held in one arena vector
//! and addressed by [`NodeId`]. Cycles introduced by recursive schemas
//! always pass through a [`NodeKind::Link`] node, so every other traversal
//! of the graph can recurse freely.

use std::mem;

use crate::schema::{Names, Schema};
use crate::value::Value;

/// Index of a node within a resolver's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Memory footprint of the value a node decodes into.
///
/// Sizes are assigned in a second pass after the graph is built, so that
/// recursive schemas get a finite answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceSize {
    /// Not yet computed.
    Unsized,
    /// Computed footprint in bytes.
    Sized(usize),
}

/// The writer-side scalar type a scalar node decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

/// A permitted widening from the writer's numeric type to the reader's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Promotion {
    IntToLong,
    IntToFloat,
    IntToDouble,
    LongToFloat,
    LongToDouble,
    FloatToDouble,
}

/// What to do with one writer-side record field.
#[derive(Debug)]
pub(crate) enum FieldAction {
    /// Decode the field through `child` into the reader field at
    /// `reader_index`.
    Read { child: NodeId, reader_index: usize },
    /// The reader has no such field: skip the encoded bytes under the
    /// writer's field schema.
    Skip { schema: Schema },
}

/// Behavior of one resolved node.
#[derive(Debug)]
pub(crate) enum NodeKind {
    Scalar {
        kind: ScalarKind,
        promotion: Option<Promotion>,
    },
    Enum {
        /// Writer symbol index to reader symbol index, `None` when the
        /// reader dropped the symbol.
        mapping: Vec<Option<usize>>,
        /// The reader's symbols, for materializing decoded values.
        symbols: Vec<String>,
    },
    Fixed {
        size: usize,
    },
    Array {
        items: NodeId,
    },
    Map {
        values: NodeId,
    },
    Record {
        /// Per writer field, in the writer's encoding order.
        actions: Vec<FieldAction>,
        /// The reader's field names, in the reader's order.
        reader_fields: Vec<String>,
        /// Values for reader fields the writer never encodes, as
        /// (reader field index, value) pairs.
        defaults: Vec<(usize, Value)>,
    },
    /// The writer encoded a union: one child per writer branch, `None`
    /// for branches that cannot be stored into the reader's schema.
    WriterUnion {
        branches: Vec<Option<NodeId>>,
        /// Description of the reader schema, for read-time branch errors.
        reader: String,
    },
    /// Indirection through which recursive schemas close their cycle.
    /// `target` is attached after the recursive resolve completes.
    Link {
        target: Option<NodeId>,
    },
}

/// One node of the resolved graph.
#[derive(Debug)]
pub(crate) struct ResolverNode {
    pub(crate) kind: NodeKind,
    /// When the reader's schema at this point is a union, the branch the
    /// decoded value is stored into.
    pub(crate) reader_union_branch: Option<usize>,
    pub(crate) instance_size: InstanceSize,
}

impl ResolverNode {
    pub(crate) fn new(kind: NodeKind) -> Self {
        ResolverNode {
            kind,
            reader_union_branch: None,
            instance_size: InstanceSize::Unsized,
        }
    }
}

/// A compiled writer-to-reader schema resolution.
///
/// Build one with [`ResolverBuilder`](crate::resolve::ResolverBuilder) or
/// the [`Resolver::new`] shorthand, then decode data written under the
/// writer schema through a
/// [`ResolvedValue`](crate::resolve::ResolvedValue).
#[derive(Debug)]
pub struct Resolver {
    pub(crate) nodes: Vec<ResolverNode>,
    pub(crate) root: NodeId,
    /// Named types of the writer schema, for skipping fields the reader
    /// dropped.
    pub(crate) writer_names: Names,
    pub(crate) max_block_items: usize,
}

impl Resolver {
    /// Build a resolver with default options.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Incompatible`](crate::error::SchemaError)
    /// when no value written under `writer` can be read under `reader`.
    pub fn new(
        writer: &Schema,
        reader: &Schema,
    ) -> Result<Self, crate::error::SchemaError> {
        crate::resolve::ResolverBuilder::new().build(writer, reader)
    }

    /// Memory footprint of one decoded instance of the reader schema, in
    /// bytes. Recursive schemas report the footprint with each recursive
    /// reference counted as a fixed-size indirection.
    pub fn instance_size(&self) -> usize {
        match self.node(self.root).instance_size {
            InstanceSize::Sized(n) => n,
            InstanceSize::Unsized => 0,
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &ResolverNode {
        &self.nodes[id.index()]
    }
}

/// Size of the per-value header every node pays for.
pub(crate) fn value_header_size() -> usize {
    mem::size_of::<Value>()
}

/// Assign instance sizes to every node reachable from `root`, then to the
/// target of every link.
///
/// Links themselves are costed as two headers (the indirection plus the
/// boxed slot it points at) without recursing, which is what makes the
/// sizes of recursive schemas finite. Sizing is idempotent, so shared
/// nodes and link targets already reached from the root are not
/// recomputed.
pub(crate) fn compute_sizes(nodes: &mut Vec<ResolverNode>, root: NodeId, links: &[NodeId]) {
    size_node(nodes, root);
    for &link in links {
        let target = match &nodes[link.index()].kind {
            NodeKind::Link {
                target: Some(target),
            } => *target,
            _ => continue,
        };
        size_node(nodes, target);
    }
}

enum SizeRule {
    Header,
    SumFields(Vec<NodeId>),
    MaxBranch(Vec<NodeId>),
    Link,
}

fn size_node(nodes: &mut Vec<ResolverNode>, id: NodeId) -> usize {
    if let InstanceSize::Sized(n) = nodes[id.index()].instance_size {
        return n;
    }
    let header = value_header_size();
    let rule = match &nodes[id.index()].kind {
        NodeKind::Scalar { .. }
        | NodeKind::Enum { .. }
        | NodeKind::Fixed { .. }
        | NodeKind::Array { .. }
        | NodeKind::Map { .. } => SizeRule::Header,
        NodeKind::Record { actions, .. } => SizeRule::SumFields(
            actions
                .iter()
                .filter_map(|action| match action {
                    FieldAction::Read { child, .. } => Some(*child),
                    FieldAction::Skip { .. } => None,
                })
                .collect(),
        ),
        NodeKind::WriterUnion { branches, .. } => {
            SizeRule::MaxBranch(branches.iter().flatten().copied().collect())
        }
        NodeKind::Link { .. } => SizeRule::Link,
    };
    let size = match rule {
        SizeRule::Header => header,
        SizeRule::SumFields(children) => {
            let mut size = header;
            for child in children {
                size += size_node(nodes, child);
            }
            size
        }
        SizeRule::MaxBranch(children) => {
            let mut max = 0;
            for child in children {
                max = max.max(size_node(nodes, child));
            }
            header + max
        }
        SizeRule::Link => 2 * header,
    };
    nodes[id.index()].instance_size = InstanceSize::Sized(size);
    size
}
