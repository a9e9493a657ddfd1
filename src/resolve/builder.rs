//! Construction of the resolved-schema graph from a writer/reader schema
//! pair.

use std::collections::HashMap;

use tracing::trace;

use crate::error::SchemaError;
use crate::resolve::graph::{
    compute_sizes, FieldAction, NodeId, NodeKind, Promotion, Resolver, ResolverNode, ScalarKind,
};
use crate::resolve::memoize::Memo;
use crate::schema::{Names, Schema};
use crate::value::{value_from_json, zero_value};

/// Default cap on the declared item count of one array or map block.
pub const DEFAULT_MAX_BLOCK_ITEMS: usize = crate::codec::MAX_BLOCK_ITEMS;

/// Configures and builds a [`Resolver`].
#[derive(Debug, Clone)]
pub struct ResolverBuilder {
    tolerate_missing_fields: bool,
    max_block_items: usize,
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverBuilder {
    /// New builder with default options: missing reader fields without a
    /// declared default are a build error, and block counts are capped at
    /// [`DEFAULT_MAX_BLOCK_ITEMS`].
    pub fn new() -> Self {
        ResolverBuilder {
            tolerate_missing_fields: false,
            max_block_items: DEFAULT_MAX_BLOCK_ITEMS,
        }
    }

    /// Allow reader record fields that the writer never encodes and that
    /// carry no declared default. Such fields decode to the zero value of
    /// their schema.
    pub fn with_missing_field_defaults(mut self, tolerate: bool) -> Self {
        self.tolerate_missing_fields = tolerate;
        self
    }

    /// Cap the declared item count of a single array or map block.
    /// Larger counts fail decoding with an allocation error before any
    /// storage is reserved.
    pub fn with_max_block_items(mut self, limit: usize) -> Self {
        self.max_block_items = limit;
        self
    }

    /// Build a resolver that reads data written under `writer` as values
    /// of `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Incompatible`] when the schemas cannot be
    /// reconciled, [`SchemaError::UnknownName`] for a dangling named-type
    /// reference, and [`SchemaError::InvalidSchema`] for a malformed
    /// default value.
    pub fn build(&self, writer: &Schema, reader: &Schema) -> Result<Resolver, SchemaError> {
        trace!(
            writer = writer.type_name(),
            reader = reader.type_name(),
            "building resolver"
        );
        let mut state = BuildState {
            nodes: Vec::new(),
            memo: Memo::new(),
            links: Vec::new(),
            writer_types: type_index(writer),
            reader_types: type_index(reader),
            reader_names: Names::from_schema(reader),
            tolerate_missing_fields: self.tolerate_missing_fields,
        };
        let root = state.resolve(writer, reader)?;
        let mut nodes = state.nodes;
        compute_sizes(&mut nodes, root, &state.links);
        Ok(Resolver {
            nodes,
            root,
            writer_names: Names::from_schema(writer),
            max_block_items: self.max_block_items,
        })
    }
}

/// Index of every named type in a schema tree, by fullname, borrowing the
/// tree's own nodes so schema identity is preserved.
fn type_index(schema: &Schema) -> HashMap<String, &Schema> {
    let mut index = HashMap::new();
    collect_types(schema, &mut index);
    index
}

fn collect_types<'s>(schema: &'s Schema, index: &mut HashMap<String, &'s Schema>) {
    match schema {
        Schema::Record(r) => {
            if index.insert(r.fullname(), schema).is_none() {
                for field in &r.fields {
                    collect_types(&field.schema, index);
                }
            }
        }
        Schema::Enum(e) => {
            index.insert(e.fullname(), schema);
        }
        Schema::Fixed(f) => {
            index.insert(f.fullname(), schema);
        }
        Schema::Array(items) => collect_types(items, index),
        Schema::Map(values) => collect_types(values, index),
        Schema::Union(branches) => {
            for branch in branches {
                collect_types(branch, index);
            }
        }
        _ => {}
    }
}

/// Short description of a schema for error messages.
fn describe(schema: &Schema) -> String {
    match schema {
        Schema::Union(branches) => {
            let kinds: Vec<&str> = branches.iter().map(Schema::type_name).collect();
            format!("union [{}]", kinds.join(", "))
        }
        other => match other.fullname() {
            Some(name) => format!("{} {}", other.type_name(), name),
            None => other.type_name().to_string(),
        },
    }
}

/// Cheap compatibility precheck used to pick a reader union branch before
/// committing to a full resolve. Matches on kind, permitted numeric
/// widening, and name for named types. Never sees a union or link on the
/// writer side.
fn readable_as(writer: &Schema, reader: &Schema) -> bool {
    match (writer, reader) {
        (Schema::Null, Schema::Null)
        | (Schema::Boolean, Schema::Boolean)
        | (Schema::Bytes, Schema::Bytes)
        | (Schema::String, Schema::String) => true,
        (Schema::Int, Schema::Int | Schema::Long | Schema::Float | Schema::Double) => true,
        (Schema::Long, Schema::Long | Schema::Float | Schema::Double) => true,
        (Schema::Float, Schema::Float | Schema::Double) => true,
        (Schema::Double, Schema::Double) => true,
        (Schema::Array(_), Schema::Array(_)) | (Schema::Map(_), Schema::Map(_)) => true,
        (Schema::Record(_) | Schema::Enum(_) | Schema::Fixed(_), _) => {
            writer.same_named_type(reader)
        }
        _ => false,
    }
}

struct BuildState<'s> {
    nodes: Vec<ResolverNode>,
    memo: Memo,
    links: Vec<NodeId>,
    writer_types: HashMap<String, &'s Schema>,
    reader_types: HashMap<String, &'s Schema>,
    reader_names: Names,
    tolerate_missing_fields: bool,
}

impl<'s> BuildState<'s> {
    /// Resolve a (writer, reader) pair to a node, memoizing the pair.
    fn resolve(&mut self, writer: &'s Schema, reader: &'s Schema) -> Result<NodeId, SchemaError> {
        let reader = self.deref_reader(reader)?;
        if let Some(id) = self.memo.get(writer, reader) {
            return Ok(id);
        }
        match writer {
            Schema::Named(name) => self.resolve_link(writer, name, reader),
            Schema::Union(branches) => self.resolve_writer_union(writer, branches, reader),
            _ => self.resolve_concrete(writer, reader),
        }
    }

    /// Follow reader-side named references to the type they name.
    fn deref_reader(&self, mut reader: &'s Schema) -> Result<&'s Schema, SchemaError> {
        while let Schema::Named(name) = reader {
            reader = self
                .reader_types
                .get(name.as_str())
                .copied()
                .ok_or_else(|| SchemaError::UnknownName(name.clone()))?;
        }
        Ok(reader)
    }

    fn push_placeholder(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ResolverNode::new(NodeKind::Link { target: None }));
        id
    }

    /// A writer-side named reference becomes a link node. The link is
    /// memoized before its target resolves, so the recursive reference
    /// inside the target finds the link instead of recursing forever.
    fn resolve_link(
        &mut self,
        writer: &'s Schema,
        name: &str,
        reader: &'s Schema,
    ) -> Result<NodeId, SchemaError> {
        let target_schema = self
            .writer_types
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownName(name.to_string()))?;
        let id = self.push_placeholder();
        self.memo.insert(writer, reader, id);
        self.links.push(id);
        match self.resolve(target_schema, reader) {
            Ok(target) => {
                self.nodes[id.index()].kind = NodeKind::Link {
                    target: Some(target),
                };
                Ok(id)
            }
            Err(e) => {
                self.memo.remove(writer, reader);
                Err(e)
            }
        }
    }

    /// A writer union decodes a branch discriminant first, so each branch
    /// resolves independently. A branch the reader cannot hold is a
    /// read-time error for data using that branch, not a build failure;
    /// only a union with no readable branch at all fails the build.
    fn resolve_writer_union(
        &mut self,
        writer: &'s Schema,
        branches: &'s [Schema],
        reader: &'s Schema,
    ) -> Result<NodeId, SchemaError> {
        let id = self.push_placeholder();
        self.memo.insert(writer, reader, id);
        let mut children = Vec::with_capacity(branches.len());
        for branch in branches {
            children.push(self.resolve(branch, reader).ok());
        }
        if children.iter().all(Option::is_none) {
            self.memo.remove(writer, reader);
            return Err(SchemaError::Incompatible(format!(
                "none of the writer's union branches can be stored into {}",
                describe(reader)
            )));
        }
        self.nodes[id.index()].kind = NodeKind::WriterUnion {
            branches: children,
            reader: describe(reader),
        };
        Ok(id)
    }

    /// Resolve a non-union, non-link writer against the reader. A union
    /// reader narrows to its first branch that passes the compatibility
    /// precheck; failures past the precheck are real and propagate.
    fn resolve_concrete(
        &mut self,
        writer: &'s Schema,
        reader: &'s Schema,
    ) -> Result<NodeId, SchemaError> {
        let (effective, union_branch) = match reader {
            Schema::Union(branches) => {
                let mut found = None;
                for (i, branch) in branches.iter().enumerate() {
                    let branch = self.deref_reader(branch)?;
                    if readable_as(writer, branch) {
                        found = Some((branch, Some(i)));
                        break;
                    }
                }
                found.ok_or_else(|| {
                    SchemaError::Incompatible(format!(
                        "cannot store a {} value into {}",
                        writer.type_name(),
                        describe(reader)
                    ))
                })?
            }
            _ => (reader, None),
        };
        let id = self.push_placeholder();
        self.memo.insert(writer, reader, id);
        match self.fill_node(writer, effective, id) {
            Ok(()) => {
                self.nodes[id.index()].reader_union_branch = union_branch;
                Ok(id)
            }
            Err(e) => {
                self.memo.remove(writer, reader);
                Err(e)
            }
        }
    }

    fn fill_node(
        &mut self,
        writer: &'s Schema,
        reader: &'s Schema,
        id: NodeId,
    ) -> Result<(), SchemaError> {
        let scalar = |kind, promotion| NodeKind::Scalar { kind, promotion };
        let kind = match (writer, reader) {
            (Schema::Null, Schema::Null) => scalar(ScalarKind::Null, None),
            (Schema::Boolean, Schema::Boolean) => scalar(ScalarKind::Boolean, None),
            (Schema::Int, Schema::Int) => scalar(ScalarKind::Int, None),
            (Schema::Int, Schema::Long) => scalar(ScalarKind::Int, Some(Promotion::IntToLong)),
            (Schema::Int, Schema::Float) => scalar(ScalarKind::Int, Some(Promotion::IntToFloat)),
            (Schema::Int, Schema::Double) => scalar(ScalarKind::Int, Some(Promotion::IntToDouble)),
            (Schema::Long, Schema::Long) => scalar(ScalarKind::Long, None),
            (Schema::Long, Schema::Float) => scalar(ScalarKind::Long, Some(Promotion::LongToFloat)),
            (Schema::Long, Schema::Double) => {
                scalar(ScalarKind::Long, Some(Promotion::LongToDouble))
            }
            (Schema::Float, Schema::Float) => scalar(ScalarKind::Float, None),
            (Schema::Float, Schema::Double) => {
                scalar(ScalarKind::Float, Some(Promotion::FloatToDouble))
            }
            (Schema::Double, Schema::Double) => scalar(ScalarKind::Double, None),
            (Schema::Bytes, Schema::Bytes) => scalar(ScalarKind::Bytes, None),
            (Schema::String, Schema::String) => scalar(ScalarKind::String, None),
            (Schema::Fixed(w), Schema::Fixed(_)) if writer.same_named_type(reader) => {
                NodeKind::Fixed { size: w.size }
            }
            (Schema::Enum(w), Schema::Enum(r)) if writer.same_named_type(reader) => {
                let mapping = w
                    .symbols
                    .iter()
                    .map(|symbol| r.symbol_index(symbol))
                    .collect();
                NodeKind::Enum {
                    mapping,
                    symbols: r.symbols.clone(),
                }
            }
            (Schema::Array(w), Schema::Array(r)) => NodeKind::Array {
                items: self.resolve(w, r)?,
            },
            (Schema::Map(w), Schema::Map(r)) => NodeKind::Map {
                values: self.resolve(w, r)?,
            },
            (Schema::Record(_), Schema::Record(_)) if writer.same_named_type(reader) => {
                self.fill_record(writer, reader)?
            }
            _ => {
                return Err(SchemaError::Incompatible(format!(
                    "cannot store a {} value into {}",
                    describe(writer),
                    describe(reader)
                )))
            }
        };
        self.nodes[id.index()].kind = kind;
        Ok(())
    }

    /// Reconcile two same-named records. Writer fields decode in the
    /// writer's order; fields the reader dropped are skipped over on the
    /// wire. Reader fields the writer never wrote take their declared
    /// default, or the schema's zero value in tolerant mode.
    fn fill_record(
        &mut self,
        writer: &'s Schema,
        reader: &'s Schema,
    ) -> Result<NodeKind, SchemaError> {
        let (Schema::Record(w), Schema::Record(r)) = (writer, reader) else {
            unreachable!("fill_record called with non-records");
        };
        let mut actions = Vec::with_capacity(w.fields.len());
        for wfield in &w.fields {
            match r.field_index(&wfield.name) {
                Some(reader_index) => {
                    let child = self
                        .resolve(&wfield.schema, &r.fields[reader_index].schema)
                        .map_err(|e| {
                            SchemaError::Incompatible(format!(
                                "field \"{}\" of record {}: {}",
                                wfield.name,
                                r.fullname(),
                                e
                            ))
                        })?;
                    actions.push(FieldAction::Read {
                        child,
                        reader_index,
                    });
                }
                None => actions.push(FieldAction::Skip {
                    schema: wfield.schema.clone(),
                }),
            }
        }
        let mut defaults = Vec::new();
        for (reader_index, rfield) in r.fields.iter().enumerate() {
            if w.field_index(&rfield.name).is_some() {
                continue;
            }
            let value = match &rfield.default {
                Some(json) => value_from_json(json, &rfield.schema, &self.reader_names)?,
                None if self.tolerate_missing_fields => {
                    zero_value(&rfield.schema, &self.reader_names)?
                }
                None => {
                    return Err(SchemaError::Incompatible(format!(
                        "reader field \"{}\" of record {} is not written and has no default",
                        rfield.name,
                        r.fullname()
                    )))
                }
            };
            defaults.push((reader_index, value));
        }
        Ok(NodeKind::Record {
            actions,
            reader_fields: r.fields.iter().map(|f| f.name.clone()).collect(),
            defaults,
        })
    }
}
