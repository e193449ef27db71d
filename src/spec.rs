//! The specification: root container and pipeline runner
//!
//! A `Specification` owns the node arena, the attribute schema registry, the
//! ordered processor list, and the log of processors run. The runner is
//! two-phase: every processor's `declare_attrs` completes before the first
//! `process` begins, so schema entries can be consumed across processor
//! boundaries. Errors abort the run; no partial result is valid.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::node::{Node, NodeArena, NodeId, Value};
use crate::processor::Processor;
use crate::schema::SchemaRegistry;

/// Kind name of the root node
pub const ROOT_KIND: &str = "spec";

/// Log entry for a processor that has started running
#[derive(Debug, Clone)]
pub struct ProcessorRun {
    pub name: String,
    pub started_at: DateTime<Utc>,
}

/// The root container for one pipeline run
pub struct Specification {
    arena: NodeArena,
    root: NodeId,
    schema: SchemaRegistry,
    /// The pipeline, in execution order; assembled by the caller
    pub processors: Vec<Box<dyn Processor>>,
    processors_run: Vec<ProcessorRun>,
    strict_types: bool,
}

impl std::fmt::Debug for Specification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Specification")
            .field("arena", &self.arena)
            .field("root", &self.root)
            .field("schema", &self.schema)
            .field(
                "processors",
                &self.processors.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("processors_run", &self.processors_run)
            .field("strict_types", &self.strict_types)
            .finish()
    }
}

impl Specification {
    pub fn new() -> Self {
        let mut arena = NodeArena::new();
        let mut schema = SchemaRegistry::new();
        schema.register_kind(ROOT_KIND);
        let root = arena.alloc(Node::new(ROOT_KIND));
        Self {
            arena,
            root,
            schema,
            processors: Vec::new(),
            processors_run: Vec::new(),
            strict_types: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.schema
    }

    /// Enforce declared attribute types on writes
    pub fn set_strict_types(&mut self, strict: bool) {
        self.strict_types = strict;
    }

    /// Allocate a node, registering its kind if new
    pub fn new_node(&mut self, kind: &str) -> NodeId {
        self.schema.register_kind(kind);
        self.arena.alloc(Node::new(kind))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.arena.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.arena.get_mut(id)
    }

    /// Read an attribute: the instance field if set, else the schema default
    /// for the node's kind
    pub fn attr(&self, id: NodeId, name: &str) -> Result<Value> {
        let node = self.arena.get(id);
        if let Some(value) = node.get(name) {
            return Ok(value.clone());
        }
        if let Some(decl) = self.schema.decl(node.kind(), name) {
            return Ok(decl.default.clone());
        }
        Err(PipelineError::AttributeNotFound {
            kind: node.kind().to_string(),
            attr: name.to_string(),
        })
    }

    /// Write an attribute. The field must be declared on the node's kind;
    /// in strict mode the value must also conform to the declared type.
    /// Node-valued writes update the child's parent link.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: Value) -> Result<()> {
        let kind = self.arena.get(id).kind().to_string();
        let ty = match self.schema.decl(&kind, name) {
            Some(decl) => decl.ty,
            None => {
                return Err(PipelineError::UndeclaredAttribute {
                    kind,
                    attr: name.to_string(),
                });
            }
        };
        if self.strict_types && !ty.conforms(&value) {
            return Err(PipelineError::TypeMismatch {
                kind,
                attr: name.to_string(),
                expected: ty.name(),
                actual: value.type_name(),
            });
        }
        if let Value::Node(child) = value {
            self.arena.get_mut(child).parent = Some(id);
        }
        self.arena.get_mut(id).set(name, value);
        Ok(())
    }

    /// Remove an attribute on behalf of `caller` (owner-only): the
    /// declaration is dropped and the field stripped from every instance of
    /// the kind and of kinds deriving from it
    pub fn remove_attr(&mut self, caller: &str, kind: &str, attr: &str) -> Result<()> {
        self.schema.remove_attr(caller, kind, attr)?;
        for idx in 0..self.arena.len() {
            let id = NodeId(idx);
            let node_kind = self.arena.get(id).kind().to_string();
            if self.schema.derives_from(&node_kind, kind) {
                self.arena.get_mut(id).remove(attr);
            }
        }
        Ok(())
    }

    /// Run the pipeline: `declare_attrs` for every processor in registration
    /// order, then `process` for every processor in the same order.
    ///
    /// The processor list is moved out of the specification while a
    /// processor holds `&mut` to it and restored afterwards; processors are
    /// configuration, not tree data, and are never traversed or copied.
    pub fn run_pipeline(&mut self) -> Result<()> {
        let mut processors = std::mem::take(&mut self.processors);
        let result = self.run_phases(&mut processors);
        self.processors = processors;
        result
    }

    fn run_phases(&mut self, processors: &mut [Box<dyn Processor>]) -> Result<()> {
        for processor in processors.iter_mut() {
            debug!(processor = processor.name(), "declaring attributes");
            processor.declare_attrs(self)?;
        }
        for processor in processors.iter_mut() {
            self.processors_run.push(ProcessorRun {
                name: processor.name().to_string(),
                started_at: Utc::now(),
            });
            debug!(processor = processor.name(), "processing");
            processor.process(self)?;
        }
        Ok(())
    }

    /// Log of processors started so far, in execution order
    pub fn processors_run(&self) -> &[ProcessorRun] {
        &self.processors_run
    }

    /// Position of a processor in the run log
    pub fn run_index(&self, name: &str) -> Option<usize> {
        self.processors_run.iter().position(|r| r.name == name)
    }

    /// Canonical JSON rendering of the whole tree
    pub fn to_json(&self) -> serde_json::Value {
        self.subtree_json(self.root)
    }

    /// Canonical JSON rendering of one subtree. A reference that would
    /// re-enter a node already on the rendering stack is emitted as null, so
    /// cyclic (pre-resolution) input still renders finitely.
    pub fn subtree_json(&self, id: NodeId) -> serde_json::Value {
        let mut on_stack = HashSet::new();
        self.node_json(id, &mut on_stack)
    }

    /// Whether two subtrees hold equal field values recursively, regardless
    /// of node identities
    pub fn structurally_equal(&self, a: NodeId, b: NodeId) -> bool {
        self.subtree_json(a) == self.subtree_json(b)
    }

    fn node_json(&self, id: NodeId, on_stack: &mut HashSet<NodeId>) -> serde_json::Value {
        if !on_stack.insert(id) {
            return serde_json::Value::Null;
        }
        let mut map = serde_json::Map::new();
        for (name, value) in self.arena.get(id).fields() {
            map.insert(name.to_string(), self.value_json(value, on_stack));
        }
        on_stack.remove(&id);
        serde_json::Value::Object(map)
    }

    fn value_json(&self, value: &Value, on_stack: &mut HashSet<NodeId>) -> serde_json::Value {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(items) => serde_json::Value::Array(
                items.iter().map(|v| self.value_json(v, on_stack)).collect(),
            ),
            Value::Node(id) => self.node_json(*id, on_stack),
        }
    }
}

impl Default for Specification {
    fn default() -> Self {
        Self::new()
    }
}
