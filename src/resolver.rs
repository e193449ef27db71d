//! Reference resolution: aliases become independent copies
//!
//! A loaded tree may hold the same node at several locations (a reusable
//! sub-block referenced from multiple parents). Downstream consumers assume
//! a strict tree, so this pass walks the specification depth-first in field
//! order and gives every location after the first its own deep copy. Nodes
//! held at exactly one location are left untouched.
//!
//! Cycles cannot survive in a finite strict tree: a deep copy severs any
//! back-edge that would re-enter a node already being copied, emitting null
//! at the severed position and a debug diagnostic.

use std::collections::HashSet;
use tracing::debug;

use crate::analysis;
use crate::error::Result;
use crate::node::{Node, NodeId, Value};
use crate::processor::Processor;
use crate::spec::Specification;

/// Rewrites the tree so every node is held at exactly one location.
///
/// The first location to reach a node keeps the original; every later
/// location receives a fresh, structurally equal copy. After the pass, every
/// node's parent link names its unique container.
#[derive(Debug, Default)]
pub struct ReferenceResolver;

impl ReferenceResolver {
    pub fn new() -> Self {
        Self
    }

    /// Visit one value. `container` is the node that will hold the result,
    /// or none at the root; the holder owns the parent link, so a node's own
    /// parent stays detached until its container claims it.
    fn visit(
        &self,
        spec: &mut Specification,
        value: Value,
        seen: &mut HashSet<NodeId>,
        container: Option<NodeId>,
    ) -> Value {
        match value {
            Value::Node(id) => {
                // Second or later encounter of this identity: this location
                // is an alias and gets an independent copy.
                let id = if seen.contains(&id) {
                    self.copy_of(spec, id)
                } else {
                    id
                };
                seen.insert(id);

                // Detached while its fields are rewritten; the parent link
                // is re-established below, once per holder.
                spec.node_mut(id).parent = None;

                let field_count = spec.node(id).len();
                for i in 0..field_count {
                    let taken = std::mem::replace(
                        spec.node_mut(id).value_at_mut(i),
                        Value::Null,
                    );
                    let resolved = self.visit(spec, taken, seen, Some(id));
                    *spec.node_mut(id).value_at_mut(i) = resolved;
                }

                spec.node_mut(id).parent = container;
                Value::Node(id)
            }
            Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(|item| self.visit(spec, item, seen, container))
                    .collect(),
            ),
            // Scalar aliasing is not a concern; only node identity matters
            other => other,
        }
    }

    /// Deep copy of a node: every nested node is freshly allocated, so the
    /// copy shares no identities with the original or within itself
    fn copy_of(&self, spec: &mut Specification, id: NodeId) -> NodeId {
        let mut on_stack = HashSet::new();
        self.deep_copy(spec, id, &mut on_stack)
    }

    fn deep_copy(
        &self,
        spec: &mut Specification,
        id: NodeId,
        on_stack: &mut HashSet<NodeId>,
    ) -> NodeId {
        on_stack.insert(id);
        let source = spec.node(id).clone();
        let mut copy = Node::new(source.kind());
        for (name, value) in source.fields() {
            let copied = self.copy_value(spec, value.clone(), on_stack);
            copy.set(name, copied);
        }
        on_stack.remove(&id);
        spec.arena_mut().alloc(copy)
    }

    fn copy_value(
        &self,
        spec: &mut Specification,
        value: Value,
        on_stack: &mut HashSet<NodeId>,
    ) -> Value {
        match value {
            Value::Node(child) if on_stack.contains(&child) => {
                debug!(node = %child, "severing cyclic reference during copy");
                Value::Null
            }
            Value::Node(child) => Value::Node(self.deep_copy(spec, child, on_stack)),
            Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(|item| self.copy_value(spec, item, on_stack))
                    .collect(),
            ),
            other => other,
        }
    }
}

impl Processor for ReferenceResolver {
    fn name(&self) -> &'static str {
        "reference-resolver"
    }

    fn process(&mut self, spec: &mut Specification) -> Result<()> {
        let report = analysis::analyze(spec);
        debug!(
            reachable = report.reachable,
            shared = report.shared.len(),
            cycles = report.cycles.len(),
            "resolving references"
        );

        let mut seen = HashSet::new();
        let root = spec.root();
        self.visit(spec, Value::Node(root), &mut seen, None);
        Ok(())
    }
}
