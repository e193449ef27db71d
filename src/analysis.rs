//! Alias and cycle analysis
//!
//! Builds a containment graph over the nodes reachable from the
//! specification root and reports sharing: nodes held at more than one
//! location, and strongly connected components (cycles). The reference
//! resolver logs this before rewriting; `spec-inspect` prints it.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

use crate::node::{NodeId, Value};
use crate::spec::Specification;

/// Summary of sharing in a specification tree
#[derive(Debug, Clone, Serialize)]
pub struct AliasAnalysis {
    /// Nodes reachable from the root
    pub reachable: usize,
    /// Containment references (field values and sequence elements)
    pub references: usize,
    /// Nodes held at more than one location
    pub shared: Vec<NodeId>,
    /// Cycle groups: SCCs with more than one member, or a self-reference
    pub cycles: Vec<Vec<NodeId>>,
}

impl AliasAnalysis {
    /// True when every node is held at exactly one location and no node
    /// contains itself
    pub fn is_strict_tree(&self) -> bool {
        self.shared.is_empty() && self.cycles.is_empty()
    }
}

/// Analyze sharing among the nodes reachable from the specification root
pub fn analyze(spec: &Specification) -> AliasAnalysis {
    let mut graph: DiGraph<NodeId, ()> = DiGraph::new();
    let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();
    let mut holders: HashMap<NodeId, usize> = HashMap::new();
    let mut references = 0;

    let root = spec.root();
    index.insert(root, graph.add_node(root));
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let from = index[&id];
        let mut children = Vec::new();
        for (_, value) in spec.node(id).fields() {
            collect_child_nodes(value, &mut children);
        }
        for child in children {
            references += 1;
            *holders.entry(child).or_insert(0) += 1;
            let to = match index.get(&child) {
                Some(ix) => *ix,
                None => {
                    let ix = graph.add_node(child);
                    index.insert(child, ix);
                    stack.push(child);
                    ix
                }
            };
            graph.add_edge(from, to, ());
        }
    }

    let mut shared: Vec<NodeId> = holders
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(id, _)| *id)
        .collect();
    shared.sort();

    let cycles = kosaraju_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.find_edge(scc[0], scc[0]).is_some())
        .map(|scc| {
            let mut members: Vec<NodeId> = scc.into_iter().map(|ix| graph[ix]).collect();
            members.sort();
            members
        })
        .collect();

    AliasAnalysis {
        reachable: graph.node_count(),
        references,
        shared,
        cycles,
    }
}

/// Node ids held directly by a value, descending through sequences
fn collect_child_nodes(value: &Value, out: &mut Vec<NodeId>) {
    match value {
        Value::Node(id) => out.push(*id),
        Value::Sequence(items) => {
            for item in items {
                collect_child_nodes(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttrType;
    use crate::spec::ROOT_KIND;

    fn spec_with_root_fields() -> Specification {
        let mut spec = Specification::new();
        for attr in ["a", "b"] {
            spec.schema_mut()
                .add_attr(ROOT_KIND, attr, AttrType::Any, Value::Null, None)
                .unwrap();
        }
        spec
    }

    #[test]
    fn test_strict_tree_reports_clean() {
        let mut spec = spec_with_root_fields();
        let root = spec.root();
        let x = spec.new_node("component");
        let y = spec.new_node("component");
        spec.set_attr(root, "a", Value::Node(x)).unwrap();
        spec.set_attr(root, "b", Value::Node(y)).unwrap();

        let report = analyze(&spec);
        assert!(report.is_strict_tree());
        assert_eq!(report.reachable, 3);
        assert_eq!(report.references, 2);
    }

    #[test]
    fn test_shared_node_detected() {
        let mut spec = spec_with_root_fields();
        let root = spec.root();
        let shared = spec.new_node("component");
        spec.set_attr(root, "a", Value::Node(shared)).unwrap();
        spec.set_attr(root, "b", Value::Node(shared)).unwrap();

        let report = analyze(&spec);
        assert_eq!(report.shared, vec![shared]);
        assert!(!report.is_strict_tree());
    }

    #[test]
    fn test_alias_inside_sequence_detected() {
        let mut spec = spec_with_root_fields();
        let root = spec.root();
        let shared = spec.new_node("component");
        spec.set_attr(root, "a", Value::Node(shared)).unwrap();
        spec.set_attr(
            root,
            "b",
            Value::Sequence(vec![Value::Int(1), Value::Node(shared)]),
        )
        .unwrap();

        let report = analyze(&spec);
        assert_eq!(report.shared, vec![shared]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut spec = spec_with_root_fields();
        let root = spec.root();
        let a = spec.new_node("loop");
        spec.schema_mut()
            .add_attr("loop", "inner", AttrType::Node, Value::Null, None)
            .unwrap();
        spec.set_attr(a, "inner", Value::Node(a)).unwrap();
        spec.set_attr(root, "a", Value::Node(a)).unwrap();

        let report = analyze(&spec);
        assert_eq!(report.cycles, vec![vec![a]]);
    }
}
