//! Build a specification from a JSON document
//!
//! The heavyweight front end (YAML, templating) lives outside this crate;
//! this loader covers the boundary contract: hand the pipeline a populated
//! tree. JSON objects become nodes, and a node's kind is the name of the
//! field that holds it (the root is `spec`). Kinds register a baseline
//! schema from their first occurrence, with attribute types inferred from
//! the document values.
//!
//! `{"$ref": "/path/to/node"}` re-uses the node previously loaded at that
//! document path, holding the *same* identity at a second location. That is
//! exactly the structural aliasing the reference resolver later splits into
//! independent copies. Only references to already-loaded paths resolve.

use serde_json::Value as Json;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::node::{NodeId, Value};
use crate::schema::AttrType;
use crate::spec::Specification;

const REF_KEY: &str = "$ref";

/// Load a specification from a JSON file
pub fn from_path(path: impl AsRef<Path>) -> Result<Specification> {
    let content = fs::read_to_string(path)?;
    let doc: Json = serde_json::from_str(&content)?;
    from_json(&doc)
}

/// Build a specification from a parsed JSON document
pub fn from_json(doc: &Json) -> Result<Specification> {
    let object = match doc {
        Json::Object(map) => map,
        other => {
            return Err(PipelineError::InvalidDocument(format!(
                "top level must be an object, got {}",
                json_type_name(other)
            )));
        }
    };

    let mut spec = Specification::new();
    let mut paths: HashMap<String, NodeId> = HashMap::new();
    let root = spec.root();
    paths.insert(String::new(), root);

    for (name, value) in object {
        let loaded = load_value(&mut spec, value, name, &format!("/{}", name), &mut paths)?;
        declare_if_needed(&mut spec, root, name, &loaded)?;
        spec.set_attr(root, name, loaded)?;
    }
    Ok(spec)
}

fn load_value(
    spec: &mut Specification,
    value: &Json,
    kind: &str,
    path: &str,
    paths: &mut HashMap<String, NodeId>,
) -> Result<Value> {
    match value {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else {
                Ok(Value::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let item_path = format!("{}/{}", path, idx);
                out.push(load_value(spec, item, kind, &item_path, paths)?);
            }
            Ok(Value::Sequence(out))
        }
        Json::Object(map) => {
            if let Some(target) = ref_target(map) {
                let id = paths.get(target).copied().ok_or_else(|| {
                    PipelineError::UnresolvedRef {
                        path: target.to_string(),
                    }
                })?;
                return Ok(Value::Node(id));
            }

            let id = spec.new_node(kind);
            paths.insert(path.to_string(), id);
            for (name, child) in map {
                let child_path = format!("{}/{}", path, name);
                let loaded = load_value(spec, child, name, &child_path, paths)?;
                declare_if_needed(spec, id, name, &loaded)?;
                spec.set_attr(id, name, loaded)?;
            }
            Ok(Value::Node(id))
        }
    }
}

/// A `{"$ref": "/path"}` object, and nothing else, is a reference
fn ref_target(map: &serde_json::Map<String, Json>) -> Option<&str> {
    if map.len() != 1 {
        return None;
    }
    map.get(REF_KEY).and_then(Json::as_str)
}

/// Baseline schema entries come from the document itself: the first
/// occurrence of a field on a kind declares it, typed after its value
fn declare_if_needed(
    spec: &mut Specification,
    id: NodeId,
    name: &str,
    value: &Value,
) -> Result<()> {
    let kind = spec.node(id).kind().to_string();
    if spec.schema().decl(&kind, name).is_some() {
        return Ok(());
    }
    spec.schema_mut()
        .add_attr(&kind, name, inferred_type(value), Value::Null, None)
}

fn inferred_type(value: &Value) -> AttrType {
    match value {
        Value::Null => AttrType::Any,
        Value::Bool(_) => AttrType::Bool,
        Value::Int(_) => AttrType::Int,
        Value::Float(_) => AttrType::Float,
        Value::String(_) => AttrType::String,
        Value::Sequence(_) => AttrType::Sequence,
        Value::Node(_) => AttrType::Node,
    }
}

fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
