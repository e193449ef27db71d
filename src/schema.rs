//! Attribute schemas and the ownership registry
//!
//! Each node kind carries an ordered table of declared attributes
//! (name, type, default). The table is a property of the kind, not of any
//! instance: a declaration added mid-pipeline is visible on every existing
//! and future instance of that kind. Kinds may extend a base kind, in which
//! case the base's declarations are inherited.
//!
//! Processors extend these tables at pipeline-assembly time through
//! `add_attr`; the registry records which processor owns each dynamically
//! added attribute, and only that owner may remove it again.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::node::Value;

/// Declared type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    /// Accepts any value
    Any,
    Bool,
    Int,
    Float,
    String,
    Sequence,
    Node,
}

impl AttrType {
    /// Whether a value conforms to this declared type.
    /// Null always conforms: it is the "unset" marker.
    pub fn conforms(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (AttrType::Any, _)
                | (_, Value::Null)
                | (AttrType::Bool, Value::Bool(_))
                | (AttrType::Int, Value::Int(_))
                | (AttrType::Float, Value::Float(_))
                | (AttrType::String, Value::String(_))
                | (AttrType::Sequence, Value::Sequence(_))
                | (AttrType::Node, Value::Node(_))
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttrType::Any => "any",
            AttrType::Bool => "bool",
            AttrType::Int => "int",
            AttrType::Float => "float",
            AttrType::String => "string",
            AttrType::Sequence => "sequence",
            AttrType::Node => "node",
        }
    }
}

/// A single declared attribute
#[derive(Debug, Clone)]
pub struct AttrDecl {
    pub name: String,
    pub ty: AttrType,
    /// Reported for instances that have not set the field
    pub default: Value,
    /// Processor that declared this attribute, if any
    pub owner: Option<String>,
}

/// Ordered attribute declarations for one node kind
#[derive(Debug, Clone)]
pub struct TypeSchema {
    name: String,
    /// Kind whose declarations this kind inherits, if any
    base: Option<String>,
    attrs: Vec<AttrDecl>,
}

impl TypeSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            attrs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Declarations made directly on this kind, in declaration order
    pub fn own_attrs(&self) -> impl Iterator<Item = &AttrDecl> {
        self.attrs.iter()
    }

    pub fn get(&self, attr: &str) -> Option<&AttrDecl> {
        self.attrs.iter().find(|d| d.name == attr)
    }

    fn remove(&mut self, attr: &str) -> Option<AttrDecl> {
        let idx = self.attrs.iter().position(|d| d.name == attr)?;
        Some(self.attrs.remove(idx))
    }
}

/// Per-specification schema registry: node kinds, their attribute
/// declarations, and which processor owns each dynamically added attribute.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    types: HashMap<String, TypeSchema>,
    /// kind -> attr -> owning processor
    ownership: HashMap<String, HashMap<String, String>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node kind; idempotent
    pub fn register_kind(&mut self, kind: &str) -> &mut TypeSchema {
        self.types
            .entry(kind.to_string())
            .or_insert_with(|| TypeSchema::new(kind))
    }

    /// Register a node kind that inherits another kind's declarations
    pub fn register_kind_with_base(&mut self, kind: &str, base: &str) -> &mut TypeSchema {
        let schema = self.register_kind(kind);
        schema.base = Some(base.to_string());
        schema
    }

    pub fn contains_kind(&self, kind: &str) -> bool {
        self.types.contains_key(kind)
    }

    pub fn get(&self, kind: &str) -> Option<&TypeSchema> {
        self.types.get(kind)
    }

    /// Look up a declaration on a kind or any of its base kinds
    pub fn decl(&self, kind: &str, attr: &str) -> Option<&AttrDecl> {
        for schema in self.chain(kind) {
            if let Some(decl) = schema.get(attr) {
                return Some(decl);
            }
        }
        None
    }

    /// Whether `kind` is `ancestor` or inherits from it
    pub fn derives_from(&self, kind: &str, ancestor: &str) -> bool {
        self.chain(kind).any(|s| s.name() == ancestor)
    }

    /// Declare an attribute on a kind.
    ///
    /// Fails when the kind is unknown, the name is not an identifier, the
    /// default does not conform to the declared type, or the attribute is
    /// already declared anywhere on the kind's inheritance chain. Duplicates
    /// are never silently overwritten.
    pub fn add_attr(
        &mut self,
        kind: &str,
        attr: &str,
        ty: AttrType,
        default: Value,
        owner: Option<&str>,
    ) -> Result<()> {
        if !valid_attr_name(attr) {
            return Err(PipelineError::InvalidAttrName {
                name: attr.to_string(),
            });
        }
        if !self.types.contains_key(kind) {
            return Err(PipelineError::UnknownKind {
                kind: kind.to_string(),
            });
        }
        if self.decl(kind, attr).is_some() {
            return Err(PipelineError::DuplicateAttribute {
                kind: kind.to_string(),
                attr: attr.to_string(),
            });
        }
        if !ty.conforms(&default) {
            return Err(PipelineError::TypeMismatch {
                kind: kind.to_string(),
                attr: attr.to_string(),
                expected: ty.name(),
                actual: default.type_name(),
            });
        }

        let schema = self
            .types
            .get_mut(kind)
            .ok_or_else(|| PipelineError::UnknownKind {
                kind: kind.to_string(),
            })?;
        schema.attrs.push(AttrDecl {
            name: attr.to_string(),
            ty,
            default,
            owner: owner.map(String::from),
        });
        if let Some(owner) = owner {
            self.ownership
                .entry(kind.to_string())
                .or_default()
                .insert(attr.to_string(), owner.to_string());
        }
        Ok(())
    }

    /// The processor that owns a dynamically added attribute, if any
    pub fn owner_of(&self, kind: &str, attr: &str) -> Option<&str> {
        self.ownership
            .get(kind)
            .and_then(|m| m.get(attr))
            .map(String::as_str)
    }

    /// Remove an attribute on behalf of `caller`.
    ///
    /// Only the processor recorded as the attribute's owner may remove it;
    /// anything else is a configuration error.
    pub fn remove_attr(&mut self, caller: &str, kind: &str, attr: &str) -> Result<AttrDecl> {
        if !self.types.contains_key(kind) {
            return Err(PipelineError::UnknownKind {
                kind: kind.to_string(),
            });
        }
        if self.decl(kind, attr).is_none() {
            return Err(PipelineError::AttributeNotFound {
                kind: kind.to_string(),
                attr: attr.to_string(),
            });
        }
        match self.owner_of(kind, attr) {
            Some(owner) if owner == caller => {}
            owner => {
                return Err(PipelineError::RemovalNotPermitted {
                    kind: kind.to_string(),
                    attr: attr.to_string(),
                    owner: owner.unwrap_or("the base schema").to_string(),
                    caller: caller.to_string(),
                });
            }
        }

        if let Some(owners) = self.ownership.get_mut(kind) {
            owners.remove(attr);
        }
        let schema = self
            .types
            .get_mut(kind)
            .ok_or_else(|| PipelineError::UnknownKind {
                kind: kind.to_string(),
            })?;
        schema.remove(attr).ok_or(PipelineError::AttributeNotFound {
            kind: kind.to_string(),
            attr: attr.to_string(),
        })
    }

    /// The kind's schema followed by its base kinds, nearest first.
    /// Tolerates dangling or cyclic base links by stopping the walk.
    fn chain<'a>(&'a self, kind: &str) -> impl Iterator<Item = &'a TypeSchema> {
        let mut out = Vec::new();
        let mut seen = Vec::new();
        let mut current = Some(kind.to_string());
        while let Some(name) = current {
            if seen.contains(&name) {
                break;
            }
            seen.push(name.clone());
            match self.types.get(&name) {
                Some(schema) => {
                    current = schema.base.clone();
                    out.push(schema);
                }
                None => break,
            }
        }
        out.into_iter()
    }
}

fn valid_attr_name(name: &str) -> bool {
    let pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    pattern.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(kind: &str) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register_kind(kind);
        registry
    }

    #[test]
    fn test_add_attr_unknown_kind() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .add_attr("component", "width", AttrType::Int, Value::Null, None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownKind { .. }));
    }

    #[test]
    fn test_add_attr_duplicate() {
        let mut registry = registry_with("component");
        registry
            .add_attr("component", "width", AttrType::Int, Value::Int(8), Some("p1"))
            .unwrap();
        let err = registry
            .add_attr("component", "width", AttrType::Int, Value::Int(8), Some("p2"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateAttribute { .. }));
    }

    #[test]
    fn test_add_attr_invalid_name() {
        let mut registry = registry_with("component");
        let err = registry
            .add_attr("component", "2fast", AttrType::Int, Value::Null, None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidAttrName { .. }));
    }

    #[test]
    fn test_add_attr_default_must_conform() {
        let mut registry = registry_with("component");
        let err = registry
            .add_attr(
                "component",
                "width",
                AttrType::Int,
                Value::from("wide"),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::TypeMismatch { .. }));
    }

    #[test]
    fn test_remove_attr_owner_only() {
        let mut registry = registry_with("component");
        registry
            .add_attr("component", "gated", AttrType::Bool, Value::Bool(false), Some("power-pass"))
            .unwrap();

        let err = registry
            .remove_attr("other-pass", "component", "gated")
            .unwrap_err();
        assert!(matches!(err, PipelineError::RemovalNotPermitted { .. }));
        assert!(registry.decl("component", "gated").is_some());

        registry.remove_attr("power-pass", "component", "gated").unwrap();
        assert!(registry.decl("component", "gated").is_none());
    }

    #[test]
    fn test_inherited_declarations() {
        let mut registry = SchemaRegistry::new();
        registry.register_kind("component");
        registry.register_kind_with_base("storage", "component");
        registry
            .add_attr("component", "area", AttrType::Float, Value::Float(0.0), None)
            .unwrap();

        assert!(registry.decl("storage", "area").is_some());
        assert!(registry.derives_from("storage", "component"));
        assert!(!registry.derives_from("component", "storage"));

        // Redeclaring an inherited attribute is still a duplicate
        let err = registry
            .add_attr("storage", "area", AttrType::Float, Value::Null, None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateAttribute { .. }));
    }
}
