//! Structural fingerprints for specification trees
//!
//! SHA-256 over the canonical JSON rendering of a subtree. Two subtrees with
//! equal fingerprints hold equal field values recursively, regardless of
//! node identities; the tests use this for bit-for-bit equality assertions.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::node::NodeId;
use crate::spec::Specification;

/// SHA-256 fingerprint of a subtree's structural content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of the subtree rooted at `id`
    pub fn of(spec: &Specification, id: NodeId) -> Self {
        Self::from_json(&spec.subtree_json(id))
    }

    /// Fingerprint of the whole specification tree
    pub fn of_spec(spec: &Specification) -> Self {
        Self::of(spec, spec.root())
    }

    /// Fingerprint of a canonical JSON rendering
    pub fn from_json(value: &serde_json::Value) -> Self {
        let canonical = value.to_string();
        let hash = Sha256::digest(canonical.as_bytes());
        Self(format!("{:x}", hash))
    }

    /// Hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
