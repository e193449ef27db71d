//! The processor trait
//!
//! A processor is one ordered transformation pass over a specification. The
//! pipeline runner calls `declare_attrs` for every registered processor
//! before any `process` call, because a later pass's `process` may read
//! schema entries declared by an earlier pass.

use crate::error::{PipelineError, Result};
use crate::node::Value;
use crate::schema::AttrType;
use crate::spec::Specification;

/// A single transformation pass over a specification.
///
/// Processors are stateless identities for ordering purposes: side effects
/// belong in the tree and the specification-wide registries, never in fields
/// carried across runs.
pub trait Processor {
    /// Stable name, used for ordering queries and diagnostics
    fn name(&self) -> &'static str;

    /// Declare the attributes this processor is responsible for.
    ///
    /// Called once per pipeline run, in registration order, before any
    /// `process` call. The default declares nothing.
    fn declare_attrs(&mut self, _spec: &mut Specification) -> Result<()> {
        Ok(())
    }

    /// Rewrite the specification tree
    fn process(&mut self, spec: &mut Specification) -> Result<()>;

    /// Assert that another processor has already run.
    ///
    /// Looks both processors up in the log of processors started so far. A
    /// found-but-later `other` is always fatal; an absent `other` is fatal
    /// unless `ok_if_not_found`. Call at the top of `process` to fail fast
    /// instead of producing a subtly wrong tree.
    fn must_run_after(
        &self,
        other: &str,
        spec: &Specification,
        ok_if_not_found: bool,
    ) -> Result<()> {
        let other_idx = spec.run_index(other).map(|i| i as i64).unwrap_or(-1);
        let my_idx = spec.run_index(self.name()).map(|i| i as i64).unwrap_or(-1);
        if other_idx > my_idx || (other_idx == -1 && !ok_if_not_found) {
            return Err(PipelineError::OrderingViolation {
                before: other.to_string(),
                after: self.name().to_string(),
            });
        }
        Ok(())
    }

    /// Declare an attribute on a node kind, recording this processor as its
    /// owner in the specification's ownership registry
    fn add_attr(
        &self,
        spec: &mut Specification,
        kind: &str,
        attr: &str,
        ty: AttrType,
        default: Value,
    ) -> Result<()> {
        spec.schema_mut()
            .add_attr(kind, attr, ty, default, Some(self.name()))
    }

    /// Remove an attribute this processor owns, from the schema and from
    /// every instance of the kind
    fn remove_attr(&self, spec: &mut Specification, kind: &str, attr: &str) -> Result<()> {
        spec.remove_attr(self.name(), kind, attr)
    }
}
