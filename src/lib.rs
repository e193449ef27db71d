//! Spec Pipeline
//!
//! An ordered rewrite pipeline for hierarchical specification documents: a
//! loaded tree is passed through a sequence of processors that rewrite,
//! validate, and normalize it before downstream tools consume it.
//!
//! ## Features
//!
//! - **Attribute-Ownership Schema**: processors extend which fields a node
//!   kind accepts; only the declaring processor may remove a field again
//! - **Reference Resolution**: locations holding the same node are split
//!   into independent, structurally equal copies, yielding a strict tree
//! - **Ordering Assertions**: a processor can demand that another processor
//!   ran before it, failing fast on a misconfigured pipeline
//! - **Alias Diagnostics**: sharing and cycle reports over the loaded tree
//!
//! ## Architecture
//!
//! ```text
//! loader ──> Specification ──> declare_attrs (all processors, in order)
//!                 │
//!                 └──> process (all processors, in order)
//!                          │
//!                          └──> strict tree, handed to consumers
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod node;
pub mod processor;
pub mod resolver;
pub mod schema;
pub mod spec;

pub use analysis::AliasAnalysis;
pub use error::{PipelineError, Result};
pub use fingerprint::Fingerprint;
pub use node::{Node, NodeArena, NodeId, Value};
pub use processor::Processor;
pub use resolver::ReferenceResolver;
pub use schema::{AttrDecl, AttrType, SchemaRegistry, TypeSchema};
pub use spec::{ProcessorRun, Specification, ROOT_KIND};
