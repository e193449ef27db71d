//! Error types for the pipeline

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown node kind: {kind}")]
    UnknownKind { kind: String },

    #[error("Invalid attribute name: {name:?}")]
    InvalidAttrName { name: String },

    #[error("Duplicate attribute: {attr} is already declared on {kind}")]
    DuplicateAttribute { kind: String, attr: String },

    #[error("Attribute not found: {attr} on {kind}")]
    AttributeNotFound { kind: String, attr: String },

    #[error("Undeclared attribute: {kind} does not accept {attr}")]
    UndeclaredAttribute { kind: String, attr: String },

    #[error("Type mismatch for {kind}.{attr}: expected {expected}, got {actual}")]
    TypeMismatch {
        kind: String,
        attr: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{attr} on {kind} belongs to {owner}; {caller} may not remove it")]
    RemovalNotPermitted {
        kind: String,
        attr: String,
        owner: String,
        caller: String,
    },

    #[error(
        "{before} must run before {after}. \
         Add {before} to the list of processors before {after}."
    )]
    OrderingViolation { before: String, after: String },

    #[error("Unresolved document reference: {path}")]
    UnresolvedRef { path: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
