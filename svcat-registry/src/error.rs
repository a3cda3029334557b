//! Registry and codec error types.

use thiserror::Error;

/// Errors raised by the registry around the strategy hooks.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Version mismatch (optimistic concurrency control).
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    /// Update did not name the resource version it is based on.
    #[error("precondition required: resourceVersion must be specified for an update of {0}")]
    PreconditionRequired(String),

    /// A namespace was set on a cluster-scoped resource.
    #[error("namespace not allowed: {kind} is cluster-scoped, got namespace {namespace:?}")]
    NamespaceNotAllowed { kind: String, namespace: String },

    /// Object has no name.
    #[error("missing name")]
    MissingName,
}

/// Errors at the encoding boundary.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is a different resource type.
    #[error("unexpected kind: {api_version}/{kind}")]
    UnexpectedKind { api_version: String, kind: String },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
