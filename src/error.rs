//! Error types for schema construction, resolution, and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while compiling a declarative field description into a
/// schema tree.
///
/// All of these are fatal to construction: no partial or degraded tree is
/// ever returned.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The root (or a nested element description) was not a struct where one
    /// was required.
    #[error("expected a struct type but got {kind}")]
    Shape { kind: String },

    /// A field is missing its mandatory binding key.
    #[error("field {field} has no binding key")]
    Tag { field: String },

    /// A declared default failed to parse against the declared kind.
    #[error("field {field}: cannot parse default value {raw:?} as {kind}")]
    DefaultValue {
        field: String,
        raw: String,
        kind: String,
    },

    /// Attempted to add a child to a node that already carries a leaf
    /// descriptor. Unreachable through the builder; surfaced, never
    /// swallowed.
    #[error("node {node} already has a leaf descriptor, cannot add child {child}")]
    ChildOnLeaf { node: String, child: String },

    /// Attempted to set a leaf descriptor on a node that already has
    /// children.
    #[error("node {node} already has children, cannot set a leaf descriptor")]
    LeafOnContainer { node: String },
}

/// Errors local to a single rendering call.
///
/// A failed render never affects the tree; the same tree can be rendered
/// again with different inputs.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A leaf default's concrete value is outside the set the formatter
    /// recognizes.
    #[error("unsupported default value type: {found}")]
    UnsupportedValue { found: String },
}

/// Errors from the resolution path: reading sources, merging, decoding,
/// validating, watching.
///
/// These are recoverable at the process level: a failed re-resolution
/// leaves the previously published configuration untouched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("error reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment value did not parse against the leaf's declared kind.
    #[error("environment variable {var}: cannot parse {raw:?} as {kind}")]
    Env {
        var: String,
        raw: String,
        kind: String,
    },

    /// The merged value set did not decode into the configuration type.
    #[error("unable to decode merged configuration: {0}")]
    Decode(#[source] serde_json::Error),

    /// The configuration type's validation hook rejected the merged value.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}
