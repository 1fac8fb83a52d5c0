//! Declarative configuration schema.
//!
//! A configuration type describes its shape once, as a tree of
//! [`FieldSpec`]s, through the [`Describe`] trait. That description is
//! compiled by [`SchemaTree::build`] into an immutable node tree which
//! drives layered resolution and documentation rendering.

mod builder;
mod defaults;
mod node;

pub use node::{EnvTag, Leaf, Leaves, Node, NodeId, SchemaTree};

pub(crate) use defaults::{parse_array, parse_scalar};

use std::fmt;

/// Scalar value kinds a leaf field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Bool,
}

impl ScalarKind {
    /// Lowercase kind name used in diagnostics and documentation.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The shape of a single field: a scalar, an array of scalars, a nested
/// struct, or a repeated struct block.
#[derive(Debug, Clone)]
pub enum FieldShape {
    Scalar(ScalarKind),
    Array(ScalarKind),
    Struct(Vec<FieldSpec>),
    StructArray(Vec<FieldSpec>),
}

impl FieldShape {
    /// Kind name used in shape diagnostics.
    pub(crate) fn kind_name(&self) -> String {
        match self {
            FieldShape::Scalar(kind) => kind.name().to_string(),
            FieldShape::Array(kind) => format!("array of {}", kind.name()),
            FieldShape::Struct(_) => "struct".to_string(),
            FieldShape::StructArray(_) => "array of struct".to_string(),
        }
    }
}

/// Declarative description of one configuration field.
///
/// Built with the constructor methods plus chained modifiers:
///
/// ```
/// use conftree::{FieldSpec, ScalarKind};
///
/// let port = FieldSpec::scalar("Port", ScalarKind::Int)
///     .bind("port")
///     .default_value("8080")
///     .help("listen port");
/// ```
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Declared field name, used only in diagnostics.
    pub name: String,
    /// Binding key fragment addressing the field when merging values from
    /// file, environment, and default sources. Mandatory: building a schema
    /// with an unbound field fails.
    pub key: String,
    /// Help text, consumed only by the renderers.
    pub help: String,
    /// Environment override token: `None` derives the variable name from
    /// the field's path, `Some("-")` suppresses the binding for this field
    /// and all of its descendants, any other value replaces the derived
    /// name outright.
    pub env: Option<String>,
    /// Raw default text, coerced against the declared kind at build time.
    pub default: Option<String>,
    /// Field shape.
    pub shape: FieldShape,
}

impl FieldSpec {
    fn new(name: impl Into<String>, shape: FieldShape) -> Self {
        Self {
            name: name.into(),
            key: String::new(),
            help: String::new(),
            env: None,
            default: None,
            shape,
        }
    }

    /// A scalar field.
    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, FieldShape::Scalar(kind))
    }

    /// An array-of-scalars field.
    pub fn array(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, FieldShape::Array(kind))
    }

    /// A nested struct field.
    pub fn group(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self::new(name, FieldShape::Struct(fields))
    }

    /// A repeated struct block.
    pub fn group_array(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self::new(name, FieldShape::StructArray(fields))
    }

    /// Set the binding key.
    pub fn bind(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Attach help text.
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = text.into();
        self
    }

    /// Replace the derived environment variable name for this field.
    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env = Some(name.into());
        self
    }

    /// Suppress the environment binding for this field and its descendants.
    pub fn no_env(mut self) -> Self {
        self.env = Some("-".to_string());
        self
    }

    /// Attach a raw default value.
    pub fn default_value(mut self, raw: impl Into<String>) -> Self {
        self.default = Some(raw.into());
        self
    }
}

/// Implemented by configuration types to expose their declarative schema.
///
/// The returned shape must be a [`FieldShape::Struct`]; anything else fails
/// schema construction.
pub trait Describe {
    fn describe() -> FieldShape;
}
