//! Schema-driven configuration with layered resolution and hot reload.
//!
//! A configuration type declares its shape once through [`Describe`]; the
//! crate compiles that description into an immutable schema tree which
//! drives:
//!
//! - layered value resolution, environment > file > declared defaults;
//! - generated documentation (annotated YAML template, env-var help);
//! - change notification when the config file is edited at runtime.

pub mod error;
pub mod manager;
pub mod notifier;
pub mod render;
pub mod resolve;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use error::{ConfigError, RenderError, SchemaError};
pub use manager::{ConfigManager, ConfigManagerBuilder, Validate};
pub use notifier::{ChangeNotifier, ConfigUpdate};
pub use render::{EnvEntry, EnvHelpFormat, EnvHelpStyle, TemplateStyle};
pub use resolve::{EnvSource, OsEnv};
pub use schema::{Describe, FieldShape, FieldSpec, ScalarKind, SchemaTree};
