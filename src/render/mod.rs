//! Rendering the schema tree into human-facing artifacts.
//!
//! Renderers never touch resolved values: they consume the immutable tree
//! and its coerced defaults only. Formatting knobs travel in explicit style
//! records rather than module-level state.

mod env_help;
mod template;

pub use env_help::{EnvEntry, EnvHelpFormat, EnvHelpStyle, env_entries, render_env_help};
pub use template::{TemplateStyle, render_template};

use serde_json::Value;

use crate::error::RenderError;

/// Format a scalar default: strings quote-wrapped, numbers and booleans
/// bare. Anything else is outside the formatter's vocabulary.
pub(crate) fn format_scalar(value: &Value) -> Result<String, RenderError> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(value.to_string()),
        other => Err(RenderError::UnsupportedValue {
            found: value_kind(other).to_string(),
        }),
    }
}

/// Format a default for single-line contexts: scalars as above, arrays as a
/// bracketed, comma-separated list.
pub(crate) fn format_inline(value: &Value) -> Result<String, RenderError> {
    match value {
        Value::Array(items) => {
            let rendered: Result<Vec<String>, RenderError> =
                items.iter().map(format_scalar).collect();
            Ok(format!("[{}]", rendered?.join(", ")))
        }
        other => format_scalar(other),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_format_like_yaml() {
        assert_eq!(format_scalar(&json!("x")).unwrap(), "\"x\"");
        assert_eq!(format_scalar(&json!(8080)).unwrap(), "8080");
        assert_eq!(format_scalar(&json!(1.5)).unwrap(), "1.5");
        assert_eq!(format_scalar(&json!(true)).unwrap(), "true");
    }

    #[test]
    fn arrays_format_inline() {
        assert_eq!(
            format_inline(&json!(["a", "b"])).unwrap(),
            "[\"a\", \"b\"]"
        );
        assert_eq!(format_inline(&json!([1, 2, 3])).unwrap(), "[1, 2, 3]");
    }

    #[test]
    fn objects_are_unsupported() {
        let err = format_inline(&json!({"a": 1})).unwrap_err();
        assert_eq!(err.to_string(), "unsupported default value type: object");
    }
}
