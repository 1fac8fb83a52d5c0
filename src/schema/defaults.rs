//! Coerces raw default-value text into typed values.
//!
//! The same parsing rules serve two callers: the schema builder (coercing
//! `default` tags at build time) and the overlay resolver (parsing
//! environment values against the leaf's declared kind).

use serde_json::Value;

use super::{FieldSpec, ScalarKind};
use crate::error::SchemaError;

/// A parse failure carrying the offending text and the target kind name.
#[derive(Debug)]
pub(crate) struct CoerceError {
    pub text: String,
    pub kind: String,
}

impl CoerceError {
    fn new(text: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: kind.into(),
        }
    }
}

/// Coerce a field's raw default against its declared kind.
///
/// An absent default yields `None`: no coercion happens at all, not even to
/// an empty array. Any parse failure aborts the whole schema build.
pub(crate) fn coerce_default(
    field: &FieldSpec,
    kind: ScalarKind,
    is_array: bool,
) -> Result<Option<Value>, SchemaError> {
    let Some(raw) = field.default.as_deref() else {
        return Ok(None);
    };
    let parsed = if is_array {
        parse_array(raw, kind)
    } else {
        parse_scalar(raw, kind)
    };
    match parsed {
        Ok(value) => Ok(Some(value)),
        Err(err) => Err(SchemaError::DefaultValue {
            field: field.name.clone(),
            raw: err.text,
            kind: err.kind,
        }),
    }
}

/// Parse a scalar: strings pass through, integers are strict base-10,
/// floats are standard, booleans are exactly `true` or `false`.
pub(crate) fn parse_scalar(raw: &str, kind: ScalarKind) -> Result<Value, CoerceError> {
    match kind {
        ScalarKind::String => Ok(Value::String(raw.to_string())),
        ScalarKind::Int => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| CoerceError::new(raw, "int")),
        ScalarKind::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| CoerceError::new(raw, "float")),
        ScalarKind::Bool => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(CoerceError::new(raw, "bool")),
        },
    }
}

/// Parse an array of scalars.
///
/// Text that parses as a JSON array is decoded elementwise with strict
/// typing; anything else is split on `,` and each piece goes through the
/// scalar rule. `a,b,c` and `["a","b","c"]` therefore coerce identically.
pub(crate) fn parse_array(raw: &str, kind: ScalarKind) -> Result<Value, CoerceError> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(decode_element(item, kind)?);
        }
        return Ok(Value::Array(out));
    }
    let mut out = Vec::new();
    for part in raw.split(',') {
        out.push(parse_scalar(part, kind)?);
    }
    Ok(Value::Array(out))
}

/// Check a decoded JSON element against the declared kind.
fn decode_element(item: Value, kind: ScalarKind) -> Result<Value, CoerceError> {
    let ok = match kind {
        ScalarKind::String => item.is_string(),
        ScalarKind::Int => item.as_i64().is_some(),
        ScalarKind::Float => item.as_f64().is_some(),
        ScalarKind::Bool => item.is_boolean(),
    };
    if ok {
        Ok(item)
    } else {
        Err(CoerceError::new(item.to_string(), kind.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_kinds_parse() {
        assert_eq!(
            parse_scalar("hello", ScalarKind::String).unwrap(),
            json!("hello")
        );
        assert_eq!(parse_scalar("8080", ScalarKind::Int).unwrap(), json!(8080));
        assert_eq!(parse_scalar("-3", ScalarKind::Int).unwrap(), json!(-3));
        assert_eq!(
            parse_scalar("1.5", ScalarKind::Float).unwrap(),
            json!(1.5)
        );
        assert_eq!(parse_scalar("true", ScalarKind::Bool).unwrap(), json!(true));
        assert_eq!(
            parse_scalar("false", ScalarKind::Bool).unwrap(),
            json!(false)
        );
    }

    #[test]
    fn scalar_parse_failures() {
        assert!(parse_scalar("12x", ScalarKind::Int).is_err());
        assert!(parse_scalar("1.5", ScalarKind::Int).is_err());
        assert!(parse_scalar("yes", ScalarKind::Bool).is_err());
        // Go-style truthiness is not accepted.
        assert!(parse_scalar("1", ScalarKind::Bool).is_err());
        assert!(parse_scalar("True", ScalarKind::Bool).is_err());
    }

    #[test]
    fn comma_list_and_json_array_coerce_identically() {
        let comma = parse_array("a,b,c", ScalarKind::String).unwrap();
        let json = parse_array(r#"["a","b","c"]"#, ScalarKind::String).unwrap();
        assert_eq!(comma, json);
        assert_eq!(comma, json!(["a", "b", "c"]));
    }

    #[test]
    fn comma_list_of_ints() {
        assert_eq!(
            parse_array("1,2,3", ScalarKind::Int).unwrap(),
            json!([1, 2, 3])
        );
    }

    #[test]
    fn json_array_elements_are_strictly_typed() {
        assert!(parse_array(r#"[1, "2"]"#, ScalarKind::Int).is_err());
        assert!(parse_array(r#"["a", 1]"#, ScalarKind::String).is_err());
        // Integers are acceptable floats.
        assert_eq!(
            parse_array("[1, 2.5]", ScalarKind::Float).unwrap(),
            json!([1, 2.5])
        );
    }

    #[test]
    fn bad_array_element_reports_offender() {
        let err = parse_array("1,x,3", ScalarKind::Int).unwrap_err();
        assert_eq!(err.text, "x");
        assert_eq!(err.kind, "int");
    }

    #[test]
    fn non_array_json_falls_back_to_comma_split() {
        // "42" is valid JSON but not a JSON array.
        assert_eq!(parse_array("42", ScalarKind::Int).unwrap(), json!([42]));
    }

    #[test]
    fn absent_default_is_not_coerced() {
        let field = FieldSpec::array("Tags", ScalarKind::String).bind("tags");
        assert_eq!(
            coerce_default(&field, ScalarKind::String, true).unwrap(),
            None
        );
    }

    #[test]
    fn bad_default_aborts_with_field_context() {
        let field = FieldSpec::scalar("Port", ScalarKind::Int)
            .bind("port")
            .default_value("eighty");
        let err = coerce_default(&field, ScalarKind::Int, false).unwrap_err();
        match err {
            SchemaError::DefaultValue { field, raw, kind } => {
                assert_eq!(field, "Port");
                assert_eq!(raw, "eighty");
                assert_eq!(kind, "int");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
