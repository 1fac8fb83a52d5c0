//! Layered overlay resolution: defaults, file, environment.
//!
//! The schema tree supplies the default set and the env bindings; this
//! module reads the sources, merges them into one nested value with
//! precedence env > file > defaults, and decodes the configuration type.
//! All file and environment I/O lives here, behind small seams, so the
//! tree walks themselves stay pure.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::{SchemaTree, parse_array, parse_scalar};

/// Reads the literal value of a named environment variable.
///
/// Production code uses [`OsEnv`]; tests inject fixed maps to keep
/// process-global state out of the picture.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// [`EnvSource`] backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnv;

impl EnvSource for OsEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Deep merge two values, `overlay` taking precedence over `base`.
///
/// Objects merge recursively; arrays, strings, numbers, and booleans are
/// replaced entirely. An overlay of null preserves the base: null means
/// "not specified", never "erase".
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Insert `value` at a dotted path, creating intermediate objects and
/// replacing any non-object encountered along the way.
fn set_path(target: &mut Value, path: &[&str], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    if !matches!(target, Value::Object(_)) {
        *target = Value::Object(Map::new());
    }
    let Value::Object(map) = target else {
        return;
    };
    if rest.is_empty() {
        map.insert((*head).to_string(), value);
    } else {
        let child = map.entry(*head).or_insert(Value::Null);
        set_path(child, rest, value);
    }
}

/// Nest the tree's flat `(path, default)` pairs into one value.
fn defaults_value(tree: &SchemaTree) -> Value {
    let mut root = Value::Object(Map::new());
    for (path, value) in tree.defaults() {
        let parts: Vec<&str> = path.split('.').collect();
        set_path(&mut root, &parts, value);
    }
    root
}

/// Read and parse the config file.
///
/// A missing file yields null (merging to nothing) when not required;
/// every other failure is a resolution error.
fn file_value(path: &Path, required: bool) -> Result<Value, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
            return Ok(Value::Null);
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };
    serde_yaml::from_str::<Value>(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Overlay environment values, parsed against each leaf's declared kind
/// with the same rules as default coercion.
fn env_overlay(
    tree: &SchemaTree,
    env: &dyn EnvSource,
    merged: &mut Value,
) -> Result<(), ConfigError> {
    for id in tree.leaves() {
        if tree.in_struct_array(id) {
            continue;
        }
        let Some(var) = tree.env_name(id) else {
            continue;
        };
        let Some(raw) = env.var(&var) else {
            continue;
        };
        let Some(leaf) = tree.node(id).leaf() else {
            continue;
        };
        let parsed = if leaf.is_array {
            parse_array(&raw, leaf.kind)
        } else {
            parse_scalar(&raw, leaf.kind)
        }
        .map_err(|err| ConfigError::Env {
            var: var.clone(),
            raw: err.text,
            kind: err.kind,
        })?;
        let path = tree.bind_key(id);
        let parts: Vec<&str> = path.split('.').collect();
        set_path(merged, &parts, parsed);
    }
    Ok(())
}

/// Resolve a configuration value from all layered sources.
pub fn resolve<T: DeserializeOwned>(
    tree: &SchemaTree,
    path: &Path,
    file_required: bool,
    env: &dyn EnvSource,
) -> Result<T, ConfigError> {
    let mut merged = deep_merge(defaults_value(tree), file_value(path, file_required)?);
    env_overlay(tree, env, &mut merged)?;
    serde_json::from_value(merged).map_err(ConfigError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldShape, FieldSpec, ScalarKind, SchemaTree};
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Server {
        host: String,
        port: i64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestConfig {
        server: Server,
        tags: Vec<String>,
    }

    fn shape() -> FieldShape {
        FieldShape::Struct(vec![
            FieldSpec::group(
                "Server",
                vec![
                    FieldSpec::scalar("Host", ScalarKind::String)
                        .bind("host")
                        .default_value("localhost"),
                    FieldSpec::scalar("Port", ScalarKind::Int)
                        .bind("port")
                        .default_value("8080"),
                ],
            )
            .bind("server"),
            FieldSpec::array("Tags", ScalarKind::String)
                .bind("tags")
                .default_value("a,b"),
        ])
    }

    struct FakeEnv(HashMap<String, String>);

    impl EnvSource for FakeEnv {
        fn var(&self, name: &str) -> Option<String> {
            self.0.get(name).cloned()
        }
    }

    fn fake_env(pairs: &[(&str, &str)]) -> FakeEnv {
        FakeEnv(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn merge_objects_field_by_field() {
        let base = json!({"server": {"host": "localhost", "port": 8080}});
        let overlay = json!({"server": {"port": 9000}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"server": {"host": "localhost", "port": 9000}})
        );
    }

    #[test]
    fn merge_replaces_arrays_and_preserves_on_null() {
        assert_eq!(
            deep_merge(json!({"tags": ["a", "b"]}), json!({"tags": ["c"]})),
            json!({"tags": ["c"]})
        );
        assert_eq!(
            deep_merge(json!({"port": 8080}), json!({"port": null})),
            json!({"port": 8080})
        );
    }

    #[test]
    fn set_path_creates_intermediates() {
        let mut root = Value::Object(Map::new());
        set_path(&mut root, &["server", "port"], json!(9000));
        assert_eq!(root, json!({"server": {"port": 9000}}));
    }

    #[test]
    fn defaults_alone_resolve() {
        let tree = SchemaTree::build(&shape()).unwrap();
        let file = write_config("");
        let config: TestConfig =
            resolve(&tree, file.path(), true, &fake_env(&[])).unwrap();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tags, vec!["a", "b"]);
    }

    #[test]
    fn file_overrides_defaults() {
        let tree = SchemaTree::build(&shape()).unwrap();
        let file = write_config("server:\n  port: 9000\n");
        let config: TestConfig =
            resolve(&tree, file.path(), true, &fake_env(&[])).unwrap();
        assert_eq!(config.server.port, 9000);
        // Untouched fields keep their defaults.
        assert_eq!(config.server.host, "localhost");
    }

    #[test]
    fn env_overrides_file_and_defaults() {
        let tree = SchemaTree::build(&shape()).unwrap();
        let file = write_config("server:\n  port: 9000\n");
        let env = fake_env(&[("SERVER_PORT", "7000"), ("TAGS", "x,y,z")]);
        let config: TestConfig = resolve(&tree, file.path(), true, &env).unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.tags, vec!["x", "y", "z"]);
    }

    #[test]
    fn env_values_parse_against_declared_kind() {
        let tree = SchemaTree::build(&shape()).unwrap();
        let file = write_config("");
        let env = fake_env(&[("SERVER_PORT", "not-a-number")]);
        let err = resolve::<TestConfig>(&tree, file.path(), true, &env).unwrap_err();
        assert!(matches!(err, ConfigError::Env { .. }));
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let tree = SchemaTree::build(&shape()).unwrap();
        let err = resolve::<TestConfig>(
            &tree,
            Path::new("/nonexistent/config.yml"),
            true,
            &fake_env(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn missing_optional_file_resolves_from_defaults() {
        let tree = SchemaTree::build(&shape()).unwrap();
        let config: TestConfig = resolve(
            &tree,
            Path::new("/nonexistent/config.yml"),
            false,
            &fake_env(&[]),
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let tree = SchemaTree::build(&shape()).unwrap();
        let file = write_config("server: [not: closed\n");
        let err = resolve::<TestConfig>(&tree, file.path(), true, &fake_env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
