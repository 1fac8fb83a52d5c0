//! Compiles a declarative field description into a [`SchemaTree`].

use super::defaults::coerce_default;
use super::node::{EnvTag, Leaf, Node, NodeId, SchemaTree};
use super::{Describe, FieldShape, FieldSpec};
use crate::error::SchemaError;

impl SchemaTree {
    /// Build the schema tree for a configuration type.
    pub fn of<T: Describe>() -> Result<SchemaTree, SchemaError> {
        Self::build(&T::describe())
    }

    /// Build a schema tree from a root shape.
    ///
    /// The root must describe a struct. Field order is preserved and drives
    /// rendering order.
    pub fn build(root: &FieldShape) -> Result<SchemaTree, SchemaError> {
        let FieldShape::Struct(fields) = root else {
            return Err(SchemaError::Shape {
                kind: root.kind_name(),
            });
        };
        let mut tree = SchemaTree::with_root();
        let root_id = tree.root();
        build_fields(&mut tree, root_id, fields)?;
        Ok(tree)
    }
}

fn build_fields(
    tree: &mut SchemaTree,
    parent: NodeId,
    fields: &[FieldSpec],
) -> Result<(), SchemaError> {
    for field in fields {
        if field.key.is_empty() {
            return Err(SchemaError::Tag {
                field: field.name.clone(),
            });
        }
        let mut node = Node::new(
            &field.key,
            &field.help,
            EnvTag::from_spec(field.env.as_deref()),
        );
        match &field.shape {
            FieldShape::Struct(children) => {
                let id = tree.add_child(parent, node)?;
                build_fields(tree, id, children)?;
            }
            FieldShape::StructArray(children) => {
                // Descend into the element fields, not the array itself.
                node.mark_struct_array();
                let id = tree.add_child(parent, node)?;
                build_fields(tree, id, children)?;
            }
            FieldShape::Scalar(kind) => {
                let id = tree.add_child(parent, node)?;
                let default = coerce_default(field, *kind, false)?;
                tree.set_leaf(
                    id,
                    Leaf {
                        kind: *kind,
                        is_array: false,
                        default,
                    },
                )?;
            }
            FieldShape::Array(kind) => {
                let id = tree.add_child(parent, node)?;
                let default = coerce_default(field, *kind, true)?;
                tree.set_leaf(
                    id,
                    Leaf {
                        kind: *kind,
                        is_array: true,
                        default,
                    },
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarKind;
    use serde_json::json;

    fn server_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::scalar("Host", ScalarKind::String)
                .bind("host")
                .default_value("localhost")
                .help("listen address"),
            FieldSpec::scalar("Port", ScalarKind::Int)
                .bind("port")
                .default_value("8080")
                .help("listen port"),
        ]
    }

    #[test]
    fn builds_nested_containers_in_declaration_order() {
        let shape = FieldShape::Struct(vec![
            FieldSpec::group("Server", server_fields()).bind("server"),
            FieldSpec::scalar("LogLevel", ScalarKind::String)
                .bind("log_level")
                .default_value("info"),
        ]);
        let tree = SchemaTree::build(&shape).unwrap();
        let root = tree.root();
        let top: Vec<&str> = tree
            .children(root)
            .map(|id| tree.node(id).field_name())
            .collect();
        assert_eq!(top, vec!["server", "log_level"]);

        let server = tree.children(root).next().unwrap();
        let nested: Vec<&str> = tree
            .children(server)
            .map(|id| tree.node(id).field_name())
            .collect();
        assert_eq!(nested, vec!["host", "port"]);
    }

    #[test]
    fn scalar_leaf_gets_typed_default_and_env_name() {
        let shape = FieldShape::Struct(vec![
            FieldSpec::scalar("Port", ScalarKind::Int)
                .bind("port")
                .default_value("8080"),
        ]);
        let tree = SchemaTree::build(&shape).unwrap();
        let port = tree.leaves().next().unwrap();
        let leaf = tree.node(port).leaf().unwrap();
        assert_eq!(leaf.default, Some(json!(8080)));
        assert_eq!(tree.env_name(port).as_deref(), Some("PORT"));
    }

    #[test]
    fn non_struct_root_is_a_shape_error() {
        let err = SchemaTree::build(&FieldShape::Scalar(ScalarKind::String)).unwrap_err();
        assert_eq!(err.to_string(), "expected a struct type but got string");
    }

    #[test]
    fn missing_binding_key_is_a_tag_error() {
        let shape = FieldShape::Struct(vec![FieldSpec::scalar("Port", ScalarKind::Int)]);
        let err = SchemaTree::build(&shape).unwrap_err();
        assert_eq!(err.to_string(), "field Port has no binding key");
    }

    #[test]
    fn missing_binding_key_in_nested_struct_fails() {
        let shape = FieldShape::Struct(vec![FieldSpec::group(
            "Server",
            vec![FieldSpec::scalar("Port", ScalarKind::Int)],
        )
        .bind("server")]);
        assert!(matches!(
            SchemaTree::build(&shape),
            Err(SchemaError::Tag { .. })
        ));
    }

    #[test]
    fn struct_array_marks_node_and_descends_into_element() {
        let shape = FieldShape::Struct(vec![FieldSpec::group_array(
            "Devices",
            vec![
                FieldSpec::scalar("Host", ScalarKind::String).bind("host"),
                FieldSpec::scalar("Port", ScalarKind::Int).bind("port"),
            ],
        )
        .bind("devices")]);
        let tree = SchemaTree::build(&shape).unwrap();
        let devices = tree.children(tree.root()).next().unwrap();
        assert!(tree.node(devices).is_array_of_structs());
        let element_fields: Vec<&str> = tree
            .children(devices)
            .map(|id| tree.node(id).field_name())
            .collect();
        assert_eq!(element_fields, vec!["host", "port"]);
    }

    #[test]
    fn bad_default_aborts_build() {
        let shape = FieldShape::Struct(vec![
            FieldSpec::scalar("Host", ScalarKind::String).bind("host"),
            FieldSpec::scalar("Port", ScalarKind::Int)
                .bind("port")
                .default_value("eighty"),
        ]);
        assert!(matches!(
            SchemaTree::build(&shape),
            Err(SchemaError::DefaultValue { .. })
        ));
    }

    #[test]
    fn array_default_round_trip() {
        let comma = FieldShape::Struct(vec![
            FieldSpec::array("Tags", ScalarKind::String)
                .bind("tags")
                .default_value("a,b,c"),
        ]);
        let json_form = FieldShape::Struct(vec![
            FieldSpec::array("Tags", ScalarKind::String)
                .bind("tags")
                .default_value(r#"["a","b","c"]"#),
        ]);
        let from_comma = SchemaTree::build(&comma).unwrap();
        let from_json = SchemaTree::build(&json_form).unwrap();
        let a = from_comma.leaves().next().unwrap();
        let b = from_json.leaves().next().unwrap();
        assert_eq!(
            from_comma.node(a).leaf().unwrap().default,
            from_json.node(b).leaf().unwrap().default,
        );
    }
}
