//! Annotated YAML template rendering.
//!
//! Walks the schema tree and emits one line per leaf or container header,
//! with defaults filled in and help text as comments. The output documents
//! the file's shape; it is not fed back through a YAML parser here.

use crate::error::RenderError;
use crate::schema::{NodeId, SchemaTree};
use serde_json::Value;

use super::format_scalar;

/// Formatting knobs for [`render_template`].
#[derive(Debug, Clone)]
pub struct TemplateStyle {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Marker emitted for leaves without a default.
    pub null_marker: String,
}

impl Default for TemplateStyle {
    fn default() -> Self {
        Self {
            indent_width: 4,
            null_marker: "null".to_string(),
        }
    }
}

/// Render the tree as an annotated YAML document.
///
/// The root is never emitted; its children start at the top indentation
/// level. Struct arrays render as a header plus one dash-marked element
/// block templating the repeated structure. Output is deterministic for a
/// given tree and style.
pub fn render_template(
    tree: &SchemaTree,
    include_help: bool,
    style: &TemplateStyle,
) -> Result<String, RenderError> {
    let mut out = String::new();
    for child in tree.children(tree.root()) {
        render_node(tree, child, 0, include_help, style, &mut out)?;
    }
    Ok(out)
}

fn render_node(
    tree: &SchemaTree,
    id: NodeId,
    depth: usize,
    include_help: bool,
    style: &TemplateStyle,
    out: &mut String,
) -> Result<(), RenderError> {
    let node = tree.node(id);
    let indent = " ".repeat(style.indent_width * depth);

    if let Some(leaf) = node.leaf() {
        let comment = if include_help && !node.help().is_empty() {
            format!("  # {}", node.help())
        } else {
            String::new()
        };
        if leaf.is_array {
            out.push_str(&format!("{indent}{}:{comment}\n", node.field_name()));
            if let Some(Value::Array(items)) = &leaf.default {
                let item_indent = " ".repeat(style.indent_width * (depth + 1));
                for item in items {
                    out.push_str(&format!("{item_indent}- {}\n", format_scalar(item)?));
                }
            }
        } else {
            let value = match &leaf.default {
                Some(value) => format_scalar(value)?,
                None => style.null_marker.clone(),
            };
            out.push_str(&format!("{indent}{}: {value}{comment}\n", node.field_name()));
        }
        return Ok(());
    }

    if include_help && !node.help().is_empty() {
        out.push_str(&format!("{indent}# {}\n", node.help()));
    }
    out.push_str(&format!("{indent}{}:\n", node.field_name()));

    if node.is_array_of_structs() {
        let mut block = String::new();
        for child in tree.children(id) {
            render_node(tree, child, depth + 1, include_help, style, &mut block)?;
        }
        push_element_block(&block, style.indent_width * (depth + 1), out);
    } else {
        for child in tree.children(id) {
            render_node(tree, child, depth + 1, include_help, style, out)?;
        }
    }
    Ok(())
}

/// Rewrite a rendered element block into a single dash-marked list item:
/// the first line takes the `- ` marker after its indent, every following
/// line shifts right by the marker width so the element's fields stay
/// aligned under the first.
fn push_element_block(block: &str, marker_indent: usize, out: &mut String) {
    for (i, line) in block.lines().enumerate() {
        if i == 0 {
            let content = &line[marker_indent.min(line.len())..];
            out.push_str(&" ".repeat(marker_indent));
            out.push_str("- ");
            out.push_str(content);
        } else {
            out.push_str("  ");
            out.push_str(line);
        }
        out.push('\n');
    }
}
