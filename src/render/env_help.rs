//! Environment-variable documentation rendering.
//!
//! Projects the tree onto its environment-bound leaves and renders that
//! projection in one of three table styles.

use serde_json::Value;

use crate::error::RenderError;
use crate::schema::{ScalarKind, SchemaTree};

use super::format_inline;

/// Output format for environment-variable help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvHelpFormat {
    /// Bordered table drawn with `+`, `-`, and `|`.
    AsciiTable,
    /// One line per variable with optional default and help segments.
    Inline,
    /// Pipe-delimited table with a header separator row.
    MarkdownTable,
}

/// Formatting knobs for [`render_env_help`].
#[derive(Debug, Clone)]
pub struct EnvHelpStyle {
    /// Placeholder for absent defaults and help in the Markdown format.
    pub placeholder: String,
}

impl Default for EnvHelpStyle {
    fn default() -> Self {
        Self {
            placeholder: "N/A".to_string(),
        }
    }
}

/// Flattened, read-only view of one environment-bound leaf.
#[derive(Debug, Clone)]
pub struct EnvEntry {
    /// Resolved environment variable name.
    pub var: String,
    /// Dotted bind path of the leaf.
    pub bind_key: String,
    /// Declared scalar kind.
    pub kind: ScalarKind,
    /// Whether the leaf is an array of scalars.
    pub is_array: bool,
    /// Coerced default, when declared.
    pub default: Option<Value>,
    /// Help text.
    pub help: String,
}

/// Project the tree onto its environment-bound leaves.
///
/// Derived on demand, never stored. Leaves without a resolved binding are
/// silently skipped.
pub fn env_entries(tree: &SchemaTree) -> Vec<EnvEntry> {
    tree.leaves()
        .filter_map(|id| {
            let var = tree.env_name(id)?;
            let node = tree.node(id);
            let leaf = node.leaf()?;
            Some(EnvEntry {
                var,
                bind_key: tree.bind_key(id),
                kind: leaf.kind,
                is_array: leaf.is_array,
                default: leaf.default.clone(),
                help: node.help().to_string(),
            })
        })
        .collect()
}

/// Render environment-variable documentation for the tree.
pub fn render_env_help(
    tree: &SchemaTree,
    format: EnvHelpFormat,
    style: &EnvHelpStyle,
) -> Result<String, RenderError> {
    let entries = env_entries(tree);
    match format {
        EnvHelpFormat::AsciiTable => render_ascii(&entries),
        EnvHelpFormat::Inline => render_inline(&entries),
        EnvHelpFormat::MarkdownTable => render_markdown(&entries, style),
    }
}

const HEADERS: [&str; 3] = ["Variable", "Default", "Description"];

/// The three cells of one table row; `absent` fills missing default/help.
fn row_cells(entry: &EnvEntry, absent: &str) -> Result<[String; 3], RenderError> {
    let default = match &entry.default {
        Some(value) => format_inline(value)?,
        None => absent.to_string(),
    };
    let help = if entry.help.is_empty() {
        absent.to_string()
    } else {
        entry.help.clone()
    };
    Ok([entry.var.clone(), default, help])
}

fn render_ascii(entries: &[EnvEntry]) -> Result<String, RenderError> {
    let rows: Vec<[String; 3]> = entries
        .iter()
        .map(|entry| row_cells(entry, ""))
        .collect::<Result<_, _>>()?;

    // Column widths use visible character counts, not byte lengths.
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = format!(
        "+{}+\n",
        widths.map(|w| "-".repeat(w + 2)).join("+")
    );
    let format_row = |cells: &[String; 3]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| {
                format!(" {}{} ", cell, " ".repeat(width - cell.chars().count()))
            })
            .collect();
        format!("|{}|\n", padded.join("|"))
    };

    let mut out = String::new();
    out.push_str(&rule);
    out.push_str(&format_row(&HEADERS.map(String::from)));
    out.push_str(&rule);
    for row in &rows {
        out.push_str(&format_row(row));
    }
    out.push_str(&rule);
    Ok(out)
}

fn render_inline(entries: &[EnvEntry]) -> Result<String, RenderError> {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.var);
        if let Some(value) = &entry.default {
            out.push_str(&format!(" [default={}]", format_inline(value)?));
        }
        if !entry.help.is_empty() {
            out.push_str(&format!(" # {}", entry.help));
        }
        out.push('\n');
    }
    Ok(out)
}

fn render_markdown(entries: &[EnvEntry], style: &EnvHelpStyle) -> Result<String, RenderError> {
    let mut out = String::new();
    out.push_str("| Variable | Default | Description |\n");
    out.push_str("| --- | --- | --- |\n");
    for entry in entries {
        let [var, default, help] = row_cells(entry, &style.placeholder)?;
        out.push_str(&format!("| {var} | {default} | {help} |\n"));
    }
    Ok(out)
}
