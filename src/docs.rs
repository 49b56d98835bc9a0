//! Documentation generator for configuration trees
//!
//! Generates a markdown reference from a built [`ConfigTree`]: node comments
//! become descriptions, types and defaults are rendered per leaf.

use crate::schema::ConfigType;
use crate::tree::{ConfigLeaf, ConfigNode, ConfigTree};
use std::fmt::{self, Write};

/// Configuration for docs generation
#[derive(Debug, Clone, Default)]
pub struct DocsConfig {
    /// Title for the documentation
    pub title: Option<String>,
    /// Description/introduction text
    pub description: Option<String>,
    /// One section per subtree instead of a flat list
    pub group_by_tree: bool,
    /// Render each leaf's current value next to its default
    pub show_values: bool,
}

impl DocsConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            group_by_tree: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    #[must_use]
    pub fn flat(mut self) -> Self {
        self.group_by_tree = false;
        self
    }

    #[must_use]
    pub fn with_values(mut self) -> Self {
        self.show_values = true;
        self
    }
}

/// Generate markdown documentation for every leaf under `tree`
#[must_use]
pub fn generate_docs(tree: &ConfigTree, config: DocsConfig) -> String {
    let mut output = String::new();
    // Writing into a String never fails
    let _ = render(&mut output, tree, &config);
    output
}

fn render(out: &mut String, tree: &ConfigTree, config: &DocsConfig) -> fmt::Result {
    let title = config.title.as_deref().unwrap_or("Configuration Reference");
    writeln!(out, "# {title}\n")?;

    if let Some(desc) = &config.description {
        writeln!(out, "{desc}\n")?;
    }

    if config.group_by_tree {
        render_section(out, tree, config)
    } else {
        out.push_str("## Settings\n\n");
        for leaf in tree.leaves() {
            format_leaf(out, &leaf, config)?;
        }
        Ok(())
    }
}

// Direct leaves first, then one section per subtree
fn render_section(out: &mut String, tree: &ConfigTree, config: &DocsConfig) -> fmt::Result {
    let nodes = tree.items().nodes();
    let leaves: Vec<_> = nodes.iter().filter_map(ConfigNode::as_leaf).collect();

    if !leaves.is_empty() {
        let heading = tree.path();
        if heading.is_empty() {
            out.push_str("## General\n\n");
        } else {
            writeln!(out, "## `{heading}`\n")?;
        }
        if let Some(comment) = tree.comment() {
            writeln!(out, "{comment}\n")?;
        }
        for leaf in leaves {
            format_leaf(out, leaf, config)?;
        }
    }

    for sub in nodes.iter().filter_map(ConfigNode::as_tree) {
        render_section(out, sub, config)?;
    }
    Ok(())
}

fn format_leaf(out: &mut String, leaf: &ConfigLeaf, config: &DocsConfig) -> fmt::Result {
    writeln!(out, "### `{}`\n", leaf.path())?;

    if let Some(comment) = leaf.comment() {
        writeln!(out, "{comment}\n")?;
    }

    let ty = leaf.config_type();
    out.push_str("| Property | Value |\n");
    out.push_str("|----------|-------|\n");
    writeln!(out, "| **Type** | {} |", ty.kind_name())?;
    writeln!(out, "| **Constraints** | `{}` |", escape_cell(&ty.to_string()))?;
    match leaf.default_value() {
        Some(default) => writeln!(out, "| **Default** | `{}` |", escape_cell(&default.to_string()))?,
        None => out.push_str("| **Default** | *none* |\n"),
    }
    if config.show_values {
        if let Some(value) = leaf.value() {
            writeln!(out, "| **Value** | `{}` |", escape_cell(&value.to_string()))?;
        }
    }
    for id in leaf.attribute_ids() {
        if let Some(attribute) = leaf.attribute(&id) {
            writeln!(out, "| `{id}` | `{}` |", escape_cell(&attribute.value().to_string()))?;
        }
    }
    out.push('\n');

    if let ConfigType::Enum(choices) = ty {
        out.push_str("**Options:**\n\n");
        for choice in choices.valid_values() {
            writeln!(out, "- `{choice}`")?;
        }
        out.push('\n');
    }

    out.push_str("---\n\n");
    Ok(())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

// =============================================================================
// Tests
// =============================================================================
