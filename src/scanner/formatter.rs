use serde::Serialize;

use crate::tree::DisplayItem;

use super::size::{format_percent, format_size};

/// Format options for tree output
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Maximum depth to display
    pub max_depth: Option<usize>,
    /// Show only top N entries per directory
    pub top_n: Option<usize>,
    /// Append each entry's share of the printed root
    pub show_percent: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(3),
            top_n: Some(20),
            show_percent: true,
        }
    }
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn with_percent(mut self, enabled: bool) -> Self {
        self.show_percent = enabled;
        self
    }

    pub fn unlimited() -> Self {
        Self {
            max_depth: None,
            top_n: None,
            show_percent: false,
        }
    }
}

/// Format an item and its descendants as a tree string
pub fn format_tree(item: &DisplayItem, options: &FormatOptions) -> String {
    let mut output = String::new();
    format_tree_recursive(item, item.size, &mut output, "", true, 0, options);
    output
}

fn format_tree_recursive(
    item: &DisplayItem,
    total: i64,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &FormatOptions,
) {
    if options.max_depth.is_some_and(|max| depth > max) {
        return;
    }

    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };
    let name = item.name();
    let slash = if item.is_file || name.ends_with('/') { "" } else { "/" };

    output.push_str(&format!(
        "{}{}{}{}  {}",
        prefix,
        connector,
        name,
        slash,
        format_size(item.size)
    ));
    if options.show_percent {
        output.push_str("  ");
        output.push_str(&format_percent(item.size, total));
    }
    output.push('\n');

    if item.is_leaf() {
        return;
    }

    let new_prefix = if depth == 0 {
        String::new()
    } else if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}│   ", prefix)
    };

    let shown = options
        .top_n
        .map_or(item.children.len(), |n| n.min(item.children.len()));
    let hidden = item.children.len() - shown;

    for (i, child) in item.children.iter().take(shown).enumerate() {
        let is_last_child = i + 1 == shown && hidden == 0;
        format_tree_recursive(child, total, output, &new_prefix, is_last_child, depth + 1, options);
    }

    if hidden > 0 && options.max_depth.map_or(true, |max| depth < max) {
        output.push_str(&format!("{}└── ... and {} more entries\n", new_prefix, hidden));
    }
}

/// Serialize any report value to JSON
pub fn format_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
