//! Output formatting utilities for markdown and JSON.

use crate::config::ResolvedConfig;
use crate::variables::Variable;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Render a single value for terminal output: strings raw, everything else as JSON.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn markdown_cell(value: &Value) -> String {
    format_value(value).replace('|', "\\|").replace('\n', " ")
}

/// Format a map as a two-column markdown table, keys sorted.
pub fn format_map_markdown(title: &str, map: &Map<String, Value>) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {} ({})\n\n", title, map.len()));
    if map.is_empty() {
        md.push_str("_empty_\n");
        return md;
    }

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    md.push_str("| key | value |\n");
    md.push_str("|-----|-------|\n");
    for key in keys {
        md.push_str(&format!("| `{}` | {} |\n", key, markdown_cell(&map[key])));
    }

    md
}

/// Format a map in the requested output format.
pub fn format_map(title: &str, map: &Map<String, Value>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(map).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Markdown => format_map_markdown(title, map),
    }
}

/// Format candidate files, marking those that were merged.
pub fn format_files(config: &ResolvedConfig, existing_only: bool, format: OutputFormat) -> String {
    let existing = config.existing_files();
    let files: Vec<&String> = if existing_only {
        existing.iter().collect()
    } else {
        config.files().iter().collect()
    };

    match format {
        OutputFormat::Json => {
            let entries: Vec<Value> = files
                .iter()
                .map(|f| json!({ "path": f, "merged": existing.contains(*f) }))
                .collect();
            serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Markdown => {
            let mut md = String::new();
            md.push_str(&format!("# Files ({})\n\n", files.len()));
            for file in files {
                let mark = if existing.contains(file) { "x" } else { " " };
                md.push_str(&format!("- [{}] `{}`\n", mark, file));
            }
            md
        }
    }
}

/// Summary of a resolve: root, environment and file counts.
pub fn format_info(config: &ResolvedConfig, format: OutputFormat) -> String {
    let info = json!({
        "cwd": config.cwd().to_string_lossy(),
        "environment": config.environment(),
        "candidates": config.files().len(),
        "merged_files": config.existing_files(),
        "keys": config.values().len(),
    });

    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&info).unwrap_or_else(|_| info.to_string())
        }
        OutputFormat::Markdown => {
            let mut md = String::new();
            md.push_str("# Configuration\n");
            md.push_str(&format!("- **cwd**: `{}`\n", config.cwd().display()));
            md.push_str(&format!(
                "- **environment**: {}\n",
                config.environment().unwrap_or("(none)")
            ));
            md.push_str(&format!("- **candidates**: {}\n", config.files().len()));
            md.push_str(&format!("- **keys**: {}\n", config.values().len()));
            if !config.existing_files().is_empty() {
                md.push_str("\n## Merged files\n");
                for file in config.existing_files() {
                    md.push_str(&format!("- `{}`\n", file));
                }
            }
            md
        }
    }
}

/// Format recorded variable observations, grouped by name.
pub fn format_variables(groups: &[(String, Vec<Arc<Variable>>)], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let map: Map<String, Value> = groups
                .iter()
                .map(|(name, vars)| {
                    let list = vars
                        .iter()
                        .map(|v| serde_json::to_value(v.as_ref()).unwrap_or(Value::Null))
                        .collect();
                    (name.clone(), Value::Array(list))
                })
                .collect();
            serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Markdown => {
            let mut md = String::new();
            let count: usize = groups.iter().map(|(_, vars)| vars.len()).sum();
            md.push_str(&format!("# Variables ({})\n\n", count));
            for (name, vars) in groups {
                md.push_str(&format!("## {}\n", name));
                for var in vars {
                    let value = var
                        .value
                        .as_ref()
                        .map(markdown_cell)
                        .unwrap_or_else(|| "_undefined_".to_string());
                    if var.uses_fallback {
                        md.push_str(&format!("- {} (fallback)\n", value));
                    } else {
                        md.push_str(&format!("- {}\n", value));
                    }
                }
                md.push('\n');
            }
            md
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("md"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("plain")), "plain");
        assert_eq!(format_value(&json!(10)), "10");
        assert_eq!(format_value(&json!({"a": [1]})), r#"{"a":[1]}"#);
    }

    #[test]
    fn test_map_markdown_sorted_and_escaped() {
        let map = json!({"b": "x|y", "a": 1}).as_object().cloned().unwrap();
        let md = format_map_markdown("Values", &map);
        assert!(md.starts_with("# Values (2)"));
        let a = md.find("`a`").unwrap();
        let b = md.find("`b`").unwrap();
        assert!(a < b);
        assert!(md.contains("x\\|y"));
    }

    #[test]
    fn test_variables_markdown() {
        let groups = vec![(
            "PORT".to_string(),
            vec![Arc::new(
                Variable::new("PORT", Some(json!(80)), Some(json!(80))).using_fallback(true),
            )],
        )];
        let md = format_variables(&groups, OutputFormat::Markdown);
        assert!(md.contains("# Variables (1)"));
        assert!(md.contains("- 80 (fallback)"));
    }
}
