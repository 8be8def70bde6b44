//! Reading configuration files into value trees.
//!
//! The resolver only depends on the [`FormatReader`] trait; the default
//! implementation understands JSON, YAML, INI and dotenv files.

use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading a single configuration file.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid INI at line {line}: {message}")]
    Ini { line: usize, message: String },

    #[error("invalid dotenv content: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl FormatError {
    pub fn is_io(&self) -> bool {
        matches!(self, FormatError::Io(_))
    }
}

/// Parses a configuration file into a value tree.
pub trait FormatReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Value, FormatError>;
}

/// Concrete file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Ini,
    Dotenv,
}

impl Format {
    /// Format implied by a path's extension, if it has a known one.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "ini" | "conf" => Some(Format::Ini),
            _ => None,
        }
    }

    /// Guess the format of extensionless content.
    ///
    /// Dotenv wins over YAML when every line is an assignment, since a value
    /// like `Hello: World` also reads as a YAML mapping.
    pub fn sniff(content: &str) -> Self {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') {
            return Format::Json;
        }
        if is_dotenv(content) {
            return Format::Dotenv;
        }
        let has_section = content.lines().any(|line| {
            let line = line.trim();
            line.starts_with('[') && line.ends_with(']') && line.len() > 2
        });
        if has_section {
            return Format::Ini;
        }
        match serde_yaml::from_str::<Value>(content) {
            Ok(Value::Object(_)) => Format::Yaml,
            _ => Format::Dotenv,
        }
    }
}

/// Every non-blank, non-comment line is `[export ]KEY=...`.
fn is_dotenv(content: &str) -> bool {
    let mut assignments = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .peekable();
    if assignments.peek().is_none() {
        return false;
    }
    assignments.all(|line| {
        let line = line.strip_prefix("export ").map_or(line, str::trim_start);
        let Some((key, _)) = line.split_once('=') else {
            return false;
        };
        let mut chars = key.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    })
}

/// Reader used when no other reader is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatReader;

impl FormatReader for DefaultFormatReader {
    fn read(&self, path: &Path) -> Result<Value, FormatError> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        let format = Format::from_path(path).unwrap_or_else(|| Format::sniff(&content));
        parse(format, &content)
    }
}

/// Parse `content` as `format`.
pub fn parse(format: Format, content: &str) -> Result<Value, FormatError> {
    match format {
        Format::Json => Ok(serde_json::from_str(content)?),
        Format::Yaml => Ok(serde_yaml::from_str::<Value>(content)?),
        Format::Ini => parse_ini(content).map(Value::Object),
        Format::Dotenv => parse_dotenv(content).map(Value::Object),
    }
}

/// Parse `KEY=value` lines. Values are always strings.
pub fn parse_dotenv(content: &str) -> Result<Map<String, Value>, FormatError> {
    let mut map = Map::new();
    for item in dotenvy::from_read_iter(content.as_bytes()) {
        let (key, value) = item?;
        map.insert(key, Value::String(value));
    }
    Ok(map)
}

fn ini_error(line: usize, message: impl Into<String>) -> FormatError {
    FormatError::Ini {
        line,
        message: message.into(),
    }
}

fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

fn ini_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    let quoted = trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')));
    if quoted {
        return Value::String(unquote(trimmed).to_string());
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        other => Value::String(other.to_string()),
    }
}

/// Walk (creating as needed) the nested section for a dotted header.
fn section_mut<'m>(
    root: &'m mut Map<String, Value>,
    path: &[String],
    line: usize,
) -> Result<&'m mut Map<String, Value>, FormatError> {
    let mut current = root;
    for part in path {
        let entry = current
            .entry(part.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(map) => map,
            _ => return Err(ini_error(line, format!("section '{}' conflicts with a key", part))),
        };
    }
    Ok(current)
}

/// Parse INI content into a map; sections become nested maps.
pub fn parse_ini(content: &str) -> Result<Map<String, Value>, FormatError> {
    let mut root = Map::new();
    let mut section: Vec<String> = Vec::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = line
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .ok_or_else(|| ini_error(line_no, "unterminated section header"))?;
            let header = header.trim();
            if header.is_empty() {
                return Err(ini_error(line_no, "empty section header"));
            }
            section = header.split('.').map(|s| unquote(s).to_string()).collect();
            section_mut(&mut root, &section, line_no)?;
            continue;
        }

        let (raw_key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), ini_value(value)),
            None => (line, Value::Bool(true)),
        };
        if raw_key.is_empty() {
            return Err(ini_error(line_no, "missing key"));
        }

        let target = section_mut(&mut root, &section, line_no)?;
        match raw_key.strip_suffix("[]") {
            Some(key) => {
                let key = unquote(key).to_string();
                match target.entry(key).or_insert_with(|| Value::Array(Vec::new())) {
                    Value::Array(items) => items.push(value),
                    existing => *existing = Value::Array(vec![existing.take(), value]),
                }
            }
            None => {
                target.insert(unquote(raw_key).to_string(), value);
            }
        }
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/default.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("default.YML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("x.conf")), Some(Format::Ini));
        assert_eq!(Format::from_path(Path::new(".env.production")), None);
        assert_eq!(Format::from_path(Path::new(".myapprc")), None);
    }

    #[test]
    fn test_sniff_content() {
        assert_eq!(Format::sniff("  {\"a\": 1}"), Format::Json);
        assert_eq!(Format::sniff("[server]\nport=1"), Format::Ini);
        assert_eq!(Format::sniff("value: something\nother: 2\n"), Format::Yaml);
        assert_eq!(Format::sniff("FOO=bar\nBAZ=qux\n"), Format::Dotenv);
        assert_eq!(Format::sniff("GREETING=Hello: World\n"), Format::Dotenv);
        assert_eq!(Format::sniff("# keys\nexport TOKEN=a: b\n"), Format::Dotenv);
        assert_eq!(Format::sniff("url: http://x?a=b\n"), Format::Yaml);
    }

    #[test]
    fn test_dotenv_value_with_colon() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".env");
        std::fs::write(&path, "GREETING=\"Hello: World\"\nNAME=envrc\n").unwrap();

        let value = DefaultFormatReader.read(&path).unwrap();
        assert_eq!(value, json!({"GREETING": "Hello: World", "NAME": "envrc"}));
    }

    #[test]
    fn test_parse_ini_sections_and_literals() {
        let content = r#"
; comment
name = app
debug = true
flag

[server]
host = "localhost"
port = 8080

[server.tls]
enabled = false

[list]
items[] = a
items[] = b
"#;
        let parsed = parse_ini(content).unwrap();
        assert_eq!(
            Value::Object(parsed),
            json!({
                "name": "app",
                "debug": true,
                "flag": true,
                "server": {"host": "localhost", "port": "8080", "tls": {"enabled": false}},
                "list": {"items": ["a", "b"]}
            })
        );
    }

    #[test]
    fn test_parse_ini_rejects_bad_header() {
        let err = parse_ini("a = 1\n[broken\n").unwrap_err();
        assert!(matches!(err, FormatError::Ini { line: 2, .. }));
    }

    #[test]
    fn test_parse_dotenv() {
        let parsed = parse_dotenv("FOO=bar\n# comment\nQUOTED=\"hello world\"\n").unwrap();
        assert_eq!(Value::Object(parsed), json!({"FOO": "bar", "QUOTED": "hello world"}));
    }

    #[test]
    fn test_default_reader_dispatch() {
        let temp = TempDir::new().unwrap();
        let json_path = temp.path().join("default.json");
        let yaml_path = temp.path().join("local.yaml");
        let rc_path = temp.path().join(".myapprc");
        let empty_path = temp.path().join("common");
        std::fs::write(&json_path, r#"{"a": {"b": 1}}"#).unwrap();
        std::fs::write(&yaml_path, "a:\n  c: 2\n").unwrap();
        std::fs::write(&rc_path, "TOKEN=abc\n").unwrap();
        std::fs::write(&empty_path, "\n\n").unwrap();

        let reader = DefaultFormatReader;
        assert_eq!(reader.read(&json_path).unwrap(), json!({"a": {"b": 1}}));
        assert_eq!(reader.read(&yaml_path).unwrap(), json!({"a": {"c": 2}}));
        assert_eq!(reader.read(&rc_path).unwrap(), json!({"TOKEN": "abc"}));
        assert_eq!(reader.read(&empty_path).unwrap(), json!({}));
    }

    #[test]
    fn test_default_reader_propagates_parse_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("default.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = DefaultFormatReader.read(&path).unwrap_err();
        assert!(matches!(err, FormatError::Json(_)));
        assert!(!err.is_io());
    }

    #[test]
    fn test_default_reader_missing_file_is_io() {
        let temp = TempDir::new().unwrap();
        let err = DefaultFormatReader
            .read(&temp.path().join("nope.json"))
            .unwrap_err();
        assert!(err.is_io());
    }
}
