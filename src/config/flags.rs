//! Environment flags that switch parts of the file search off.
//!
//! Every flag is read from the resolved environment snapshot, so flags can
//! come from the process environment or from the caller's `env` option.

use heck::ToShoutySnakeCase;
use serde_json::{Map, Value};

/// Prefix shared by every ignore flag.
pub const IGNORE_PREFIX: &str = "ENVRC_IGNORE";

/// Flag holding extra ignore globs.
pub const IGNORE_GLOB_FLAG: &str = "ENVRC_IGNORE";

/// JavaScript-style truthiness for flag values.
///
/// Strings `""`, `"0"` and `"false"` are falsy so that `FLAG=0` in a shell
/// turns a flag off rather than on.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Convert a directory or file name into a flag segment.
///
/// A leading dot is spelled `DOT_` so `.config` and `config` stay distinct.
/// The empty string (the project root itself) maps to `CWD`.
pub fn flag_segment(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        return "CWD".to_string();
    }
    match trimmed.strip_prefix('.') {
        Some(rest) => format!("DOT_{}", rest.to_shouty_snake_case()),
        None => trimmed.to_shouty_snake_case(),
    }
}

/// Read-only view over the `ENVRC_IGNORE_*` flags of an environment snapshot.
#[derive(Debug, Clone, Copy)]
pub struct IgnoreFlags<'a> {
    env: &'a Map<String, Value>,
}

impl<'a> IgnoreFlags<'a> {
    pub fn new(env: &'a Map<String, Value>) -> Self {
        Self { env }
    }

    /// True when `ENVRC_IGNORE_<KEY>` is set.
    pub fn is_set(&self, key: &str) -> bool {
        self.env
            .get(&format!("{}_{}", IGNORE_PREFIX, key))
            .is_some_and(is_truthy)
    }

    /// Global switch for the built-in directories and every base-phase role.
    pub fn all(&self) -> bool {
        self.is_set("ALL")
    }

    /// Fine-grained `ENVRC_IGNORE_<SCOPE>_<NAME>` check.
    pub fn scoped(&self, scope: &str, name: &str) -> bool {
        self.is_set(&format!("{}_{}", flag_segment(scope), flag_segment(name)))
    }

    /// Glob patterns supplied through `ENVRC_IGNORE`.
    ///
    /// A string is one pattern, so brace alternation such as
    /// `config/*.{yaml,yml}` survives intact. An array holds several.
    pub fn globs(&self) -> Vec<String> {
        match self.env.get(IGNORE_GLOB_FLAG) {
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!("1")));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(2)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&json!("FALSE")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn test_flag_segments() {
        assert_eq!(flag_segment(""), "CWD");
        assert_eq!(flag_segment("etc"), "ETC");
        assert_eq!(flag_segment(".config"), "DOT_CONFIG");
        assert_eq!(flag_segment(".myapprc"), "DOT_MYAPPRC");
        assert_eq!(flag_segment("nested/dir"), "NESTED_DIR");
        assert_eq!(flag_segment("production"), "PRODUCTION");
    }

    #[test]
    fn test_scoped_flags() {
        let snapshot = env(json!({
            "ENVRC_IGNORE_ETC_DEFAULT": "1",
            "ENVRC_IGNORE_ENV_PRODUCTION": "true",
            "ENVRC_IGNORE_CONFIG_LOCAL": "0",
        }));
        let flags = IgnoreFlags::new(&snapshot);
        assert!(flags.scoped("etc", "default"));
        assert!(flags.scoped("ENV", "production"));
        assert!(!flags.scoped("config", "local"));
        assert!(!flags.scoped(".config", "default"));
        assert!(!flags.all());
    }

    #[test]
    fn test_globs_from_environment() {
        let snapshot = env(json!({"ENVRC_IGNORE": " config/*.{yaml,yml} "}));
        let flags = IgnoreFlags::new(&snapshot);
        assert_eq!(flags.globs(), vec!["config/*.{yaml,yml}"]);

        let snapshot = env(json!({"ENVRC_IGNORE": ["etc/*", "config/local*"]}));
        assert_eq!(IgnoreFlags::new(&snapshot).globs(), vec!["etc/*", "config/local*"]);

        let snapshot = env(json!({"ENVRC_IGNORE": ""}));
        assert!(IgnoreFlags::new(&snapshot).globs().is_empty());

        let empty = Map::new();
        assert!(IgnoreFlags::new(&empty).globs().is_empty());
    }
}
