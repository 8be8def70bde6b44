//! The resolved configuration and its lookup protocol.
//!
//! A [`ResolvedConfig`] is built once by the resolver and never changes.
//! Values are read either one name at a time with [`ResolvedConfig::get`] or
//! through a fallback chain with [`ResolvedConfig::lookup`]. Both record a
//! [`Variable`] observation in the attached registry.

use crate::error::{ConfigError, ConfigResult};
use crate::variables::{Variable, VariableRegistry};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Metadata fields reachable through [`ResolvedConfig::get`] when no
/// configuration value shadows them.
pub const RESERVED_FIELDS: &[&str] = &["env", "cwd", "merged", "values", "files"];

/// Runtime type of a configuration value, used by type assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ValueType::String,
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Boolean,
            Value::Object(_) => ValueType::Object,
            Value::Array(_) => ValueType::Array,
            Value::Null => ValueType::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::Null => "null",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "string" => Some(ValueType::String),
            "number" => Some(ValueType::Number),
            "boolean" | "bool" => Some(ValueType::Boolean),
            "object" => Some(ValueType::Object),
            "array" => Some(ValueType::Array),
            "null" => Some(ValueType::Null),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints applied by [`ResolvedConfig::lookup`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupOptions {
    pub required: bool,
    pub value_type: Option<ValueType>,
}

impl LookupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when no name resolves and no fallback is given.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Fail when a resolved value has a different runtime type.
    pub fn of_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }
}

/// Immutable result of one resolver invocation.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    env: Map<String, Value>,
    values: Map<String, Value>,
    merged: Map<String, Value>,
    cwd: PathBuf,
    files: Vec<String>,
    existing_files: Vec<String>,
    environment: Option<String>,
    registry: Arc<VariableRegistry>,
}

impl ResolvedConfig {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        env: Map<String, Value>,
        values: Map<String, Value>,
        merged: Map<String, Value>,
        cwd: PathBuf,
        files: Vec<String>,
        existing_files: Vec<String>,
        environment: Option<String>,
        registry: Arc<VariableRegistry>,
    ) -> Self {
        Self {
            env,
            values,
            merged,
            cwd,
            files,
            existing_files,
            environment,
            registry,
        }
    }

    /// Environment snapshot the configuration was resolved against.
    pub fn env(&self) -> &Map<String, Value> {
        &self.env
    }

    /// Values merged from files and overrides.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Environment snapshot overlaid with `values`.
    pub fn merged(&self) -> &Map<String, Value> {
        &self.merged
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Every candidate path considered, relative to `cwd`.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Candidate paths that existed and were merged, in merge order.
    pub fn existing_files(&self) -> &[String] {
        &self.existing_files
    }

    /// Environment name used for the environment-specific pass.
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn registry(&self) -> &Arc<VariableRegistry> {
        &self.registry
    }

    /// Look up one name: `values`, then `merged`, then reserved metadata.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.observe(name, None)
    }

    /// Fallback-chain lookup.
    ///
    /// Tries each name in order and returns the first defined value. When
    /// every name is exhausted, returns `fallback` unchanged. `required`
    /// fails only when the final result is undefined; `value_type` is only
    /// checked against values found under one of `names`.
    pub fn lookup<I, S>(
        &self,
        names: I,
        fallback: Option<Value>,
        options: LookupOptions,
    ) -> ConfigResult<Option<Value>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut first: Option<String> = None;

        for name in names {
            let name = name.as_ref();
            first.get_or_insert_with(|| name.to_string());

            if let Some(value) = self.observe(name, fallback.clone()) {
                if let Some(expected) = options.value_type {
                    let actual = ValueType::of(&value);
                    if actual != expected {
                        return Err(ConfigError::type_mismatch(
                            name,
                            expected.as_str(),
                            actual.as_str(),
                            &value,
                        ));
                    }
                }
                return Ok(Some(value));
            }
        }

        if fallback.is_none() && options.required {
            return Err(ConfigError::missing_required(first.as_deref().unwrap_or("")));
        }
        Ok(fallback)
    }

    /// Convenience for a single name looked up as a string.
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Resolve `name` and record the observation.
    fn observe(&self, name: &str, fallback: Option<Value>) -> Option<Value> {
        if let Some(value) = self.values.get(name).or_else(|| self.merged.get(name)) {
            self.registry
                .create(Variable::new(name, Some(value.clone()), fallback));
            return Some(value.clone());
        }

        if let Some(value) = self.reserved(name) {
            return Some(value);
        }

        let uses_fallback = fallback.is_some();
        let recorded = fallback.clone();
        self.registry
            .create(Variable::new(name, recorded, fallback).using_fallback(uses_fallback));
        None
    }

    fn reserved(&self, name: &str) -> Option<Value> {
        if !RESERVED_FIELDS.contains(&name) {
            return None;
        }
        match name {
            "env" => Some(Value::Object(self.env.clone())),
            "cwd" => Some(Value::String(self.cwd.to_string_lossy().into_owned())),
            "merged" => Some(Value::Object(self.merged.clone())),
            "values" => Some(Value::Object(self.values.clone())),
            "files" => Some(Value::Array(
                self.files.iter().cloned().map(Value::String).collect(),
            )),
            _ => None,
        }
    }
}
