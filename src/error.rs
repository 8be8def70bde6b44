//! Structured error types for resolution and lookups.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::config::FormatError;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lookup errors
    MissingRequiredValue,
    TypeMismatch,

    // Resolution errors
    ParseFailure,
    ReadFailure,
}

/// Structured error for resolver and accessor failures.
#[derive(Debug, Serialize)]
pub struct ConfigError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ConfigError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_required(name: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredValue,
            format!("undefined value for '{}'", name),
        )
        .with_field(name)
    }

    pub fn type_mismatch(name: &str, expected: &str, actual: &str, value: &Value) -> Self {
        Self::new(
            ErrorCode::TypeMismatch,
            format!(
                "'{}' requires type {}, but got type {} ({})",
                name, expected, actual, value
            ),
        )
        .with_field(name)
        .with_details(value.to_string())
    }

    pub fn from_format(path: &Path, err: FormatError) -> Self {
        let code = if err.is_io() {
            ErrorCode::ReadFailure
        } else {
            ErrorCode::ParseFailure
        };
        Self::new(
            code,
            format!("Failed to load config file {}: {}", path.display(), err),
        )
        .with_field(path.to_string_lossy())
        .with_details(err.to_string())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Result type for resolver operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
