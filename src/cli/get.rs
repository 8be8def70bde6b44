//! Get subcommand for the envrc CLI
//!
//! Looks up one or more names as a fallback chain.

use crate::config::{LookupOptions, ValueType};
use clap::Args;
use serde_json::Value;

/// Arguments for the get subcommand
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Names to try in order; the first defined value wins
    #[arg(value_name = "NAME", required = true, num_args = 1..)]
    pub names: Vec<String>,

    /// Value returned when no name resolves (parsed as JSON when valid)
    #[arg(long, value_name = "VALUE")]
    pub fallback: Option<String>,

    /// Fail when no name resolves and no fallback is given
    #[arg(long)]
    pub required: bool,

    /// Require the resolved value to have this type
    ///
    /// One of: string, number, boolean, object, array, null
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_value_type)]
    pub value_type: Option<ValueType>,

    /// Print the recorded variable observations to stderr
    #[arg(long)]
    pub trace: bool,
}

impl GetArgs {
    pub fn fallback_value(&self) -> Option<Value> {
        self.fallback.as_deref().map(super::parse_value)
    }

    pub fn lookup_options(&self) -> LookupOptions {
        LookupOptions {
            required: self.required,
            value_type: self.value_type,
        }
    }
}

fn parse_value_type(s: &str) -> Result<ValueType, String> {
    ValueType::from_str(s).ok_or_else(|| {
        format!(
            "Invalid type '{}'. Valid options: string, number, boolean, object, array, null",
            s
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value_type() {
        assert_eq!(parse_value_type("String"), Ok(ValueType::String));
        assert!(parse_value_type("float").is_err());
    }

    #[test]
    fn test_fallback_value() {
        let args = GetArgs {
            names: vec!["A".into()],
            fallback: Some("42".into()),
            required: true,
            value_type: None,
            trace: false,
        };
        assert_eq!(args.fallback_value(), Some(json!(42)));
        assert!(args.lookup_options().required);
    }
}
