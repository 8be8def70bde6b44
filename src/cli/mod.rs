//! CLI command definitions for envrc
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod get;

use crate::config::ResolveOptions;
use clap::{Parser, Subcommand, ValueEnum};
use get::GetArgs;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Section of the resolved configuration to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Section {
    /// Values merged from files and overrides (default)
    #[default]
    Values,
    /// Environment overlaid with values
    Merged,
    /// Environment snapshot
    Env,
}

/// Resolve layered configuration files and environment variables
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root (`/srv/app`, `./app`) or a module name used to discover it
    #[arg(short = 'C', long, value_name = "TARGET", global = true)]
    pub cwd: Option<String>,

    /// Module name, used for root discovery and the rc file
    #[arg(short, long, global = true)]
    pub name: Option<String>,

    /// Extra environment variable (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE", global = true)]
    pub env: Vec<String>,

    /// Value that wins over every source (repeatable, VALUE parsed as JSON when valid)
    #[arg(short, long = "override", value_name = "KEY=VALUE", global = true)]
    pub overrides: Vec<String>,

    /// Extra search directory (repeatable)
    #[arg(short, long = "dir", value_name = "DIR", global = true)]
    pub dirs: Vec<PathBuf>,

    /// Glob of candidate files to skip (repeatable)
    #[arg(short, long, value_name = "GLOB", global = true)]
    pub ignore: Vec<String>,

    /// Output format: json (default) or markdown
    #[arg(short, long, default_value = "json", global = true)]
    pub format: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up a value through a fallback chain of names
    Get(GetArgs),

    /// Print a section of the resolved configuration (default if no subcommand given)
    Dump {
        /// Section to print
        #[arg(short, long, value_enum, default_value_t = Section::Values)]
        section: Section,
    },

    /// List candidate configuration files
    Files {
        /// Only list files that existed and were merged
        #[arg(long)]
        existing: bool,
    },

    /// Show the project root, environment name and merged files
    Info,
}

impl Cli {
    /// Build resolver options from the command line.
    pub fn resolve_options(&self) -> Result<ResolveOptions, String> {
        let mut options = match self.cwd.as_deref() {
            Some(target) => ResolveOptions::target(target),
            None => ResolveOptions::new(),
        };

        if let Some(ref name) = self.name {
            options.name = Some(name.clone());
        }
        options.env = parse_pairs(&self.env, |v| Value::String(v.to_string()))?;
        options.overrides = parse_pairs(&self.overrides, parse_value)?;
        options.dirs = self.dirs.clone();
        options.ignore = self.ignore.clone();
        Ok(options)
    }
}

/// Parse a CLI value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Split `KEY=VALUE`.
pub fn parse_key_value(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(format!("Invalid '{}': expected KEY=VALUE", raw)),
    }
}

fn parse_pairs(
    raw: &[String],
    convert: impl Fn(&str) -> Value,
) -> Result<Map<String, Value>, String> {
    let mut map = Map::new();
    for item in raw {
        let (key, value) = parse_key_value(item)?;
        map.insert(key.to_string(), convert(value));
    }
    Ok(map)
}
