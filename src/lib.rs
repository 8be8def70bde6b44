//! envrc library
//!
//! Layered configuration resolver: file discovery, two-pass merging and
//! fallback-chain lookups with variable observation.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod variables;

pub use config::{LookupOptions, ResolveOptions, ResolvedConfig, Resolver, ValueType, resolve};
pub use error::{ConfigError, ConfigResult, ErrorCode};
pub use variables::{Variable, VariableRegistry};
