//! Layered configuration resolution.
//!
//! Discovers configuration files under a project root, merges them with the
//! environment and exposes the result through [`ResolvedConfig`].
//!
//! ## Search directories
//! Project root, `etc/`, `config/`, `.config/`, then caller-supplied
//! directories. Files in later directories override earlier ones.
//!
//! ## Merge order (lowest to highest)
//! 1. `common`
//! 2. `default`
//! 3. `local`
//! 4. `.env`
//! 5. `.<name>rc` and the `envrc` section of `package.json` (named modules only)
//! 6. Files for the environment named by `NODE_ENV`
//!
//! Caller overrides replace top-level keys after each pass, so they always win.
//!
//! Each searched role tries `.env.<role>` first and then `<dir>/<role>` in
//! every search directory, each with the extensions `json`, `yaml`, `yml`,
//! `ini` and `conf` after the bare name.
//!
//! ## Environment Variables
//! - `ENVRC_IGNORE_ALL` - Skip built-in directories and base-pass files
//! - `ENVRC_IGNORE_CWD` / `_ETC` / `_CONFIG` / `_DOT_CONFIG` - Skip one directory
//! - `ENVRC_IGNORE_COMMON` / `_DEFAULT` / `_LOCAL` / `_ENV` / `_RC` / `_MANIFEST` - Skip one role
//! - `ENVRC_IGNORE_<SCOPE>_<NAME>` - Skip one role in one directory
//! - `ENVRC_IGNORE` - One extra ignore glob

pub mod flags;
pub mod glob;
mod loader;
mod merge;
pub mod reader;
mod resolved;
pub mod root;
pub mod search;

pub use loader::{ENVIRONMENT_KEY, ResolveOptions, Resolver, resolve};
pub use merge::{deep_merge, merge_maps};
pub use reader::{DefaultFormatReader, Format, FormatError, FormatReader};
pub use resolved::{LookupOptions, RESERVED_FIELDS, ResolvedConfig, ValueType};
pub use search::{Candidate, FileRole};
