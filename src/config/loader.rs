//! Configuration resolver with two-pass layered merging.
//!
//! Base pass, lowest to highest precedence:
//! `common` < `default` < `local` < `.env` < `.<name>rc` < manifest section,
//! followed by caller overrides. The environment name is then taken from the
//! merged values (falling back to the environment snapshot) and a second
//! pass merges that environment's files into the same accumulator.

use super::flags::IgnoreFlags;
use super::glob::IgnoreSet;
use super::merge::merge_maps;
use super::reader::{DefaultFormatReader, FormatReader};
use super::resolved::ResolvedConfig;
use super::root::{MANIFEST_FILE, MANIFEST_SECTION, is_path_like, locate_root, process_cwd};
use super::search::{Candidate, CandidateSearch, DOTENV_FILE, FileRole, dedupe, enumerate_dirs};
use crate::error::{ConfigError, ConfigResult};
use crate::variables::VariableRegistry;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Key naming the active environment.
pub const ENVIRONMENT_KEY: &str = "NODE_ENV";

/// Shell artifact stripped from every environment snapshot.
const SHELL_ARTIFACT_KEY: &str = "_";

/// Caller options for one resolve.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Module name, used to locate the project root and the rc file.
    pub name: Option<String>,
    /// Explicit project root (or the start of the root search when `name` is set).
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered over the base environment.
    pub env: Map<String, Value>,
    /// Values that win over every file and environment source.
    pub overrides: Map<String, Value>,
    /// Extra search directories, searched after the built-ins.
    pub dirs: Vec<PathBuf>,
    /// Glob patterns for candidate paths to skip.
    pub ignore: Vec<String>,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret a positional argument: a path-like string (`/`, `./`,
    /// `../`) becomes the project root, anything else a module name.
    pub fn target(arg: &str) -> Self {
        let mut options = Self::new();
        if is_path_like(arg) {
            options.cwd = Some(PathBuf::from(arg));
        } else if !arg.is_empty() {
            options.name = Some(arg.to_string());
        }
        options
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    pub fn with_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore.push(pattern.into());
        self
    }
}

/// Resolves configuration for a project.
///
/// Holds the collaborators a resolve needs: the file reader, the variable
/// registry lookups are recorded in, and the base environment.
#[derive(Clone)]
pub struct Resolver {
    reader: Arc<dyn FormatReader>,
    registry: Arc<VariableRegistry>,
    /// Replaces the process environment when set.
    base_env: Option<Map<String, Value>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry_count", &self.registry.count())
            .field("base_env", &self.base_env.as_ref().map(Map::len))
            .finish()
    }
}

impl Resolver {
    /// Resolver with the default reader, the global registry and the
    /// process environment.
    pub fn new() -> Self {
        Self {
            reader: Arc::new(DefaultFormatReader),
            registry: VariableRegistry::global(),
            base_env: None,
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn FormatReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_registry(mut self, registry: Arc<VariableRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Use `env` instead of the process environment.
    pub fn with_base_env(mut self, env: Map<String, Value>) -> Self {
        self.base_env = Some(env);
        self
    }

    pub fn registry(&self) -> &Arc<VariableRegistry> {
        &self.registry
    }

    /// Discover, read and merge every configuration layer.
    ///
    /// Missing files are skipped. A file that exists but cannot be read or
    /// parsed aborts the whole resolve.
    pub fn resolve(&self, options: ResolveOptions) -> ConfigResult<ResolvedConfig> {
        let (name, cwd) = resolve_target(&options);
        let env = self.snapshot(&options);
        let flags = IgnoreFlags::new(&env);

        let dirs = enumerate_dirs(&cwd, &flags, &options.dirs);
        let search = CandidateSearch::new(&dirs, flags);

        let mut ignore_patterns = options.ignore.clone();
        ignore_patterns.extend(flags.globs());
        let ignore = IgnoreSet::new(&ignore_patterns);

        let base = base_candidates(&search, &flags, name.as_deref());
        let mut existing = Vec::new();

        let mut values = self.merge_files(&cwd, &base, &ignore, Map::new(), &mut existing)?;
        values = merge_overrides(values, &options.overrides);

        let environment = environment_name(&values, &env);
        debug!(environment = ?environment, "Resolved environment name");

        let env_candidates = match &environment {
            Some(environment) => dedupe(search.role(&FileRole::Environment(environment.clone()))),
            None => Vec::new(),
        };
        values = self.merge_files(&cwd, &env_candidates, &ignore, values, &mut existing)?;
        values = merge_overrides(values, &options.overrides);

        let mut merged = env.clone();
        merged.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));

        let files = base
            .iter()
            .chain(env_candidates.iter())
            .map(|c| c.path.clone())
            .collect();

        debug!(
            cwd = %cwd.display(),
            merged_files = existing.len(),
            keys = values.len(),
            "Configuration resolved"
        );

        Ok(ResolvedConfig::new(
            env,
            values,
            merged,
            cwd,
            files,
            existing,
            environment,
            Arc::clone(&self.registry),
        ))
    }

    /// Environment snapshot: base environment, then caller `env`, then
    /// caller overrides, minus the shell artifact key.
    fn snapshot(&self, options: &ResolveOptions) -> Map<String, Value> {
        let mut env = match &self.base_env {
            Some(base) => base.clone(),
            None => std::env::vars()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        };
        env.extend(options.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env.extend(options.overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        env.remove(SHELL_ARTIFACT_KEY);
        env
    }

    /// Fold eligible candidates into `acc`, in order.
    fn merge_files(
        &self,
        cwd: &Path,
        candidates: &[Candidate],
        ignore: &IgnoreSet,
        mut acc: Map<String, Value>,
        existing: &mut Vec<String>,
    ) -> ConfigResult<Map<String, Value>> {
        for candidate in candidates {
            if let Some(pattern) = ignore.matching(&candidate.path) {
                trace!(file = %candidate.path, pattern = %pattern, "Candidate ignored by glob");
                continue;
            }
            let location = candidate.location(cwd);
            if !location.is_file() {
                continue;
            }

            let Some(layer) = self.read_layer(&location, candidate)? else {
                continue;
            };
            debug!(
                file = %candidate.path,
                role = %candidate.role,
                keys = layer.len(),
                "Merging configuration file"
            );
            acc = merge_maps(acc, layer);
            existing.push(candidate.path.clone());
        }
        Ok(acc)
    }

    fn read_layer(
        &self,
        location: &Path,
        candidate: &Candidate,
    ) -> ConfigResult<Option<Map<String, Value>>> {
        let parsed = self
            .reader
            .read(location)
            .map_err(|e| ConfigError::from_format(location, e))?;

        let parsed = if candidate.role == FileRole::Manifest {
            match parsed {
                Value::Object(mut manifest) => manifest.remove(MANIFEST_SECTION).unwrap_or(Value::Null),
                _ => Value::Null,
            }
        } else {
            parsed
        };

        match parsed {
            Value::Object(map) => Ok(Some(map)),
            Value::Null if candidate.role == FileRole::Manifest => Ok(None),
            other => {
                warn!(
                    file = %candidate.path,
                    kind = %super::resolved::ValueType::of(&other),
                    "Configuration file is not a map, skipping"
                );
                Ok(None)
            }
        }
    }
}

/// Resolve with default collaborators.
pub fn resolve(options: ResolveOptions) -> ConfigResult<ResolvedConfig> {
    Resolver::new().resolve(options)
}

/// Work out the module name and project root from the options.
fn resolve_target(options: &ResolveOptions) -> (Option<String>, PathBuf) {
    let mut name = options.name.clone().filter(|n| !n.is_empty());
    let mut cwd = options.cwd.clone();

    if let Some(n) = &name
        && is_path_like(n)
    {
        cwd = Some(PathBuf::from(n));
        name = None;
    }

    let cwd = match (&name, cwd) {
        (Some(_), start) => locate_root(&start.unwrap_or_else(process_cwd)),
        (None, Some(cwd)) => cwd,
        (None, None) => process_cwd(),
    };
    (name, cwd)
}

/// Base-pass candidates in precedence order.
fn base_candidates(
    search: &CandidateSearch<'_>,
    flags: &IgnoreFlags<'_>,
    name: Option<&str>,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    if flags.all() {
        return candidates;
    }

    let enabled = |role: &FileRole| role.flag().is_none_or(|flag| !flags.is_set(flag));

    for role in [FileRole::Common, FileRole::Default, FileRole::Local] {
        if enabled(&role) {
            candidates.extend(search.role(&role));
        }
    }
    if enabled(&FileRole::Dotenv) {
        candidates.push(Candidate::new(DOTENV_FILE, FileRole::Dotenv));
    }
    if let Some(name) = name {
        if enabled(&FileRole::Rc) {
            candidates.extend(search.rc(name));
        }
        if enabled(&FileRole::Manifest) {
            candidates.push(Candidate::new(MANIFEST_FILE, FileRole::Manifest));
        }
    }
    dedupe(candidates)
}

/// Overrides replace top-level keys outright.
fn merge_overrides(mut values: Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overrides {
        values.insert(key.clone(), value.clone());
    }
    values
}

/// First set `NODE_ENV` from the merged values, then the snapshot.
///
/// Any non-empty string counts, including `"0"` and `"false"`; only `null`,
/// `false`, `0` and `""` are unset.
fn environment_name(values: &Map<String, Value>, env: &Map<String, Value>) -> Option<String> {
    [values.get(ENVIRONMENT_KEY), env.get(ENVIRONMENT_KEY)]
        .into_iter()
        .flatten()
        .find_map(|v| match v {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
}
