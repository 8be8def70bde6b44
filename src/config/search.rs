//! Search directories and candidate file paths.
//!
//! Directories are enumerated once per resolve, in a fixed order, and every
//! role's candidate list is derived from that order. All paths here are
//! relative to the project root and use `/` separators; the project root
//! itself is the empty directory `""`.

use super::flags::IgnoreFlags;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions tried after the bare file name, in order.
pub const EXTENSIONS: &[&str] = &["json", "yaml", "yml", "ini", "conf"];

/// Built-in directories searched after the project root, lowest precedence first.
pub const BUILTIN_DIRS: &[&str] = &["etc", "config", ".config"];

/// The dotenv file merged after the `local` role.
pub const DOTENV_FILE: &str = ".env";

/// Category of a configuration file, which fixes its merge position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileRole {
    Common,
    Default,
    Local,
    Dotenv,
    Rc,
    Manifest,
    /// Environment-specific files for the named environment.
    Environment(String),
}

impl FileRole {
    /// Base name searched for this role, if it is a searched role.
    pub fn search_name(&self) -> Option<&str> {
        match self {
            FileRole::Common => Some("common"),
            FileRole::Default => Some("default"),
            FileRole::Local => Some("local"),
            FileRole::Environment(name) => Some(name.as_str()),
            FileRole::Dotenv | FileRole::Rc | FileRole::Manifest => None,
        }
    }

    /// Suffix of the `ENVRC_IGNORE_<FLAG>` that disables this role.
    pub fn flag(&self) -> Option<&'static str> {
        match self {
            FileRole::Common => Some("COMMON"),
            FileRole::Default => Some("DEFAULT"),
            FileRole::Local => Some("LOCAL"),
            FileRole::Dotenv => Some("ENV"),
            FileRole::Rc => Some("RC"),
            FileRole::Manifest => Some("MANIFEST"),
            FileRole::Environment(_) => None,
        }
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRole::Common => write!(f, "common"),
            FileRole::Default => write!(f, "default"),
            FileRole::Local => write!(f, "local"),
            FileRole::Dotenv => write!(f, "dotenv"),
            FileRole::Rc => write!(f, "rc"),
            FileRole::Manifest => write!(f, "manifest"),
            FileRole::Environment(name) => write!(f, "environment:{}", name),
        }
    }
}

/// A file path considered during discovery, whether or not it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path relative to the project root.
    pub path: String,
    pub role: FileRole,
}

impl Candidate {
    pub fn new(path: impl Into<String>, role: FileRole) -> Self {
        Self {
            path: path.into(),
            role,
        }
    }

    /// Absolute (or cwd-joined) location on disk.
    pub fn location(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.path)
    }
}

/// Render `dir` relative to `cwd` with forward slashes.
fn relative_dir(cwd: &Path, dir: &Path) -> String {
    let Ok(rel) = dir.strip_prefix(cwd) else {
        return dir.to_string_lossy().replace('\\', "/");
    };
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the ordered list of search directories.
///
/// Order: project root, `etc`, `config`, `.config`, then `extra` in the
/// order given. Built-ins can be switched off individually or together via
/// flags; `extra` directories are always considered. Only existing
/// directories are kept, and each is returned relative to `cwd`.
pub fn enumerate_dirs<P: AsRef<Path>>(cwd: &Path, flags: &IgnoreFlags<'_>, extra: &[P]) -> Vec<String> {
    let mut wanted: Vec<PathBuf> = Vec::new();

    if !flags.all() {
        if !flags.is_set("CWD") {
            wanted.push(PathBuf::new());
        }
        for dir in BUILTIN_DIRS {
            let flag = super::flags::flag_segment(dir);
            if !flags.is_set(&flag) {
                wanted.push(PathBuf::from(dir));
            }
        }
    }
    wanted.extend(extra.iter().map(|d| d.as_ref().to_path_buf()));

    let mut dirs: Vec<String> = Vec::new();
    for dir in wanted {
        let full = cwd.join(&dir);
        if !full.is_dir() {
            continue;
        }
        let rel = relative_dir(cwd, &full);
        if !dirs.contains(&rel) {
            dirs.push(rel);
        }
    }

    debug!(cwd = %cwd.display(), dirs = ?dirs, "Enumerated search directories");
    dirs
}

/// Push `prefix` followed by each extension variant.
fn push_variants(prefix: &str, role: &FileRole, out: &mut Vec<Candidate>) {
    out.push(Candidate::new(prefix, role.clone()));
    for ext in EXTENSIONS {
        out.push(Candidate::new(format!("{}.{}", prefix, ext), role.clone()));
    }
}

fn join_dir(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Candidate path generator bound to one enumerated directory list.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSearch<'a> {
    dirs: &'a [String],
    flags: IgnoreFlags<'a>,
}

impl<'a> CandidateSearch<'a> {
    pub fn new(dirs: &'a [String], flags: IgnoreFlags<'a>) -> Self {
        Self { dirs, flags }
    }

    /// Candidates for a searched role: `.env.<name>` variants first, then
    /// `<dir>/<name>` variants for each directory in order.
    ///
    /// Returns nothing for roles without a search name or with an empty one.
    pub fn role(&self, role: &FileRole) -> Vec<Candidate> {
        let mut out = Vec::new();
        let Some(name) = role.search_name() else {
            return out;
        };
        if name.is_empty() {
            return out;
        }

        if !self.flags.scoped("ENV", name) {
            push_variants(&format!("{}.{}", DOTENV_FILE, name), role, &mut out);
        }
        self.push_dir_variants(name, role, &mut out);
        out
    }

    /// Candidates for `.<module>rc`: the bare file at the root, then its
    /// directory-qualified variants.
    pub fn rc(&self, module: &str) -> Vec<Candidate> {
        let mut out = Vec::new();
        if module.is_empty() {
            return out;
        }
        let name = format!(".{}rc", module);
        out.push(Candidate::new(name.clone(), FileRole::Rc));
        self.push_dir_variants(&name, &FileRole::Rc, &mut out);
        out
    }

    fn push_dir_variants(&self, name: &str, role: &FileRole, out: &mut Vec<Candidate>) {
        for dir in self.dirs {
            let scope = if dir.is_empty() { "CWD" } else { dir.as_str() };
            if self.flags.scoped(scope, name) {
                continue;
            }
            push_variants(&join_dir(dir, name), role, out);
        }
    }
}

/// Drop repeated paths, keeping the first occurrence.
pub fn dedupe(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};
    use tempfile::TempDir;

    fn env(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn paths(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.path.as_str()).collect()
    }

    fn tree(dirs: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for dir in dirs {
            std::fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        temp
    }

    #[test]
    fn test_enumeration_order() {
        let temp = tree(&[".config", "config", "etc", "extra"]);
        let snapshot = Map::new();
        let flags = IgnoreFlags::new(&snapshot);

        let dirs = enumerate_dirs(temp.path(), &flags, &["extra", "missing"]);
        assert_eq!(dirs, vec!["", "etc", "config", ".config", "extra"]);
    }

    #[test]
    fn test_enumeration_skips_missing_dirs() {
        let temp = tree(&["config"]);
        let snapshot = Map::new();
        let flags = IgnoreFlags::new(&snapshot);

        let dirs = enumerate_dirs::<&str>(temp.path(), &flags, &[]);
        assert_eq!(dirs, vec!["", "config"]);
    }

    #[test]
    fn test_enumeration_flags() {
        let temp = tree(&["etc", "config", ".config", "extra"]);

        let snapshot = env(json!({"ENVRC_IGNORE_CWD": "1", "ENVRC_IGNORE_DOT_CONFIG": "1"}));
        let dirs = enumerate_dirs::<&str>(temp.path(), &IgnoreFlags::new(&snapshot), &[]);
        assert_eq!(dirs, vec!["etc", "config"]);

        let snapshot = env(json!({"ENVRC_IGNORE_ALL": "1"}));
        let dirs = enumerate_dirs(temp.path(), &IgnoreFlags::new(&snapshot), &["extra"]);
        assert_eq!(dirs, vec!["extra"]);
    }

    #[test]
    fn test_role_candidates() {
        let dirs = vec![String::new(), "etc".to_string()];
        let snapshot = Map::new();
        let search = CandidateSearch::new(&dirs, IgnoreFlags::new(&snapshot));

        let candidates = search.role(&FileRole::Default);
        assert_eq!(
            paths(&candidates),
            vec![
                ".env.default",
                ".env.default.json",
                ".env.default.yaml",
                ".env.default.yml",
                ".env.default.ini",
                ".env.default.conf",
                "default",
                "default.json",
                "default.yaml",
                "default.yml",
                "default.ini",
                "default.conf",
                "etc/default",
                "etc/default.json",
                "etc/default.yaml",
                "etc/default.yml",
                "etc/default.ini",
                "etc/default.conf",
            ]
        );
        assert!(candidates.iter().all(|c| c.role == FileRole::Default));
    }

    #[test]
    fn test_empty_environment_name_has_no_candidates() {
        let dirs = vec!["etc".to_string()];
        let snapshot = Map::new();
        let search = CandidateSearch::new(&dirs, IgnoreFlags::new(&snapshot));
        assert!(search.role(&FileRole::Environment(String::new())).is_empty());
        assert!(search.role(&FileRole::Manifest).is_empty());
    }

    #[test]
    fn test_scoped_ignore_flags() {
        let dirs = vec![String::new(), "etc".to_string(), "config".to_string()];
        let snapshot = env(json!({
            "ENVRC_IGNORE_ENV_PRODUCTION": "1",
            "ENVRC_IGNORE_ETC_PRODUCTION": "1",
            "ENVRC_IGNORE_CWD_PRODUCTION": "1",
        }));
        let search = CandidateSearch::new(&dirs, IgnoreFlags::new(&snapshot));

        let candidates = search.role(&FileRole::Environment("production".into()));
        assert_eq!(candidates.len(), 1 + EXTENSIONS.len());
        assert!(candidates.iter().all(|c| c.path.starts_with("config/production")));
    }

    #[test]
    fn test_rc_candidates() {
        let dirs = vec![String::new(), "etc".to_string()];
        let snapshot = Map::new();
        let search = CandidateSearch::new(&dirs, IgnoreFlags::new(&snapshot));

        let candidates = dedupe(search.rc("myapp"));
        let list = paths(&candidates);
        assert_eq!(list[0], ".myapprc");
        assert_eq!(list[1], ".myapprc.json");
        assert!(list.contains(&"etc/.myapprc"));
        assert!(list.contains(&"etc/.myapprc.conf"));
        assert_eq!(list.iter().filter(|p| **p == ".myapprc").count(), 1);
        assert!(search.rc("").is_empty());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(FileRole::Local.to_string(), "local");
        assert_eq!(
            FileRole::Environment("production".into()).to_string(),
            "environment:production"
        );
    }
}
