//! Project root discovery.
//!
//! Walks up from a starting directory looking for the project manifest.
//! Never fails: when no manifest is found the process working directory is
//! returned instead.

use std::path::{Path, PathBuf};
use tracing::debug;

/// File that marks a project root. Also the source of the manifest section.
pub const MANIFEST_FILE: &str = "package.json";

/// Key extracted from the manifest and merged as a configuration layer.
pub const MANIFEST_SECTION: &str = "envrc";

/// Whether a positional argument names a path rather than a module.
///
/// Matches `/…`, `./…`, `../…` (and any run of dots followed by a slash).
pub fn is_path_like(arg: &str) -> bool {
    let rest = arg.trim_start_matches('.');
    rest.starts_with('/')
}

/// The process working directory, falling back to `.` if it is unavailable.
pub fn process_cwd() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Find the nearest ancestor of `start` (inclusive) containing [`MANIFEST_FILE`].
pub fn locate_root(start: &Path) -> PathBuf {
    for dir in start.ancestors() {
        if dir.as_os_str().is_empty() {
            break;
        }
        if dir.join(MANIFEST_FILE).is_file() {
            debug!(root = %dir.display(), "Found project manifest");
            return dir.to_path_buf();
        }
    }

    let cwd = process_cwd();
    debug!(
        start = %start.display(),
        cwd = %cwd.display(),
        "No project manifest found, using working directory"
    );
    cwd
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_like_arguments() {
        assert!(is_path_like("/abs/path"));
        assert!(is_path_like("./rel"));
        assert!(is_path_like("../up"));
        assert!(!is_path_like("my-module"));
        assert!(!is_path_like(".myrc"));
        assert!(!is_path_like(""));
    }

    #[test]
    fn test_locate_root_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(MANIFEST_FILE), "{}").unwrap();

        assert_eq!(locate_root(&nested), temp.path());
    }

    #[test]
    fn test_locate_root_prefers_nearest() {
        let temp = TempDir::new().unwrap();
        let inner = temp.path().join("inner");
        let nested = inner.join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(MANIFEST_FILE), "{}").unwrap();
        std::fs::write(inner.join(MANIFEST_FILE), "{}").unwrap();

        assert_eq!(locate_root(&nested), inner);
    }

    #[test]
    fn test_locate_root_ignores_manifest_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("x");
        std::fs::create_dir_all(nested.join(MANIFEST_FILE)).unwrap();
        std::fs::write(temp.path().join(MANIFEST_FILE), "{}").unwrap();

        assert_eq!(locate_root(&nested), temp.path());
    }
}
