//! Ignore-glob matching for candidate paths.
//!
//! Patterns are compiled to anchored regular expressions. Supported syntax:
//! `*` (within one path segment), `**` (across segments), `?`, `[...]`
//! classes and `{a,b}` alternation. Like shell globs, a wildcard at the start
//! of a segment does not match a leading dot.

use regex_lite::Regex;
use tracing::warn;

/// A set of compiled ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<(String, Regex)>,
}

impl IgnoreSet {
    /// Compile every pattern. Invalid patterns are logged and dropped.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            match Regex::new(&glob_to_regex(pattern)) {
                Ok(re) => compiled.push((pattern.to_string(), re)),
                Err(e) => warn!(pattern = %pattern, error = %e, "Ignoring invalid glob pattern"),
            }
        }
        Self { patterns: compiled }
    }

    /// The pattern that matches `path`, if any.
    pub fn matching(&self, path: &str) -> Option<&str> {
        let path = path.trim_start_matches("./");
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(path))
            .map(|(pattern, _)| pattern.as_str())
    }

}

/// Translate a glob into an anchored regex source string.
pub fn glob_to_regex(glob: &str) -> String {
    let glob = glob.trim_start_matches("./");
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::from("^");
    let mut in_group = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let segment_start = i == 0 || chars[i - 1] == '/';
        match c {
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    // `**/` also matches zero directories.
                    if chars.get(i + 2) == Some(&'/') {
                        out.push_str("(?:.*/)?");
                        i += 3;
                    } else {
                        out.push_str(".*");
                        i += 2;
                    }
                    continue;
                }
                if segment_start {
                    out.push_str("(?:[^./][^/]*)?");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => {
                if segment_start {
                    out.push_str("[^./]");
                } else {
                    out.push_str("[^/]");
                }
            }
            '[' => match chars[i + 1..].iter().position(|&ch| ch == ']') {
                Some(offset) if offset > 0 => {
                    let class: String = chars[i + 1..i + 1 + offset].iter().collect();
                    let class = match class.strip_prefix('!') {
                        Some(rest) => format!("^{}", rest),
                        None => class,
                    };
                    out.push('[');
                    out.push_str(&class.replace('\\', "\\\\"));
                    out.push(']');
                    i += offset + 2;
                    continue;
                }
                _ => out.push_str("\\["),
            },
            '{' => {
                in_group += 1;
                out.push_str("(?:");
            }
            '}' if in_group > 0 => {
                in_group -= 1;
                out.push(')');
            }
            ',' if in_group > 0 => out.push('|'),
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    push_literal(&mut out, next);
                    i += 2;
                    continue;
                }
                out.push_str("\\\\");
            }
            other => push_literal(&mut out, other),
        }
        i += 1;
    }

    // Unbalanced braces are treated as an unterminated group and closed.
    for _ in 0..in_group {
        out.push(')');
    }
    out.push('$');
    out
}

fn push_literal(out: &mut String, c: char) {
    if "\\.+*?()|[]{}^$".contains(c) {
        out.push('\\');
    }
    out.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> IgnoreSet {
        IgnoreSet::new(patterns.iter().copied())
    }

    impl IgnoreSet {
        fn is_ignored(&self, path: &str) -> bool {
            self.matching(path).is_some()
        }
    }

    #[test]
    fn test_star_stays_in_segment() {
        let ignore = set(&["etc/*"]);
        assert!(ignore.is_ignored("etc/default"));
        assert!(ignore.is_ignored("etc/local.json"));
        assert!(!ignore.is_ignored("etc/nested/default"));
        assert!(!ignore.is_ignored("config/default"));
        assert!(!ignore.is_ignored("etc"));
    }

    #[test]
    fn test_star_skips_dotfiles() {
        let ignore = set(&["*"]);
        assert!(ignore.is_ignored("default"));
        assert!(!ignore.is_ignored(".env"));
        assert!(set(&[".*"]).is_ignored(".env"));
    }

    #[test]
    fn test_double_star() {
        let ignore = set(&["**/local*"]);
        assert!(ignore.is_ignored("local"));
        assert!(ignore.is_ignored("config/local.yaml"));
        assert!(ignore.is_ignored("a/b/local.ini"));
        assert!(!ignore.is_ignored("config/default"));
    }

    #[test]
    fn test_alternation_and_classes() {
        let ignore = set(&["config/*.{yaml,yml}", "etc/defaul[tx]"]);
        assert!(ignore.is_ignored("config/default.yaml"));
        assert!(ignore.is_ignored("config/default.yml"));
        assert!(!ignore.is_ignored("config/default.json"));
        assert!(ignore.is_ignored("etc/default"));
        assert!(!ignore.is_ignored("etc/defaulz"));
    }

    #[test]
    fn test_literal_dots_are_escaped() {
        let ignore = set(&[".env.production"]);
        assert!(ignore.is_ignored(".env.production"));
        assert!(ignore.is_ignored("./.env.production"));
        assert!(!ignore.is_ignored(".envXproduction"));
    }

    #[test]
    fn test_empty_patterns_ignore_nothing() {
        let ignore = set(&["", "   "]);
        assert!(ignore.patterns.is_empty());
        assert!(!ignore.is_ignored("etc/default"));
    }

    #[test]
    fn test_matching_reports_pattern() {
        let ignore = set(&["config/*", "etc/*"]);
        assert_eq!(ignore.matching("etc/local"), Some("etc/*"));
        assert_eq!(ignore.matching("config/a.json"), Some("config/*"));
        assert_eq!(ignore.matching("other/a.json"), None);
    }
}
