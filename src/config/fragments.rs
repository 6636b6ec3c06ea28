//! User configuration fragments
//!
//! `*.cnf` files from the user configuration directory, read in file name
//! order. Variables are substituted before parsing, the way `envsubst`
//! would: `$NAME` and `${NAME}`, unknown names become empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::errors::{ValidationError, ValidationResult};

const FRAGMENT_EXTENSION: &str = "cnf";

fn variable_regex() -> &'static Regex {
    static VAR: OnceLock<Regex> = OnceLock::new();
    VAR.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("static variable pattern")
    })
}

/// Substitute `$NAME` / `${NAME}` references
pub fn substitute(text: &str, vars: &BTreeMap<String, String>) -> String {
    variable_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            vars.get(name).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// A fragment as read from disk, before substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFragment {
    /// Source file
    pub path: PathBuf,
    /// File content
    pub text: String,
}

impl RawFragment {
    /// Fragment from in-memory text
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read every `*.cnf` below `dir`, sorted by file name.
    ///
    /// A missing directory means no fragments.
    pub fn load_dir(dir: &Path) -> ValidationResult<Vec<Self>> {
        let unreadable = |reason: String| ValidationError::UnreadableFragment {
            path: dir.display().to_string(),
            reason,
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(unreadable(e.to_string())),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| unreadable(e.to_string()))?.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(FRAGMENT_EXTENSION)
            {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let text = fs::read_to_string(&path).map_err(|e| {
                    ValidationError::UnreadableFragment {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Self { path, text })
            })
            .collect()
    }

    /// Substitute variables and parse
    pub fn render(&self, vars: &BTreeMap<String, String>) -> ValidationResult<ConfigFragment> {
        ConfigFragment::parse(&self.path, &substitute(&self.text, vars))
    }
}

/// One `[section]` with its entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSection {
    /// Section name, lowercased
    pub name: String,
    /// `key[=value]` entries in file order
    pub entries: Vec<(String, Option<String>)>,
}

impl FragmentSection {
    /// Whether this section configures the server
    pub fn is_server(&self) -> bool {
        self.name == "mysqld" || self.name == "server"
    }
}

/// A parsed option-file fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFragment {
    /// Source file
    pub path: PathBuf,
    /// Sections in file order
    pub sections: Vec<FragmentSection>,
}

impl ConfigFragment {
    /// Parse option-file text
    pub fn parse(path: &Path, text: &str) -> ValidationResult<Self> {
        let mut sections: Vec<FragmentSection> = Vec::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let malformed = |reason: &str| ValidationError::MalformedFragment {
                path: path.display().to_string(),
                line: index + 1,
                reason: reason.to_string(),
            };

            if line.starts_with('!') {
                return Err(malformed("include directives are not supported in fragments"));
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| malformed("unterminated section header"))?;
                sections.push(FragmentSection {
                    name: name.to_ascii_lowercase(),
                    entries: Vec::new(),
                });
                continue;
            }

            let section = sections
                .last_mut()
                .ok_or_else(|| malformed("option outside of any [section]"))?;

            let entry = match line.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim();
                    if key.is_empty() {
                        return Err(malformed("missing option name"));
                    }
                    (key.to_string(), Some(value.trim().to_string()))
                }
                None => (line.to_string(), None),
            };
            section.entries.push(entry);
        }

        Ok(Self {
            path: path.to_path_buf(),
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_both_forms() {
        let vars = vars(&[("MYSQL_MAX_CONNECTIONS", "151"), ("HOME", "/root")]);
        assert_eq!(
            substitute("max_connections = ${MYSQL_MAX_CONNECTIONS}0", &vars),
            "max_connections = 1510"
        );
        assert_eq!(substitute("dir = $HOME/x", &vars), "dir = /root/x");
    }

    #[test]
    fn test_substitute_unknown_is_empty() {
        assert_eq!(substitute("a = ${NOPE}b", &BTreeMap::new()), "a = b");
    }

    #[test]
    fn test_parse_sections_and_flags() {
        let text = "\
# comment
[mysqld]
max_connections = 300
skip-name-resolve

[client]
port=3306
";
        let fragment = ConfigFragment::parse(Path::new("x.cnf"), text).unwrap();
        assert_eq!(fragment.sections.len(), 2);
        assert!(fragment.sections[0].is_server());
        assert_eq!(
            fragment.sections[0].entries,
            vec![
                ("max_connections".to_string(), Some("300".to_string())),
                ("skip-name-resolve".to_string(), None),
            ]
        );
        assert!(!fragment.sections[1].is_server());
    }

    #[test]
    fn test_option_outside_section_is_malformed() {
        let err = ConfigFragment::parse(Path::new("x.cnf"), "max_connections = 1\n").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedFragment { line: 1, .. }));
    }

    #[test]
    fn test_unterminated_header_is_malformed() {
        let err = ConfigFragment::parse(Path::new("x.cnf"), "\n[mysqld\n").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedFragment { line: 2, .. }));
    }

    #[test]
    fn test_include_directive_rejected() {
        let err = ConfigFragment::parse(Path::new("x.cnf"), "!includedir /etc\n").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedFragment { .. }));
    }

    #[test]
    fn test_load_dir_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("20-b.cnf"), "[mysqld]\nb=2\n").unwrap();
        fs::write(dir.path().join("10-a.cnf"), "[mysqld]\na=1\n").unwrap();
        fs::write(dir.path().join("README"), "ignored").unwrap();

        let fragments = RawFragment::load_dir(dir.path()).unwrap();
        let names: Vec<_> = fragments
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["10-a.cnf", "20-b.cnf"]);
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let fragments = RawFragment::load_dir(&dir.path().join("absent")).unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn test_render_substitutes_then_parses() {
        let raw = RawFragment::new("t.cnf", "[mysqld]\nmax_connections = ${MYSQL_MAX_CONNECTIONS}\n");
        let fragment = raw.render(&vars(&[("MYSQL_MAX_CONNECTIONS", "42")])).unwrap();
        assert_eq!(
            fragment.sections[0].entries[0],
            ("max_connections".to_string(), Some("42".to_string()))
        );
    }
}
