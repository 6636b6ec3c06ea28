//! The resolved configuration document
//!
//! One setting per option name, each tagged with where its value came
//! from. Precedence is structural: a value only replaces another of equal
//! or lower provenance, so the order in which sources are applied cannot
//! break "user file beats env beats tuning beats default".

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Where a setting's value came from, lowest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Built-in default
    Default,
    /// Computed from the memory limit
    AutoTuned,
    /// Environment variable
    Env,
    /// User configuration fragment
    UserFile,
}

impl Provenance {
    /// Name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Default => "default",
            Provenance::AutoTuned => "auto-tuned",
            Provenance::Env => "env",
            Provenance::UserFile => "user-file",
        }
    }
}

/// One resolved option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Setting {
    /// Value; empty for bare flags such as `skip_name_resolve`
    pub value: String,
    /// Where the value came from
    pub provenance: Provenance,
    /// Fragment file, for user-file settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A non-server section carried through from user fragments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSection {
    /// Section name without brackets
    pub name: String,
    /// Raw `key[=value]` entries in file order
    pub entries: Vec<(String, Option<String>)>,
}

/// Normalize an option name: MySQL treats `-` and `_` alike
pub fn normalize_option_name(name: &str) -> String {
    name.trim().replace('-', "_")
}

/// Final settings for one start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Configuration {
    #[serde(skip_serializing_if = "Option::is_none")]
    include: Option<PathBuf>,
    settings: BTreeMap<String, Setting>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sections: Vec<OptionSection>,
}

impl Configuration {
    /// Empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Base option file to include ahead of the generated section
    pub fn with_include(mut self, path: impl Into<PathBuf>) -> Self {
        self.include = Some(path.into());
        self
    }

    /// Included base file, if any
    pub fn include(&self) -> Option<&Path> {
        self.include.as_deref()
    }

    /// Apply a value unless a higher-precedence one is already present.
    ///
    /// Returns whether the value was taken.
    pub fn apply(
        &mut self,
        name: &str,
        value: impl Into<String>,
        provenance: Provenance,
    ) -> bool {
        self.apply_from(name, value, provenance, None)
    }

    /// Like [`Configuration::apply`], recording the fragment it came from
    pub fn apply_from(
        &mut self,
        name: &str,
        value: impl Into<String>,
        provenance: Provenance,
        source: Option<&str>,
    ) -> bool {
        let name = normalize_option_name(name);
        if let Some(existing) = self.settings.get(&name) {
            if existing.provenance > provenance {
                return false;
            }
        }
        self.settings.insert(
            name,
            Setting {
                value: value.into(),
                provenance,
                source: source.map(str::to_string),
            },
        );
        true
    }

    /// Append entries to a pass-through section, creating it if needed
    pub fn extend_section(&mut self, name: &str, entries: &[(String, Option<String>)]) {
        match self.sections.iter_mut().find(|s| s.name == name) {
            Some(section) => section.entries.extend_from_slice(entries),
            None => self.sections.push(OptionSection {
                name: name.to_string(),
                entries: entries.to_vec(),
            }),
        }
    }

    /// Setting by option name
    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.settings.get(&normalize_option_name(name))
    }

    /// Value by option name
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|s| s.value.as_str())
    }

    /// All settings in option-name order
    pub fn settings(&self) -> impl Iterator<Item = (&str, &Setting)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of resolved settings
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Whether no settings are resolved
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Pass-through sections
    pub fn sections(&self) -> &[OptionSection] {
        &self.sections
    }

    /// Render as a MySQL option file
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# Generated by mysqld-orchestrator on every start; edits are overwritten.\n");

        if let Some(include) = &self.include {
            out.push_str(&format!("!include {}\n", include.display()));
        }

        out.push_str("\n[mysqld]\n");
        for (name, setting) in &self.settings {
            if setting.value.is_empty() {
                out.push_str(name);
                out.push('\n');
            } else {
                out.push_str(&format!("{} = {}\n", name, setting.value));
            }
        }

        for section in &self.sections {
            out.push_str(&format!("\n[{}]\n", section.name));
            for (key, value) in &section.entries {
                match value {
                    Some(value) => out.push_str(&format!("{} = {}\n", key, value)),
                    None => {
                        out.push_str(key);
                        out.push('\n');
                    }
                }
            }
        }

        out
    }

    /// Write the rendered document, replacing any previous one atomically
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("cnf.tmp");
        fs::write(&tmp, self.render())?;
        fs::rename(&tmp, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_provenance_order() {
        assert!(Provenance::Default < Provenance::AutoTuned);
        assert!(Provenance::AutoTuned < Provenance::Env);
        assert!(Provenance::Env < Provenance::UserFile);
    }

    #[test]
    fn test_higher_provenance_wins_regardless_of_order() {
        let mut a = Configuration::new();
        a.apply("max_connections", "151", Provenance::Default);
        a.apply("max_connections", "200", Provenance::Env);
        a.apply("max_connections", "300", Provenance::UserFile);

        let mut b = Configuration::new();
        b.apply("max_connections", "300", Provenance::UserFile);
        assert!(!b.apply("max_connections", "200", Provenance::Env));
        assert!(!b.apply("max_connections", "151", Provenance::Default));

        assert_eq!(a.value("max_connections"), Some("300"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_provenance_later_wins() {
        let mut config = Configuration::new();
        config.apply("max_connections", "10", Provenance::UserFile);
        config.apply("max_connections", "20", Provenance::UserFile);
        assert_eq!(config.value("max_connections"), Some("20"));
    }

    #[test]
    fn test_dash_and_underscore_are_the_same_option() {
        let mut config = Configuration::new();
        config.apply("max_connections", "151", Provenance::Env);
        config.apply("max-connections", "99", Provenance::UserFile);
        assert_eq!(config.len(), 1);
        assert_eq!(config.value("max-connections"), Some("99"));
    }

    #[test]
    fn test_render() {
        let mut config = Configuration::new().with_include("/etc/my.cnf");
        config.apply("max_connections", "151", Provenance::Default);
        config.apply("skip_name_resolve", "", Provenance::Default);
        config.extend_section("client", &[("port".to_string(), Some("3306".to_string()))]);

        let rendered = config.render();
        let include = rendered.find("!include /etc/my.cnf").unwrap();
        let mysqld = rendered.find("[mysqld]").unwrap();
        let client = rendered.find("[client]").unwrap();
        assert!(include < mysqld && mysqld < client);
        assert!(rendered.contains("max_connections = 151\n"));
        assert!(rendered.contains("\nskip_name_resolve\n"));
        assert!(rendered.contains("port = 3306\n"));
    }

    #[test]
    fn test_write_replaces_previous_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("generated.cnf");

        let mut first = Configuration::new();
        first.apply("max_connections", "1", Provenance::Default);
        first.write_to(&path).unwrap();

        let mut second = Configuration::new();
        second.apply("max_connections", "2", Provenance::Default);
        second.write_to(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("max_connections = 2"));
        assert!(!content.contains("max_connections = 1"));
        assert!(!path.with_extension("cnf.tmp").exists());
    }

    #[test]
    fn test_serializes_with_provenance() {
        let mut config = Configuration::new();
        config.apply_from("max_connections", "300", Provenance::UserFile, Some("a.cnf"));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["settings"]["max_connections"]["provenance"], "user-file");
        assert_eq!(json["settings"]["max_connections"]["source"], "a.cnf");
    }
}
