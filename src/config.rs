//! Pin file loading.
//!
//! The built-in table pins FBAudienceNetwork 6.16 to 6.17.0. A pin file makes
//! a different dependency or version a data change: the `[pin]` section
//! regenerates the quote/operator table and `[[rules]]` entries append
//! verbatim literal pairs.

use crate::locate::SearchSpec;
use crate::rules::{ReplacementRule, RuleSet};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PinFile {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub pin: Option<PinSection>,
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchSection {
    #[serde(default = "default_vendor")]
    pub vendor: String,
    #[serde(default = "default_dependency")]
    pub dependency: String,
    #[serde(default)]
    pub local_specs: Option<PathBuf>,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            vendor: default_vendor(),
            dependency: default_dependency(),
            local_specs: None,
        }
    }
}

fn default_vendor() -> String {
    "facebook".to_string()
}

fn default_dependency() -> String {
    "FBAudienceNetwork".to_string()
}

/// Version pair expanded into the quote × operator table.
#[derive(Debug, Deserialize, Clone)]
pub struct PinSection {
    pub old: String,
    pub new: String,
}

/// A verbatim literal pair, attempted as-is.
#[derive(Debug, Deserialize, Clone)]
pub struct RawRule {
    pub old: String,
    pub new: String,
}

impl PinFile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.search.vendor.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "search.vendor",
            });
        }
        if self.search.dependency.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "search.dependency",
            });
        }

        match &self.pin {
            Some(pin) => {
                if pin.old.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField { field: "pin.old" });
                }
                if pin.new.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField { field: "pin.new" });
                }
                if !pin.old.trim().is_empty() && pin.old == pin.new {
                    issues.push(ValidationIssue::IdenticalPair {
                        old: pin.old.clone(),
                    });
                }
            }
            None => {
                if self.rules.is_empty() {
                    issues.push(ValidationIssue::NoRules);
                }
            }
        }

        for rule in &self.rules {
            if rule.old.is_empty() {
                issues.push(ValidationIssue::MissingField { field: "rules.old" });
            } else if rule.old == rule.new {
                issues.push(ValidationIssue::IdenticalPair {
                    old: rule.old.clone(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Expand the pin file into the locator spec and replacement table.
    pub fn resolve(&self) -> (SearchSpec, RuleSet) {
        let search = SearchSpec {
            vendor: self.search.vendor.clone(),
            dependency: self.search.dependency.clone(),
            local_specs: self.search.local_specs.clone(),
        };

        let mut rules = match &self.pin {
            Some(pin) => RuleSet::pin_dependency(&self.search.dependency, &pin.old, &pin.new),
            None => RuleSet::from_rules(Vec::new()),
        };
        for raw in &self.rules {
            rules.push(ReplacementRule::new(raw.old.clone(), raw.new.clone()));
        }

        (search, rules)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read pin file {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse pin file ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse pin file: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid pin file ({}): {}", path.display(), source),
                None => write!(f, "invalid pin file: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<PinFile, ConfigError> {
    let file: PinFile =
        toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml { path: None, source })?;
    file.validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(file)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PinFile, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    NoRules,
    MissingField { field: &'static str },
    IdenticalPair { old: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NoRules => {
                write!(f, "pin file needs a [pin] section or at least one [[rules]] entry")
            }
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::IdenticalPair { old } => {
                write!(f, "replacement for '{old}' is identical to the original")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_section_expands_to_table() {
        let file = load_from_str(
            r#"
[meta]
name = "audience-network"

[pin]
old = "6.16"
new = "6.17.0"
"#,
        )
        .unwrap();

        let (search, rules) = file.resolve();
        assert_eq!(search.vendor, "facebook");
        assert_eq!(rules.len(), 6);
        assert!(rules
            .iter()
            .any(|r| r.old == "'FBAudienceNetwork', '~> 6.16'"
                && r.new == "'FBAudienceNetwork', '= 6.17.0'"));
    }

    #[test]
    fn test_custom_dependency_and_extra_rules() {
        let file = load_from_str(
            r#"
[search]
vendor = "maps"
dependency = "GoogleMaps"

[pin]
old = "7.0"
new = "7.4.0"

[[rules]]
old = "s.platform = :ios, '11.0'"
new = "s.platform = :ios, '12.0'"
"#,
        )
        .unwrap();

        let (search, rules) = file.resolve();
        assert_eq!(search.dependency, "GoogleMaps");
        assert_eq!(rules.len(), 7);
        assert!(rules.iter().any(|r| r.old.contains(":ios")));
    }

    #[test]
    fn test_rules_only_file() {
        let file = load_from_str(
            r#"
[[rules]]
old = "'6.16'"
new = "'6.17.0'"
"#,
        )
        .unwrap();

        let (_, rules) = file.resolve();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_empty_file_is_invalid() {
        let err = load_from_str("").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().contains("[pin]"));
    }

    #[test]
    fn test_identical_pair_rejected() {
        let err = load_from_str(
            r#"
[pin]
old = "6.16"
new = "6.16"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = load_from_str("[pin\nold = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn test_load_from_path_reports_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pins.toml");
        fs::write(&path, "[pin]\nold = \"6.16\"\nnew = \"6.16\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("pins.toml"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_from_path("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
