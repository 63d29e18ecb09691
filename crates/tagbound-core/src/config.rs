//! Configuration types: the project-wide `tagbound.toml` and per-package
//! `package.toml` declarations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project config file name, looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "tagbound.toml";

/// Package declaration file name, placed in each package root directory.
pub const PACKAGE_FILE_NAME: &str = "package.toml";

/// A declared rule: packages tagged `tag` may import packages tagged with
/// any of `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraint {
    /// Source tag.
    pub tag: String,
    /// Tags the source tag may depend on.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Constraint {
    /// Creates a constraint.
    #[must_use]
    pub fn new<I, S>(tag: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag: tag.into(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
        }
    }
}

/// Top-level project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Directories (relative to the project root) that module paths are
    /// computed from.
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<PathBuf>,

    /// Glob patterns to exclude, matched against relative paths and single
    /// path components.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Skip files and directories whose name starts with `.`.
    #[serde(default = "default_true")]
    pub exclude_hidden_paths: bool,

    /// Skip imports guarded by `if TYPE_CHECKING:`.
    #[serde(default)]
    pub ignore_type_checking_imports: bool,

    /// Tag dependency rules.
    #[serde(default)]
    pub constraints: Vec<Constraint>,

    /// Set when the file used the legacy `[constraints.<tag>]` table layout.
    #[serde(skip)]
    pub legacy_layout: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_roots: default_source_roots(),
            exclude: default_exclude(),
            exclude_hidden_paths: true,
            ignore_type_checking_imports: false,
            constraints: Vec::new(),
            legacy_layout: false,
        }
    }
}

fn default_source_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_exclude() -> Vec<String> {
    vec!["tests".to_string(), "docs".to_string()]
}

fn default_true() -> bool {
    true
}

impl ProjectConfig {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// Accepts both the `[[constraints]]` list layout and the legacy
    /// `[constraints.<tag>]` table layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct RawConfig {
            #[serde(default = "default_source_roots")]
            source_roots: Vec<PathBuf>,
            #[serde(default = "default_exclude")]
            exclude: Vec<String>,
            #[serde(default = "default_true")]
            exclude_hidden_paths: bool,
            #[serde(default)]
            ignore_type_checking_imports: bool,
            #[serde(default)]
            constraints: Option<RawConstraints>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawConstraints {
            List(Vec<Constraint>),
            Legacy(BTreeMap<String, LegacyRule>),
        }

        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct LegacyRule {
            #[serde(default)]
            depends_on: Vec<String>,
        }

        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;

        let (constraints, legacy_layout) = match raw.constraints {
            None => (Vec::new(), false),
            Some(RawConstraints::List(list)) => (list, false),
            Some(RawConstraints::Legacy(table)) => {
                tracing::warn!(
                    "config uses the deprecated [constraints.<tag>] layout; it will be rewritten as [[constraints]] on save"
                );
                let list = table
                    .into_iter()
                    .map(|(tag, rule)| Constraint {
                        tag,
                        depends_on: rule.depends_on,
                    })
                    .collect();
                (list, true)
            }
        };

        Ok(Self {
            source_roots: raw.source_roots,
            exclude: raw.exclude,
            exclude_hidden_paths: raw.exclude_hidden_paths,
            ignore_type_checking_imports: raw.ignore_type_checking_imports,
            constraints,
            legacy_layout,
        })
    }

    /// Serializes to TOML using the `[[constraints]]` layout.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })
    }

    /// Writes the configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Validates fields that do not depend on the package tree.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_roots.is_empty() {
            return Err(ConfigError::NoSourceRoots);
        }
        self.exclude_patterns()?;
        for (i, c) in self.constraints.iter().enumerate() {
            if c.tag.trim().is_empty() {
                return Err(ConfigError::BlankTag {
                    context: format!("constraints[{i}].tag"),
                });
            }
            if let Some(j) = c.depends_on.iter().position(|d| d.trim().is_empty()) {
                return Err(ConfigError::BlankTag {
                    context: format!("constraints[{i}].depends_on[{j}]"),
                });
            }
        }
        Ok(())
    }

    /// Compiles the exclude globs.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid glob.
    pub fn exclude_patterns(&self) -> Result<Vec<glob::Pattern>, ConfigError> {
        self.exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| ConfigError::InvalidGlob {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Returns the union of `depends_on` across every entry for `tag`.
    #[must_use]
    pub fn dependencies_for_tag(&self, tag: &str) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for c in self.constraints.iter().filter(|c| c.tag.trim() == tag.trim()) {
            for d in c.depends_on.iter().map(|d| d.trim()) {
                if !deps.contains(&d) {
                    deps.push(d);
                }
            }
        }
        deps
    }

    /// Adds dependencies to the first constraint for `tag`, or appends a new
    /// constraint. Existing dependencies are not duplicated.
    pub fn add_dependencies_to_tag<I, S>(&mut self, tag: &str, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pos = match self.constraints.iter().position(|c| c.tag.trim() == tag.trim()) {
            Some(pos) => pos,
            None => {
                self.constraints.push(Constraint::new(tag.trim(), Vec::<String>::new()));
                self.constraints.len() - 1
            }
        };
        let current = &mut self.constraints[pos].depends_on;
        for dep in deps {
            let dep: String = dep.into();
            if !current.iter().any(|d| d.trim() == dep.trim()) {
                current.push(dep.trim().to_string());
            }
        }
    }

    /// Removes `dep` from every constraint for `tag`. The constraint entries
    /// themselves are kept even when they become empty.
    ///
    /// Tags are compared with surrounding whitespace ignored, as in
    /// [`ProjectConfig::dependencies_for_tag`].
    pub fn remove_dependency(&mut self, tag: &str, dep: &str) {
        for c in self.constraints.iter_mut().filter(|c| c.tag.trim() == tag.trim()) {
            c.depends_on.retain(|d| d.trim() != dep.trim());
        }
    }
}

/// A package declaration as written in `package.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    /// Tags identifying the package.
    pub tags: Vec<String>,
    /// Importers must go through the public interface.
    #[serde(default)]
    pub strict: bool,
}

impl PackageConfig {
    /// Loads a package declaration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { message } => ConfigError::Parse {
                message: format!("{}: {message}", path.display()),
            },
            other => other,
        })
    }

    /// Parses a package declaration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

/// Configuration errors. All of them abort a run before any parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading or writing a config file.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// TOML parse error.
    #[error("invalid config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// TOML serialization error.
    #[error("failed to serialize config: {message}")]
    Serialize {
        /// Serializer message.
        message: String,
    },

    /// `source_roots` is empty.
    #[error("source_roots must list at least one directory")]
    NoSourceRoots,

    /// Invalid exclude glob.
    #[error("invalid exclude pattern `{pattern}`: {reason}")]
    InvalidGlob {
        /// The pattern as written.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A package declares no tags.
    #[error("package '{package}' declares no tags")]
    MissingTags {
        /// Package root path.
        package: String,
    },

    /// A tag is empty or whitespace.
    #[error("{context}: tag must not be empty or whitespace")]
    BlankTag {
        /// Where the tag was declared.
        context: String,
    },

    /// Two packages declare the same root path.
    #[error("package root '{path}' is declared more than once")]
    DuplicateRoot {
        /// Duplicated root path.
        path: String,
    },

    /// A constraint references a tag no package carries.
    #[error("{context}: unknown tag '{tag}'")]
    UnknownTag {
        /// Offending tag.
        tag: String,
        /// Where it was referenced.
        context: String,
    },

    /// A package root is not strictly inside any source root.
    #[error("package '{package}' is not inside any source root")]
    OutsideSourceRoots {
        /// Package root path.
        package: String,
    },

    /// A strict package has no `__all__` in its entry module.
    #[error("package '{package}' is strict but its entry module declares no public interface")]
    StrictWithoutInterface {
        /// Package root path.
        package: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert!(config.exclude_hidden_paths);
        assert!(config.constraints.is_empty());
        assert_eq!(config.source_roots, vec![PathBuf::from(".")]);
        assert_eq!(config.exclude, vec!["tests", "docs"]);
    }

    #[test]
    fn parse_list_layout() {
        let toml = r#"
exclude_hidden_paths = false

[[constraints]]
tag = "core"
depends_on = ["db", "utils"]

[[constraints]]
tag = "utils"
"#;
        let config = ProjectConfig::parse(toml).expect("parse failed");
        assert!(!config.exclude_hidden_paths);
        assert!(!config.legacy_layout);
        assert_eq!(config.constraints.len(), 2);
        assert_eq!(config.dependencies_for_tag("core"), vec!["db", "utils"]);
        assert!(config.dependencies_for_tag("utils").is_empty());
    }

    #[test]
    fn parse_legacy_layout() {
        let toml = r#"
[constraints.db]
depends_on = ["utils"]

[constraints.utils]
depends_on = []
"#;
        let config = ProjectConfig::parse(toml).expect("parse failed");
        assert!(config.legacy_layout);
        assert_eq!(config.constraints[0], Constraint::new("db", ["utils"]));
        assert_eq!(config.constraints[1].tag, "utils");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ProjectConfig::parse("colour = true\n").is_err());
        assert!(PackageConfig::parse("tags = [\"a\"]\nstrictt = true\n").is_err());
    }

    #[test]
    fn duplicate_constraint_entries_are_unioned() {
        let mut config = ProjectConfig::new();
        config.constraints.push(Constraint::new("core", ["db"]));
        config.constraints.push(Constraint::new("core", ["utils", "db"]));
        assert_eq!(config.dependencies_for_tag("core"), vec!["db", "utils"]);
    }

    #[test]
    fn add_dependencies_merges_into_existing() {
        let mut config = ProjectConfig::new();
        config.constraints.push(Constraint::new("core", ["db"]));
        config.add_dependencies_to_tag("core", ["utils", "db"]);
        config.add_dependencies_to_tag("db", ["utils"]);
        assert_eq!(config.constraints.len(), 2);
        assert_eq!(config.constraints[0].depends_on, vec!["db", "utils"]);
        assert_eq!(config.constraints[1], Constraint::new("db", ["utils"]));
    }

    #[test]
    fn remove_dependency_keeps_entry() {
        let mut config = ProjectConfig::new();
        config.constraints.push(Constraint::new("core", ["db"]));
        config.remove_dependency("core", "db");
        assert_eq!(config.constraints, vec![Constraint::new("core", Vec::<String>::new())]);
    }

    #[test]
    fn edits_ignore_padding_around_tags() {
        let mut config = ProjectConfig::new();
        config.constraints.push(Constraint::new(" core", [" db ", "utils"]));

        config.remove_dependency("core", "db");
        assert_eq!(config.constraints[0].depends_on, vec!["utils".to_string()]);

        config.add_dependencies_to_tag("core ", ["utils", "cache"]);
        assert_eq!(config.constraints.len(), 1);
        assert_eq!(
            config.constraints[0].depends_on,
            vec!["utils".to_string(), "cache".to_string()]
        );
        assert_eq!(config.dependencies_for_tag("core"), vec!["utils", "cache"]);
    }

    #[test]
    fn save_round_trip_uses_list_layout() {
        let config = ProjectConfig::parse("[constraints.core]\ndepends_on = [\"db\"]\n").unwrap();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[[constraints]]"));
        let reparsed = ProjectConfig::parse(&text).unwrap();
        assert!(!reparsed.legacy_layout);
        assert_eq!(reparsed.constraints, config.constraints);
    }

    #[test]
    fn validate_rejects_bad_glob_and_blank_tag() {
        let mut config = ProjectConfig::new();
        config.exclude.push("[".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGlob { .. })
        ));

        let mut config = ProjectConfig::new();
        config.constraints.push(Constraint::new("core", [" "]));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("constraints[0].depends_on[0]"));
    }

    #[test]
    fn package_config_defaults_to_non_strict() {
        let pkg = PackageConfig::parse("tags = [\"db\"]\n").unwrap();
        assert_eq!(pkg.tags, vec!["db"]);
        assert!(!pkg.strict);
    }
}
