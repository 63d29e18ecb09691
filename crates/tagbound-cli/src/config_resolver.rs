//! Configuration file resolution.
//!
//! Resolves the configuration file path using a deterministic priority order:
//!
//! 1. `--config` flag (explicit path)
//! 2. `{project}/tagbound.toml`
//! 3. `tagbound.toml` in the nearest ancestor of the project directory
//! 4. No config found → defaults

use std::path::{Path, PathBuf};

use tagbound_core::CONFIG_FILE_NAME;

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Found in an ancestor of the project directory.
    Ancestor(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Ancestor(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Directory that package roots and source roots are relative to.
    ///
    /// A config found by searching upwards anchors the project at its own
    /// directory; otherwise the requested directory is the project.
    #[must_use]
    pub fn project_root(&self, requested: &Path) -> PathBuf {
        match self {
            Self::Ancestor(p) => p
                .parent()
                .map_or_else(|| requested.to_path_buf(), Path::to_path_buf),
            _ => requested.to_path_buf(),
        }
    }
}

/// Resolves the configuration file path.
///
/// See module-level docs for resolution order.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    // 1. Explicit path from --config flag
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    // 2. Project-level config
    let candidate = project_dir.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        tracing::debug!("Found project config: {}", candidate.display());
        return ConfigSource::Project(candidate);
    }

    // 3. Nearest ancestor
    let absolute = if project_dir.is_absolute() {
        project_dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(project_dir))
            .unwrap_or_else(|_| project_dir.to_path_buf())
    };
    for dir in absolute.ancestors().skip(1) {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!("Found ancestor config: {}", candidate.display());
            return ConfigSource::Ancestor(candidate);
        }
    }

    ConfigSource::Default
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_takes_priority_over_project() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("custom.toml");
        fs::write(&explicit, "").unwrap();

        let project = tmp.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(project.join(CONFIG_FILE_NAME), "").unwrap();

        let result = resolve(&project, Some(&explicit));
        assert_eq!(result, ConfigSource::Explicit(explicit));
        assert_eq!(result.project_root(&project), project);
    }

    #[test]
    fn explicit_does_not_check_existence() {
        let result = resolve(Path::new("/tmp"), Some(Path::new("/nonexistent.toml")));
        assert_eq!(
            result,
            ConfigSource::Explicit(PathBuf::from("/nonexistent.toml"))
        );
    }

    #[test]
    fn project_config_found() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();

        let result = resolve(tmp.path(), None);
        assert_eq!(
            result,
            ConfigSource::Project(tmp.path().join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn nearest_ancestor_config_anchors_project() {
        let tmp = TempDir::new().unwrap();
        let outer = tmp.path().join("repo");
        let nested = outer.join("services").join("billing");
        fs::create_dir_all(&nested).unwrap();
        fs::write(outer.join(CONFIG_FILE_NAME), "").unwrap();

        let result = resolve(&nested, None);
        assert_eq!(result, ConfigSource::Ancestor(outer.join(CONFIG_FILE_NAME)));
        assert_eq!(result.project_root(&nested), outer);
    }

    #[test]
    fn config_directory_is_not_mistaken_for_file() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(!matches!(
            resolve(tmp.path(), None),
            ConfigSource::Project(_)
        ));
    }

    #[test]
    fn config_source_path_returns_none_for_default() {
        assert!(ConfigSource::Default.path().is_none());
        assert_eq!(
            ConfigSource::Default.project_root(Path::new("app")),
            PathBuf::from("app")
        );
    }

    #[test]
    fn config_source_path_returns_some_for_all_others() {
        let p = PathBuf::from("/tmp/test.toml");
        assert_eq!(ConfigSource::Explicit(p.clone()).path(), Some(p.as_path()));
        assert_eq!(ConfigSource::Project(p.clone()).path(), Some(p.as_path()));
        assert_eq!(ConfigSource::Ancestor(p.clone()).path(), Some(p.as_path()));
    }
}
