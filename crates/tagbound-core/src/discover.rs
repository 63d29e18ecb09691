//! Project discovery: source files and package declarations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ConfigError, PackageConfig, ProjectConfig, PACKAGE_FILE_NAME};
use crate::extractor::{LanguageExtractor, SourceFile};
use crate::package::PackageDecl;
use crate::types::ParseWarning;
use crate::utils::paths::{is_excluded, is_hidden, normalize};

/// Errors raised while walking the project.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    /// Directory traversal failed.
    #[error("failed to walk project: {0}")]
    Walk(#[from] ignore::Error),

    /// A source file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A package declaration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything found under a project root. Paths are relative to the root.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Source files the extractor handles, sorted by path.
    pub files: Vec<SourceFile>,
    /// Package declarations with their public interface, sorted by root.
    pub packages: Vec<PackageDecl>,
    /// Source files skipped because they are not valid UTF-8, sorted by path.
    pub warnings: Vec<ParseWarning>,
}

/// Walks `root`, honoring hidden-path and glob exclusion.
///
/// `extra_excludes` are applied on top of the config's `exclude` list.
///
/// # Errors
///
/// Returns [`DiscoverError`] if traversal fails, a file cannot be read, or a
/// `package.toml` is invalid. Undecodable sources and entry modules that
/// fail to parse are not errors.
pub fn discover(
    root: &Path,
    config: &ProjectConfig,
    extra_excludes: &[glob::Pattern],
    extractor: &dyn LanguageExtractor,
) -> Result<Discovery, DiscoverError> {
    let mut patterns = config.exclude_patterns()?;
    patterns.extend_from_slice(extra_excludes);
    let patterns = Arc::new(patterns);
    let skip_hidden = config.exclude_hidden_paths;

    let walk_root = root.to_path_buf();
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let rel = entry.path().strip_prefix(&walk_root).unwrap_or(entry.path());
            if rel.as_os_str().is_empty() {
                return true;
            }
            let skip = (skip_hidden && is_hidden(rel)) || is_excluded(rel, &patterns);
            if skip {
                debug!("Excluding: {}", rel.display());
            }
            !skip
        });

    let mut files = Vec::new();
    let mut warnings = Vec::new();
    let mut package_dirs = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let rel = normalize(path.strip_prefix(root).unwrap_or(path));

        if path.file_name().is_some_and(|n| n == PACKAGE_FILE_NAME) {
            let decl = PackageConfig::from_file(path)?;
            let dir = rel.parent().map(Path::to_path_buf).unwrap_or_default();
            debug!("Package declared at '{}'", dir.display());
            package_dirs.push((dir, decl));
        } else if extractor.handles(path) {
            let bytes = std::fs::read(path).map_err(|e| DiscoverError::Io {
                path: rel.clone(),
                source: e,
            })?;
            match String::from_utf8(bytes) {
                Ok(content) => files.push(SourceFile::new(rel, content)),
                Err(_) => {
                    warn!("Skipping {}: not valid UTF-8", rel.display());
                    warnings.push(ParseWarning {
                        file: rel,
                        message: "file is not valid UTF-8".to_string(),
                    });
                }
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    warnings.sort_by(|a, b| a.file.cmp(&b.file));
    let by_path: HashMap<&Path, &SourceFile> =
        files.iter().map(|f| (f.path.as_path(), f)).collect();

    let mut packages = Vec::with_capacity(package_dirs.len());
    for (dir, decl) in package_dirs {
        let entry_path = dir.join(extractor.entry_module_name());
        // A broken entry module is reported by the graph builder when it
        // parses the same file; here the package just has no interface.
        let public_symbols = match by_path.get(entry_path.as_path()) {
            Some(entry) => extractor.public_symbols(&entry.content).unwrap_or_else(|e| {
                debug!("No interface for '{}': {}", dir.display(), e);
                None
            }),
            None => None,
        };
        packages.push(PackageDecl {
            root_path: dir,
            tags: decl.tags,
            strict: decl.strict,
            public_symbols,
        });
    }
    packages.sort_by(|a, b| a.root_path.cmp(&b.root_path));

    Ok(Discovery {
        files,
        packages,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::testing::LineExtractor;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "core/package.toml", "tags = [\"core\"]\n");
        write(root, "core/__init__.py", "__all__ = PublicAPI\n");
        write(root, "core/api.py", "import db\n");
        write(root, "db/package.toml", "tags = [\"db\"]\nstrict = false\n");
        write(root, "db/models.py", "");
        write(root, "tests/test_core.py", "import core\n");
        write(root, ".venv/lib/site.py", "");
        write(root, "README.md", "");
        dir
    }

    #[test]
    fn finds_sources_and_packages() {
        let dir = project();
        let found = discover(dir.path(), &ProjectConfig::default(), &[], &LineExtractor).unwrap();

        let files: Vec<&Path> = found.files.iter().map(|f| f.path.as_path()).collect();
        assert_eq!(
            files,
            vec![
                Path::new("core/__init__.py"),
                Path::new("core/api.py"),
                Path::new("db/models.py")
            ]
        );

        assert_eq!(found.packages.len(), 2);
        assert_eq!(found.packages[0].root_path, PathBuf::from("core"));
        assert_eq!(
            found.packages[0].public_symbols,
            Some(vec!["PublicAPI".to_string()])
        );
        assert_eq!(found.packages[1].public_symbols, None);
    }

    #[test]
    fn hidden_paths_are_kept_when_configured() {
        let dir = project();
        let config = ProjectConfig {
            exclude_hidden_paths: false,
            exclude: Vec::new(),
            ..ProjectConfig::default()
        };
        let found = discover(dir.path(), &config, &[], &LineExtractor).unwrap();
        let files: Vec<String> = found
            .files
            .iter()
            .map(|f| f.path.to_string_lossy().replace('\\', "/"))
            .collect();
        assert!(files.contains(&".venv/lib/site.py".to_string()));
        assert!(files.contains(&"tests/test_core.py".to_string()));
    }

    #[test]
    fn extra_excludes_apply() {
        let dir = project();
        let extra = vec![glob::Pattern::new("db").unwrap()];
        let found = discover(dir.path(), &ProjectConfig::default(), &extra, &LineExtractor).unwrap();
        assert_eq!(found.packages.len(), 1);
        assert!(found.files.iter().all(|f| !f.path.starts_with("db")));
    }

    #[test]
    fn invalid_package_file_is_config_error() {
        let dir = project();
        write(dir.path(), "db/package.toml", "tags = [\"db\"]\nlayer = 1\n");
        let err = discover(dir.path(), &ProjectConfig::default(), &[], &LineExtractor).unwrap_err();
        assert!(matches!(err, DiscoverError::Config(ConfigError::Parse { .. })));
    }

    #[test]
    fn broken_entry_module_leaves_package_without_interface() {
        let dir = project();
        write(dir.path(), "core/__init__.py", "!!\n");
        let found = discover(dir.path(), &ProjectConfig::default(), &[], &LineExtractor).unwrap();
        assert_eq!(found.packages[0].root_path, PathBuf::from("core"));
        assert_eq!(found.packages[0].public_symbols, None);
        assert!(found.files.iter().any(|f| f.path == Path::new("core/__init__.py")));
    }

    #[test]
    fn non_utf8_source_is_skipped_with_warning() {
        let dir = project();
        let path = dir.path().join("core/latin1.py");
        fs::write(&path, b"# caf\xe9\nimport utils\n").unwrap();

        let found = discover(dir.path(), &ProjectConfig::default(), &[], &LineExtractor).unwrap();
        assert!(found.files.iter().all(|f| f.path != Path::new("core/latin1.py")));
        assert_eq!(found.files.len(), 3);
        assert_eq!(
            found.warnings,
            vec![ParseWarning {
                file: PathBuf::from("core/latin1.py"),
                message: "file is not valid UTF-8".to_string(),
            }]
        );
    }
}
