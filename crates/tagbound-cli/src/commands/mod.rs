//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod install;
pub mod output;
pub mod report;
pub mod sync;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tagbound_core::{AnalyzerBuilder, ProjectConfig, CONFIG_FILE_NAME};
use tagbound_python::PythonExtractor;

use crate::config_resolver::{self, ConfigSource};

/// A resolved project: where it lives and how it is configured.
pub struct Workspace {
    /// Directory package roots are relative to.
    pub root: PathBuf,
    /// Loaded configuration, or defaults.
    pub config: ProjectConfig,
    /// File the configuration came from, if any.
    pub source: ConfigSource,
}

impl Workspace {
    /// Resolves and loads the configuration for `path`.
    pub fn load(path: &Path, explicit: Option<&Path>) -> Result<Self> {
        let source = config_resolver::resolve(path, explicit);
        let config = match source.path() {
            Some(p) => {
                tracing::info!("Using config: {}", p.display());
                ProjectConfig::from_file(p)
                    .with_context(|| format!("Failed to load config: {}", p.display()))?
            }
            None => {
                tracing::info!("No {CONFIG_FILE_NAME} found, using defaults");
                ProjectConfig::default()
            }
        };
        let root = source.project_root(path);
        Ok(Self {
            root,
            config,
            source,
        })
    }

    /// Where `sync` writes the configuration.
    pub fn config_path(&self) -> PathBuf {
        self.source
            .path()
            .map_or_else(|| self.root.join(CONFIG_FILE_NAME), Path::to_path_buf)
    }

    /// Starts an analyzer for this project with the Python extractor.
    pub fn analyzer(&self) -> AnalyzerBuilder {
        tagbound_core::Analyzer::builder()
            .root(&self.root)
            .config(self.config.clone())
            .extractor(PythonExtractor::new())
    }
}
