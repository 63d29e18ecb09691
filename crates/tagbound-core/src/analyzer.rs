//! Orchestrates a full run: discovery, package resolution, graph building,
//! then checking, syncing or reporting.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cancel::{CancelToken, Cancelled};
use crate::check::{check, CheckError, ConstraintSet};
use crate::config::{ConfigError, ProjectConfig};
use crate::discover::{discover, DiscoverError, Discovery};
use crate::extractor::{ExtractOptions, LanguageExtractor};
use crate::graph::{GraphBuilder, ImportGraph};
use crate::package::PackageTree;
use crate::report::{DependencyReport, ReportError, ReportSections};
use crate::sync::{sync, ConstraintPatch};
use crate::types::{CheckResult, NO_FIRST_PARTY_IMPORTS};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Invalid configuration or package declaration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reading the project failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Directory traversal failed.
    #[error("failed to walk project: {0}")]
    Walk(#[from] ignore::Error),

    /// The run was cancelled. No partial result is produced.
    #[error("analysis cancelled")]
    Cancelled,

    /// No language extractor was configured.
    #[error("no language extractor configured")]
    NoExtractor,

    /// The report request could not be served.
    #[error(transparent)]
    Report(ReportError),

    /// An internal invariant was broken.
    #[error(transparent)]
    Internal(#[from] CheckError),
}

impl From<Cancelled> for AnalyzerError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<DiscoverError> for AnalyzerError {
    fn from(e: DiscoverError) -> Self {
        match e {
            DiscoverError::Walk(e) => Self::Walk(e),
            DiscoverError::Io { path, source } => Self::Io { path, source },
            DiscoverError::Config(e) => Self::Config(e),
        }
    }
}

impl From<ReportError> for AnalyzerError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::Check(e) => Self::Internal(e),
            other => Self::Report(other),
        }
    }
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    config: Option<ProjectConfig>,
    extractor: Option<Box<dyn LanguageExtractor>>,
    exclude_patterns: Vec<String>,
    cancel: Option<CancelToken>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project root directory.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Sets the project configuration.
    #[must_use]
    pub fn config(mut self, config: ProjectConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the language extractor.
    #[must_use]
    pub fn extractor<E: LanguageExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Adds an exclude glob on top of the configured ones.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude globs.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Observes a cancellation token.
    #[must_use]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if no extractor was set, the root is not a directory,
    /// or the configuration is invalid.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let extractor = self.extractor.ok_or(AnalyzerError::NoExtractor)?;
        let root = self.root.unwrap_or_else(|| PathBuf::from("."));
        if !root.is_dir() {
            return Err(AnalyzerError::Io {
                path: root,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let config = self.config.unwrap_or_default();
        config.validate()?;

        let extra_excludes = self
            .exclude_patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| ConfigError::InvalidGlob {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Analyzer {
            root,
            config,
            extractor,
            extra_excludes,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// A resolved project: its package tree and import graph.
#[derive(Debug)]
pub struct Project {
    /// Immutable package snapshot.
    pub tree: PackageTree,
    /// Resolved import edges and parse warnings.
    pub graph: ImportGraph,
}

/// The main analyzer.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    config: ProjectConfig,
    extractor: Box<dyn LanguageExtractor>,
    extra_excludes: Vec<glob::Pattern>,
    cancel: CancelToken,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the project configuration.
    #[must_use]
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Returns the cancellation token observed by this analyzer.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Discovers packages and sources, then builds the import graph.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid configuration, I/O failure or
    /// cancellation.
    pub fn load(&self) -> Result<Project, AnalyzerError> {
        let (tree, found) = self.resolve_packages()?;
        let graph = self.build_graph(&tree, found)?;
        Ok(Project { tree, graph })
    }

    /// Discovery and the package snapshot. No source is parsed yet.
    fn resolve_packages(&self) -> Result<(PackageTree, Discovery), AnalyzerError> {
        info!("Starting analysis at {}", self.root.display());
        self.cancel.check()?;

        let mut found = discover(
            &self.root,
            &self.config,
            &self.extra_excludes,
            self.extractor.as_ref(),
        )?;
        info!(
            "Found {} package(s) and {} source file(s)",
            found.packages.len(),
            found.files.len()
        );

        let packages = std::mem::take(&mut found.packages);
        let tree = PackageTree::build(packages, &self.config.source_roots)?;
        self.cancel.check()?;
        Ok((tree, found))
    }

    fn build_graph(
        &self,
        tree: &PackageTree,
        found: Discovery,
    ) -> Result<ImportGraph, AnalyzerError> {
        let options = ExtractOptions {
            ignore_type_checking_imports: self.config.ignore_type_checking_imports,
        };
        let mut graph = GraphBuilder::new(tree, self.extractor.as_ref(), &self.config.source_roots)
            .options(options)
            .cancel_token(&self.cancel)
            .build(&found.files)?;

        // Undecodable files only matter where they would have been analyzed.
        let skipped = found
            .warnings
            .into_iter()
            .filter(|w| tree.resolve(&w.file).is_some());
        graph.warnings.extend(skipped);
        graph.warnings.sort_by(|a, b| a.file.cmp(&b.file));

        debug!(
            "Import graph: {} edge(s) from {} file(s), {} warning(s)",
            graph.len(),
            graph.files_analyzed,
            graph.warnings.len()
        );
        Ok(graph)
    }

    /// Checks every import against the declared constraints.
    ///
    /// Constraints are validated against the package tags before any source
    /// is parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or a constraint names an unknown
    /// tag.
    pub fn check(&self) -> Result<CheckResult, AnalyzerError> {
        let (tree, found) = self.resolve_packages()?;
        let constraints = ConstraintSet::new(&self.config.constraints, tree.tags())?;
        let graph = self.build_graph(&tree, found)?;
        let violations = check(&graph, &tree, &constraints)?;

        let no_first_party_imports = graph.files_analyzed > 0 && graph.first_party_imports == 0;
        if no_first_party_imports {
            warn!("{NO_FIRST_PARTY_IMPORTS}");
        }
        let result = CheckResult {
            violations,
            warnings: graph.warnings,
            files_checked: graph.files_analyzed,
            no_first_party_imports,
        };
        info!(
            "Check complete: {} violation(s), {} warning(s) in {} file(s)",
            result.violations.len(),
            result.warnings.len(),
            result.files_checked
        );
        Ok(result)
    }

    /// Computes the constraint changes that match the observed imports.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    pub fn sync(&self, prune: bool) -> Result<ConstraintPatch, AnalyzerError> {
        let project = self.load()?;
        let patch = sync(
            &project.graph,
            &project.tree,
            &self.config.constraints,
            prune,
        )?;
        info!(
            "Sync complete: {} addition(s), {} prune(s)",
            patch.additions.len(),
            patch.prunes.len()
        );
        Ok(patch)
    }

    /// Reports dependencies and usages of the package rooted at
    /// `package_root` (relative to the project root).
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails, no section is selected, or the
    /// directory is not a package root.
    pub fn report(
        &self,
        package_root: &Path,
        sections: ReportSections,
    ) -> Result<DependencyReport, AnalyzerError> {
        if !sections.dependencies && !sections.usages {
            return Err(ReportError::NothingToReport.into());
        }
        let project = self.load()?;
        Ok(DependencyReport::build(
            &project.graph,
            &project.tree,
            package_root,
            sections,
        )?)
    }
}
