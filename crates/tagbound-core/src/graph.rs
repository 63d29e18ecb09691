//! Import graph construction.
//!
//! Each source file is parsed and resolved independently on the rayon pool.
//! The package tree is only read. Per-file results are merged by a single
//! sequential concatenation followed by a sort, so the output does not depend
//! on scheduling.

use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::cancel::{CancelToken, Cancelled};
use crate::extractor::{ExtractOptions, ImportedNames, LanguageExtractor, SourceFile};
use crate::package::{Package, PackageId, PackageTree};
use crate::types::ParseWarning;
use crate::utils::paths::{file_to_module_path, join_module, resolve_relative};

/// The name an edge imports from its target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ImportedSymbol {
    /// A specific member.
    Name(String),
    /// The whole module.
    Wildcard,
}

impl ImportedSymbol {
    /// The member name, or `None` for wildcards.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n),
            Self::Wildcard => None,
        }
    }
}

impl std::fmt::Display for ImportedSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(n) => f.write_str(n),
            Self::Wildcard => f.write_str("*"),
        }
    }
}

/// One imported name in one import statement, resolved to packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEdge {
    /// Importing file, relative to the project root.
    pub from_file: PathBuf,
    /// Line of the import statement (1-indexed).
    pub line: usize,
    /// Column of the import statement (1-indexed).
    pub column: usize,
    /// Package owning the importing file.
    pub from_package: PackageId,
    /// Package owning the imported module.
    pub to_package: PackageId,
    /// Absolute dotted module path named by the statement.
    pub module_path: String,
    /// The imported member, or a wildcard.
    pub imported_symbol: ImportedSymbol,
    /// A suppression directive covers the statement.
    pub suppressed: bool,
    /// Reason given by the covering directive, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_reason: Option<String>,
}

impl ImportEdge {
    /// The fully qualified import, e.g. `core.PublicAPI`.
    #[must_use]
    pub fn qualified_path(&self) -> String {
        match &self.imported_symbol {
            ImportedSymbol::Name(n) => join_module(&self.module_path, n),
            ImportedSymbol::Wildcard => self.module_path.clone(),
        }
    }
}

/// The merged import graph of a project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportGraph {
    /// Edges sorted by file, line, column and symbol.
    pub edges: Vec<ImportEdge>,
    /// Files that failed to parse.
    pub warnings: Vec<ParseWarning>,
    /// Number of files whose imports were resolved.
    pub files_analyzed: usize,
    /// Imported names that resolved into any package, self-imports included.
    pub first_party_imports: usize,
}

impl ImportGraph {
    /// Edges not covered by a suppression directive.
    pub fn active_edges(&self) -> impl Iterator<Item = &ImportEdge> {
        self.edges.iter().filter(|e| !e.suppressed)
    }

    /// Edges leaving the given package.
    pub fn dependencies_of(&self, id: PackageId) -> impl Iterator<Item = &ImportEdge> {
        self.edges.iter().filter(move |e| e.from_package == id)
    }

    /// Edges entering the given package.
    pub fn usages_of(&self, id: PackageId) -> impl Iterator<Item = &ImportEdge> {
        self.edges.iter().filter(move |e| e.to_package == id)
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if there are no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

enum FileOutcome {
    Skipped,
    Resolved {
        edges: Vec<ImportEdge>,
        first_party: usize,
    },
    Failed(ParseWarning),
}

/// Resolves raw imports of many files into an [`ImportGraph`].
pub struct GraphBuilder<'a> {
    tree: &'a PackageTree,
    extractor: &'a dyn LanguageExtractor,
    source_roots: &'a [PathBuf],
    options: ExtractOptions,
    cancel: Option<&'a CancelToken>,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder over an immutable package tree.
    #[must_use]
    pub fn new(
        tree: &'a PackageTree,
        extractor: &'a dyn LanguageExtractor,
        source_roots: &'a [PathBuf],
    ) -> Self {
        Self {
            tree,
            extractor,
            source_roots,
            options: ExtractOptions::default(),
            cancel: None,
        }
    }

    /// Sets extraction options.
    #[must_use]
    pub fn options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Observes a cancellation token between files.
    #[must_use]
    pub fn cancel_token(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Parses and resolves every file.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the token was cancelled; no partial graph is
    /// produced in that case.
    pub fn build(&self, files: &[SourceFile]) -> Result<ImportGraph, Cancelled> {
        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|file| {
                if let Some(token) = self.cancel {
                    token.check()?;
                }
                Ok(self.resolve_file(file))
            })
            .collect::<Result<_, Cancelled>>()?;

        if let Some(token) = self.cancel {
            token.check()?;
        }

        let mut graph = ImportGraph::default();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Skipped => {}
                FileOutcome::Resolved { edges, first_party } => {
                    graph.edges.extend(edges);
                    graph.files_analyzed += 1;
                    graph.first_party_imports += first_party;
                }
                FileOutcome::Failed(warning) => graph.warnings.push(warning),
            }
        }

        graph.edges.sort_by(|a, b| {
            a.from_file
                .cmp(&b.from_file)
                .then(a.line.cmp(&b.line))
                .then(a.column.cmp(&b.column))
                .then_with(|| a.imported_symbol.cmp(&b.imported_symbol))
                .then(a.to_package.cmp(&b.to_package))
        });
        graph.warnings.sort_by(|a, b| a.file.cmp(&b.file));

        Ok(graph)
    }

    fn resolve_file(&self, file: &SourceFile) -> FileOutcome {
        if !self.extractor.handles(&file.path) {
            return FileOutcome::Skipped;
        }

        // Files outside every package are not import sources.
        let Some(source) = self.tree.resolve(&file.path) else {
            debug!("Not in any package: {}", file.path.display());
            return FileOutcome::Skipped;
        };
        let Some(file_module) = file_to_module_path(self.source_roots, &file.path) else {
            debug!("Not under a source root: {}", file.path.display());
            return FileOutcome::Skipped;
        };

        let imports = match self.extractor.extract_imports(&file.content, self.options) {
            Ok(imports) => imports,
            Err(e) => {
                warn!("Failed to parse {}: {}", file.path.display(), e);
                return FileOutcome::Failed(ParseWarning {
                    file: file.path.clone(),
                    message: e.to_string(),
                });
            }
        };

        let mut edges = Vec::new();
        let mut first_party = 0;
        for import in imports {
            let module = if import.level == 0 {
                import.module_path
            } else if let Some(resolved) = resolve_relative(
                &file_module,
                file.is_package_init(),
                import.level,
                &import.module_path,
            ) {
                resolved
            } else {
                debug!(
                    "{}:{}: relative import climbs above the source root",
                    file.path.display(),
                    import.line
                );
                continue;
            };

            let symbols = match import.names {
                ImportedNames::Wildcard => vec![ImportedSymbol::Wildcard],
                ImportedNames::Names(names) => {
                    names.into_iter().map(ImportedSymbol::Name).collect()
                }
            };

            for symbol in symbols {
                let qualified = match &symbol {
                    ImportedSymbol::Name(n) => join_module(&module, n),
                    ImportedSymbol::Wildcard => module.clone(),
                };
                let Some(target) = self.resolve_target(&qualified) else {
                    continue;
                };
                first_party += 1;
                if target.id == source.id {
                    continue;
                }
                edges.push(ImportEdge {
                    from_file: file.path.clone(),
                    line: import.line,
                    column: import.column,
                    from_package: source.id,
                    to_package: target.id,
                    module_path: module.clone(),
                    imported_symbol: symbol,
                    suppressed: import.suppressed,
                    ignore_reason: import.ignore_reason.clone(),
                });
            }
        }

        FileOutcome::Resolved { edges, first_party }
    }

    fn resolve_target(&self, qualified: &str) -> Option<&'a Package> {
        if qualified.is_empty() {
            return None;
        }
        self.tree.resolve_module(qualified)
    }
}
