//! Dependency report for a single package.
//!
//! Lists the imports leaving a package (its dependencies) and the imports
//! entering it (its usages).

use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::check::CheckError;
use crate::graph::{ImportEdge, ImportGraph};
use crate::package::{PackageId, PackageTree};
use crate::types::{Location, ParseWarning};

const RULE: &str = "-------------------------------";

/// Errors raised while building a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Both sections were deselected.
    #[error("nothing to report: select dependencies, usages or both")]
    NothingToReport,

    /// The directory is not a declared package root.
    #[error("'{path}' is not a package root")]
    UnknownPackage {
        /// Requested directory.
        path: PathBuf,
    },

    /// The graph is inconsistent with the tree.
    #[error(transparent)]
    Check(#[from] CheckError),
}

/// Which sections to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSections {
    /// Include imports leaving the package.
    pub dependencies: bool,
    /// Include imports entering the package.
    pub usages: bool,
}

impl Default for ReportSections {
    fn default() -> Self {
        Self {
            dependencies: true,
            usages: true,
        }
    }
}

/// One import in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Where the import statement is.
    pub location: Location,
    /// Fully qualified import.
    pub import: String,
    /// Module path of the package on the other side of the edge.
    pub other_module: String,
    /// A suppression directive covers the statement.
    pub suppressed: bool,
    /// Reason given by that directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_reason: Option<String>,
}

/// Dependencies and usages of one package.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyReport {
    /// Package display name.
    pub package: String,
    /// Imports leaving the package, `None` when not selected.
    pub dependencies: Option<Vec<ReportEntry>>,
    /// Imports entering the package, `None` when not selected.
    pub usages: Option<Vec<ReportEntry>>,
    /// Files skipped while building the graph.
    pub warnings: Vec<ParseWarning>,
}

impl DependencyReport {
    /// Collects the selected sections for the package rooted at `package_root`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NothingToReport`] when no section is selected,
    /// and [`ReportError::UnknownPackage`] when `package_root` is not a
    /// declared package root.
    pub fn build(
        graph: &ImportGraph,
        tree: &PackageTree,
        package_root: &Path,
        sections: ReportSections,
    ) -> Result<Self, ReportError> {
        if !sections.dependencies && !sections.usages {
            return Err(ReportError::NothingToReport);
        }
        let package = tree
            .find_by_root(package_root)
            .ok_or_else(|| ReportError::UnknownPackage {
                path: package_root.to_path_buf(),
            })?;

        let entry = |edge: &ImportEdge, other: PackageId| -> Result<ReportEntry, ReportError> {
            let other = tree.get(other).ok_or(CheckError::Internal(other.index()))?;
            Ok(ReportEntry {
                location: Location::new(edge.from_file.clone(), edge.line, edge.column),
                import: edge.qualified_path(),
                other_module: other.module_path.clone(),
                suppressed: edge.suppressed,
                ignore_reason: edge.ignore_reason.clone(),
            })
        };

        let dependencies = if sections.dependencies {
            Some(
                graph
                    .dependencies_of(package.id)
                    .map(|e| entry(e, e.to_package))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        } else {
            None
        };
        let usages = if sections.usages {
            Some(
                graph
                    .usages_of(package.id)
                    .map(|e| entry(e, e.from_package))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        } else {
            None
        };

        Ok(Self {
            package: package.name(),
            dependencies,
            usages,
            warnings: graph.warnings.clone(),
        })
    }

    /// Renders sectioned, human-readable text.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[ Dependency Report for '{}' ]", self.package);
        let _ = writeln!(out, "{RULE}");

        let sections = [
            ("Dependencies", "No dependencies found.", &self.dependencies),
            ("Usages", "No usages found.", &self.usages),
        ];
        for (title, empty, entries) in sections {
            let Some(entries) = entries else {
                continue;
            };
            let _ = writeln!(out, "[ {title} of '{}' ]", self.package);
            if entries.is_empty() {
                let _ = writeln!(out, "{empty}");
            }
            for e in entries {
                let marker = match (&e.ignore_reason, e.suppressed) {
                    (Some(reason), true) => format!(" (ignored: {reason})"),
                    (None, true) => " (ignored)".to_string(),
                    (_, false) => String::new(),
                };
                let _ = writeln!(out, "{}: Import '{}'{marker}", e.location, e.import);
            }
            let _ = writeln!(out, "{RULE}");
        }
        if !self.warnings.is_empty() {
            let _ = writeln!(out, "[ Warnings ]");
            for w in &self.warnings {
                let _ = writeln!(out, "{w}");
            }
        }
        out
    }

    /// Renders only the unique module paths on the other side of each edge.
    ///
    /// Warnings are left out so the output stays machine-readable.
    #[must_use]
    pub fn render_raw(&self) -> String {
        let mut lines = Vec::new();
        let sections = [
            ("# Module Dependencies", &self.dependencies),
            ("# Module Usages", &self.usages),
        ];
        for (header, entries) in sections {
            let Some(entries) = entries.as_ref().filter(|e| !e.is_empty()) else {
                continue;
            };
            let mut modules: Vec<&str> = entries.iter().map(|e| e.other_module.as_str()).collect();
            modules.sort_unstable();
            modules.dedup();
            lines.push(header.to_string());
            lines.extend(modules.into_iter().map(String::from));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::testing::LineExtractor;
    use crate::extractor::SourceFile;
    use crate::graph::GraphBuilder;
    use crate::package::PackageDecl;

    fn setup() -> (ImportGraph, PackageTree) {
        let roots = vec![PathBuf::from(".")];
        let tree = PackageTree::build(
            vec![
                PackageDecl::new("utils", ["utils"]),
                PackageDecl::new("db", ["db"]),
                PackageDecl::new("core", ["core"]),
            ],
            &roots,
        )
        .unwrap();
        let files = [
            SourceFile::new("core/service.py", "from db import Session\nimport utils.text\n"),
            SourceFile::new("utils/helpers.py", "# tagbound: ignore\nfrom core import PublicAPI\n"),
            SourceFile::new("db/models.py", "from utils import slug\n"),
        ];
        let graph = GraphBuilder::new(&tree, &LineExtractor, &roots)
            .build(&files)
            .unwrap();
        (graph, tree)
    }

    #[test]
    fn text_report_lists_both_sections() {
        let (graph, tree) = setup();
        let report =
            DependencyReport::build(&graph, &tree, Path::new("core"), ReportSections::default())
                .unwrap();
        insta::assert_snapshot!(report.render_text(), @r"
        [ Dependency Report for 'core' ]
        -------------------------------
        [ Dependencies of 'core' ]
        core/service.py:1:1: Import 'db.Session'
        core/service.py:2:1: Import 'utils.text'
        -------------------------------
        [ Usages of 'core' ]
        utils/helpers.py:2:1: Import 'core.PublicAPI' (ignored)
        -------------------------------
        ");
    }

    #[test]
    fn raw_report_lists_unique_modules() {
        let (graph, tree) = setup();
        let report = DependencyReport::build(
            &graph,
            &tree,
            Path::new("utils"),
            ReportSections::default(),
        )
        .unwrap();
        assert_eq!(
            report.render_raw(),
            "# Module Dependencies\ncore\n# Module Usages\ncore\ndb"
        );
    }

    #[test]
    fn deselected_section_is_omitted() {
        let (graph, tree) = setup();
        let report = DependencyReport::build(
            &graph,
            &tree,
            Path::new("db"),
            ReportSections {
                dependencies: false,
                usages: true,
            },
        )
        .unwrap();
        assert!(report.dependencies.is_none());
        let text = report.render_text();
        assert!(!text.contains("Dependencies of"));
        assert!(text.contains("core/service.py:1:1: Import 'db.Session'"));
    }

    #[test]
    fn ignore_reason_is_shown() {
        let roots = vec![PathBuf::from(".")];
        let tree = PackageTree::build(
            vec![
                PackageDecl::new("db", ["db"]),
                PackageDecl::new("core", ["core"]),
            ],
            &roots,
        )
        .unwrap();
        let files = [SourceFile::new(
            "core/service.py",
            "# tagbound: ignore reason=\"legacy session\"\nfrom db import Session\n",
        )];
        let graph = GraphBuilder::new(&tree, &LineExtractor, &roots)
            .build(&files)
            .unwrap();
        let report =
            DependencyReport::build(&graph, &tree, Path::new("core"), ReportSections::default())
                .unwrap();
        assert!(report
            .render_text()
            .contains("core/service.py:2:1: Import 'db.Session' (ignored: legacy session)"));
    }

    #[test]
    fn parse_warnings_are_listed_in_text_only() {
        let roots = vec![PathBuf::from(".")];
        let tree = PackageTree::build(
            vec![
                PackageDecl::new("db", ["db"]),
                PackageDecl::new("core", ["core"]),
            ],
            &roots,
        )
        .unwrap();
        let files = [
            SourceFile::new("core/service.py", "from db import Session\n"),
            SourceFile::new("db/broken.py", "!!\n"),
        ];
        let graph = GraphBuilder::new(&tree, &LineExtractor, &roots)
            .build(&files)
            .unwrap();
        let report =
            DependencyReport::build(&graph, &tree, Path::new("core"), ReportSections::default())
                .unwrap();
        assert_eq!(report.warnings.len(), 1);

        let text = report.render_text();
        let tail = text.split("[ Warnings ]\n").nth(1).unwrap();
        assert!(tail.starts_with("db/broken.py: skipped, "));
        assert_eq!(report.render_raw(), "# Module Dependencies\ndb");
    }

    #[test]
    fn nothing_selected_is_an_error() {
        let (graph, tree) = setup();
        let err = DependencyReport::build(
            &graph,
            &tree,
            Path::new("db"),
            ReportSections {
                dependencies: false,
                usages: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::NothingToReport));
    }

    #[test]
    fn unknown_package_is_an_error() {
        let (graph, tree) = setup();
        let err = DependencyReport::build(&graph, &tree, Path::new("web"), ReportSections::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "'web' is not a package root");
    }
}
