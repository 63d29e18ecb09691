//! Core types for boundary violations and check results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::graph::ImportEdge;

/// Shown when no import resolved into any package.
pub const NO_FIRST_PARTY_IMPORTS: &str = "No first-party imports were found. \
     Check that `source_roots` lists the directories your packages are imported from.";

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to project root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl Location {
    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// The two kinds of boundary finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// The importing package's tags do not allow any of the target's tags.
    UndeclaredDependency,
    /// The target is strict and the import bypasses its public interface.
    StrictInterfaceViolation,
}

impl ViolationKind {
    /// Short stable code (e.g. `"TB001"`).
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::UndeclaredDependency => "TB001",
            Self::StrictInterfaceViolation => "TB002",
        }
    }

    /// Kebab-case rule name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::UndeclaredDependency => "undeclared-dependency",
            Self::StrictInterfaceViolation => "strict-interface",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A boundary violation found during checking.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    /// What kind of rule was broken.
    pub kind: ViolationKind,
    /// Location of the offending import statement.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// The edge that triggered this violation.
    pub edge: ImportEdge,
}

impl Violation {
    /// Creates a violation located at the edge's import statement.
    #[must_use]
    pub fn new(kind: ViolationKind, edge: ImportEdge, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: Location::new(edge.from_file.clone(), edge.line, edge.column),
            message: message.into(),
            edge,
        }
    }

    /// Stable code of the violation kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "{} {} at {}\n  error: {}\n",
            self.kind.code(),
            self.kind.name(),
            self.location,
            self.message,
        )
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: error [{}] {}",
            self.location,
            self.kind.code(),
            self.message
        )
    }
}

/// A file that could not be parsed. Non-fatal: the file contributes no edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// File path relative to project root.
    pub file: PathBuf,
    /// Parser message.
    pub message: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: skipped, {}", self.file.display(), self.message)
    }
}

/// Result of running a boundary check.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    /// All violations found, sorted by file, line and column.
    pub violations: Vec<Violation>,
    /// Files that failed to parse.
    pub warnings: Vec<ParseWarning>,
    /// Number of files whose imports were analyzed.
    pub files_checked: usize,
    /// No import resolved into any package, usually a `source_roots` mistake.
    pub no_first_party_imports: bool,
}

impl CheckResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any violation was found.
    #[must_use]
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Returns true only when there are no violations and every file parsed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.warnings.is_empty()
    }

    /// Counts violations by kind: `(undeclared, strict)`.
    #[must_use]
    pub fn count_by_kind(&self) -> (usize, usize) {
        let undeclared = self
            .violations
            .iter()
            .filter(|v| v.kind == ViolationKind::UndeclaredDependency)
            .count();
        (undeclared, self.violations.len() - undeclared)
    }

    /// Formats violations as a multi-line report.
    #[must_use]
    pub fn format_report(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        for v in &self.violations {
            let _ = writeln!(report, "{}", v.format());
        }
        for w in &self.warnings {
            let _ = writeln!(report, "warning: {w}");
        }
        if self.no_first_party_imports {
            let _ = writeln!(report, "warning: {NO_FIRST_PARTY_IMPORTS}");
        }

        let (undeclared, strict) = self.count_by_kind();
        let _ = writeln!(
            report,
            "Found {} undeclared dependency(ies), {} strict interface violation(s) in {} file(s)",
            undeclared, strict, self.files_checked
        );
        report
    }
}
