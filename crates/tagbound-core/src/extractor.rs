//! Language-agnostic extraction types and trait.
//!
//! `LanguageExtractor` is the extension point for source languages.
//! Implement it to teach the engine how to pull import statements and the
//! public interface declaration out of a source file.

use serde::Serialize;
use std::path::PathBuf;

/// Names bound by an import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImportedNames {
    /// The whole module (`import a.b`, `from a.b import *`).
    Wildcard,
    /// Specific members (`from a.b import X, Y`). Aliases are not recorded.
    Names(Vec<String>),
}

/// A single import statement extracted from source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawImport {
    /// Line number of the statement (1-indexed).
    pub line: usize,
    /// Column of the statement (1-indexed).
    pub column: usize,
    /// Number of leading dots for relative imports (0 for absolute).
    pub level: usize,
    /// Dotted module path as written, without leading dots.
    pub module_path: String,
    /// What the statement imports from the module.
    pub names: ImportedNames,
    /// A suppression directive covers this statement.
    pub suppressed: bool,
    /// Reason given by the covering directive, if any.
    pub ignore_reason: Option<String>,
}

impl RawImport {
    /// Creates an absolute import record.
    #[must_use]
    pub fn new(line: usize, column: usize, module_path: impl Into<String>, names: ImportedNames) -> Self {
        Self {
            line,
            column,
            level: 0,
            module_path: module_path.into(),
            names,
            suppressed: false,
            ignore_reason: None,
        }
    }

    /// Sets the relative import level.
    #[must_use]
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    /// Marks the import as suppressed, keeping the directive's reason.
    #[must_use]
    pub fn suppressed(mut self, reason: Option<String>) -> Self {
        self.suppressed = true;
        self.ignore_reason = reason;
        self
    }
}

/// Options passed to extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Skip imports guarded by a `TYPE_CHECKING` condition.
    pub ignore_type_checking_imports: bool,
}

/// Source text that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at {line}:{column}: {message}")]
pub struct ParseError {
    /// Line of the first error (1-indexed).
    pub line: usize,
    /// Column of the first error (1-indexed).
    pub column: usize,
    /// Parser message.
    pub message: String,
}

/// A source file handed to the engine: project-relative path plus contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// File contents.
    pub content: String,
}

impl SourceFile {
    /// Creates a source file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Returns true for package entry modules (`__init__` files).
    #[must_use]
    pub fn is_package_init(&self) -> bool {
        self.path
            .file_stem()
            .is_some_and(|stem| stem == "__init__")
    }
}

/// Trait for language-specific extraction.
///
/// The extractor receives raw source text and returns import records in the
/// language-agnostic representation above. Implementations must be usable
/// from several threads at once.
pub trait LanguageExtractor: Send + Sync {
    /// Language identifier (e.g., `"python"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this extractor handles (e.g., `&[".py"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// File name of a package's entry module (e.g., `"__init__.py"`).
    fn entry_module_name(&self) -> &'static str;

    /// Extracts every statically visible import statement.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the source does not parse.
    fn extract_imports(
        &self,
        source: &str,
        options: ExtractOptions,
    ) -> Result<Vec<RawImport>, ParseError>;

    /// Reads the public interface declared by an entry module.
    ///
    /// Returns `Ok(None)` when the module declares no interface.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the source does not parse.
    fn public_symbols(&self, source: &str) -> Result<Option<Vec<String>>, ParseError>;

    /// Returns true if this extractor handles the given path.
    fn handles(&self, path: &std::path::Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions()
            .iter()
            .any(|known| known.strip_prefix('.') == Some(ext))
    }
}
