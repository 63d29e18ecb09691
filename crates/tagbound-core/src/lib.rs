//! # tagbound-core
//!
//! Static, tag-based import boundary analysis.
//!
//! Packages are directory subtrees labelled with tags. Constraints declare
//! which tags may import which. This crate resolves a project's packages,
//! builds its import graph through a pluggable [`LanguageExtractor`], and
//! then:
//!
//! - [`check`]s every import against the constraints and strict interfaces
//! - [`sync`]s the declared constraints with the observed imports
//! - reports a single package's dependencies and usages
//!
//! ## Example
//!
//! ```ignore
//! use tagbound_core::{Analyzer, ProjectConfig};
//! use tagbound_python::PythonExtractor;
//!
//! let analyzer = Analyzer::builder()
//!     .root(".")
//!     .config(ProjectConfig::from_file("tagbound.toml".as_ref())?)
//!     .extractor(PythonExtractor::new())
//!     .build()?;
//!
//! let result = analyzer.check()?;
//! print!("{}", result.format_report());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod cancel;
mod check;
mod config;
mod discover;
mod extractor;
mod graph;
mod package;
mod report;
mod sync;
mod tag;
mod types;

/// Path and suppression helpers shared with language extractors.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError, Project};
pub use cancel::{CancelToken, Cancelled};
pub use check::{check, CheckError, ConstraintSet};
pub use config::{
    ConfigError, Constraint, PackageConfig, ProjectConfig, CONFIG_FILE_NAME, PACKAGE_FILE_NAME,
};
pub use discover::{discover, DiscoverError, Discovery};
pub use extractor::{
    ExtractOptions, ImportedNames, LanguageExtractor, ParseError, RawImport, SourceFile,
};
pub use graph::{GraphBuilder, ImportEdge, ImportGraph, ImportedSymbol};
pub use package::{Package, PackageDecl, PackageId, PackageTree};
pub use report::{DependencyReport, ReportEntry, ReportError, ReportSections};
pub use sync::{sync, ConstraintPatch, TagPair};
pub use tag::{TagError, TagId, TagSet, TagTable};
pub use types::{
    CheckResult, Location, ParseWarning, Violation, ViolationKind, NO_FIRST_PARTY_IMPORTS,
};
