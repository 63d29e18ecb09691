//! Report command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use tagbound_core::ReportSections;

use super::Workspace;

/// Runs the report command.
///
/// Passing neither `--dependencies` nor `--usages` shows both.
pub fn run(
    path: &Path,
    package: &Path,
    dependencies: bool,
    usages: bool,
    raw: bool,
    config: Option<&Path>,
) -> Result<ExitCode> {
    let workspace = Workspace::load(path, config)?;
    let analyzer = workspace
        .analyzer()
        .build()
        .context("Failed to build analyzer")?;

    let sections = ReportSections {
        dependencies: dependencies || !usages,
        usages: usages || !dependencies,
    };
    let report = analyzer
        .report(package, sections)
        .with_context(|| format!("Failed to report on {}", package.display()))?;

    if raw {
        println!("{}", report.render_raw());
    } else {
        print!("{}", report.render_text());
    }
    Ok(ExitCode::SUCCESS)
}
