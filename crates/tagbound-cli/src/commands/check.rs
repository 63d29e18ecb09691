//! Check command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;

use super::Workspace;
use crate::OutputFormat;

/// Runs the check command.
pub fn run(
    path: &Path,
    format: OutputFormat,
    exclude: Vec<String>,
    config: Option<&Path>,
) -> Result<ExitCode> {
    let workspace = Workspace::load(path, config)?;

    let analyzer = workspace
        .analyzer()
        .excludes(exclude)
        .build()
        .context("Failed to build analyzer")?;

    tracing::info!("Checking {}", workspace.root.display());

    let result = analyzer.check().context("Check failed")?;

    super::output::print(&result, format)?;

    // Parse warnings fail the run too.
    if result.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
