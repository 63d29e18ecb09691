//! Sync command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use tagbound_core::ConstraintPatch;

use super::Workspace;

/// Runs the sync command.
pub fn run(path: &Path, prune: bool, dry_run: bool, config: Option<&Path>) -> Result<ExitCode> {
    let mut workspace = Workspace::load(path, config)?;

    let analyzer = workspace
        .analyzer()
        .build()
        .context("Failed to build analyzer")?;
    let patch = analyzer.sync(prune).context("Sync failed")?;

    print!("{}", describe(&patch));

    if patch.is_empty() && !workspace.config.legacy_layout {
        println!("Constraints already match the imports.");
        return Ok(ExitCode::SUCCESS);
    }
    if dry_run {
        println!("Dry run: config not written.");
        return Ok(ExitCode::SUCCESS);
    }

    patch.apply(&mut workspace.config);
    let target = workspace.config_path();
    workspace
        .config
        .save(&target)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    if workspace.config.legacy_layout {
        tracing::info!("Rewrote legacy [constraints.<tag>] tables as [[constraints]]");
    }
    println!(
        "Updated {}: {} added, {} removed",
        target.display(),
        patch.additions.len(),
        patch.prunes.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn describe(patch: &ConstraintPatch) -> String {
    let mut out = String::new();
    for pair in &patch.additions {
        out.push_str(&format!("+ {pair}\n"));
    }
    for pair in &patch.prunes {
        out.push_str(&format!("- {pair}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagbound_core::TagPair;

    #[test]
    fn describe_lists_additions_then_prunes() {
        let patch = ConstraintPatch {
            additions: vec![TagPair::new("utils", "core")],
            prunes: vec![TagPair::new("core", "db")],
        };
        assert_eq!(describe(&patch), "+ utils -> core\n- core -> db\n");
    }
}
