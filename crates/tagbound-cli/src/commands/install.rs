//! Install command implementation.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const PRE_COMMIT_TEMPLATE: &str = "#!/bin/sh
# Pre-commit script that validates dependencies locally
set -e

";

/// Hook script running `tagbound check`, from the repository root.
///
/// `project` is the project directory relative to the repository root, or
/// `None` when they are the same.
fn hook_content(project: Option<&Path>) -> String {
    let command = match project {
        Some(dir) => format!("tagbound check {}", dir.to_string_lossy().replace('\\', "/")),
        None => "tagbound check".to_string(),
    };
    format!("{PRE_COMMIT_TEMPLATE}{command}\n")
}

/// Nearest ancestor of `dir` (itself included) holding a `.git` directory.
fn find_git_root(dir: &Path) -> Option<&Path> {
    dir.ancestors().find(|d| d.join(".git").is_dir())
}

/// Writes the pre-commit hook for the project at `path` and returns its
/// location.
fn install_pre_commit(path: &Path, force: bool) -> Result<PathBuf> {
    let project = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to read current directory")?
            .join(path)
    };
    let Some(git_root) = find_git_root(&project) else {
        bail!("{} is not inside a git repository", path.display());
    };

    let relative = project.strip_prefix(git_root).unwrap_or(Path::new(""));
    let relative = relative
        .components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect::<PathBuf>();
    let content = hook_content((!relative.as_os_str().is_empty()).then_some(relative.as_path()));

    let hooks_dir = git_root.join(".git").join("hooks");
    let hook = hooks_dir.join("pre-commit");
    if hook.exists() && !force {
        bail!(
            "A pre-commit hook already exists at {}. Use --force to overwrite.",
            hook.display()
        );
    }
    std::fs::create_dir_all(&hooks_dir)
        .with_context(|| format!("Failed to create {}", hooks_dir.display()))?;
    std::fs::write(&hook, content)
        .with_context(|| format!("Failed to write {}", hook.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to make {} executable", hook.display()))?;
    }

    tracing::debug!("Hook written for git root {}", git_root.display());
    Ok(hook)
}

/// Runs the install command for a pre-commit hook.
pub fn run(path: &Path, force: bool) -> Result<ExitCode> {
    let hook = install_pre_commit(path, force)?;
    println!("Installed pre-commit hook at {}", hook.display());
    Ok(ExitCode::SUCCESS)
}
