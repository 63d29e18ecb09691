//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::ExitCode;
use tagbound_core::CONFIG_FILE_NAME;

const DEFAULT_CONFIG: &str = r#"# tagbound configuration
#
# Packages are declared by a package.toml in their root directory:
#
#     tags = ["core"]
#     strict = false   # true: importers may only use names in __all__

# Directories module paths are computed from
source_roots = ["."]

# Glob patterns to exclude, matched against paths and path components
exclude = ["tests", "docs"]

# Skip files and directories starting with "."
exclude_hidden_paths = true

# Skip imports inside `if TYPE_CHECKING:` blocks
ignore_type_checking_imports = false

# Packages tagged `tag` may import packages tagged with any of `depends_on`.
# Run `tagbound sync` to fill these in from the current imports.

# [[constraints]]
# tag = "core"
# depends_on = ["db", "utils"]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<ExitCode> {
    let config_path = Path::new(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_FILE_NAME}");
    println!("\nNext steps:");
    println!("  1. Add a package.toml with tags to each package directory");
    println!("  2. Run: tagbound sync");
    println!("  3. Run: tagbound check");

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagbound_core::ProjectConfig;

    #[test]
    fn template_is_a_valid_default_config() {
        let config = ProjectConfig::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, ProjectConfig::default());
        config.validate().unwrap();
    }
}
