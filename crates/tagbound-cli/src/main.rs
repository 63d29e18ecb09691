//! tagbound CLI tool.
//!
//! Usage:
//! ```bash
//! tagbound check [OPTIONS] [PATH]
//! tagbound sync [--prune] [--dry-run] [PATH]
//! tagbound report <PACKAGE_DIR> [PATH]
//! tagbound init
//! tagbound install pre-commit [PATH]
//! ```
//!
//! Exit codes: `0` clean, `1` violations or unparsable files, `2` any
//! configuration, I/O or internal failure.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Tag-based import boundary checker for Python projects
#[derive(Parser)]
#[command(name = "tagbound")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check imports against the declared constraints
    Check {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// Update the declared constraints to match the observed imports
    Sync {
        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Also remove declared dependencies that no import uses
        #[arg(long)]
        prune: bool,

        /// Print the changes without writing the config
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the dependencies and usages of one package
    Report {
        /// Package root directory, relative to the project
        package: PathBuf,

        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only show the package's dependencies
        #[arg(long)]
        dependencies: bool,

        /// Only show the package's usages
        #[arg(long)]
        usages: bool,

        /// Print module paths only
        #[arg(long)]
        raw: bool,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Install a git hook that runs the check
    Install {
        /// What to install
        target: InstallTarget,

        /// Project directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing hook
        #[arg(long)]
        force: bool,
    },
}

/// Installable integrations.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum InstallTarget {
    /// Git pre-commit hook.
    PreCommit,
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-finding compact format.
    Compact,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Check {
            path,
            format,
            exclude,
        } => commands::check::run(&path, format, exclude, config),
        Commands::Sync {
            path,
            prune,
            dry_run,
        } => commands::sync::run(&path, prune, dry_run, config),
        Commands::Report {
            package,
            path,
            dependencies,
            usages,
            raw,
        } => commands::report::run(&path, &package, dependencies, usages, raw, config),
        Commands::Init { force } => commands::init::run(force),
        Commands::Install {
            target: InstallTarget::PreCommit,
            path,
            force,
        } => commands::install::run(&path, force),
    }
}
