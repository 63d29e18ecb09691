//! Shared output formatting for check results.

use anyhow::Result;
use tagbound_core::{CheckResult, NO_FIRST_PARTY_IMPORTS};

use crate::OutputFormat;

/// Print check results in the specified format.
pub fn print(result: &CheckResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
    }
    Ok(())
}

fn print_text(result: &CheckResult) {
    for violation in &result.violations {
        println!(
            "{} {} at {}",
            violation.code(),
            violation.kind.name(),
            violation.location,
        );
        println!("  \x1b[31merror\x1b[0m: {}", violation.message);
        println!();
    }

    for warning in &result.warnings {
        println!(
            "{}: \x1b[33mwarning\x1b[0m: skipped, {}",
            warning.file.display(),
            warning.message
        );
    }
    if !result.warnings.is_empty() {
        println!();
    }
    if result.no_first_party_imports {
        println!("\x1b[33mwarning\x1b[0m: {NO_FIRST_PARTY_IMPORTS}");
        println!();
    }

    let (undeclared, strict) = result.count_by_kind();
    let summary_color = if result.has_violations() {
        "\x1b[31m"
    } else if !result.warnings.is_empty() {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} undeclared dependency(ies), {} strict interface violation(s), {} unparsable file(s) in {} file(s)\x1b[0m",
        summary_color,
        undeclared,
        strict,
        result.warnings.len(),
        result.files_checked
    );
}

fn print_json(result: &CheckResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &CheckResult) {
    for violation in &result.violations {
        println!("{violation}");
    }
    for warning in &result.warnings {
        println!("{}: warning {}", warning.file.display(), warning.message);
    }
    if result.no_first_party_imports {
        println!("warning: {NO_FIRST_PARTY_IMPORTS}");
    }
}
