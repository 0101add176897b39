//! Implementation of `sift check`.

use std::process::ExitCode;

use sift_config::ConfigWarning;
use sift_query::DEFAULT_QUERY_BUILDERS;

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader, warning},
};

/// Exit codes for `sift check`.
mod exit_codes {
    use std::process::ExitCode;

    /// Configuration is valid with no warnings.
    pub const OK: ExitCode = ExitCode::SUCCESS;
    /// Configuration has warnings but is usable.
    pub const WARNINGS: ExitCode = ExitCode::FAILURE;
}

/// Validates configuration and reports anything the page would silently ignore.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    println!("Checking configuration...");
    println!();

    let Some(source) = &config.source else {
        println!("{}", dim("No configuration file found."));
        println!();
        println!("Run {} to create a configuration file.", subheader("sift init"));
        return exit_codes::OK;
    };

    println!("{}", subheader("Config file:"));
    println!("   {}", source.display());
    println!();

    println!("{}", subheader("Content types:"));
    if config.schema.types.is_empty() {
        println!("   {}", dim("(none described, field names are used verbatim)"));
    } else {
        for (name, ty) in &config.schema.types {
            match &ty.parent {
                Some(parent) => println!("   {name} {}", dim(&format!("extends {parent}"))),
                None => println!("   {name}"),
            }
        }
    }
    println!();

    let warnings = config.validate();
    let mut issues: Vec<String> = warnings.iter().map(ToString::to_string).collect();
    let query_type = &config.page.query_type;
    if !DEFAULT_QUERY_BUILDERS.contains(&query_type.as_str()) {
        issues.push(format!(
            "query type '{query_type}' is not offered by the backend (available: {})",
            DEFAULT_QUERY_BUILDERS.join(", ")
        ));
    }

    if issues.is_empty() {
        println!("No issues found.");
        return exit_codes::OK;
    }

    println!("{}", warning(&format!("Warnings ({}):", issues.len())));
    for issue in &issues {
        println!("   - {issue}");
    }
    println!();

    print_hints(&warnings);

    exit_codes::WARNINGS
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    let mut hints = Vec::new();

    for warning in warnings {
        match warning {
            ConfigWarning::UnknownType { .. } => {
                hints.push("Describe the type under [schema.types] or remove it from page.types.");
            }
            ConfigWarning::UndefinedParentType { .. } => {
                hints.push("Define the parent type or drop the parent setting.");
            }
            ConfigWarning::NonPositiveBoost { .. } => {
                hints.push("Boost weights must be greater than zero to take effect.");
            }
            ConfigWarning::InvalidSortDirection { .. } => {
                hints.push("Use sort_dir = \"Ascending\" or \"Descending\".");
            }
            ConfigWarning::ZeroResultsPerPage => {
                hints.push("Set results_per_page to a positive number.");
            }
        }
    }

    hints.sort_unstable();
    hints.dedup();

    if !hints.is_empty() {
        println!("Hints:");
        for hint in hints {
            println!("   - {hint}");
        }
    }
}
