//! Implementation of `sift init`.

use std::{fs, process::ExitCode};

use sift_config::{CONFIG_FILENAME, page_template};

use crate::cli::{
    args::InitCommand,
    context::CommandContext,
    output::{indent, subheader},
};

/// Writes a commented `.sift.toml` template into the current directory.
pub fn run(ctx: &CommandContext, cmd: &InitCommand) -> ExitCode {
    let config_path = ctx.cwd.join(CONFIG_FILENAME);

    if config_path.exists() && !cmd.force {
        eprintln!(
            "error: configuration file already exists: {}",
            config_path.display()
        );
        eprintln!("use --force to overwrite");
        return ExitCode::FAILURE;
    }

    let template = page_template();
    if let Err(e) = fs::write(&config_path, &template) {
        eprintln!("error: failed to write {}: {e}", config_path.display());
        return ExitCode::FAILURE;
    }

    println!("Created {}", config_path.display());
    println!();
    println!("{}", subheader("Configuration written:"));
    println!("{}", indent(&template));

    ExitCode::SUCCESS
}
