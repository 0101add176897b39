//! Implementation of `sift config`.

use std::process::ExitCode;

use crate::cli::context::CommandContext;

/// Shows effective page settings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    print!("{}", ctx.config.settings_to_toml());
    ExitCode::SUCCESS
}
