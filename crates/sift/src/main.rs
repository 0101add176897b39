//! sift: faceted search page queries from the command line.
//!
//! Loads a search page configuration, turns an HTTP-style query string into the backend query
//! the page would send, and optionally runs it against a canned backend response to show the
//! results, facets and crumbs a results page would render.

#![warn(missing_docs)]

mod cli;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::{args::Cli, commands, context::CommandContext, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let ctx = if cli.command.needs_config() {
        CommandContext::load(cli.config.as_deref())
    } else {
        CommandContext::load_cwd_only()
    };
    let ctx = match ctx {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    commands::run(cli.command, &ctx)
}
