//! Clap argument definitions for the `sift` CLI.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Build, inspect and run faceted search page queries")]
pub struct Cli {
    /// Configuration file to use instead of the nearest .sift.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log more (-v for debug, -vv for trace). RUST_LOG applies when not given
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Supported `sift` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Create a .sift.toml in the current directory
    Init(InitCommand),

    /// Validate configuration and diagnose issues
    Check,

    /// Show the effective page settings
    Config,

    /// List the fields the page can sort on
    Fields(FieldsCommand),

    /// Show the backend query a request would produce
    Build(BuildCommand),

    /// Run a request against a canned backend response
    Search(SearchCommand),
}

impl Commands {
    /// Returns false for commands that must work without a readable configuration.
    pub fn needs_config(&self) -> bool {
        !matches!(self, Self::Init(_))
    }
}

/// Arguments for `sift init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `sift fields`.
#[derive(Args, Debug, Clone)]
pub struct FieldsCommand {
    /// Include geo-point fields, which cannot be sorted on
    #[arg(long)]
    pub include_geo: bool,
}

/// Arguments for `sift build`.
#[derive(Args, Debug, Clone)]
pub struct BuildCommand {
    /// Request query string, for example "Search=shoes&SortBy=Title"
    #[arg(default_value = "")]
    pub query: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `sift search`.
#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    /// Request query string, for example "Search=shoes&filter[Category_ms][]=Hats"
    #[arg(default_value = "")]
    pub query: String,

    /// JSON file holding the backend response
    #[arg(long, value_name = "FILE")]
    pub response: Option<PathBuf>,

    /// Behave as if the backend were unreachable
    #[arg(long, conflicts_with = "response")]
    pub offline: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
