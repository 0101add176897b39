//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use sift_config::Config;
use sift_query::StaticSchema;

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (default if no configuration file was found).
    pub config: Config,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    ///
    /// An explicit `config_path` is read as is; otherwise the nearest `.sift.toml` at or above
    /// the current directory is used.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config = match config_path {
            Some(path) => Config::load_file(path),
            None => Config::load(&cwd),
        }
        .map_err(|e| {
            eprintln!("error: failed to load configuration: {e}");
            ExitCode::FAILURE
        })?;
        Ok(Self { cwd, config })
    }

    /// Loads only the current directory, skipping configuration parsing.
    ///
    /// Used for `init`, which should work even when an existing config file is invalid.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        Ok(Self {
            cwd,
            config: Config::default(),
        })
    }

    /// Builds the index schema described by the configuration.
    pub fn schema(&self) -> StaticSchema {
        StaticSchema::from_config(&self.config.schema)
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}
