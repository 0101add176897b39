//! Configuration file discovery.
//!
//! Finds the `.sift.toml` closest to a starting directory by walking up the directory tree.

use std::path::{Path, PathBuf};

/// The configuration filename.
pub const CONFIG_FILENAME: &str = ".sift.toml";

/// Returns the nearest configuration file at or above `cwd`.
///
/// Directories named `.sift.toml` are skipped. Returns `None` when no file is found before
/// reaching the filesystem root.
pub fn discover_config_file(cwd: &Path) -> Option<PathBuf> {
    let mut current = Some(cwd);
    while let Some(dir) = current {
        let config_path = dir.join(CONFIG_FILENAME);
        if config_path.is_file() {
            return Some(config_path);
        }
        current = dir.parent();
    }
    None
}
