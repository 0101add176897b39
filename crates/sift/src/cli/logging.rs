//! Log output for the CLI.
//!
//! Library crates emit `tracing` events; this installs the subscriber that prints them to
//! stderr so they never mix with command output.

use std::io;

use tracing_subscriber::EnvFilter;

/// Filter used when neither `-v` nor `RUST_LOG` is given.
const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber.
///
/// `-v` and `-vv` select debug and trace output for the sift crates. Without them `RUST_LOG`
/// is honoured, falling back to warnings only.
pub fn init(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        1 => EnvFilter::new("warn,sift=debug,sift_config=debug,sift_query=debug"),
        _ => EnvFilter::new("warn,sift=trace,sift_config=trace,sift_query=trace"),
    };

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
    if let Err(e) = result {
        eprintln!("warning: could not initialize logging: {e}");
    }
}
