//! Error types for the sift-query crate.
//!
//! Query construction itself never fails. Only talking to a backend can.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that can occur when executing a query against a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to read a canned response.
    #[error("failed to read response fixture {path}: {source}")]
    ReadFixture {
        /// Path to the fixture.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A canned response is not valid JSON of the expected shape.
    #[error("failed to parse response fixture {path}: {source}")]
    ParseFixture {
        /// Path to the fixture.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The backend rejected or failed to run the query.
    #[error("query execution failed: {0}")]
    Execution(String),
}
