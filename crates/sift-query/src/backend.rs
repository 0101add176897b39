//! The search backend seam and the result set it returns.
//!
//! The backend itself lives elsewhere; this crate only needs to know whether it is reachable,
//! which query parsers it offers and how to run one [`ResolvedQuery`]. [`FixtureBackend`]
//! answers every query with a canned [`ResultSet`], which is enough for the CLI and for tests.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fs,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{builder::ResolvedQuery, error::BackendError};

/// Query parsers offered when a backend does not say otherwise.
pub const DEFAULT_QUERY_BUILDERS: &[&str] = &["default", "dismax", "edismax"];

/// One counted facet bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetTerm {
    /// Term as reported by the backend.
    pub name: String,
    /// Filter value selecting this bucket. Defaults to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Number of matching records.
    pub count: u64,
}

impl FacetTerm {
    /// Creates a term whose filter value is its name.
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            query: None,
            count,
        }
    }

    /// Returns the filter value that selects this bucket.
    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or(&self.name)
    }
}

/// Counts for one facet field, in backend order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCounts {
    /// Indexed field, or `facet_queries` for query facets.
    pub field: String,
    /// Buckets in the order the backend returned them.
    pub terms: Vec<FacetTerm>,
}

/// Facet counts for every field, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetResult(Vec<FacetCounts>);

impl FacetResult {
    /// Wraps per-field counts.
    pub fn new(fields: Vec<FacetCounts>) -> Self {
        Self(fields)
    }

    /// Returns the terms counted for `field`.
    pub fn get(&self, field: &str) -> Option<&[FacetTerm]> {
        self.0
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.terms.as_slice())
    }

    /// Iterates over fields in backend order.
    pub fn iter(&self) -> impl Iterator<Item = &FacetCounts> {
        self.0.iter()
    }

    /// Returns true if no field was counted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A stored record: field name to value.
pub type Record = BTreeMap<String, serde_json::Value>;

/// What the backend returns for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultSet {
    /// The page of matching records.
    pub records: Vec<Record>,
    /// Total number of matches across all pages.
    pub total_results: u64,
    /// Time the backend spent, in milliseconds, when reported.
    pub time_taken_ms: Option<u64>,
    /// Facet counts.
    pub facets: FacetResult,
}

impl ResultSet {
    /// Returns the elapsed time in seconds. Missing or zero timings yield `None`.
    pub fn time_taken_secs(&self) -> Option<f64> {
        self.time_taken_ms
            .filter(|ms| *ms > 0)
            .map(|ms| ms as f64 / 1000.0)
    }
}

/// A full-text search service.
pub trait SearchBackend {
    /// Returns true if the backend can currently take queries.
    fn is_connected(&self) -> bool;

    /// Returns the query parsers this backend offers.
    fn query_builders(&self) -> Vec<String> {
        DEFAULT_QUERY_BUILDERS
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    /// Runs one query.
    fn execute(&self, query: &ResolvedQuery) -> Result<ResultSet, BackendError>;
}

/// A backend that answers every query with the same canned response.
#[derive(Debug, Default)]
pub struct FixtureBackend {
    /// Response returned for every query.
    response: ResultSet,
    /// Whether the backend claims to be reachable.
    connected: bool,
    /// Error message returned instead of the response, if set.
    failure: Option<String>,
    /// Number of queries executed so far.
    executions: Cell<usize>,
    /// The most recently executed query.
    last_query: RefCell<Option<ResolvedQuery>>,
}

impl FixtureBackend {
    /// Creates a connected backend returning `response`.
    pub fn new(response: ResultSet) -> Self {
        Self {
            response,
            connected: true,
            ..Self::default()
        }
    }

    /// Creates a connected backend returning the JSON response stored at `path`.
    pub fn from_file(path: &Path) -> Result<Self, BackendError> {
        let content = fs::read_to_string(path).map_err(|source| BackendError::ReadFixture {
            path: path.to_path_buf(),
            source,
        })?;
        let response =
            serde_json::from_str(&content).map_err(|source| BackendError::ParseFixture {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(response))
    }

    /// Creates a backend that reports itself unreachable.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Creates a connected backend whose every execution fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            connected: true,
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns how many queries have been executed.
    pub fn executions(&self) -> usize {
        self.executions.get()
    }

    /// Returns the most recently executed query.
    pub fn last_query(&self) -> Option<ResolvedQuery> {
        self.last_query.borrow().clone()
    }
}

impl SearchBackend for FixtureBackend {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn execute(&self, query: &ResolvedQuery) -> Result<ResultSet, BackendError> {
        self.executions.set(self.executions.get() + 1);
        *self.last_query.borrow_mut() = Some(query.clone());
        match &self.failure {
            Some(message) => Err(BackendError::Execution(message.clone())),
            None => Ok(self.response.clone()),
        }
    }
}
