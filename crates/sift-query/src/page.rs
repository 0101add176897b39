//! A search page: configuration, schema and backend bound together.

use std::collections::BTreeMap;

use serde::Serialize;
use sift_config::{Config, PageConfig, SearchSettings};

use crate::{
    backend::{Record, SearchBackend},
    facets::FacetCatalog,
    interpreter::SearchRequestInterpreter,
    params::RequestParameters,
    schema::{SchemaResolver, SchemaSource},
    transform::{FacetCrumb, PresentationFacet},
};

/// Label shown when the backend reports no timing.
pub const UNMEASURED_ELAPSED: &str = "< 0.001";

/// One configured search page.
#[derive(Clone, Copy)]
pub struct SearchPage<'a> {
    /// The page configuration.
    page: &'a PageConfig,
    /// Shared search settings.
    settings: &'a SearchSettings,
    /// The index schema.
    schema: &'a dyn SchemaSource,
    /// The backend queries go to.
    backend: &'a dyn SearchBackend,
}

impl<'a> SearchPage<'a> {
    /// Binds a page configuration to a schema and a backend.
    pub fn new(
        page: &'a PageConfig,
        settings: &'a SearchSettings,
        schema: &'a dyn SchemaSource,
        backend: &'a dyn SearchBackend,
    ) -> Self {
        Self {
            page,
            settings,
            schema,
            backend,
        }
    }

    /// Binds the page described by a loaded configuration.
    pub fn from_config(
        config: &'a Config,
        schema: &'a dyn SchemaSource,
        backend: &'a dyn SearchBackend,
    ) -> Self {
        Self::new(&config.page, &config.search, schema, backend)
    }

    /// Starts interpreting one request.
    pub fn interpreter(&self, params: RequestParameters) -> SearchRequestInterpreter<'a> {
        SearchRequestInterpreter::new(self.page, self.settings, self.schema, self.backend, params)
    }

    /// Returns the fields this page may sort on, keyed by name, valued by label.
    pub fn selectable_fields(&self, exclude_geo: bool) -> BTreeMap<String, String> {
        let resolver = SchemaResolver::new(self.schema);
        let types = FacetCatalog::new(self.page, self.settings, resolver).searchable_types();
        resolver.selectable_fields(&types, exclude_geo)
    }

    /// Returns the query parsers the backend offers.
    pub fn query_builders(&self) -> Vec<String> {
        self.backend.query_builders()
    }

    /// Runs the request and gathers everything a results view shows.
    pub fn results(&self, interpreter: &mut SearchRequestInterpreter<'_>) -> SearchResults {
        let facets = interpreter.all_facets();
        let crumbs = interpreter.facet_crumbs();
        let query = interpreter
            .params()
            .search_term()
            .unwrap_or_default()
            .to_string();

        let (records, total_results, time_taken) = match interpreter.results() {
            Some(results) => (
                results.records.clone(),
                Some(results.total_results),
                results.time_taken_secs(),
            ),
            None => (Vec::new(), None, None),
        };

        SearchResults {
            title: self.page.title.clone(),
            query,
            records,
            total_results,
            time_taken,
            facets,
            crumbs,
        }
    }
}

/// What a results view shows for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Page title.
    pub title: String,
    /// The free-text term, empty when none was given.
    pub query: String,
    /// Matching records on this page of results.
    pub records: Vec<Record>,
    /// Total matches, or `None` when no query ran.
    pub total_results: Option<u64>,
    /// Backend time in seconds, when reported.
    pub time_taken: Option<f64>,
    /// Facets with their entries.
    pub facets: Vec<PresentationFacet>,
    /// Active facet selections.
    pub crumbs: Vec<FacetCrumb>,
}

impl SearchResults {
    /// Returns the elapsed time for display.
    pub fn elapsed_label(&self) -> String {
        match self.time_taken {
            Some(secs) => secs.to_string(),
            None => UNMEASURED_ELAPSED.to_string(),
        }
    }
}
