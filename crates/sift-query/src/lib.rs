//! Query construction and facet presentation for sift search pages.
//!
//! This crate sits between a search request and a full-text search backend. It:
//! - Parses request parameters ([`RequestParameters`])
//! - Maps logical field names to indexed ones ([`SchemaResolver`] over a [`SchemaSource`])
//! - Chooses facet fields and their labels ([`FacetCatalog`])
//! - Assembles and executes exactly one query per request ([`SearchRequestInterpreter`])
//! - Turns facet counts into linkable entries and removable crumbs ([`transform`])
//!
//! # Example
//!
//! ```
//! use sift_config::Config;
//! use sift_query::{FixtureBackend, RequestParameters, ResultSet, SearchPage, StaticSchema};
//!
//! let config = Config::default();
//! let schema = StaticSchema::from_config(&config.schema);
//! let backend = FixtureBackend::new(ResultSet::default());
//! let page = SearchPage::from_config(&config, &schema, &backend);
//!
//! let mut interpreter = page.interpreter(RequestParameters::parse("Search=shoes"));
//! let query = interpreter.build().unwrap();
//! assert_eq!(query.builder.base_query.as_deref(), Some("shoes"));
//! ```

#![warn(missing_docs)]

mod backend;
mod builder;
mod error;
mod facets;
mod interpreter;
mod page;
mod params;
mod schema;
pub mod transform;

pub use backend::{
    DEFAULT_QUERY_BUILDERS, FacetCounts, FacetResult, FacetTerm, FixtureBackend, Record,
    ResultSet, SearchBackend,
};
pub use builder::{
    FACET_LIMIT, FacetRequest, Filter, QueryBuilder, RETURN_FIELDS, ResolvedQuery, SortClause,
};
pub use error::BackendError;
pub use facets::FacetCatalog;
pub use interpreter::{
    CLASS_HIERARCHY_FIELD, PARENTS_HIERARCHY_FIELD, QueryHook, SearchRequestInterpreter,
};
pub use page::{SearchPage, SearchResults, UNMEASURED_ELAPSED};
pub use params::{RequestParameters, SortDirection, facet_key, parse_facet_key};
pub use schema::{
    GEO_POINT_TYPE, RELEVANCE_FIELD, SchemaResolver, SchemaSource, StaticSchema, base_type,
};
pub use transform::{FacetCrumb, FacetEntry, LinkContext, PresentationFacet};
