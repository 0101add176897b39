//! Turns raw facet counts into linkable presentation data.
//!
//! Everything here is a pure function of its inputs: the counts returned by the backend, the
//! request's preserved query string and the label tables. Backend order is kept as is.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use url::form_urlencoded;

use crate::{
    backend::{FacetResult, FacetTerm},
    params::{RequestParameters, facet_key, parse_facet_key},
};

/// Where facet links point and what they carry over.
#[derive(Debug, Clone, Copy)]
pub struct LinkContext<'a> {
    /// URL of the results action.
    pub results_link: &'a str,
    /// The current request's query string, already encoded.
    pub query_string: &'a str,
    /// Request key facet filters are namespaced under.
    pub filter_param: &'a str,
}

impl LinkContext<'_> {
    /// Returns a link to the current search narrowed by `field = value`.
    pub fn add_filter_link(&self, field: &str, value: &str) -> String {
        let mut serializer = form_urlencoded::Serializer::new(self.query_string.to_string());
        serializer.append_pair(&facet_key(self.filter_param, field), value);
        with_query(self.results_link, &serializer.finish())
    }
}

/// One facet bucket ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetEntry {
    /// Indexed facet field.
    pub field: String,
    /// Display name: the query facet label when one exists, otherwise the term.
    pub name: String,
    /// Filter value selecting this bucket.
    pub query: String,
    /// Number of matching records.
    pub count: u64,
    /// Link adding this bucket as a filter.
    pub search_link: String,
    /// Link adding this bucket as a quoted, exact-phrase filter.
    pub quoted_search_link: String,
}

/// All buckets of one facet field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationFacet {
    /// Indexed facet field.
    pub field: String,
    /// Mapped label, or the field name.
    pub title: String,
    /// Buckets in backend order.
    pub items: Vec<FacetEntry>,
}

/// An active facet selection with a link that removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCrumb {
    /// Facet field the value is selected on.
    pub field: String,
    /// The selected value.
    pub name: String,
    /// The current search without this selection.
    pub remove_link: String,
}

/// Converts the buckets of one facet field into entries.
pub fn convert_facet_terms(
    terms: &[FacetTerm],
    field: &str,
    links: &LinkContext<'_>,
    query_labels: &BTreeMap<String, String>,
) -> Vec<FacetEntry> {
    terms
        .iter()
        .map(|term| {
            let query = term.query();
            let name = query_labels
                .get(&term.name)
                .cloned()
                .unwrap_or_else(|| term.name.clone());
            FacetEntry {
                field: field.to_string(),
                name,
                query: query.to_string(),
                count: term.count,
                search_link: links.add_filter_link(field, query),
                quoted_search_link: links.add_filter_link(field, &format!("\"{query}\"")),
            }
        })
        .collect()
}

/// Builds one presentation facet per counted field, or only for `requested` when given.
pub fn transform(
    facets: &FacetResult,
    requested: Option<&str>,
    links: &LinkContext<'_>,
    query_labels: &BTreeMap<String, String>,
    field_labels: &BTreeMap<String, String>,
) -> Vec<PresentationFacet> {
    facets
        .iter()
        .filter(|counts| requested.is_none_or(|r| r == counts.field))
        .map(|counts| PresentationFacet {
            field: counts.field.clone(),
            title: field_labels
                .get(&counts.field)
                .cloned()
                .unwrap_or_else(|| counts.field.clone()),
            items: convert_facet_terms(&counts.terms, &counts.field, links, query_labels),
        })
        .collect()
}

/// Flattens the entries of every facet field, or of `requested` only.
pub fn current_facets(
    facets: &FacetResult,
    requested: Option<&str>,
    links: &LinkContext<'_>,
    query_labels: &BTreeMap<String, String>,
) -> Vec<FacetEntry> {
    facets
        .iter()
        .filter(|counts| requested.is_none_or(|r| r == counts.field))
        .flat_map(|counts| convert_facet_terms(&counts.terms, &counts.field, links, query_labels))
        .collect()
}

/// Builds one crumb per active facet selection, in request order.
///
/// Each removal link is the current query string with every occurrence of that one selection
/// removed; other selections and parameters are kept.
pub fn facet_crumbs(
    params: &RequestParameters,
    filter_param: &str,
    results_link: &str,
) -> Vec<FacetCrumb> {
    let mut seen = BTreeSet::new();
    let mut crumbs = Vec::new();
    for (key, value) in params.pairs() {
        let Some(field) = parse_facet_key(key, filter_param) else {
            continue;
        };
        if !seen.insert((field, value.as_str())) {
            continue;
        }
        let remaining = params.query_string_without(|k, v| {
            v == value.as_str() && parse_facet_key(k, filter_param) == Some(field)
        });
        crumbs.push(FacetCrumb {
            field: field.to_string(),
            name: value.clone(),
            remove_link: with_query(results_link, &remaining),
        });
    }
    crumbs
}

/// Appends a query string to a link, leaving out the `?` when there is nothing to append.
fn with_query(link: &str, query: &str) -> String {
    if query.is_empty() {
        link.to_string()
    } else {
        format!("{link}?{query}")
    }
}
