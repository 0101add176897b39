//! Facet field selection and labelling.

use std::collections::{BTreeMap, BTreeSet};

use sift_config::{PageConfig, SearchSettings};

use crate::{params::RequestParameters, schema::SchemaResolver};

/// Which facet fields a page requests and how they are labelled.
#[derive(Clone, Copy)]
pub struct FacetCatalog<'a> {
    /// The page configuration.
    page: &'a PageConfig,
    /// Shared search settings.
    settings: &'a SearchSettings,
    /// Resolver for logical field names.
    resolver: SchemaResolver<'a>,
}

impl<'a> FacetCatalog<'a> {
    /// Creates a catalog for one page.
    pub fn new(
        page: &'a PageConfig,
        settings: &'a SearchSettings,
        resolver: SchemaResolver<'a>,
    ) -> Self {
        Self {
            page,
            settings,
            resolver,
        }
    }

    /// Returns the request key facet filters are namespaced under.
    pub fn filter_param(&self) -> &'a str {
        &self.settings.filter_param
    }

    /// Returns the page's configured types, or the default type when none are configured.
    pub fn searchable_types(&self) -> Vec<String> {
        if self.page.types.is_empty() {
            vec![self.settings.default_type.clone()]
        } else {
            self.page.types.clone()
        }
    }

    /// Returns the indexed facet fields to request, in order.
    ///
    /// Static facets come first and are used verbatim. Page facet fields and custom facet
    /// fields follow, resolved against the searchable types and passed through raw when
    /// resolution fails. Duplicates are kept.
    pub fn facet_fields(&self) -> Vec<String> {
        let types = self.searchable_types();
        let mut fields = self.settings.facets.clone();
        fields.extend(
            self.page
                .facet_fields
                .iter()
                .chain(&self.page.custom_facet_fields)
                .map(|name| self.resolver.resolve_or_raw(name, &types)),
        );
        fields
    }

    /// Returns the configured labels keyed by indexed field name.
    pub fn facet_field_mapping(&self) -> BTreeMap<String, String> {
        let types = self.searchable_types();
        self.page
            .facet_mapping
            .iter()
            .map(|(name, label)| (self.resolver.resolve_or_raw(name, &types), label.clone()))
            .collect()
    }

    /// Returns the label for an indexed facet field, or the field name itself.
    pub fn label_for(&self, indexed_field: &str) -> String {
        self.facet_field_mapping()
            .remove(indexed_field)
            .unwrap_or_else(|| indexed_field.to_string())
    }

    /// Returns query facet labels keyed by facet query.
    pub fn query_facet_labels(&self) -> &'a BTreeMap<String, String> {
        &self.page.query_facets
    }

    /// Returns the facet values selected in the request, per field.
    pub fn active_facets(&self, params: &RequestParameters) -> BTreeMap<String, BTreeSet<String>> {
        params.facet_selections(self.filter_param())
    }
}
