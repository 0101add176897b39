//! Default resolution.
//!
//! Turns a parsed `RawConfig` into an effective `Config`, filling every unset value with its
//! default.

use crate::{
    Config, ContentType, PageConfig, SchemaConfig, SearchSettings,
    parse::{RawConfig, RawPageConfig, RawSchemaConfig, RawSearchSettings},
};

/// Resolves a raw configuration into an effective `Config`.
///
/// The returned config has no `source`; callers that loaded it from disk set that.
pub fn resolve_config(raw: &RawConfig) -> Config {
    let mut search = SearchSettings::default();
    if let Some(ref raw_search) = raw.search {
        apply_raw_search(&mut search, raw_search);
    }

    let mut page = PageConfig::default();
    if let Some(ref raw_page) = raw.page {
        apply_raw_page(&mut page, raw_page);
    }

    let schema = raw
        .schema
        .as_ref()
        .map(resolve_schema)
        .unwrap_or_default();

    Config {
        search,
        page,
        schema,
        source: None,
    }
}

/// Applies raw search settings to result, overwriting any present values.
fn apply_raw_search(result: &mut SearchSettings, raw: &RawSearchSettings) {
    if let Some(ref v) = raw.filter_param {
        result.filter_param = v.clone();
    }
    if let Some(ref v) = raw.default_type {
        result.default_type = v.clone();
    }
    if let Some(ref v) = raw.facets {
        result.facets = v.clone();
    }
}

/// Applies raw page settings to result, overwriting any present values.
fn apply_raw_page(result: &mut PageConfig, raw: &RawPageConfig) {
    if let Some(ref v) = raw.title {
        result.title = v.clone();
    }
    if let Some(ref v) = raw.link {
        result.link = v.clone();
    }
    if let Some(ref v) = raw.query_type {
        result.query_type = v.clone();
    }
    if raw.sort_by.is_some() {
        result.sort_by = raw.sort_by.clone();
    }
    if raw.sort_dir.is_some() {
        result.sort_dir = raw.sort_dir.clone();
    }
    if let Some(v) = raw.results_per_page {
        result.results_per_page = v;
    }
    if let Some(v) = raw.min_facet_count {
        result.min_facet_count = v;
    }
    if let Some(ref v) = raw.types {
        result.types = v.clone();
    }
    if let Some(ref v) = raw.search_trees {
        result.search_trees = v.clone();
    }
    if let Some(ref v) = raw.search_on_fields {
        result.search_on_fields = v.clone();
    }
    if let Some(ref v) = raw.facet_fields {
        result.facet_fields = v.clone();
    }
    if let Some(ref v) = raw.custom_facet_fields {
        result.custom_facet_fields = v.clone();
    }
    if let Some(ref v) = raw.boost_fields {
        result.boost_fields = v.clone();
    }
    if let Some(ref v) = raw.boost_match_fields {
        result.boost_match_fields = v.clone();
    }
    if let Some(ref v) = raw.filter_fields {
        result.filter_fields = v.clone();
    }
    if let Some(ref v) = raw.facet_mapping {
        result.facet_mapping = v.clone();
    }
    if let Some(ref v) = raw.query_facets {
        result.query_facets = v.clone();
    }
}

/// Resolves the schema section.
fn resolve_schema(raw: &RawSchemaConfig) -> SchemaConfig {
    let types = raw
        .types
        .iter()
        .flatten()
        .map(|(name, ty)| {
            (
                name.clone(),
                ContentType {
                    parent: ty.parent.clone(),
                    fields: ty.fields.clone().unwrap_or_default(),
                },
            )
        })
        .collect();

    SchemaConfig {
        types,
        field_types: raw.field_types.clone().unwrap_or_default(),
        suffixes: raw.suffixes.clone().unwrap_or_default(),
    }
}
