//! Configuration file parsing.
//!
//! Parses a `.sift.toml` file into an intermediate `RawConfig` structure that preserves
//! the optional nature of all fields before defaults are applied.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};
#[cfg(test)]
use toml::de::Error as TomlError;

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional; missing values are filled in by [`crate::resolve_config`].
/// This mirrors the TOML schema exactly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// Shared search settings section.
    pub search: Option<RawSearchSettings>,
    /// Page settings section.
    pub page: Option<RawPageConfig>,
    /// Index schema section.
    pub schema: Option<RawSchemaConfig>,
}

/// Raw shared search settings.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSearchSettings {
    /// Request parameter under which facet filters are namespaced.
    pub filter_param: Option<String>,
    /// Content type assumed when sorting without a type in scope.
    pub default_type: Option<String>,
    /// Static facet fields. Accepts a single string or an array.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub facets: Option<Vec<String>>,
}

/// Raw page settings.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPageConfig {
    /// Page title.
    pub title: Option<String>,
    /// Page URL.
    pub link: Option<String>,
    /// Query parser identifier.
    pub query_type: Option<String>,
    /// Default sort field.
    pub sort_by: Option<String>,
    /// Default sort direction.
    pub sort_dir: Option<String>,
    /// Results per page.
    pub results_per_page: Option<usize>,
    /// Minimum facet count.
    pub min_facet_count: Option<usize>,
    /// Searchable content types. Accepts a single string or an array.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub types: Option<Vec<String>>,
    /// Root node identifiers to scope the search under.
    pub search_trees: Option<Vec<u64>>,
    /// Fields the free-text query runs against.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub search_on_fields: Option<Vec<String>>,
    /// Facet fields.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub facet_fields: Option<Vec<String>>,
    /// Custom facet fields.
    #[serde_as(as = "Option<OneOrMany<_>>")]
    pub custom_facet_fields: Option<Vec<String>>,
    /// Field boost weights.
    pub boost_fields: Option<BTreeMap<String, f64>>,
    /// Field value boosts.
    pub boost_match_fields: Option<BTreeMap<String, String>>,
    /// Fixed filters.
    pub filter_fields: Option<BTreeMap<String, String>>,
    /// Facet labels keyed by logical field name.
    pub facet_mapping: Option<BTreeMap<String, String>>,
    /// Query facets keyed by facet query.
    pub query_facets: Option<BTreeMap<String, String>>,
}

/// Raw index schema description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSchemaConfig {
    /// Content type definitions: name -> type.
    pub types: Option<BTreeMap<String, RawContentType>>,
    /// Field type inheritance: child -> parent.
    pub field_types: Option<BTreeMap<String, String>>,
    /// Index suffix overrides: field type -> suffix.
    pub suffixes: Option<BTreeMap<String, String>>,
}

/// Raw content type definition from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawContentType {
    /// Parent content type.
    pub parent: Option<String>,
    /// Declared fields: name -> field type.
    pub fields: Option<BTreeMap<String, String>>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a TOML string without path context.
///
/// Useful for validating template content (tests only).
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}
