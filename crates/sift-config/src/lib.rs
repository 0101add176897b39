//! Configuration system for sift.
//!
//! sift reads a TOML file named `.sift.toml`. The file describes one search page (which content
//! types it searches, how fields are boosted, sorted, filtered and faceted) together with a
//! description of the index schema used to map logical field names to indexed ones. The nearest
//! `.sift.toml` found by walking up from the current working directory is used.

#![warn(missing_docs)]

mod discovery;
mod error;
mod parse;
mod resolve;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub use discovery::{CONFIG_FILENAME, discover_config_file};
pub use error::ConfigError;
pub use parse::{
    RawConfig, RawPageConfig, RawSchemaConfig, RawSearchSettings, parse_config_file,
    parse_config_str,
};
pub use resolve::resolve_config;
use serde::{Deserialize, Serialize};
pub use templates::page_template;
pub use validate::ConfigWarning;
use validate::validate_config;

/// Default number of results shown per page when the page does not set one.
pub const DEFAULT_RESULTS_PER_PAGE: usize = 10;

/// Default minimum count a facet term needs before the backend reports it.
pub const DEFAULT_MIN_FACET_COUNT: usize = 1;

/// Top-level configuration for sift.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Settings shared by every search page.
    pub search: SearchSettings,
    /// The search page being served.
    pub page: PageConfig,
    /// Description of the indexed content types.
    pub schema: SchemaConfig,
    /// Path of the file this configuration was loaded from, if any.
    pub source: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from the nearest `.sift.toml` at or above `cwd`.
    ///
    /// Returns `Ok(Config::default())` if no configuration file is found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        match discover_config_file(cwd) {
            Some(path) => Self::load_file(&path),
            None => {
                tracing::debug!(cwd = %cwd.display(), "no configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Loads configuration from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = parse_config_file(path)?;
        let mut config = resolve_config(&raw);
        config.source = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Validates the configuration and returns any warnings.
    ///
    /// This checks for:
    /// - Page types that the schema does not describe
    /// - Content types whose parent type is undefined
    /// - Boost weights that will be ignored because they are not positive
    /// - Sort directions other than `Ascending` or `Descending`
    /// - A results-per-page of zero
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective page and search settings to TOML format.
    ///
    /// The schema is omitted; it describes the index rather than the page.
    pub fn settings_to_toml(&self) -> String {
        let serializable = SerializableSettings {
            search: self.search.clone(),
            page: self.page.clone(),
        };
        toml::to_string_pretty(&serializable).expect("settings serialization should not fail")
    }
}

/// Settings that apply to every search page.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Request parameter under which facet filters are namespaced.
    pub filter_param: String,
    /// Content type assumed when a sort is requested but no type is in scope.
    pub default_type: String,
    /// Indexed facet fields always requested, used verbatim.
    pub facets: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            filter_param: String::from("filter"),
            default_type: String::from("Page"),
            facets: Vec::new(),
        }
    }
}

/// Per-page search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PageConfig {
    /// Page title shown above the results.
    pub title: String,
    /// URL of the page; results live under `{link}results`.
    pub link: String,
    /// Query parser the backend should use.
    pub query_type: String,
    /// Default sort field when the request does not set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// Default sort direction (`Ascending` or `Descending`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_dir: Option<String>,
    /// Number of results per page. Zero means the default.
    pub results_per_page: usize,
    /// Minimum count for facet terms. Zero means the default.
    pub min_facet_count: usize,
    /// Content types this page searches. Empty means all.
    pub types: Vec<String>,
    /// Root node identifiers the search is scoped under.
    pub search_trees: Vec<u64>,
    /// Logical fields the free-text query runs against.
    pub search_on_fields: Vec<String>,
    /// Logical fields requested as facets.
    pub facet_fields: Vec<String>,
    /// Additional logical facet fields chosen by the page author.
    pub custom_facet_fields: Vec<String>,
    /// Field weights for relevance scoring.
    pub boost_fields: BTreeMap<String, f64>,
    /// Field values that boost matching records.
    pub boost_match_fields: BTreeMap<String, String>,
    /// Filters always applied, used verbatim.
    pub filter_fields: BTreeMap<String, String>,
    /// Human readable labels for facet fields, keyed by logical name.
    pub facet_mapping: BTreeMap<String, String>,
    /// Query facets: facet query to human readable label.
    pub query_facets: BTreeMap<String, String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: String::from("Search"),
            link: String::from("/search/"),
            query_type: String::from("default"),
            sort_by: None,
            sort_dir: None,
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            min_facet_count: DEFAULT_MIN_FACET_COUNT,
            types: Vec::new(),
            search_trees: Vec::new(),
            search_on_fields: Vec::new(),
            facet_fields: Vec::new(),
            custom_facet_fields: Vec::new(),
            boost_fields: BTreeMap::new(),
            boost_match_fields: BTreeMap::new(),
            filter_fields: BTreeMap::new(),
            facet_mapping: BTreeMap::new(),
            query_facets: BTreeMap::new(),
        }
    }
}

impl PageConfig {
    /// Returns the URL search results are served from.
    pub fn results_link(&self) -> String {
        format!("{}/results", self.link.trim_end_matches('/'))
    }

    /// Returns the results-per-page setting, substituting the default for zero.
    pub fn effective_results_per_page(&self) -> usize {
        if self.results_per_page == 0 {
            DEFAULT_RESULTS_PER_PAGE
        } else {
            self.results_per_page
        }
    }

    /// Returns the minimum facet count, substituting the default for zero.
    pub fn effective_min_facet_count(&self) -> usize {
        if self.min_facet_count == 0 {
            DEFAULT_MIN_FACET_COUNT
        } else {
            self.min_facet_count
        }
    }
}

/// Description of the indexed content types.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Content types keyed by name.
    pub types: BTreeMap<String, ContentType>,
    /// Field type inheritance: field type name to its parent field type.
    pub field_types: BTreeMap<String, String>,
    /// Index suffix overrides keyed by field type name.
    pub suffixes: BTreeMap<String, String>,
}

/// A content type stored in the index.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentType {
    /// Parent content type, whose fields are inherited.
    pub parent: Option<String>,
    /// Declared fields: name to field type (for example `Varchar(255)`).
    pub fields: BTreeMap<String, String>,
}

/// Internal struct for TOML serialization of settings.
#[derive(Serialize)]
struct SerializableSettings {
    /// Shared search settings.
    search: SearchSettings,
    /// Page settings.
    page: PageConfig,
}
