//! Configuration validation.
//!
//! Validates a loaded configuration and reports warnings for settings that will be ignored
//! or silently replaced by a default at query time.

use std::fmt;

use crate::Config;

/// Sort direction tokens understood by the page.
const SORT_DIRECTIONS: &[&str] = &["Ascending", "Descending"];

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// A page type is not described by the schema.
    UnknownType {
        /// Name of the type.
        name: String,
    },
    /// A content type names a parent that is not defined.
    UndefinedParentType {
        /// Name of the content type.
        name: String,
        /// The missing parent.
        parent: String,
    },
    /// A boost weight is zero or negative and will be ignored.
    NonPositiveBoost {
        /// Field the weight belongs to.
        field: String,
        /// The configured weight.
        weight: f64,
    },
    /// The sort direction is not recognised; descending order is used.
    InvalidSortDirection {
        /// The configured value.
        value: String,
    },
    /// Results per page is zero; the default is used.
    ZeroResultsPerPage,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType { name } => {
                write!(f, "page type '{name}' is not defined in the schema")
            }
            Self::UndefinedParentType { name, parent } => {
                write!(f, "type '{name}' has undefined parent type '{parent}'")
            }
            Self::NonPositiveBoost { field, weight } => {
                write!(f, "boost for field '{field}' is {weight} and will be ignored")
            }
            Self::InvalidSortDirection { value } => {
                write!(
                    f,
                    "sort direction '{value}' is not Ascending or Descending; using Descending"
                )
            }
            Self::ZeroResultsPerPage => {
                write!(f, "results_per_page is 0; using the default")
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    let page = &config.page;
    let schema = &config.schema;

    // Without a schema every name is used verbatim, so there is nothing to check types against.
    if !schema.types.is_empty() {
        for name in &page.types {
            if !schema.types.contains_key(name) {
                warnings.push(ConfigWarning::UnknownType { name: name.clone() });
            }
        }
    }

    for (name, ty) in &schema.types {
        if let Some(parent) = &ty.parent
            && !schema.types.contains_key(parent)
        {
            warnings.push(ConfigWarning::UndefinedParentType {
                name: name.clone(),
                parent: parent.clone(),
            });
        }
    }

    for (field, weight) in &page.boost_fields {
        if *weight <= 0.0 {
            warnings.push(ConfigWarning::NonPositiveBoost {
                field: field.clone(),
                weight: *weight,
            });
        }
    }

    if let Some(dir) = &page.sort_dir
        && !SORT_DIRECTIONS.contains(&dir.as_str())
    {
        warnings.push(ConfigWarning::InvalidSortDirection { value: dir.clone() });
    }

    if page.results_per_page == 0 {
        warnings.push(ConfigWarning::ZeroResultsPerPage);
    }

    warnings
}
