//! Field name resolution against the index schema.
//!
//! Pages refer to fields by their logical names (`Title`, `LastEdited`). The index stores them
//! under type-suffixed names (`Title_ms`, `LastEdited_dt`). [`SchemaSource`] is the
//! introspection seam onto whatever knows the index layout; [`SchemaResolver`] layers the page
//! policies on top of it: meta-fields, geo-point exclusion and raw-name fallback.

use std::collections::{BTreeMap, BTreeSet};

use sift_config::{ContentType, SchemaConfig};

/// Relevance score pseudo-field.
pub const RELEVANCE_FIELD: &str = "score";

/// Field type every geo-point field type derives from.
pub const GEO_POINT_TYPE: &str = "SolrGeoPoint";

/// Fields every record carries regardless of its declared fields.
const IMPLICIT_FIELDS: &[(&str, &str)] = &[
    ("ID", "Int"),
    ("Created", "SS_Datetime"),
    ("LastEdited", "SS_Datetime"),
];

/// Fields always offered for sorting, with their labels.
const META_FIELDS: &[(&str, &str)] = &[
    ("LastEdited", "LastEdited"),
    ("Created", "Created"),
    ("ID", "ID"),
    (RELEVANCE_FIELD, "Score"),
];

/// Default index suffix per field type.
const DEFAULT_SUFFIXES: &[(&str, &str)] = &[
    ("Varchar", "_ms"),
    ("Enum", "_ms"),
    ("Text", "_t"),
    ("HTMLText", "_t"),
    ("HTMLVarchar", "_t"),
    ("Int", "_i"),
    ("Float", "_f"),
    ("Double", "_f"),
    ("Decimal", "_f"),
    ("Currency", "_f"),
    ("Boolean", "_b"),
    ("Date", "_dt"),
    ("Datetime", "_dt"),
    ("SS_Datetime", "_dt"),
    (GEO_POINT_TYPE, "_p"),
];

/// Suffixes that cannot be sorted on, mapped to their sortable variant.
const SORT_SUFFIXES: &[(&str, &str)] = &[("_t", "_s"), ("_ms", "_s")];

/// Depth limit for parent chains, guarding against cycles in hand-written schemas.
const MAX_LINEAGE_DEPTH: usize = 32;

/// Introspection API of the search index schema.
pub trait SchemaSource {
    /// Returns every indexed field of `types` (including inherited ones) with its field type.
    fn all_searchable_fields(&self, types: &[String]) -> BTreeMap<String, String>;

    /// Returns the declared fields of one content type, including inherited ones.
    fn declared_fields(&self, content_type: &str) -> BTreeMap<String, String>;

    /// Maps a logical field to its indexed name, or `None` if no type in `types` has it.
    fn resolve_field_name(&self, name: &str, types: &[String]) -> Option<String>;

    /// Maps a logical field to the indexed name used for sorting.
    ///
    /// Unknown names are returned unchanged.
    fn resolve_sort_field_name(&self, name: &str, types: &[String]) -> String;

    /// Returns true if `field_type` is a geo-point type or derives from one.
    fn is_geo_type(&self, field_type: &str) -> bool;
}

/// Strips type arguments: `Varchar(255)` becomes `Varchar`.
pub fn base_type(field_type: &str) -> &str {
    field_type
        .split_once('(')
        .map_or(field_type, |(base, _)| base)
        .trim()
}

/// A [`SchemaSource`] described up front in configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    /// Content types keyed by name.
    types: BTreeMap<String, ContentType>,
    /// Field type inheritance: child type to parent type.
    field_type_parents: BTreeMap<String, String>,
    /// Index suffix per field type.
    suffixes: BTreeMap<String, String>,
}

impl StaticSchema {
    /// Builds a schema from the `[schema]` configuration section.
    pub fn from_config(config: &SchemaConfig) -> Self {
        let mut suffixes: BTreeMap<String, String> = DEFAULT_SUFFIXES
            .iter()
            .map(|(ty, suffix)| ((*ty).to_string(), (*suffix).to_string()))
            .collect();
        suffixes.extend(config.suffixes.clone());

        Self {
            types: config.types.clone(),
            field_type_parents: config.field_types.clone(),
            suffixes,
        }
    }

    /// Returns `content_type` followed by its ancestors, stopping at unknown types.
    fn lineage<'a>(&'a self, content_type: &'a str) -> Vec<&'a str> {
        let mut chain = Vec::new();
        let mut current = Some(content_type);
        while let Some(name) = current {
            let Some(ty) = self.types.get(name) else {
                break;
            };
            if chain.contains(&name) || chain.len() >= MAX_LINEAGE_DEPTH {
                break;
            }
            chain.push(name);
            current = ty.parent.as_deref();
        }
        chain
    }

    /// Returns the field type of `name` on the first type in `types` that has it.
    fn field_type(&self, name: &str, types: &[String]) -> Option<String> {
        types
            .iter()
            .find_map(|ty| self.declared_fields(ty).remove(name))
    }

    /// Returns the index suffix for a field type, following field type inheritance.
    fn suffix_for(&self, field_type: &str) -> Option<&str> {
        let mut current = base_type(field_type);
        for _ in 0..MAX_LINEAGE_DEPTH {
            if let Some(suffix) = self.suffixes.get(current) {
                return Some(suffix);
            }
            current = self.field_type_parents.get(current)?;
        }
        None
    }
}

impl SchemaSource for StaticSchema {
    fn all_searchable_fields(&self, types: &[String]) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        for ty in types {
            for (name, field_type) in self.declared_fields(ty) {
                fields.entry(name).or_insert(field_type);
            }
        }
        fields
    }

    fn declared_fields(&self, content_type: &str) -> BTreeMap<String, String> {
        let lineage = self.lineage(content_type);
        if lineage.is_empty() {
            return BTreeMap::new();
        }

        let mut fields: BTreeMap<String, String> = IMPLICIT_FIELDS
            .iter()
            .map(|(name, ty)| ((*name).to_string(), (*ty).to_string()))
            .collect();
        // Ancestors first so subtypes override inherited declarations.
        for name in lineage.iter().rev() {
            if let Some(ty) = self.types.get(*name) {
                fields.extend(ty.fields.clone());
            }
        }
        fields
    }

    fn resolve_field_name(&self, name: &str, types: &[String]) -> Option<String> {
        let field_type = self.field_type(name, types)?;
        let suffix = self.suffix_for(&field_type)?;
        Some(format!("{name}{suffix}"))
    }

    fn resolve_sort_field_name(&self, name: &str, types: &[String]) -> String {
        let Some(resolved) = self.resolve_field_name(name, types) else {
            return name.to_string();
        };
        for (unsortable, sortable) in SORT_SUFFIXES {
            if let Some(stem) = resolved.strip_suffix(unsortable) {
                return format!("{stem}{sortable}");
            }
        }
        resolved
    }

    fn is_geo_type(&self, field_type: &str) -> bool {
        let mut current = base_type(field_type);
        for _ in 0..MAX_LINEAGE_DEPTH {
            if current == GEO_POINT_TYPE {
                return true;
            }
            match self.field_type_parents.get(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}

/// Page-level field resolution policies over a [`SchemaSource`].
#[derive(Clone, Copy)]
pub struct SchemaResolver<'a> {
    /// The schema being consulted.
    source: &'a dyn SchemaSource,
}

impl<'a> SchemaResolver<'a> {
    /// Creates a resolver over `source`.
    pub fn new(source: &'a dyn SchemaSource) -> Self {
        Self { source }
    }

    /// Returns the indexed name of `logical_name`, or `None` when no candidate type has it.
    pub fn resolve_field_name(&self, logical_name: &str, types: &[String]) -> Option<String> {
        self.source.resolve_field_name(logical_name, types)
    }

    /// Returns the indexed name of `logical_name`, falling back to the logical name itself.
    pub fn resolve_or_raw(&self, logical_name: &str, types: &[String]) -> String {
        self.resolve_field_name(logical_name, types)
            .unwrap_or_else(|| logical_name.to_string())
    }

    /// Returns the indexed name to sort on.
    pub fn resolve_sort_field_name(&self, name: &str, types: &[String]) -> String {
        self.source.resolve_sort_field_name(name, types)
    }

    /// Returns the fields a page may sort on, keyed and ordered by name, valued by label.
    ///
    /// The result is the union of the indexed fields of `types` and the meta-fields
    /// `LastEdited`, `Created`, `ID` and `score`. With `exclude_geo`, fields whose type is a
    /// geo-point (or derives from one) are left out, since those cannot be sorted on.
    pub fn selectable_fields(&self, types: &[String], exclude_geo: bool) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<String, String> = self
            .source
            .all_searchable_fields(types)
            .into_keys()
            .map(|name| (name.clone(), name))
            .collect();
        for (name, label) in META_FIELDS {
            fields.insert((*name).to_string(), (*label).to_string());
        }

        if exclude_geo {
            let geo: BTreeSet<String> = types
                .iter()
                .flat_map(|ty| self.source.declared_fields(ty))
                .filter(|(_, field_type)| self.source.is_geo_type(field_type))
                .map(|(name, _)| name)
                .collect();
            fields.retain(|name, _| !geo.contains(name));
        }

        fields
    }
}
