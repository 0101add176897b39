//! The backend query being assembled for one request.
//!
//! [`QueryBuilder`] accumulates the pieces of a query (term, filters, sort, field
//! restrictions and boosts) in the order the interpreter adds them. [`ResolvedQuery`] is the
//! finished article: the builder plus facet parameters and pagination, ready to hand to a
//! [`SearchBackend`](crate::SearchBackend).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::params::SortDirection;

/// Maximum number of terms the backend reports per facet field.
pub const FACET_LIMIT: usize = 10;

/// Stored fields requested alongside every result, plus the relevance score.
pub const RETURN_FIELDS: &str = "*,score";

/// Query type that needs no explicit parser selection.
pub const DEFAULT_QUERY_TYPE: &str = "default";

/// Separator joining alternatives within a single filter.
pub const OR_SEPARATOR: &str = " OR ";

/// A hard restriction on which records match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    /// Indexed field name.
    pub field: String,
    /// Value, possibly several alternatives joined with ` OR `.
    pub value: String,
}

impl Filter {
    /// Renders the filter in backend query syntax.
    ///
    /// Alternatives containing whitespace are phrase-quoted so that a multi-word value stays
    /// one term. Values that are already quoted and range expressions pass through.
    pub fn to_query(&self) -> String {
        if self.value.contains(OR_SEPARATOR) {
            let alternatives: Vec<String> = self
                .value
                .split(OR_SEPARATOR)
                .map(quote_term)
                .collect();
            format!("{}:({})", self.field, alternatives.join(OR_SEPARATOR))
        } else {
            format!("{}:{}", self.field, quote_term(&self.value))
        }
    }
}

/// Phrase-quotes a single filter value when it contains whitespace.
fn quote_term(value: &str) -> String {
    let is_wrapped = |open: char, close: &[char]| {
        value.len() >= 2 && value.starts_with(open) && value.ends_with(close)
    };
    if !value.contains(char::is_whitespace)
        || is_wrapped('"', &['"'])
        || is_wrapped('[', &[']', '}'])
        || is_wrapped('{', &[']', '}'])
    {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Result ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortClause {
    /// Indexed field, or `score` for relevance.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

/// Accumulates the parts of a backend query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryBuilder {
    /// Query parser the backend should use.
    pub query_type: String,
    /// Free-text term, if any.
    pub base_query: Option<String>,
    /// Filters in the order they were added. Each is AND-combined with the others.
    pub filters: Vec<Filter>,
    /// Result ordering.
    pub sort: Option<SortClause>,
    /// Fields the free-text term is matched against.
    pub query_fields: Vec<String>,
    /// Field weights for relevance scoring.
    pub boosts: BTreeMap<String, f64>,
    /// Field values that raise the score of matching records.
    pub boost_field_values: BTreeMap<String, String>,
}

impl QueryBuilder {
    /// Creates an empty builder for the given query parser.
    pub fn new(query_type: impl Into<String>) -> Self {
        Self {
            query_type: query_type.into(),
            base_query: None,
            filters: Vec::new(),
            sort: None,
            query_fields: Vec::new(),
            boosts: BTreeMap::new(),
            boost_field_values: BTreeMap::new(),
        }
    }

    /// Sets the free-text term.
    pub fn base_query(&mut self, term: impl Into<String>) -> &mut Self {
        self.base_query = Some(term.into());
        self
    }

    /// Appends a filter.
    pub fn add_filter(&mut self, field: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the result ordering, replacing any previous one.
    pub fn sort_by(&mut self, field: impl Into<String>, direction: SortDirection) -> &mut Self {
        self.sort = Some(SortClause {
            field: field.into(),
            direction,
        });
        self
    }

    /// Restricts free-text matching to `fields`.
    pub fn query_fields(&mut self, fields: Vec<String>) -> &mut Self {
        self.query_fields = fields;
        self
    }

    /// Adds field weights.
    pub fn boost(&mut self, boosts: BTreeMap<String, f64>) -> &mut Self {
        self.boosts.extend(boosts);
        self
    }

    /// Adds value-level boosts.
    pub fn boost_field_values(&mut self, values: BTreeMap<String, String>) -> &mut Self {
        self.boost_field_values.extend(values);
        self
    }

    /// Returns the filters on `field`.
    pub fn filters_on<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Filter> + 'a {
        self.filters.iter().filter(move |f| f.field == field)
    }
}

/// Facet counting parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetRequest {
    /// Whether faceting is switched on.
    pub enabled: bool,
    /// Indexed fields to count.
    pub fields: Vec<String>,
    /// Maximum terms per field.
    pub limit: usize,
    /// Minimum count for a term to be reported.
    pub min_count: usize,
    /// Query facets, each counted as its own bucket.
    pub queries: Vec<String>,
    /// Fields returned with each record.
    pub return_fields: String,
}

impl FacetRequest {
    /// Creates an enabled facet request over `fields`.
    pub fn new(fields: Vec<String>, min_count: usize) -> Self {
        Self {
            enabled: true,
            fields,
            limit: FACET_LIMIT,
            min_count,
            queries: Vec::new(),
            return_fields: RETURN_FIELDS.to_string(),
        }
    }
}

/// A fully assembled query plus pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedQuery {
    /// The populated builder.
    pub builder: QueryBuilder,
    /// Facet parameters.
    pub facets: FacetRequest,
    /// Index of the first result.
    pub offset: usize,
    /// Maximum number of results.
    pub limit: usize,
}

impl ResolvedQuery {
    /// Renders the query as Solr request parameters.
    ///
    /// An absent or empty term becomes the match-all query `*:*`. Repeated keys (`fq`,
    /// `facet.field`, `facet.query`, `bq`) appear once per value.
    pub fn to_solr_params(&self) -> Vec<(String, String)> {
        let builder = &self.builder;
        let mut params: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        let term = builder
            .base_query
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("*:*");
        push("q", term.to_string());

        if builder.query_type != DEFAULT_QUERY_TYPE {
            push("defType", builder.query_type.clone());
        }

        for filter in &builder.filters {
            push("fq", filter.to_query());
        }

        if let Some(sort) = &builder.sort {
            push(
                "sort",
                format!("{} {}", sort.field, sort.direction.backend_token()),
            );
        }

        let mut qf: Vec<String> = builder
            .query_fields
            .iter()
            .map(|field| match builder.boosts.get(field) {
                Some(weight) => format!("{field}^{weight}"),
                None => field.clone(),
            })
            .collect();
        qf.extend(
            builder
                .boosts
                .iter()
                .filter(|(field, _)| !builder.query_fields.contains(field))
                .map(|(field, weight)| format!("{field}^{weight}")),
        );
        if !qf.is_empty() {
            push("qf", qf.join(" "));
        }

        for (field, value) in &builder.boost_field_values {
            push("bq", format!("{field}:{value}"));
        }

        push("start", self.offset.to_string());
        push("rows", self.limit.to_string());

        let facets = &self.facets;
        if facets.enabled {
            push("facet", "true".to_string());
            for field in &facets.fields {
                push("facet.field", field.clone());
            }
            push("facet.limit", facets.limit.to_string());
            push("facet.mincount", facets.min_count.to_string());
            for query in &facets.queries {
                push("facet.query", query.clone());
            }
        }
        push("fl", facets.return_fields.clone());

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn resolved(builder: QueryBuilder) -> ResolvedQuery {
        ResolvedQuery {
            builder,
            facets: FacetRequest::new(vec!["Category_ms".into()], 1),
            offset: 0,
            limit: 10,
        }
    }

    #[test]
    fn filters_render_or_groups_in_parentheses() {
        let single = Filter {
            field: "Category_ms".into(),
            value: "Footwear".into(),
        };
        let group = Filter {
            field: "ClassNameHierarchy_ms".into(),
            value: "ArticlePage OR NewsPage".into(),
        };
        assert_eq!(single.to_query(), "Category_ms:Footwear");
        assert_eq!(
            group.to_query(),
            "ClassNameHierarchy_ms:(ArticlePage OR NewsPage)"
        );
    }

    #[test]
    fn multi_word_filter_values_are_phrase_quoted() {
        let spaced = Filter {
            field: "Category_ms".into(),
            value: "Running Shoes".into(),
        };
        let group = Filter {
            field: "Category_ms".into(),
            value: "Running Shoes OR Hats".into(),
        };
        let embedded = Filter {
            field: "Title_s".into(),
            value: r#"The "Best" Boots"#.into(),
        };
        assert_eq!(spaced.to_query(), r#"Category_ms:"Running Shoes""#);
        assert_eq!(group.to_query(), r#"Category_ms:("Running Shoes" OR Hats)"#);
        assert_eq!(embedded.to_query(), r#"Title_s:"The \"Best\" Boots""#);
    }

    #[test]
    fn quoted_and_range_filter_values_pass_through() {
        let quoted = Filter {
            field: "Category_ms".into(),
            value: r#""Running Shoes""#.into(),
        };
        let range = Filter {
            field: "LastEdited_dt".into(),
            value: "[NOW-7DAY TO NOW]".into(),
        };
        assert_eq!(quoted.to_query(), r#"Category_ms:"Running Shoes""#);
        assert_eq!(range.to_query(), "LastEdited_dt:[NOW-7DAY TO NOW]");
    }

    #[test]
    fn spaced_facet_selection_renders_as_one_filter_term() {
        let mut builder = QueryBuilder::new("default");
        builder.add_filter("Category_ms", "Running Shoes");
        let params = resolved(builder).to_solr_params();
        assert_eq!(values(&params, "fq"), vec![r#"Category_ms:"Running Shoes""#]);
    }

    #[test]
    fn builder_methods_chain() {
        let mut builder = QueryBuilder::new("default");
        builder
            .base_query("shoes")
            .add_filter("A", "1")
            .add_filter("B", "2")
            .sort_by("Title_s", SortDirection::Ascending)
            .sort_by("score", SortDirection::Descending);

        assert_eq!(builder.base_query.as_deref(), Some("shoes"));
        assert_eq!(builder.filters.len(), 2);
        assert_eq!(builder.filters_on("B").count(), 1);
        assert_eq!(
            builder.sort,
            Some(SortClause {
                field: "score".into(),
                direction: SortDirection::Descending
            })
        );
    }

    #[test]
    fn empty_term_matches_everything() {
        let params = resolved(QueryBuilder::new("default")).to_solr_params();
        assert_eq!(values(&params, "q"), vec!["*:*"]);
        assert!(values(&params, "defType").is_empty());
        assert_eq!(values(&params, "fl"), vec!["*,score"]);
        assert_eq!(values(&params, "facet"), vec!["true"]);
        assert_eq!(values(&params, "facet.limit"), vec!["10"]);
        assert_eq!(values(&params, "facet.mincount"), vec!["1"]);
    }

    #[test]
    fn renders_all_query_parts() {
        let mut builder = QueryBuilder::new("dismax");
        builder
            .base_query("shoes")
            .add_filter("Category_ms", "Footwear")
            .add_filter("ClassNameHierarchy_ms", "ArticlePage")
            .sort_by("LastEdited_dt", SortDirection::Ascending)
            .query_fields(vec!["Title_ms".into(), "Content_t".into()])
            .boost([("Title_ms".to_string(), 2.0), ("Summary_t".to_string(), 1.5)].into())
            .boost_field_values([("Featured_b".to_string(), "true".to_string())].into());
        let mut query = resolved(builder);
        query.offset = 20;
        query.facets.queries = vec!["Price_f:[0 TO 10]".into()];

        let params = query.to_solr_params();
        assert_eq!(values(&params, "q"), vec!["shoes"]);
        assert_eq!(values(&params, "defType"), vec!["dismax"]);
        assert_eq!(
            values(&params, "fq"),
            vec!["Category_ms:Footwear", "ClassNameHierarchy_ms:ArticlePage"]
        );
        assert_eq!(values(&params, "sort"), vec!["LastEdited_dt asc"]);
        assert_eq!(
            values(&params, "qf"),
            vec!["Title_ms^2 Content_t Summary_t^1.5"]
        );
        assert_eq!(values(&params, "bq"), vec!["Featured_b:true"]);
        assert_eq!(values(&params, "start"), vec!["20"]);
        assert_eq!(values(&params, "rows"), vec!["10"]);
        assert_eq!(values(&params, "facet.field"), vec!["Category_ms"]);
        assert_eq!(values(&params, "facet.query"), vec!["Price_f:[0 TO 10]"]);
    }

    #[test]
    fn serializes_to_json() {
        let mut builder = QueryBuilder::new("default");
        builder.sort_by("score", SortDirection::Descending);
        let json = serde_json::to_value(resolved(builder)).unwrap();
        assert_eq!(json["builder"]["sort"]["direction"], "desc");
        assert_eq!(json["facets"]["limit"], 10);
    }
}
