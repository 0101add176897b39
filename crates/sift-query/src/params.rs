//! Request parameters for a search page.
//!
//! Parameters arrive as an HTTP query string and are untrusted: anything missing or malformed
//! falls back to the page defaults, nothing here is ever rejected. The decoded pairs are kept
//! in their original order so the current query string can be reproduced for facet links.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Free-text search term.
pub const SEARCH_PARAM: &str = "Search";
/// Sort field override.
pub const SORT_BY_PARAM: &str = "SortBy";
/// Sort direction override (`Ascending` or `Descending`).
pub const SORT_DIR_PARAM: &str = "SortDir";
/// Restricts the search to one of the page's types.
pub const SEARCH_TYPE_PARAM: &str = "SearchType";
/// Pagination offset.
pub const START_PARAM: &str = "start";
/// Pagination limit.
pub const LIMIT_PARAM: &str = "limit";

/// Sort order sent to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first.
    #[serde(rename = "asc")]
    Ascending,
    /// Largest first.
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Translates the user-facing token; anything but `Ascending` sorts descending.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("Ascending") => Self::Ascending,
            _ => Self::Descending,
        }
    }

    /// Returns the backend token for this direction.
    pub fn backend_token(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Parameters of one search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    /// Decoded key/value pairs in request order.
    pairs: Vec<(String, String)>,
}

impl RequestParameters {
    /// Parses an URL-encoded query string. A leading `?` is ignored.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// Builds parameters from already decoded pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the decoded pairs in request order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Returns the value of a parameter. When repeated, the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the free-text search term, if supplied.
    pub fn search_term(&self) -> Option<&str> {
        self.get(SEARCH_PARAM)
    }

    /// Returns the requested sort field, if supplied.
    pub fn sort_by(&self) -> Option<&str> {
        self.get(SORT_BY_PARAM)
    }

    /// Returns the requested sort direction token, if supplied.
    pub fn sort_dir(&self) -> Option<&str> {
        self.get(SORT_DIR_PARAM)
    }

    /// Returns the requested type restriction, if supplied.
    pub fn search_type(&self) -> Option<&str> {
        self.get(SEARCH_TYPE_PARAM)
    }

    /// Returns the pagination offset, ignoring malformed values.
    pub fn start(&self) -> Option<usize> {
        self.get(START_PARAM).and_then(|v| v.trim().parse().ok())
    }

    /// Returns the pagination limit, ignoring malformed values.
    pub fn limit(&self) -> Option<usize> {
        self.get(LIMIT_PARAM).and_then(|v| v.trim().parse().ok())
    }

    /// Extracts facet selections namespaced under `filter_param`.
    ///
    /// Keys look like `filter[Field][]` or `filter[Field][0]`. Values are grouped per field;
    /// duplicates collapse and values come back sorted, not in request order.
    pub fn facet_selections(&self, filter_param: &str) -> BTreeMap<String, BTreeSet<String>> {
        let mut selections: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (key, value) in &self.pairs {
            if let Some(field) = parse_facet_key(key, filter_param) {
                selections
                    .entry(field.to_string())
                    .or_default()
                    .insert(value.clone());
            }
        }
        selections
    }

    /// Re-encodes all parameters as a query string.
    pub fn query_string(&self) -> String {
        encode_pairs(self.pairs.iter())
    }

    /// Re-encodes the parameters, leaving out every pair for which `skip` returns true.
    pub fn query_string_without<F>(&self, skip: F) -> String
    where
        F: Fn(&str, &str) -> bool,
    {
        encode_pairs(self.pairs.iter().filter(|(k, v)| !skip(k, v)))
    }
}

/// Returns the facet field named by a `filter[Field][...]` key, if `key` is one.
pub fn parse_facet_key<'a>(key: &'a str, filter_param: &str) -> Option<&'a str> {
    let rest = key.strip_prefix(filter_param)?.strip_prefix('[')?;
    let (field, tail) = rest.split_once(']')?;
    if field.is_empty() {
        return None;
    }
    let index_ok = tail.is_empty() || (tail.starts_with('[') && tail.ends_with(']'));
    index_ok.then_some(field)
}

/// Builds the `filter[Field][]` key for a facet field.
pub fn facet_key(filter_param: &str, field: &str) -> String {
    format!("{filter_param}[{field}][]")
}

/// Encodes pairs with `application/x-www-form-urlencoded` rules.
fn encode_pairs<'a, I>(pairs: I) -> String
where
    I: Iterator<Item = &'a (String, String)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_parameters() {
        let params =
            RequestParameters::parse("?Search=running+shoes&SortBy=Title&SortDir=Ascending");
        assert_eq!(params.search_term(), Some("running shoes"));
        assert_eq!(params.sort_by(), Some("Title"));
        assert_eq!(params.sort_dir(), Some("Ascending"));
        assert_eq!(params.search_type(), None);
    }

    #[test]
    fn last_repeated_value_wins() {
        let params = RequestParameters::parse("SortBy=Title&SortBy=Created");
        assert_eq!(params.sort_by(), Some("Created"));
    }

    #[test]
    fn malformed_pagination_is_ignored() {
        let params = RequestParameters::parse("start=ten&limit=-3");
        assert_eq!(params.start(), None);
        assert_eq!(params.limit(), None);

        let params = RequestParameters::parse("start=20&limit=5");
        assert_eq!(params.start(), Some(20));
        assert_eq!(params.limit(), Some(5));
    }

    #[test]
    fn sort_direction_tokens() {
        assert_eq!(
            SortDirection::from_token(Some("Ascending")),
            SortDirection::Ascending
        );
        assert_eq!(
            SortDirection::from_token(Some("Descending")),
            SortDirection::Descending
        );
        assert_eq!(
            SortDirection::from_token(Some("ascending")),
            SortDirection::Descending
        );
        assert_eq!(SortDirection::from_token(None), SortDirection::Descending);
        assert_eq!(SortDirection::Ascending.backend_token(), "asc");
        assert_eq!(SortDirection::Descending.backend_token(), "desc");
    }

    #[test]
    fn extracts_facet_selections() {
        let params = RequestParameters::parse(
            "filter%5BCategoryField%5D%5B%5D=Footwear\
             &filter[CategoryField][]=Hats\
             &filter[Brand_ms][0]=Acme\
             &filter[CategoryField][]=Footwear\
             &other[Brand_ms][]=Ignored",
        );
        let facets = params.facet_selections("filter");

        assert_eq!(facets.len(), 2);
        let categories: Vec<_> = facets["CategoryField"].iter().cloned().collect();
        assert_eq!(categories, vec!["Footwear", "Hats"]);
        assert!(facets["Brand_ms"].contains("Acme"));
    }

    #[test]
    fn facet_selections_are_sorted_not_request_ordered() {
        let params = RequestParameters::parse("filter[Colour][]=Red&filter[Colour][]=Blue");
        let colours: Vec<_> = params.facet_selections("filter")["Colour"]
            .iter()
            .cloned()
            .collect();
        assert_eq!(colours, vec!["Blue", "Red"]);
    }

    #[test]
    fn no_facet_parameter_gives_empty_selection() {
        let params = RequestParameters::parse("Search=shoes&filter=plain");
        assert!(params.facet_selections("filter").is_empty());
    }

    #[test]
    fn facet_key_parsing() {
        assert_eq!(parse_facet_key("filter[A][]", "filter"), Some("A"));
        assert_eq!(parse_facet_key("filter[A][3]", "filter"), Some("A"));
        assert_eq!(parse_facet_key("filter[A]", "filter"), Some("A"));
        assert_eq!(parse_facet_key("filter[]", "filter"), None);
        assert_eq!(parse_facet_key("filter[A]x", "filter"), None);
        assert_eq!(parse_facet_key("filters[A][]", "filter"), None);
        assert_eq!(parse_facet_key("f[A][]", "f"), Some("A"));
    }

    #[test]
    fn query_string_round_trips() {
        let params = RequestParameters::parse("Search=a+b&filter[F][]=x");
        assert_eq!(params.query_string(), "Search=a+b&filter%5BF%5D%5B%5D=x");
        assert_eq!(
            RequestParameters::parse(&params.query_string()),
            params
        );
    }

    #[test]
    fn query_string_without_strips_matching_pairs() {
        let params = RequestParameters::parse("Search=a&filter[F][]=x&filter[F][]=y");
        let stripped = params.query_string_without(|k, v| k.starts_with("filter") && v == "x");
        assert_eq!(stripped, "Search=a&filter%5BF%5D%5B%5D=y");
    }

    #[test]
    fn empty_query_string() {
        let params = RequestParameters::parse("");
        assert!(params.pairs().is_empty());
        assert_eq!(params.query_string(), "");
    }
}
