//! Request interpretation: parameters in, one executed query out.
//!
//! A [`SearchRequestInterpreter`] lives for exactly one request. It moves through
//! `Unbuilt -> Built -> Executed` and never back. Building and executing are memoised: facet
//! rendering, crumbs and result listing all observe the same query and the same result set,
//! and the backend is asked at most once.

use std::{
    collections::{BTreeMap, BTreeSet},
    mem,
};

use sift_config::{PageConfig, SearchSettings};

use crate::{
    backend::{ResultSet, SearchBackend},
    builder::{FacetRequest, OR_SEPARATOR, QueryBuilder, ResolvedQuery},
    facets::FacetCatalog,
    params::{RequestParameters, SortDirection},
    schema::{RELEVANCE_FIELD, SchemaResolver, SchemaSource},
    transform::{self, FacetCrumb, FacetEntry, LinkContext, PresentationFacet},
};

/// Hierarchy field holding a record's type and all its ancestor types.
pub const CLASS_HIERARCHY_FIELD: &str = "ClassNameHierarchy_ms";

/// Hierarchy field holding the identifiers of all a record's ancestor nodes.
pub const PARENTS_HIERARCHY_FIELD: &str = "ParentsHierarchy_ms";

/// Callback that may adjust the assembled query right before it is executed.
pub type QueryHook<'a> = Box<dyn Fn(&mut QueryBuilder) + 'a>;

/// Lifecycle of the request's query.
#[derive(Debug, Default)]
enum QueryState {
    /// Nothing assembled yet.
    #[default]
    Unbuilt,
    /// Assembled, not yet executed.
    Built(ResolvedQuery),
    /// Executed. `results` is `None` when the backend failed.
    Executed {
        /// The query that was executed.
        query: ResolvedQuery,
        /// The backend's answer.
        results: Option<ResultSet>,
    },
    /// The backend was not connected; there is no query.
    Unavailable,
}

/// Interprets one search request against one page.
pub struct SearchRequestInterpreter<'a> {
    /// The page configuration.
    page: &'a PageConfig,
    /// Shared search settings.
    settings: &'a SearchSettings,
    /// The index schema.
    schema: &'a dyn SchemaSource,
    /// The backend queries are sent to.
    backend: &'a dyn SearchBackend,
    /// The request.
    params: RequestParameters,
    /// Optional last-minute query adjustment.
    hook: Option<QueryHook<'a>>,
    /// Where in its lifecycle the query is.
    state: QueryState,
}

impl<'a> SearchRequestInterpreter<'a> {
    /// Creates an interpreter for one request.
    pub fn new(
        page: &'a PageConfig,
        settings: &'a SearchSettings,
        schema: &'a dyn SchemaSource,
        backend: &'a dyn SearchBackend,
        params: RequestParameters,
    ) -> Self {
        Self {
            page,
            settings,
            schema,
            backend,
            params,
            hook: None,
            state: QueryState::Unbuilt,
        }
    }

    /// Installs a callback that runs after the query is assembled and before it is executed.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut QueryBuilder) + 'a,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Returns the request parameters.
    pub fn params(&self) -> &RequestParameters {
        &self.params
    }

    /// Returns the page configuration.
    pub fn page(&self) -> &'a PageConfig {
        self.page
    }

    /// Returns the field resolver for this page.
    pub fn resolver(&self) -> SchemaResolver<'a> {
        SchemaResolver::new(self.schema)
    }

    /// Returns the facet catalog for this page.
    pub fn catalog(&self) -> FacetCatalog<'a> {
        FacetCatalog::new(self.page, self.settings, self.resolver())
    }

    /// Assembles the query if that has not happened yet and returns it.
    ///
    /// Returns `None` when the backend is not connected.
    pub fn build(&mut self) -> Option<&ResolvedQuery> {
        if matches!(self.state, QueryState::Unbuilt) {
            self.state = if self.backend.is_connected() {
                QueryState::Built(self.assemble())
            } else {
                tracing::info!("search backend is not connected, skipping query");
                QueryState::Unavailable
            };
        }
        self.resolved_query()
    }

    /// Returns the assembled query, if one has been built.
    pub fn resolved_query(&self) -> Option<&ResolvedQuery> {
        match &self.state {
            QueryState::Built(query) | QueryState::Executed { query, .. } => Some(query),
            QueryState::Unbuilt | QueryState::Unavailable => None,
        }
    }

    /// Executes the query if that has not happened yet and returns the result set.
    ///
    /// Returns `None` when the backend is not connected or the execution failed. Either way
    /// the backend is asked at most once per interpreter.
    pub fn results(&mut self) -> Option<&ResultSet> {
        self.build();
        self.state = match mem::take(&mut self.state) {
            QueryState::Built(query) => {
                let results = self.execute(&query);
                QueryState::Executed { query, results }
            }
            other => other,
        };
        match &self.state {
            QueryState::Executed { results, .. } => results.as_ref(),
            _ => None,
        }
    }

    /// Returns the facet values selected in the request.
    pub fn active_facets(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.catalog().active_facets(&self.params)
    }

    /// Returns every counted facet field as a labelled, linkable facet.
    pub fn all_facets(&mut self) -> Vec<PresentationFacet> {
        let catalog = self.catalog();
        let field_labels = catalog.facet_field_mapping();
        let results_link = self.page.results_link();
        let query_string = self.params.query_string();
        let links = LinkContext {
            results_link: &results_link,
            query_string: &query_string,
            filter_param: catalog.filter_param(),
        };
        match self.results() {
            Some(results) => transform::transform(
                &results.facets,
                None,
                &links,
                catalog.query_facet_labels(),
                &field_labels,
            ),
            None => Vec::new(),
        }
    }

    /// Returns the facet entries of `term`, or of every field when `term` is `None`.
    pub fn current_facets(&mut self, term: Option<&str>) -> Vec<FacetEntry> {
        let catalog = self.catalog();
        let results_link = self.page.results_link();
        let query_string = self.params.query_string();
        let links = LinkContext {
            results_link: &results_link,
            query_string: &query_string,
            filter_param: catalog.filter_param(),
        };
        match self.results() {
            Some(results) => transform::current_facets(
                &results.facets,
                term,
                &links,
                catalog.query_facet_labels(),
            ),
            None => Vec::new(),
        }
    }

    /// Returns one removable crumb per active facet selection.
    pub fn facet_crumbs(&self) -> Vec<FacetCrumb> {
        transform::facet_crumbs(
            &self.params,
            self.catalog().filter_param(),
            &self.page.results_link(),
        )
    }

    /// Assembles the query from the page configuration and the request.
    fn assemble(&self) -> ResolvedQuery {
        let page = self.page;
        let params = &self.params;
        let resolver = self.resolver();
        let catalog = self.catalog();

        let mut builder = QueryBuilder::new(page.query_type.as_str());
        if let Some(term) = params.search_term() {
            builder.base_query(term);
        }

        // A blank sort key is the relevance option of a sort select, not a sort request.
        let is_set = |field: &&str| !field.trim().is_empty();
        let mut sort_by = params
            .sort_by()
            .filter(is_set)
            .or(page.sort_by.as_deref().filter(is_set))
            .map(str::to_string);
        let sort_dir = SortDirection::from_token(params.sort_dir().or(page.sort_dir.as_deref()));

        let mut types = self.effective_types();

        // Sorting still needs a type to resolve against when the page searches everything.
        if types.is_empty() && sort_by.is_some() {
            types = vec![self.settings.default_type.clone()];
        }

        let selectable = resolver.selectable_fields(&catalog.searchable_types(), true);
        if let Some(field) = &sort_by
            && !selectable.contains_key(field)
        {
            tracing::debug!(field = %field, "sort field is not selectable, sorting by relevance");
            sort_by = Some(RELEVANCE_FIELD.to_string());
        }

        for (field, values) in catalog.active_facets(params) {
            let value = values.into_iter().collect::<Vec<_>>().join(OR_SEPARATOR);
            builder.add_filter(field, value);
        }

        if !types.is_empty() {
            sort_by = sort_by.map(|field| resolver.resolve_sort_field_name(&field, &types));
            builder.add_filter(CLASS_HIERARCHY_FIELD, types.join(OR_SEPARATOR));
        }

        if !page.search_trees.is_empty() {
            let ids: Vec<String> = page.search_trees.iter().map(u64::to_string).collect();
            builder.add_filter(PARENTS_HIERARCHY_FIELD, ids.join(OR_SEPARATOR));
        }

        let sort_field = sort_by
            .filter(|field| !field.is_empty())
            .unwrap_or_else(|| RELEVANCE_FIELD.to_string());
        builder.sort_by(sort_field, sort_dir);

        self.apply_relevance(&mut builder, &types);

        for (field, value) in &page.filter_fields {
            builder.add_filter(field.as_str(), value.as_str());
        }

        let mut facets = FacetRequest::new(catalog.facet_fields(), page.effective_min_facet_count());
        facets.queries = catalog.query_facet_labels().keys().cloned().collect();

        if let Some(hook) = &self.hook {
            hook(&mut builder);
        }

        let query = ResolvedQuery {
            builder,
            facets,
            offset: params.start().unwrap_or(0),
            limit: params
                .limit()
                .unwrap_or_else(|| page.effective_results_per_page()),
        };
        tracing::debug!(
            term = ?query.builder.base_query,
            filters = query.builder.filters.len(),
            offset = query.offset,
            limit = query.limit,
            "assembled search query"
        );
        query
    }

    /// Restricts the searched fields and adds field and value boosts.
    fn apply_relevance(&self, builder: &mut QueryBuilder, types: &[String]) {
        let page = self.page;
        let resolver = self.resolver();

        // Fields missing from every in-scope type are dropped, not searched raw.
        let query_fields: Vec<String> = page
            .search_on_fields
            .iter()
            .filter_map(|field| resolver.resolve_field_name(field, types))
            .collect();
        if !query_fields.is_empty() {
            builder.query_fields(query_fields);
        }

        let boosts: BTreeMap<String, f64> = page
            .boost_fields
            .iter()
            .filter(|(_, weight)| **weight > 0.0)
            .map(|(field, weight)| (resolver.resolve_or_raw(field, types), *weight))
            .collect();
        if !boosts.is_empty() {
            builder.boost(boosts);
        }

        if !page.boost_match_fields.is_empty() {
            builder.boost_field_values(page.boost_match_fields.clone());
        }
    }

    /// Sends the query to the backend, logging failures.
    fn execute(&self, query: &ResolvedQuery) -> Option<ResultSet> {
        match self.backend.execute(query) {
            Ok(results) => {
                tracing::debug!(total = results.total_results, "query executed");
                Some(results)
            }
            Err(e) => {
                tracing::warn!(error = %e, "search query failed");
                None
            }
        }
    }

    /// Returns the page types, narrowed to the requested type when it is one of them.
    fn effective_types(&self) -> Vec<String> {
        let types = &self.page.types;
        match self.params.search_type() {
            Some(requested) if types.iter().any(|t| t == requested) => vec![requested.to_string()],
            _ => types.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use sift_config::{ContentType, SchemaConfig};

    use super::*;
    use crate::{
        backend::{FacetCounts, FacetResult, FacetTerm, FixtureBackend},
        builder::Filter,
        schema::StaticSchema,
    };

    fn schema() -> StaticSchema {
        let mut config = SchemaConfig::default();
        config.types.insert(
            "Page".into(),
            ContentType {
                parent: None,
                fields: [
                    ("Title".to_string(), "Varchar(255)".to_string()),
                    ("Content".to_string(), "HTMLText".to_string()),
                ]
                .into(),
            },
        );
        config.types.insert(
            "ArticlePage".into(),
            ContentType {
                parent: Some("Page".into()),
                fields: [
                    ("Category".to_string(), "Varchar".to_string()),
                    ("Location".to_string(), "SolrGeoPoint".to_string()),
                ]
                .into(),
            },
        );
        config.types.insert(
            "NewsPage".into(),
            ContentType {
                parent: Some("Page".into()),
                fields: [("Summary".to_string(), "Text".to_string())].into(),
            },
        );
        StaticSchema::from_config(&config)
    }

    fn response() -> ResultSet {
        ResultSet {
            total_results: 2,
            time_taken_ms: Some(5),
            facets: FacetResult::new(vec![FacetCounts {
                field: "Category_ms".into(),
                terms: vec![FacetTerm::new("Footwear", 2)],
            }]),
            ..ResultSet::default()
        }
    }

    fn filter(field: &str, value: &str) -> Filter {
        Filter {
            field: field.into(),
            value: value.into(),
        }
    }

    struct Fixture {
        page: PageConfig,
        settings: SearchSettings,
        schema: StaticSchema,
        backend: FixtureBackend,
    }

    impl Fixture {
        fn new(page: PageConfig) -> Self {
            Self {
                page,
                settings: SearchSettings::default(),
                schema: schema(),
                backend: FixtureBackend::new(response()),
            }
        }

        fn interpreter(&self, query: &str) -> SearchRequestInterpreter<'_> {
            SearchRequestInterpreter::new(
                &self.page,
                &self.settings,
                &self.schema,
                &self.backend,
                RequestParameters::parse(query),
            )
        }

        fn build(&self, query: &str) -> ResolvedQuery {
            self.interpreter(query).build().cloned().unwrap()
        }
    }

    #[test]
    fn defaults_without_parameters() {
        let fixture = Fixture::new(PageConfig::default());
        let query = fixture.build("");

        assert_eq!(query.builder.base_query, None);
        assert_eq!(query.offset, 0);
        assert_eq!(query.limit, 10);
        let sort = query.builder.sort.unwrap();
        assert_eq!(sort.field, "score");
        assert_eq!(sort.direction, SortDirection::Descending);
        assert!(query.builder.filters.is_empty());
        assert!(query.facets.enabled);
        assert_eq!(query.facets.min_count, 1);
        assert_eq!(query.facets.return_fields, "*,score");
    }

    #[test]
    fn page_default_sort_and_results_per_page() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into()],
            sort_by: Some("Title".into()),
            sort_dir: Some("Ascending".into()),
            results_per_page: 25,
            ..PageConfig::default()
        });
        let query = fixture.build("");
        let sort = query.builder.sort.unwrap();
        assert_eq!(sort.field, "Title_s");
        assert_eq!(sort.direction, SortDirection::Ascending);
        assert_eq!(query.limit, 25);
    }

    #[test]
    fn request_overrides_sort_and_pagination() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into()],
            sort_by: Some("Title".into()),
            ..PageConfig::default()
        });
        let query = fixture.build("SortBy=Created&SortDir=Ascending&start=20&limit=5");
        let sort = query.builder.sort.unwrap();
        assert_eq!(sort.field, "Created_dt");
        assert_eq!(sort.direction, SortDirection::Ascending);
        assert_eq!(query.offset, 20);
        assert_eq!(query.limit, 5);
    }

    #[test]
    fn unknown_sort_field_falls_back_to_relevance() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into()],
            ..PageConfig::default()
        });
        let query = fixture.build("SortBy=Nonsense&SortDir=Ascending");
        let sort = query.builder.sort.unwrap();
        assert_eq!(sort.field, "score");
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn geo_fields_cannot_be_sorted_on() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into()],
            ..PageConfig::default()
        });
        let query = fixture.build("SortBy=Location");
        assert_eq!(query.builder.sort.unwrap().field, "score");
    }

    #[test]
    fn sort_without_types_defaults_to_page_type() {
        let fixture = Fixture::new(PageConfig::default());
        let query = fixture.build("SortBy=Title");

        assert_eq!(query.builder.sort.unwrap().field, "Title_s");
        assert_eq!(
            query.builder.filters,
            vec![filter(CLASS_HIERARCHY_FIELD, "Page")]
        );
    }

    #[test]
    fn blank_sort_without_types_keeps_search_broad() {
        let fixture = Fixture::new(PageConfig::default());

        for query in ["Search=shoes&SortBy=", "Search=shoes&SortBy=+++"] {
            let query = fixture.build(query);
            assert!(query.builder.filters.is_empty(), "{:?}", query.builder.filters);
            let sort = query.builder.sort.unwrap();
            assert_eq!(sort.field, RELEVANCE_FIELD);
            assert_eq!(sort.direction, SortDirection::Descending);
        }
    }

    #[test]
    fn blank_request_sort_falls_back_to_page_sort() {
        let fixture = Fixture::new(PageConfig {
            sort_by: Some("Title".into()),
            ..PageConfig::default()
        });
        let query = fixture.build("SortBy=");

        assert_eq!(query.builder.sort.unwrap().field, "Title_s");
        assert_eq!(
            query.builder.filters,
            vec![filter(CLASS_HIERARCHY_FIELD, "Page")]
        );
    }

    #[test]
    fn blank_page_sort_is_ignored() {
        let fixture = Fixture::new(PageConfig {
            sort_by: Some(String::new()),
            ..PageConfig::default()
        });
        let query = fixture.build("");

        assert!(query.builder.filters.is_empty());
        assert_eq!(query.builder.sort.unwrap().field, RELEVANCE_FIELD);
    }

    #[test]
    fn type_restriction_is_or_combined() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into(), "NewsPage".into()],
            ..PageConfig::default()
        });
        let query = fixture.build("");
        assert_eq!(
            query.builder.filters,
            vec![filter(CLASS_HIERARCHY_FIELD, "ArticlePage OR NewsPage")]
        );
    }

    #[test]
    fn search_type_narrows_only_to_configured_types() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into(), "NewsPage".into()],
            ..PageConfig::default()
        });
        let narrowed = fixture.build("SearchType=NewsPage");
        assert_eq!(
            narrowed.builder.filters,
            vec![filter(CLASS_HIERARCHY_FIELD, "NewsPage")]
        );

        let ignored = fixture.build("SearchType=SecretPage");
        assert_eq!(
            ignored.builder.filters,
            vec![filter(CLASS_HIERARCHY_FIELD, "ArticlePage OR NewsPage")]
        );
    }

    #[test]
    fn facet_selections_are_and_of_or() {
        let fixture = Fixture::new(PageConfig::default());
        let query = fixture.build(
            "filter[Category_ms][]=Hats&filter[Category_ms][]=Footwear&filter[Brand_ms][]=Acme",
        );
        assert_eq!(
            query.builder.filters,
            vec![
                filter("Brand_ms", "Acme"),
                filter("Category_ms", "Footwear OR Hats"),
            ]
        );
    }

    #[test]
    fn filter_order_facets_types_trees_then_fixed() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into()],
            search_trees: vec![3, 7],
            filter_fields: [("ShowInSearch_b".to_string(), "true".to_string())].into(),
            ..PageConfig::default()
        });
        let query = fixture.build("filter[Category_ms][]=Hats");
        assert_eq!(
            query.builder.filters,
            vec![
                filter("Category_ms", "Hats"),
                filter(CLASS_HIERARCHY_FIELD, "ArticlePage"),
                filter(PARENTS_HIERARCHY_FIELD, "3 OR 7"),
                filter("ShowInSearch_b", "true"),
            ]
        );
    }

    #[test]
    fn search_fields_drop_unresolvable_names() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into()],
            search_on_fields: vec!["Title".into(), "Summary".into(), "Content".into()],
            ..PageConfig::default()
        });
        let query = fixture.build("Search=shoes");
        assert_eq!(query.builder.base_query.as_deref(), Some("shoes"));
        assert_eq!(query.builder.query_fields, vec!["Title_ms", "Content_t"]);
    }

    #[test]
    fn boosts_skip_non_positive_weights_but_keep_value_boosts() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into()],
            boost_fields: [
                ("Title".to_string(), 3.0),
                ("Content".to_string(), 0.0),
                ("Unknown".to_string(), 1.5),
            ]
            .into(),
            boost_match_fields: [("Category_ms".to_string(), "Featured".to_string())].into(),
            ..PageConfig::default()
        });
        let query = fixture.build("");
        assert_eq!(
            query.builder.boosts,
            [("Title_ms".to_string(), 3.0), ("Unknown".to_string(), 1.5)].into()
        );
        assert_eq!(
            query.builder.boost_field_values.get("Category_ms").map(String::as_str),
            Some("Featured")
        );
    }

    #[test]
    fn facet_request_lists_fields_and_queries() {
        let mut fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into()],
            facet_fields: vec!["Category".into()],
            min_facet_count: 3,
            query_facets: [("Price_f:[0 TO 10]".to_string(), "Cheap".to_string())].into(),
            ..PageConfig::default()
        });
        fixture.settings.facets = vec!["Brand_ms".into()];
        let query = fixture.build("");

        assert_eq!(query.facets.fields, vec!["Brand_ms", "Category_ms"]);
        assert_eq!(query.facets.limit, 10);
        assert_eq!(query.facets.min_count, 3);
        assert_eq!(query.facets.queries, vec!["Price_f:[0 TO 10]"]);
    }

    #[test]
    fn hook_runs_after_assembly() {
        let fixture = Fixture::new(PageConfig {
            types: vec!["ArticlePage".into()],
            ..PageConfig::default()
        });
        let calls = Cell::new(0);
        let mut interpreter = fixture.interpreter("").with_hook(|builder| {
            calls.set(calls.get() + 1);
            assert_eq!(builder.filters.len(), 1);
            builder.add_filter("Locale_ms", "en_NZ");
        });

        interpreter.results();
        interpreter.results();
        let query = interpreter.resolved_query().unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(query.builder.filters.last(), Some(&filter("Locale_ms", "en_NZ")));
        assert_eq!(fixture.backend.last_query().as_ref(), Some(query));
    }

    #[test]
    fn results_are_memoised() {
        let fixture = Fixture::new(PageConfig::default());
        let mut interpreter = fixture.interpreter("Search=shoes");

        let first: *const ResultSet = interpreter.results().unwrap();
        let second: *const ResultSet = interpreter.results().unwrap();
        assert_eq!(first, second);
        interpreter.all_facets();
        interpreter.current_facets(None);
        assert_eq!(fixture.backend.executions(), 1);
    }

    #[test]
    fn disconnected_backend_yields_nothing() {
        let mut fixture = Fixture::new(PageConfig::default());
        fixture.backend = FixtureBackend::disconnected();
        let mut interpreter = fixture.interpreter("Search=shoes&filter[Category_ms][]=Hats");

        assert!(interpreter.build().is_none());
        assert!(interpreter.results().is_none());
        assert!(interpreter.all_facets().is_empty());
        assert!(interpreter.current_facets(Some("Category_ms")).is_empty());
        assert_eq!(interpreter.facet_crumbs().len(), 1);
        assert_eq!(fixture.backend.executions(), 0);
    }

    #[test]
    fn failed_execution_is_not_retried() {
        let mut fixture = Fixture::new(PageConfig::default());
        fixture.backend = FixtureBackend::failing("boom");
        let mut interpreter = fixture.interpreter("");

        assert!(interpreter.results().is_none());
        assert!(interpreter.results().is_none());
        assert!(interpreter.resolved_query().is_some());
        assert_eq!(fixture.backend.executions(), 1);
    }

    #[test]
    fn facets_link_back_to_results() {
        let fixture = Fixture::new(PageConfig {
            facet_mapping: [("Category_ms".to_string(), "Category".to_string())].into(),
            ..PageConfig::default()
        });
        let mut interpreter = fixture.interpreter("Search=shoes");
        let facets = interpreter.all_facets();

        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].title, "Category");
        assert_eq!(
            facets[0].items[0].search_link,
            "/search/results?Search=shoes&filter%5BCategory_ms%5D%5B%5D=Footwear"
        );
    }
}
