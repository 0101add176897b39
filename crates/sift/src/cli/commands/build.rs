//! Implementation of `sift build`.

use std::process::ExitCode;

use serde::Serialize;
use sift_query::{FixtureBackend, RequestParameters, ResolvedQuery, ResultSet, SearchPage};

use crate::cli::{
    args::BuildCommand,
    context::CommandContext,
    output::{dim, print_json, subheader},
};

/// JSON output for `sift build`.
#[derive(Serialize)]
struct JsonBuildOutput<'a> {
    /// The assembled query.
    query: &'a ResolvedQuery,
    /// The query as Solr request parameters.
    solr_params: Vec<(String, String)>,
}

/// Shows the backend query a request would produce, without running it.
pub fn run(ctx: &CommandContext, cmd: &BuildCommand) -> ExitCode {
    let schema = ctx.schema();
    let backend = FixtureBackend::new(ResultSet::default());
    let page = SearchPage::from_config(&ctx.config, &schema, &backend);

    let mut interpreter = page.interpreter(RequestParameters::parse(&cmd.query));
    let Some(query) = interpreter.build() else {
        eprintln!("error: no query was built");
        return ExitCode::FAILURE;
    };

    if cmd.json {
        return print_json(&JsonBuildOutput {
            query,
            solr_params: query.to_solr_params(),
        });
    }

    print_query(query);
    ExitCode::SUCCESS
}

/// Prints a human readable breakdown of the query.
pub fn print_query(query: &ResolvedQuery) {
    let builder = &query.builder;

    println!("{}", subheader("Query:"));
    println!(
        "   term:   {}",
        builder.base_query.as_deref().unwrap_or("(none)")
    );
    if let Some(sort) = &builder.sort {
        println!(
            "   sort:   {} {}",
            sort.field,
            sort.direction.backend_token()
        );
    }
    println!("   parser: {}", builder.query_type);
    println!("   page:   start {} rows {}", query.offset, query.limit);
    println!();

    println!("{}", subheader("Filters:"));
    if builder.filters.is_empty() {
        println!("   {}", dim("(none)"));
    }
    for filter in &builder.filters {
        println!("   {}", filter.to_query());
    }
    println!();

    if !builder.query_fields.is_empty() {
        println!("{}", subheader("Search fields:"));
        println!("   {}", builder.query_fields.join(", "));
        println!();
    }

    if !builder.boosts.is_empty() || !builder.boost_field_values.is_empty() {
        println!("{}", subheader("Boosts:"));
        for (field, weight) in &builder.boosts {
            println!("   {field}^{weight}");
        }
        for (field, value) in &builder.boost_field_values {
            println!("   {field}:{value}");
        }
        println!();
    }

    println!("{}", subheader("Facets:"));
    if query.facets.fields.is_empty() && query.facets.queries.is_empty() {
        println!("   {}", dim("(none)"));
    }
    for field in &query.facets.fields {
        println!("   {field}");
    }
    for facet_query in &query.facets.queries {
        println!("   {facet_query} {}", dim("(query)"));
    }
    println!(
        "   {}",
        dim(&format!(
            "limit {}, min count {}",
            query.facets.limit, query.facets.min_count
        ))
    );
    println!();

    println!("{}", subheader("Solr parameters:"));
    for (key, value) in query.to_solr_params() {
        println!("   {key}={value}");
    }
}
