//! Implementation of `sift search`.

use std::process::ExitCode;

use serde::Serialize;
use serde_json::Value;
use sift_query::{
    FixtureBackend, Record, RequestParameters, ResolvedQuery, ResultSet, SearchPage,
    SearchResults,
};

use crate::cli::{
    args::SearchCommand,
    context::CommandContext,
    output::{dim, header, print_json, subheader, warning},
};

/// Record fields tried, in order, when choosing a display title.
const TITLE_FIELDS: &[&str] = &["Title", "Title_ms", "Name", "ID"];

/// JSON output for `sift search`.
#[derive(Serialize)]
struct JsonSearchOutput<'a> {
    /// The executed query, absent when the backend was unavailable.
    query: Option<&'a ResolvedQuery>,
    /// What a results page would show.
    results: &'a SearchResults,
}

/// Runs a request against a canned backend response and prints the results page data.
pub fn run(ctx: &CommandContext, cmd: &SearchCommand) -> ExitCode {
    let backend = if cmd.offline {
        FixtureBackend::disconnected()
    } else if let Some(path) = &cmd.response {
        match FixtureBackend::from_file(path) {
            Ok(backend) => backend,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        FixtureBackend::new(ResultSet::default())
    };

    let schema = ctx.schema();
    let page = SearchPage::from_config(&ctx.config, &schema, &backend);
    let mut interpreter = page.interpreter(RequestParameters::parse(&cmd.query));
    let results = page.results(&mut interpreter);

    if cmd.json {
        return print_json(&JsonSearchOutput {
            query: interpreter.resolved_query(),
            results: &results,
        });
    }

    print_results(&results);
    ExitCode::SUCCESS
}

/// Prints results, facets and crumbs.
fn print_results(results: &SearchResults) {
    println!("{}", header(&results.title));
    if !results.query.is_empty() {
        println!("{}", dim(&format!("Search: {}", results.query)));
    }
    println!();

    let Some(total) = results.total_results else {
        println!("{}", warning("Search backend unavailable; no results."));
        return;
    };

    println!(
        "{}",
        subheader(&format!(
            "{total} results ({} seconds):",
            results.elapsed_label()
        ))
    );
    if results.records.is_empty() {
        println!("   {}", dim("No results found."));
    }
    for record in &results.records {
        println!("   {}", record_title(record));
    }
    println!();

    for facet in &results.facets {
        println!("{}", subheader(&format!("{}:", facet.title)));
        for entry in &facet.items {
            println!("   {} ({})", entry.name, entry.count);
            println!("      {}", dim(&entry.search_link));
        }
        println!();
    }

    if !results.crumbs.is_empty() {
        println!("{}", subheader("Active filters:"));
        for crumb in &results.crumbs {
            println!("   {} {}", crumb.name, dim(&format!("[{}]", crumb.field)));
            println!("      {}", dim(&format!("remove: {}", crumb.remove_link)));
        }
    }
}

/// Picks a display title for a record, falling back to its JSON form.
fn record_title(record: &Record) -> String {
    match TITLE_FIELDS.iter().find_map(|field| record.get(*field)) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => serde_json::to_string(record).unwrap_or_default(),
    }
}
