//! Implementation of `sift fields`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use sift_query::{FacetCatalog, FixtureBackend, SchemaResolver, SearchPage};

use crate::cli::{
    args::FieldsCommand,
    context::CommandContext,
    output::{dim, subheader},
};

/// Lists the fields the page can sort on with their indexed sort names.
pub fn run(ctx: &CommandContext, cmd: &FieldsCommand) -> ExitCode {
    let config = &ctx.config;
    let schema = ctx.schema();
    let backend = FixtureBackend::disconnected();
    let page = SearchPage::from_config(config, &schema, &backend);

    let resolver = SchemaResolver::new(&schema);
    let types = FacetCatalog::new(&config.page, &config.search, resolver).searchable_types();
    let fields = page.selectable_fields(!cmd.include_geo);

    println!("{}", subheader(&format!("Selectable fields ({}):", types.join(", "))));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Field", "Label", "Sorts on"]);
    for (name, label) in &fields {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(label),
            Cell::new(resolver.resolve_sort_field_name(name, &types)),
        ]);
    }
    println!("{table}");

    if !cmd.include_geo {
        println!("{}", dim("Geo-point fields are hidden; use --include-geo to show them."));
    }

    ExitCode::SUCCESS
}
