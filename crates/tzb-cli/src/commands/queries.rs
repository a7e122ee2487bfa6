use crate::support::{RunConfig, load_catalog_or_exit, load_sources_or_exit, print_json_or_exit};
use serde::Serialize;
use std::collections::BTreeMap;
use tzb_config::{BoundaryQuery, timezone_query_id};

/// Overpass QL for the downloads a build reads, keyed by the file stem the
/// fetcher should write under the downloads directory.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryPlan {
    boundaries: BTreeMap<String, String>,
    timezones: BTreeMap<String, String>,
}

pub fn run(config: RunConfig, json_output: bool) {
    let catalog = load_catalog_or_exit(&config);
    let sources = load_sources_or_exit(&config.sources, Some(&catalog));
    let plan = QueryPlan {
        boundaries: sources.overpass_queries(),
        timezones: catalog
            .base()
            .into_iter()
            .flat_map(|recipes| recipes.keys())
            .map(|zone| (timezone_query_id(zone), BoundaryQuery::timezone(zone).overpass_query()))
            .collect(),
    };

    if json_output {
        print_json_or_exit("queries", &plan);
        return;
    }
    println!(
        "[queries] boundaries={}, timezones={}",
        plan.boundaries.len(),
        plan.timezones.len()
    );
    for (id, query) in plan.boundaries.iter().chain(&plan.timezones) {
        println!("  - {id}: {query}");
    }
}
