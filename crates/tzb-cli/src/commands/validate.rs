use crate::commands::build::print_validation_report;
use crate::support::{RunConfig, load_catalog_or_exit, load_overlaps_or_exit, print_json_or_exit};
use std::collections::BTreeMap;
use std::sync::Arc;
use tzb_config::ZoneVariant;
use tzb_geometry::GeometryOps;
use tzb_pipeline::{configure_threads, validate_overlaps};
use tzb_store::{DirectorySink, ZoneFiles};

/// Validate the zone files a previous build left in the working directory.
pub fn run(config: RunConfig, json_output: bool) {
    configure_threads(config.threads);
    let catalog = load_catalog_or_exit(&config);
    let overlaps = load_overlaps_or_exit(&config.expected_overlaps);
    let files = ZoneFiles::new(&config.working_dir);

    let mut zones = BTreeMap::new();
    for zone in catalog.base().into_iter().flat_map(|recipes| recipes.keys()) {
        let (geometry, _) = files.read(ZoneVariant::Base, zone).unwrap_or_else(|e| {
            eprintln!("error: zone {zone} has not been built: {e}");
            std::process::exit(1);
        });
        zones.insert(zone.clone(), geometry);
    }

    let ops = GeometryOps::new(Arc::new(DirectorySink::new(config.diagnostics_dir())));
    let report = validate_overlaps(&ops, &zones, &overlaps);
    if json_output {
        print_json_or_exit("validate", &report);
    } else {
        print_validation_report(&report);
    }
    if !report.accepted() {
        std::process::exit(1);
    }
}
