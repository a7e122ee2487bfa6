use crate::support::{
    RunConfig, exit_on_error, filtered_bands, load_catalog_or_exit, load_overlaps_or_exit, load_sources_or_exit,
    print_json_or_exit,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tzb_config::{ZoneId, ZoneVariant};
use tzb_geometry::GeometryOps;
use tzb_pipeline::{
    BuildReport, ValidationReport, ZoneBuilder, configure_threads, fill_oceans, timezone_names, validate_overlaps,
    write_combined_osm_zones, write_combined_outputs, write_timezone_names,
};
use tzb_store::{DirectorySink, FileMemo, Memoize, NoMemo, SourceStore, ZoneFiles, write_json_atomic};

pub const BUILD_REPORT_FILE: &str = "build-report.json";
pub const VALIDATION_REPORT_FILE: &str = "validation-report.json";

pub struct Args {
    pub config: RunConfig,
    pub skip_validation: bool,
    pub skip_oceans: bool,
    pub no_cache: bool,
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildRun {
    result: &'static str,
    build: BuildReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationReport>,
    ocean_count: usize,
    osm_zone_placeholders: usize,
    outputs: Vec<String>,
}

fn print_build_report(report: &BuildReport) {
    println!(
        "[build] {} (zones={}, built={}, reused={}, failed={})",
        if report.accepted() { "OK" } else { "FAIL" },
        report.summary.zone_count,
        report.summary.built_count,
        report.summary.reused_count,
        report.summary.failed_count
    );
    for failure in &report.failures {
        println!("  - {} {} ({})", failure.zone, failure.class, failure.message);
    }
}

pub fn print_validation_report(report: &ValidationReport) {
    println!(
        "[validate] {} (zones={}, pairs={}, candidates={}, failures={}, warnings={})",
        if report.accepted() { "OK" } else { "FAIL" },
        report.summary.zone_count,
        report.summary.pair_count,
        report.summary.candidate_pair_count,
        report.summary.failure_count,
        report.summary.warning_count
    );
    for failure in &report.failures {
        println!(
            "  - {} / {} {} ({})",
            failure.zone_a, failure.zone_b, failure.class, failure.message
        );
        for region in &failure.regions {
            println!(
                "      {:.1} m² within {} (suggested bounds {})",
                region.area_m2, region.bounds, region.suggested_bounds
            );
        }
    }
    for warning in &report.warnings {
        println!(
            "  - WARN {} / {} {} ({})",
            warning.zone_a, warning.zone_b, warning.class, warning.message
        );
    }
}

fn finish(run: &BuildRun, json: bool) -> ! {
    if json {
        print_json_or_exit("build", run);
    } else {
        print_build_report(&run.build);
        if let Some(validation) = &run.validation {
            print_validation_report(validation);
        }
        for output in &run.outputs {
            println!("  wrote {output}");
        }
    }
    std::process::exit(if run.result == "accepted" { 0 } else { 1 });
}

pub fn run(args: Args) {
    let config = args.config;
    configure_threads(config.threads);

    let catalog = load_catalog_or_exit(&config);
    let sources = load_sources_or_exit(&config.sources, Some(&catalog));
    info!(
        zones = catalog.zone_count(),
        sources = sources.len(),
        "configuration loaded"
    );

    let ops = GeometryOps::new(Arc::new(DirectorySink::new(config.diagnostics_dir())));
    let store = SourceStore::new(&config.downloads_dir);
    let files = ZoneFiles::new(&config.working_dir);
    let memo: Box<dyn Memoize> = if args.no_cache || config.no_cache {
        Box::new(NoMemo)
    } else {
        Box::new(FileMemo::in_dir(&config.working_dir))
    };

    let builder = ZoneBuilder::new(ops.clone(), &store, &files, memo.as_ref());
    let outcome = exit_on_error("build aborted", builder.build_all(&catalog));
    if let Err(e) = memo.finish() {
        warn!(error = %e, "zone cache index not saved");
    }

    let build = outcome.report();
    exit_on_error(
        "failed to write build report",
        write_json_atomic(&config.working_dir.join(BUILD_REPORT_FILE), &build),
    );
    let mut run = BuildRun {
        result: if build.accepted() { "accepted" } else { "rejected" },
        build,
        validation: None,
        ocean_count: 0,
        osm_zone_placeholders: 0,
        outputs: Vec::new(),
    };
    if !run.build.accepted() {
        finish(&run, args.json);
    }

    let land = outcome.results.variant(ZoneVariant::Base);
    let bands = filtered_bands(&config);
    let oceans = if args.skip_oceans || config.skip_oceans {
        BTreeMap::new()
    } else {
        exit_on_error("ocean fill failed", fill_oceans(&ops, &bands, &land))
    };
    run.ocean_count = oceans.len();

    if !(args.skip_validation || config.skip_validation) {
        let overlaps = load_overlaps_or_exit(&config.expected_overlaps);
        let report = validate_overlaps(&ops, &land, &overlaps);
        exit_on_error(
            "failed to write validation report",
            write_json_atomic(&config.working_dir.join(VALIDATION_REPORT_FILE), &report),
        );
        let accepted = report.accepted();
        run.validation = Some(report);
        if !accepted {
            run.result = "rejected";
            finish(&run, args.json);
        }
    }

    let combined = exit_on_error(
        "failed to write combined outputs",
        write_combined_outputs(&config.working_dir, &outcome.results, &oceans),
    );
    let osm_zones = exit_on_error(
        "failed to write combined OSM zones",
        write_combined_osm_zones(&config.working_dir, &store, land.keys()),
    );
    run.osm_zone_placeholders = osm_zones.placeholder_count;
    let band_ids: Vec<&ZoneId> = bands.iter().map(|band| &band.zone_id).collect();
    let names = timezone_names(land.keys(), band_ids);
    let names_path = exit_on_error(
        "failed to write timezone names",
        write_timezone_names(&config.dist_dir, &names),
    );
    run.outputs = combined
        .files
        .iter()
        .chain([&osm_zones.path, &names_path])
        .map(|path: &PathBuf| path.display().to_string())
        .collect();
    finish(&run, args.json);
}
