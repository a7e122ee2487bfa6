use crate::support::{
    RunConfig, load_catalog_or_exit, load_overlaps_or_exit, load_sources_or_exit, print_json_or_exit,
};
use tzb_config::{LintReport, ZoneFilter, lint_config, ocean_bands};

fn print_report(report: &LintReport) {
    println!(
        "[config-lint] {} (zones={}, sources={}, overlapPairs={}, errors={}, warnings={})",
        if report.accepted() { "OK" } else { "FAIL" },
        report.summary.zone_count,
        report.summary.source_count,
        report.summary.overlap_pair_count,
        report.summary.error_count,
        report.summary.warning_count
    );
    for finding in &report.errors {
        println!("  - {} {} ({})", finding.subject, finding.class, finding.message);
    }
    for finding in &report.warnings {
        println!("  - WARN {} {} ({})", finding.subject, finding.class, finding.message);
    }
}

/// Lint the whole configuration. Zone filters are ignored: a filtered
/// configuration would report every skipped zone's sources as unused.
pub fn run(config: RunConfig, json_output: bool) {
    let config = RunConfig {
        filter: ZoneFilter::default(),
        ..config
    };
    let catalog = load_catalog_or_exit(&config);
    let sources = load_sources_or_exit(&config.sources, None);
    let overlaps = load_overlaps_or_exit(&config.expected_overlaps);

    let report = lint_config(&catalog, &sources, &overlaps, &ocean_bands());
    if json_output {
        print_json_or_exit("config-lint", &report);
    } else {
        print_report(&report);
    }
    if !report.accepted() {
        std::process::exit(1);
    }
}
