use crate::support::{RunConfig, exit_on_error, print_json_or_exit};
use std::path::PathBuf;
use std::sync::Arc;
use tzb_geometry::GeometryOps;
use tzb_pipeline::{COMBINED_FILE, configure_threads, diff_releases, write_release_diff};
use tzb_store::{DirectorySink, load_release};

/// Diff `<working>/combined.json` against a previous release and write
/// `additions.json` / `removals.json` next to it.
pub fn run(config: RunConfig, previous_release: Option<String>, json_output: bool) {
    configure_threads(config.threads);
    let Some(previous_path) = previous_release.map(PathBuf::from).or(config.previous_release.clone()) else {
        eprintln!("error: --previous-release is required (or `previous-release` in the settings file)");
        std::process::exit(1);
    };

    let current_path = config.working_dir.join(COMBINED_FILE);
    let current = exit_on_error(
        &format!("failed to load {}", current_path.display()),
        load_release(&current_path),
    );
    let previous = exit_on_error(
        &format!("failed to load {}", previous_path.display()),
        load_release(&previous_path),
    );

    let ops = GeometryOps::new(Arc::new(DirectorySink::new(config.diagnostics_dir())));
    let diffs = exit_on_error("diff failed", diff_releases(&ops, &current, &previous));
    let summary = exit_on_error(
        "failed to write diff",
        write_release_diff(&config.working_dir, &diffs),
    );

    if json_output {
        print_json_or_exit("diff", &summary);
    } else {
        println!(
            "[diff] changed={}, additions={}, removals={}",
            summary.changed_zone_count, summary.addition_count, summary.removal_count
        );
        for (zone, diff) in &diffs {
            let mut kinds = Vec::new();
            if diff.addition.is_some() {
                kinds.push("addition");
            }
            if diff.removal.is_some() {
                kinds.push("removal");
            }
            println!("  - {zone} ({})", kinds.join(", "));
        }
    }
}
