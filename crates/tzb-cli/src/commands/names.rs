use crate::support::{RunConfig, exit_on_error, filtered_bands, load_catalog_or_exit};
use tzb_pipeline::{timezone_names, write_timezone_names};

pub fn run(config: RunConfig) {
    let catalog = load_catalog_or_exit(&config);
    let bands = filtered_bands(&config);
    let names = timezone_names(
        catalog.base().into_iter().flat_map(|recipes| recipes.keys()),
        bands.iter().map(|band| &band.zone_id),
    );
    let path = exit_on_error(
        "failed to write timezone names",
        write_timezone_names(&config.dist_dir, &names),
    );
    println!("wrote {} names to {}", names.len(), path.display());
}
