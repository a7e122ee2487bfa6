use crate::cli::RunArgs;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tzb_config::{
    BoundarySources, ExpectedOverlaps, OceanBand, RunSettings, ZoneCatalog, ZoneFilter, ZoneId, ZoneVariant,
    load_recipes, ocean_bands, retain_referenced_sources,
};

pub const DEFAULT_ZONES_PATH: &str = "timezones.json";
pub const DEFAULT_SOURCES_PATH: &str = "osmBoundarySources.json";
pub const DEFAULT_EXPECTED_OVERLAPS_PATH: &str = "expectedZoneOverlaps.json";
pub const DEFAULT_DOWNLOADS_DIR: &str = "downloads";
pub const DEFAULT_WORKING_DIR: &str = "working";
pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DIAGNOSTICS_SUBDIR: &str = "diagnostics";

/// Arguments merged over the settings file over built-in defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub zones: PathBuf,
    pub zones_1970: Option<PathBuf>,
    pub zones_now: Option<PathBuf>,
    pub sources: PathBuf,
    pub expected_overlaps: PathBuf,
    pub downloads_dir: PathBuf,
    pub working_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub previous_release: Option<PathBuf>,
    pub filter: ZoneFilter,
    pub skip_validation: bool,
    pub skip_oceans: bool,
    pub no_cache: bool,
    pub threads: Option<usize>,
}

impl RunConfig {
    pub fn diagnostics_dir(&self) -> PathBuf {
        self.working_dir.join(DIAGNOSTICS_SUBDIR)
    }
}

fn pick(arg: &Option<String>, setting: Option<PathBuf>) -> Option<PathBuf> {
    arg.as_ref().map(PathBuf::from).or(setting)
}

fn pick_or(arg: &Option<String>, setting: Option<PathBuf>, default: &str) -> PathBuf {
    pick(arg, setting).unwrap_or_else(|| PathBuf::from(default))
}

fn pick_list(arg: &[String], setting: Vec<String>) -> Vec<String> {
    if arg.is_empty() { setting } else { arg.to_vec() }
}

/// Merge `run` over the settings file (if any) over the defaults. Flags
/// given on the command line can only switch a setting on.
pub fn resolve_run_config(settings: RunSettings, run: &RunArgs) -> RunConfig {
    let included = pick_list(&run.included_zones, settings.included_zones);
    let excluded = pick_list(&run.excluded_zones, settings.excluded_zones);
    RunConfig {
        zones: pick_or(&run.zones, settings.zones, DEFAULT_ZONES_PATH),
        zones_1970: pick(&run.zones_1970, settings.zones_1970),
        zones_now: pick(&run.zones_now, settings.zones_now),
        sources: pick_or(&run.sources, settings.sources, DEFAULT_SOURCES_PATH),
        expected_overlaps: pick_or(
            &run.expected_overlaps,
            settings.expected_overlaps,
            DEFAULT_EXPECTED_OVERLAPS_PATH,
        ),
        downloads_dir: pick_or(&run.downloads_dir, settings.downloads_dir, DEFAULT_DOWNLOADS_DIR),
        working_dir: pick_or(&run.working_dir, settings.working_dir, DEFAULT_WORKING_DIR),
        dist_dir: pick_or(&run.dist_dir, settings.dist_dir, DEFAULT_DIST_DIR),
        previous_release: settings.previous_release,
        filter: ZoneFilter::new(
            included.into_iter().map(ZoneId::new),
            excluded.into_iter().map(ZoneId::new),
        ),
        skip_validation: settings.skip_validation.unwrap_or(false),
        skip_oceans: settings.skip_oceans.unwrap_or(false),
        no_cache: settings.no_cache.unwrap_or(false),
        threads: run.threads.or(settings.threads),
    }
}

pub fn run_config_or_exit(settings_path: Option<&str>, run: &RunArgs) -> RunConfig {
    let settings = match settings_path {
        Some(path) => RunSettings::load(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        }),
        None => RunSettings::default(),
    };
    resolve_run_config(settings, run)
}

/// The zone catalog (base plus any variant files), filtered.
pub fn load_catalog_or_exit(config: &RunConfig) -> ZoneCatalog {
    let mut catalog = ZoneCatalog::new();
    let variants = [
        (ZoneVariant::Base, Some(&config.zones)),
        (ZoneVariant::Cutoff1970, config.zones_1970.as_ref()),
        (ZoneVariant::Present, config.zones_now.as_ref()),
    ];
    for (variant, path) in variants {
        let Some(path) = path else { continue };
        let recipes = load_recipes(path).unwrap_or_else(|e| {
            eprintln!("error: failed to load {variant} recipes: {e}");
            std::process::exit(1);
        });
        catalog.insert(variant, recipes);
    }
    config.filter.apply_catalog(&catalog, &ocean_bands()).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

/// Ocean bands left after filtering.
pub fn filtered_bands(config: &RunConfig) -> Vec<OceanBand> {
    config.filter.apply_bands(ocean_bands())
}

/// Boundary sources, reduced to those the catalog fetches.
pub fn load_sources_or_exit(path: &Path, catalog: Option<&ZoneCatalog>) -> BoundarySources {
    let mut sources = BoundarySources::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    if let Some(catalog) = catalog {
        retain_referenced_sources(&mut sources, catalog);
    }
    sources
}

pub fn load_overlaps_or_exit(path: &Path) -> ExpectedOverlaps {
    ExpectedOverlaps::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn print_json_or_exit<T: Serialize>(what: &str, payload: &T) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|error| {
        eprintln!("error: failed to render {what} payload: {error}");
        std::process::exit(2);
    });
    println!("{rendered}");
}

pub fn exit_on_error<T, E: std::fmt::Display>(context: &str, result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {context}: {e}");
        std::process::exit(1);
    })
}
