//! # tzb-pipeline
//!
//! The boundary-construction and validation pipeline.
//!
//! ## Flow
//!
//! ```text
//! SourceResolver    ← fetched document / manual polygon / derived zone
//!     │
//! ZoneBuilder       ← recipe ops in order, post-process, write per-zone file
//!     │               (dependency waves, zones of a wave run concurrently)
//!     ├── fill_oceans        ← band rectangles minus overlapping land
//!     ├── validate_overlaps  ← every zone pair, expected-overlap allowances
//!     ├── write_combined_outputs
//!     ├── write_combined_osm_zones  ← downloaded OSM timezone boundaries
//!     └── diff_releases      ← against a previous release
//! ```
//!
//! Zone results are written once, by the build that produced them, and only
//! read afterwards. Iteration order is zone-id order throughout, so outputs
//! are reproducible regardless of scheduling.

pub mod builder;
pub mod diff;
pub mod error;
pub mod merge;
pub mod ocean;
pub mod resolver;
pub mod results;
pub mod validate;

pub use builder::{
    BUILD_REPORT_KIND, BuildFailure, BuildOutcome, BuildReport, BuildSummary, ZoneBuilder, run_recipe,
};
pub use diff::{
    ADDITIONS_FILE, DIFF_NOISE_AREA, DiffSummary, REMOVALS_FILE, ZoneDiff, diff_releases, diff_zone,
    write_release_diff,
};
pub use error::PipelineError;
pub use merge::{
    COMBINED_FILE, COMBINED_OSM_ZONES_FILE, COMBINED_WITH_OCEANS_FILE, CombinedOutputs, OsmZonesOutput,
    TIMEZONE_NAMES_FILE, combined_variant_path, null_island, timezone_names, write_combined,
    write_combined_osm_zones, write_combined_outputs, write_timezone_names,
};
pub use ocean::{fill_band, fill_oceans};
pub use resolver::{SourceResolver, boundary_geometry};
pub use results::{ZoneResult, ZoneResults};
pub use validate::{
    MINOR_OVERLAP_AREA_M2, OVERLAP_NOISE_AREA, OverlapFailure, OverlapRegion, VALIDATION_CHECK_KIND,
    ValidationReport, ValidationSummary, ValidationWarning, validate_overlaps,
};

/// Size the global rayon pool. `None` keeps rayon's default (one thread per
/// core). Only the first call has an effect.
pub fn configure_threads(threads: Option<usize>) {
    let Some(threads) = threads else {
        return;
    };
    if let Err(err) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        tracing::warn!(threads, error = %err, "thread pool already initialized");
    }
}
