//! # tzb-config
//!
//! Configuration inputs of a boundary build, loaded once and read-only for
//! the rest of the run:
//!
//! - zone recipes (`timezones.json` and optional variant files)
//! - boundary source queries (`osmBoundarySources.json`)
//! - expected overlaps (`expectedZoneOverlaps.json`)
//! - the fixed ocean band table
//! - run settings (`tzb.toml`)
//!
//! Unknown operation or source strings are rejected here, at the parsing
//! boundary. Past this crate, operations are a closed enum.

pub mod dependency;
pub mod error;
pub mod filter;
pub mod lint;
pub mod ocean;
pub mod overlaps;
pub mod recipe;
pub mod settings;
pub mod sources;
pub mod zone;

pub use dependency::{BuildNode, build_waves};
pub use error::ConfigError;
pub use filter::{ZoneFilter, retain_referenced_sources};
pub use lint::{CONFIG_LINT_KIND, LintFinding, LintReport, LintSummary, lint_config};
pub use ocean::{OceanBand, check_band_tiling, ocean_bands};
pub use overlaps::{ExpectedOverlap, ExpectedOverlaps};
pub use recipe::{
    Operation, OperationKind, Recipe, SourceRef, ZoneCatalog, ZoneRecipes, load_recipes, parse_recipes,
};
pub use settings::RunSettings;
pub use sources::{BoundaryQuery, BoundarySources, timezone_query_id};
pub use zone::{ZoneId, ZoneVariant};

use serde_json::Value;
use std::path::Path;

/// Read and parse one JSON configuration file.
pub fn read_json_file(path: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::ParseJson {
        path: path.display().to_string(),
        source,
    })
}
