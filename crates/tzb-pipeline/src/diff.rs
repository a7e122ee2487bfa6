//! Geometric diff between a new build and a previous release.

use crate::error::PipelineError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};
use tzb_config::ZoneId;
use tzb_geometry::{BUFFER_DISTANCE, BooleanOp, Geometry, GeometryOps, Recovery, feature_value};
use tzb_store::FeatureWriter;

/// Diff results with less planar area (square degrees) are dropped.
pub const DIFF_NOISE_AREA: f64 = 1e-4;

pub const ADDITIONS_FILE: &str = "additions.json";
pub const REMOVALS_FILE: &str = "removals.json";

/// What changed for one zone. Both sides empty means unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneDiff {
    pub addition: Option<Geometry>,
    pub removal: Option<Geometry>,
}

impl ZoneDiff {
    pub fn is_unchanged(&self) -> bool {
        self.addition.is_none() && self.removal.is_none()
    }
}

/// Diff one zone.
///
/// A zone present on both sides is compared with both operands buffered by
/// [`BUFFER_DISTANCE`], so coordinate jitter between releases does not show
/// up as slivers. A zone present on one side only is a whole addition or
/// removal.
pub fn diff_zone(
    ops: &GeometryOps,
    current: Option<&Geometry>,
    previous: Option<&Geometry>,
) -> Result<ZoneDiff, PipelineError> {
    match (current, previous) {
        (Some(current), Some(previous)) => {
            let current = ops.buffer(current, BUFFER_DISTANCE)?;
            let previous = ops.buffer(previous, BUFFER_DISTANCE)?;
            if current == previous {
                return Ok(ZoneDiff::default());
            }
            let significant = |geometry: Geometry| (geometry.planar_area() > DIFF_NOISE_AREA).then_some(geometry);
            let addition = ops.apply(BooleanOp::Difference, &current, &previous, Recovery::AllowBuffer)?;
            let removal = ops.apply(BooleanOp::Difference, &previous, &current, Recovery::AllowBuffer)?;
            Ok(ZoneDiff {
                addition: significant(addition),
                removal: significant(removal),
            })
        }
        (Some(current), None) => Ok(ZoneDiff {
            addition: Some(current.clone()),
            removal: None,
        }),
        (None, Some(previous)) => Ok(ZoneDiff {
            addition: None,
            removal: Some(previous.clone()),
        }),
        (None, None) => Ok(ZoneDiff::default()),
    }
}

/// Diff every zone of either side. Zones are diffed concurrently; the map
/// only holds changed zones.
pub fn diff_releases<C, P>(
    ops: &GeometryOps,
    current: &BTreeMap<ZoneId, C>,
    previous: &BTreeMap<ZoneId, P>,
) -> Result<BTreeMap<ZoneId, ZoneDiff>, PipelineError>
where
    C: Borrow<Geometry> + Sync,
    P: Borrow<Geometry> + Sync,
{
    let zones: Vec<&ZoneId> = current.keys().chain(previous.keys()).collect::<BTreeSet<_>>().into_iter().collect();
    info!(zones = zones.len(), "diffing against previous release");

    let diffs: Vec<(ZoneId, ZoneDiff)> = zones
        .par_iter()
        .map(|zone| {
            let ops = ops.scoped(zone.as_str());
            let diff = diff_zone(
                &ops,
                current.get(*zone).map(Borrow::borrow),
                previous.get(*zone).map(Borrow::borrow),
            )
            .map_err(|err| match err {
                PipelineError::Geometry(err) => PipelineError::in_zone(zone, err),
                other => other,
            })?;
            debug!(zone = %zone, unchanged = diff.is_unchanged(), "zone diffed");
            Ok(((*zone).clone(), diff))
        })
        .collect::<Result<_, PipelineError>>()?;

    Ok(diffs.into_iter().filter(|(_, diff)| !diff.is_unchanged()).collect())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub changed_zone_count: usize,
    pub addition_count: usize,
    pub removal_count: usize,
}

/// Stream `additions.json` and `removals.json` into `dir`, one feature per
/// changed zone, in zone-id order.
pub fn write_release_diff(dir: &Path, diffs: &BTreeMap<ZoneId, ZoneDiff>) -> Result<DiffSummary, PipelineError> {
    let mut additions = FeatureWriter::create(&dir.join(ADDITIONS_FILE))?;
    let mut removals = FeatureWriter::create(&dir.join(REMOVALS_FILE))?;
    for (zone, diff) in diffs {
        if let Some(addition) = &diff.addition {
            additions.write_feature(&feature_value(zone.as_str(), addition))?;
        }
        if let Some(removal) = &diff.removal {
            removals.write_feature(&feature_value(zone.as_str(), removal))?;
        }
    }
    let summary = DiffSummary {
        changed_zone_count: diffs.len(),
        addition_count: additions.finish()?,
        removal_count: removals.finish()?,
    };
    info!(
        additions = summary.addition_count,
        removals = summary.removal_count,
        "wrote release diff"
    );
    Ok(summary)
}
