//! Pairwise overlap validation.
//!
//! Every unordered pair of land zones is checked. A pair passes when its
//! intersection is below [`OVERLAP_NOISE_AREA`], or when every constituent
//! polygon of the intersection above [`MINOR_OVERLAP_AREA_M2`] fits inside
//! one of the pair's expected-overlap boxes. Box containment is checked on
//! the constituent's bounding box, not its shape.
//!
//! Pairs are independent and checked concurrently; all of them are checked
//! even after a failure.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info, warn};
use tzb_config::{ExpectedOverlaps, ZoneId};
use tzb_geometry::{Bounds, Geometry, GeometryOps, geometry_to_value};

pub const VALIDATION_CHECK_KIND: &str = "tzb.validation.overlap.v1";

/// Intersections with less planar area (square degrees) are noise.
pub const OVERLAP_NOISE_AREA: f64 = 1e-4;

/// Constituent overlaps with less spherical area (m²) are ignored.
pub const MINOR_OVERLAP_AREA_M2: f64 = 10.0;

pub mod failure_class {
    /// The pair has no expected-overlap entry at all.
    pub const UNEXPECTED: &str = "validation.overlap.unexpected";
    /// Some constituent is outside every expected-overlap box.
    pub const OUTSIDE_ALLOWED_BOUNDS: &str = "validation.overlap.outside_allowed_bounds";
    /// The intersection itself could not be computed.
    pub const INTERSECTION_FAILED: &str = "validation.overlap.intersection_failed";
}

pub mod warning_class {
    pub const INTERSECTS_FAILED: &str = "validation.intersects.failed";
}

/// One constituent polygon of an offending intersection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlapRegion {
    pub area_m2: f64,
    pub bounds: Bounds,
    /// `bounds` rounded outward to a tenth of a degree, ready for an
    /// expected-overlap entry.
    pub suggested_bounds: Bounds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlapFailure {
    pub zone_a: ZoneId,
    pub zone_b: ZoneId,
    pub class: String,
    pub message: String,
    /// Planar area of the whole intersection.
    pub area: f64,
    pub regions: Vec<OverlapRegion>,
    /// Where the intersection geometry was dumped, if it was.
    pub diagnostic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub zone_a: ZoneId,
    pub zone_b: ZoneId,
    pub class: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub zone_count: usize,
    pub pair_count: usize,
    /// Pairs whose bounding boxes overlap.
    pub candidate_pair_count: usize,
    pub failure_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub check_kind: String,
    pub result: String,
    pub failure_classes: Vec<String>,
    pub warning_classes: Vec<String>,
    pub failures: Vec<OverlapFailure>,
    pub warnings: Vec<ValidationWarning>,
    pub diagnostics: Vec<String>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

enum PairOutcome {
    Failure(OverlapFailure),
    Warning(ValidationWarning),
}

/// Check every unordered pair of `zones`.
pub fn validate_overlaps<G>(
    ops: &GeometryOps,
    zones: &BTreeMap<ZoneId, G>,
    expected: &ExpectedOverlaps,
) -> ValidationReport
where
    G: Borrow<Geometry> + Sync,
{
    let entries: Vec<(&ZoneId, &Geometry, Option<Bounds>)> = zones
        .iter()
        .map(|(zone, geometry)| {
            let geometry = geometry.borrow();
            (zone, geometry, geometry.bounds())
        })
        .collect();

    let n = entries.len();
    let pair_count = n * n.saturating_sub(1) / 2;
    let candidates: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .filter(|&(i, j)| match (entries[i].2, entries[j].2) {
            (Some(a), Some(b)) => a.intersects(&b),
            _ => false,
        })
        .collect();
    info!(zones = n, pairs = pair_count, candidates = candidates.len(), "validating zone overlaps");

    let checked = AtomicUsize::new(0);
    let total = candidates.len();
    let outcomes: Vec<Option<PairOutcome>> = candidates
        .par_iter()
        .map(|&(i, j)| {
            let (zone_a, a, _) = entries[i];
            let (zone_b, b, _) = entries[j];
            let outcome = check_pair(ops, zone_a, a, zone_b, b, expected);
            let done = checked.fetch_add(1, Ordering::Relaxed) + 1;
            if total >= 10 && done % (total / 10) == 0 {
                info!("[{done}/{total}] pairs validated");
            }
            outcome
        })
        .collect();

    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    for outcome in outcomes.into_iter().flatten() {
        match outcome {
            PairOutcome::Failure(failure) => failures.push(failure),
            PairOutcome::Warning(warning) => warnings.push(warning),
        }
    }

    let failure_classes = sorted_classes(failures.iter().map(|f| f.class.as_str()));
    let warning_classes = sorted_classes(warnings.iter().map(|w| w.class.as_str()));
    let diagnostics = failures
        .iter()
        .filter_map(|failure| failure.diagnostic.clone())
        .collect();
    let summary = ValidationSummary {
        zone_count: n,
        pair_count,
        candidate_pair_count: total,
        failure_count: failures.len(),
        warning_count: warnings.len(),
    };
    if failures.is_empty() {
        info!(warnings = warnings.len(), "zone validation passed");
    } else {
        error!(failures = failures.len(), "zone validation unsuccessful");
    }

    ValidationReport {
        check_kind: VALIDATION_CHECK_KIND.to_string(),
        result: if failures.is_empty() { "accepted" } else { "rejected" }.to_string(),
        failure_classes,
        warning_classes,
        failures,
        warnings,
        diagnostics,
        summary,
    }
}

fn sorted_classes<'a>(classes: impl Iterator<Item = &'a str>) -> Vec<String> {
    classes
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn check_pair(
    ops: &GeometryOps,
    zone_a: &ZoneId,
    a: &Geometry,
    zone_b: &ZoneId,
    b: &Geometry,
    expected: &ExpectedOverlaps,
) -> Option<PairOutcome> {
    let pair_ops = ops.scoped(&format!("{zone_a}-{zone_b}"));
    match pair_ops.intersects(a, b) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(err) => {
            warn!(zone_a = %zone_a, zone_b = %zone_b, error = %err, "intersects check failed, treating pair as disjoint");
            return Some(PairOutcome::Warning(ValidationWarning {
                zone_a: zone_a.clone(),
                zone_b: zone_b.clone(),
                class: warning_class::INTERSECTS_FAILED.to_string(),
                message: err.to_string(),
            }));
        }
    }

    let intersection = match pair_ops.intersection(a, b) {
        Ok(intersection) => intersection,
        Err(err) => {
            error!(zone_a = %zone_a, zone_b = %zone_b, error = %err, "intersection failed");
            return Some(PairOutcome::Failure(OverlapFailure {
                zone_a: zone_a.clone(),
                zone_b: zone_b.clone(),
                class: failure_class::INTERSECTION_FAILED.to_string(),
                message: err.to_string(),
                area: 0.0,
                regions: Vec::new(),
                diagnostic: None,
            }));
        }
    };

    let area = intersection.planar_area();
    if area <= OVERLAP_NOISE_AREA {
        return None;
    }

    let allowed = expected.lookup(zone_a, zone_b);
    let regions: Vec<OverlapRegion> = intersection
        .polygons()
        .filter_map(|polygon| {
            let constituent = Geometry::from_polygon(polygon.clone());
            let area_m2 = constituent.spherical_area();
            let bounds = constituent.bounds()?;
            let significant = area_m2 > MINOR_OVERLAP_AREA_M2;
            let covered = expected.allows(zone_a, zone_b, &bounds);
            (allowed.is_empty() || (significant && !covered)).then(|| OverlapRegion {
                area_m2,
                bounds,
                suggested_bounds: bounds.rounded_outward(),
            })
        })
        .collect();

    if !allowed.is_empty() && regions.is_empty() {
        return None;
    }

    for region in &regions {
        error!(
            zone_a = %zone_a,
            zone_b = %zone_b,
            area_m2 = region.area_m2,
            "unexpected intersection with bounds: {}",
            region.suggested_bounds
        );
    }
    error!(zone_a = %zone_a, zone_b = %zone_b, area, "validation error: {zone_a} intersects {zone_b}");

    let name = format!("{}-{}-overlap", zone_a.diagnostic_stem(), zone_b.diagnostic_stem());
    let diagnostic = match ops.sink().persist(&name, &geometry_to_value(&intersection)) {
        Ok(path) => {
            error!(path = %path.display(), "wrote overlap area");
            Some(path.display().to_string())
        }
        Err(err) => {
            warn!(artifact = %name, error = %err, "overlap area not persisted");
            None
        }
    };

    let (class, message) = if allowed.is_empty() {
        (
            failure_class::UNEXPECTED,
            format!("{zone_a} intersects {zone_b} (area {area}) with no expected overlap listed"),
        )
    } else {
        (
            failure_class::OUTSIDE_ALLOWED_BOUNDS,
            format!(
                "{zone_a} intersects {zone_b}: {} region(s) outside the expected overlap bounds",
                regions.len()
            ),
        )
    };

    Some(PairOutcome::Failure(OverlapFailure {
        zone_a: zone_a.clone(),
        zone_b: zone_b.clone(),
        class: class.to_string(),
        message,
        area,
        regions,
        diagnostic,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tzb_config::ExpectedOverlap;

    fn square(x: f64, y: f64) -> Geometry {
        Geometry::rectangle(Bounds::new(x, y, x + 1.0, y + 1.0))
    }

    fn zones(pairs: &[(&str, Geometry)]) -> BTreeMap<ZoneId, Geometry> {
        pairs
            .iter()
            .map(|(zone, geometry)| (ZoneId::new(*zone), geometry.clone()))
            .collect()
    }

    #[test]
    fn separated_squares_pass() {
        let zones = zones(&[("A/One", square(0.0, 0.0)), ("A/Two", square(2.0, 0.0))]);
        let report = validate_overlaps(&GeometryOps::default(), &zones, &ExpectedOverlaps::default());
        assert!(report.accepted());
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.summary.pair_count, 1);
        assert_eq!(report.summary.candidate_pair_count, 0);
    }

    #[test]
    fn shared_edge_is_not_an_overlap() {
        let zones = zones(&[("A/One", square(0.0, 0.0)), ("A/Two", square(1.0, 0.0))]);
        let report = validate_overlaps(&GeometryOps::default(), &zones, &ExpectedOverlaps::default());
        assert!(report.accepted());
    }

    #[test]
    fn unlisted_overlap_fails_with_suggested_bounds() {
        let zones = zones(&[("A/One", square(0.0, 0.0)), ("A/Two", square(0.5, 0.0))]);
        let report = validate_overlaps(&GeometryOps::default(), &zones, &ExpectedOverlaps::default());
        assert!(!report.accepted());
        assert_eq!(report.failure_classes, vec![failure_class::UNEXPECTED.to_string()]);
        let failure = &report.failures[0];
        assert!((failure.area - 0.5).abs() < 1e-9);
        assert_eq!(failure.regions.len(), 1);
        let region = &failure.regions[0];
        assert!(region.suggested_bounds.contains(&region.bounds));
        assert!(Bounds::new(0.4, -0.1, 1.1, 1.1).contains(&region.suggested_bounds));
        // The default sink refuses artifacts.
        assert_eq!(failure.diagnostic, None);
    }

    #[test]
    fn listed_overlap_inside_bounds_passes() {
        let zones = zones(&[("A/One", square(0.0, 0.0)), ("A/Two", square(0.5, 0.0))]);
        let mut expected = ExpectedOverlaps::default();
        expected.insert(
            &ZoneId::new("A/Two"),
            &ZoneId::new("A/One"),
            ExpectedOverlap {
                description: "disputed strip".to_string(),
                bounds: Bounds::new(0.4, -0.1, 1.1, 1.1),
            },
        );
        let report = validate_overlaps(&GeometryOps::default(), &zones, &expected);
        assert!(report.accepted(), "failures: {:?}", report.failures);
    }

    #[test]
    fn listed_overlap_outside_bounds_fails() {
        let zones = zones(&[("A/One", square(0.0, 0.0)), ("A/Two", square(0.5, 0.0))]);
        let mut expected = ExpectedOverlaps::default();
        expected.insert(
            &ZoneId::new("A/One"),
            &ZoneId::new("A/Two"),
            ExpectedOverlap {
                description: "too small".to_string(),
                bounds: Bounds::new(0.5, 0.0, 0.8, 1.0),
            },
        );
        let report = validate_overlaps(&GeometryOps::default(), &zones, &expected);
        assert_eq!(report.failure_classes, vec![failure_class::OUTSIDE_ALLOWED_BOUNDS.to_string()]);
    }

    #[test]
    fn every_failing_pair_is_reported() {
        let zones = zones(&[
            ("A/One", square(0.0, 0.0)),
            ("A/Two", square(0.5, 0.0)),
            ("B/One", square(10.0, 0.0)),
            ("B/Two", square(10.0, 0.5)),
        ]);
        let report = validate_overlaps(&GeometryOps::default(), &zones, &ExpectedOverlaps::default());
        let pairs: Vec<(&str, &str)> = report
            .failures
            .iter()
            .map(|failure| (failure.zone_a.as_str(), failure.zone_b.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A/One", "A/Two"), ("B/One", "B/Two")]);
        assert_eq!(report.summary.pair_count, 6);
    }
}
