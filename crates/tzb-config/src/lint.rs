//! Deterministic configuration lint.
//!
//! Checks the cross-file contracts the builder relies on but does not
//! itself enforce: every fetched source is defined and used, every expected
//! overlap is documented and well formed, derived-zone references point at
//! configured zones, recipes start with `init`, and there are no dependency
//! cycles.

use crate::dependency::build_waves;
use crate::ocean::{OceanBand, check_band_tiling};
use crate::overlaps::ExpectedOverlaps;
use crate::recipe::{OperationKind, SourceRef, ZoneCatalog};
use crate::sources::BoundarySources;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const CONFIG_LINT_KIND: &str = "tzb.config.lint.v1";

pub mod failure_class {
    pub const SOURCE_UNDEFINED: &str = "config.source.undefined";
    pub const SOURCE_UNUSED: &str = "config.source.unused";
    pub const OVERLAP_DESCRIPTION_MISSING: &str = "config.overlap.description_missing";
    pub const OVERLAP_BOUNDS_INVERTED: &str = "config.overlap.bounds_inverted";
    pub const DERIVED_ZONE_UNKNOWN: &str = "config.recipe.derived_zone_unknown";
    pub const RECIPE_EMPTY: &str = "config.recipe.empty";
    pub const INIT_NOT_FIRST: &str = "config.recipe.init_not_first";
    pub const DEPENDENCY_CYCLE: &str = "config.recipe.dependency_cycle";
    pub const OCEAN_TILING: &str = "config.ocean.tiling";
}

pub mod warning_class {
    pub const OVERLAP_DUPLICATE_PAIR: &str = "config.overlap.duplicate_pair";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LintFinding {
    /// Zone, source id, or overlap key the finding is about.
    pub subject: String,
    pub class: String,
    pub message: String,
}

impl LintFinding {
    fn new(subject: impl Into<String>, class: &str, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            class: class.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LintSummary {
    pub zone_count: usize,
    pub source_count: usize,
    pub overlap_pair_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LintReport {
    pub check_kind: String,
    pub result: String,
    pub failure_classes: Vec<String>,
    pub warning_classes: Vec<String>,
    pub errors: Vec<LintFinding>,
    pub warnings: Vec<LintFinding>,
    pub summary: LintSummary,
}

impl LintReport {
    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

fn collect_classes(findings: &[LintFinding]) -> Vec<String> {
    findings
        .iter()
        .map(|finding| finding.class.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn lint_config(
    catalog: &ZoneCatalog,
    sources: &BoundarySources,
    overlaps: &ExpectedOverlaps,
    bands: &[OceanBand],
) -> LintReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut used_sources = BTreeSet::new();
    for (variant, zone, recipe) in catalog.iter() {
        let subject = match variant.subdirectory() {
            None => zone.to_string(),
            Some(dir) => format!("{zone}@{dir}"),
        };

        if recipe.operations.is_empty() {
            errors.push(LintFinding::new(
                &subject,
                failure_class::RECIPE_EMPTY,
                "recipe has no operations",
            ));
        }
        for (index, operation) in recipe.operations.iter().enumerate() {
            let is_init = operation.kind == OperationKind::Init;
            if is_init != (index == 0) {
                errors.push(LintFinding::new(
                    &subject,
                    failure_class::INIT_NOT_FIRST,
                    format!("operation {index} is `{}`; `init` must be first and only first", operation.kind),
                ));
            }
            match &operation.source {
                SourceRef::Fetched { query_id } => {
                    if sources.contains(query_id) {
                        used_sources.insert(query_id.clone());
                    } else {
                        errors.push(LintFinding::new(
                            &subject,
                            failure_class::SOURCE_UNDEFINED,
                            format!("no boundary source defined for `{query_id}`"),
                        ));
                    }
                }
                SourceRef::DerivedZone { zone_id, variant } => {
                    if !catalog.contains(*variant, zone_id) {
                        errors.push(LintFinding::new(
                            &subject,
                            failure_class::DERIVED_ZONE_UNKNOWN,
                            format!("references unconfigured zone `{zone_id}` ({variant})"),
                        ));
                    }
                }
                SourceRef::ManualPolygon { .. } | SourceRef::ManualMultiPolygon { .. } => {}
            }
        }
    }

    for id in sources.ids() {
        if !used_sources.contains(id) {
            errors.push(LintFinding::new(
                id,
                failure_class::SOURCE_UNUSED,
                "boundary source is never used in zone building",
            ));
        }
    }

    for (key, entries) in &overlaps.entries {
        for (index, entry) in entries.iter().enumerate() {
            if entry.description.trim().is_empty() {
                errors.push(LintFinding::new(
                    key,
                    failure_class::OVERLAP_DESCRIPTION_MISSING,
                    format!("entry {index} has no description"),
                ));
            }
            if !entry.bounds.is_ordered() {
                errors.push(LintFinding::new(
                    key,
                    failure_class::OVERLAP_BOUNDS_INVERTED,
                    format!("entry {index} has inverted bounds {}", entry.bounds),
                ));
            }
        }
    }
    for key in duplicate_pair_keys(overlaps) {
        warnings.push(LintFinding::new(
            key,
            warning_class::OVERLAP_DUPLICATE_PAIR,
            "pair is listed in both orders; lookups consult only one spelling",
        ));
    }

    if let Err(stuck) = build_waves(catalog) {
        for node in stuck {
            errors.push(LintFinding::new(
                node.to_string(),
                failure_class::DEPENDENCY_CYCLE,
                "zone is part of (or depends on) a derived-zone cycle",
            ));
        }
    }

    if let Err(message) = check_band_tiling(bands) {
        errors.push(LintFinding::new("ocean", failure_class::OCEAN_TILING, message));
    }

    let failure_classes = collect_classes(&errors);
    let warning_classes = collect_classes(&warnings);
    let result = if errors.is_empty() {
        "accepted".to_string()
    } else {
        "rejected".to_string()
    };
    let summary = LintSummary {
        zone_count: catalog.zone_count(),
        source_count: sources.len(),
        overlap_pair_count: overlaps.entries.len(),
        error_count: errors.len(),
        warning_count: warnings.len(),
    };

    LintReport {
        check_kind: CONFIG_LINT_KIND.to_string(),
        result,
        failure_classes,
        warning_classes,
        errors,
        warnings,
        summary,
    }
}

/// Second spellings (`b-a`) of pairs that are also listed as `a-b`.
///
/// Keys are split on every `-` position where both halves are non-empty;
/// zone ids such as `Etc/GMT-5` contain dashes themselves.
fn duplicate_pair_keys(overlaps: &ExpectedOverlaps) -> Vec<String> {
    let mut duplicates = BTreeSet::new();
    for key in overlaps.entries.keys() {
        for (split, _) in key.match_indices('-') {
            let (a, b) = (&key[..split], &key[split + 1..]);
            if a.is_empty() || b.is_empty() {
                continue;
            }
            let reversed = format!("{b}-{a}");
            if reversed != *key && overlaps.entries.contains_key(&reversed) && reversed > *key {
                duplicates.insert(reversed);
            }
        }
    }
    duplicates.into_iter().collect()
}
