//! Zone building: run each recipe through the geometry operations,
//! post-process, and write the per-zone output.
//!
//! Zones are scheduled in dependency waves. Zones of one wave run
//! concurrently on the rayon pool; a wave's results are published only
//! after the whole wave finished, so a build never reads a result that is
//! still being written.

use crate::error::PipelineError;
use crate::resolver::SourceResolver;
use crate::results::{ZoneResult, ZoneResults};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, info};
use tzb_config::{BuildNode, OperationKind, Recipe, ZoneCatalog, build_waves};
use tzb_geometry::{Geometry, GeometryOps, post_process};
use tzb_store::{Memoize, SourceStore, ZoneFiles, get_or_compute};

pub const BUILD_REPORT_KIND: &str = "tzb.build.v1";

/// Run `recipe` left to right. No post-processing.
pub fn run_recipe(
    ops: &GeometryOps,
    zone: &BuildNode,
    recipe: &Recipe,
    resolver: &SourceResolver<'_>,
) -> Result<Geometry, PipelineError> {
    let invalid = |message: String| PipelineError::InvalidRecipe {
        zone: zone.to_string(),
        message,
    };

    let mut accumulator: Option<Geometry> = None;
    for (index, operation) in recipe.operations.iter().enumerate() {
        debug!(zone = %zone, index, op = %operation.kind, source = operation.source.tag(), "recipe step");
        let operand = resolver.resolve(&operation.source)?;

        let next = match (operation.kind, accumulator.take()) {
            (OperationKind::Init, None) => Ok(operand),
            (OperationKind::Init, Some(_)) => {
                return Err(invalid(format!("operation {index}: `init` after the zone was initialized")));
            }
            (kind, None) => {
                return Err(invalid(format!("operation {index}: `{kind}` before `init`")));
            }
            (OperationKind::Intersect, Some(acc)) => ops.intersection(&acc, &operand),
            (OperationKind::Difference, Some(acc)) => ops.difference(&acc, &operand),
            (OperationKind::DifferenceReversed, Some(acc)) => ops.difference(&operand, &acc),
            (OperationKind::Union, Some(acc)) => ops.union(&acc, &operand),
        };
        accumulator = Some(next.map_err(|err| PipelineError::in_zone(zone, err))?);
    }
    accumulator.ok_or_else(|| invalid("recipe has no operations".to_string()))
}

/// Everything a zone build reads from and writes to.
pub struct ZoneBuilder<'a> {
    ops: GeometryOps,
    sources: &'a SourceStore,
    files: &'a ZoneFiles,
    memo: &'a dyn Memoize,
}

impl<'a> ZoneBuilder<'a> {
    pub fn new(ops: GeometryOps, sources: &'a SourceStore, files: &'a ZoneFiles, memo: &'a dyn Memoize) -> Self {
        Self {
            ops,
            sources,
            files,
            memo,
        }
    }

    /// Build one zone against the results published so far.
    pub fn build(&self, node: &BuildNode, recipe: &Recipe, built: &ZoneResults) -> Result<ZoneResult, PipelineError> {
        let ops = self.ops.scoped(node.zone.as_str());
        let resolver = SourceResolver::for_recipe(node, recipe, &ops, self.sources, built)?;
        let input = resolver.input_digest(recipe)?;
        let output = self.files.path(node.variant, &node.zone);

        let memoized = get_or_compute(
            self.memo,
            &node.to_string(),
            &input,
            &output,
            || Ok::<_, PipelineError>(self.files.read(node.variant, &node.zone)?),
            || {
                let raw = run_recipe(&ops, node, recipe, &resolver)?;
                let geometry = post_process(&raw);
                let digest = self.files.write(node.variant, &node.zone, &geometry)?;
                Ok(((geometry, digest.clone()), digest))
            },
        )?;
        let reused = memoized.was_reused();
        let (geometry, digest) = memoized.into_inner();
        Ok(ZoneResult {
            geometry,
            digest,
            reused,
        })
    }

    /// Build every zone of the catalog.
    ///
    /// A failed zone produces no result; zones that depend on it then fail
    /// with [`PipelineError::UnresolvedDependency`]. Independent zones are
    /// still built. Only a dependency cycle aborts before building.
    pub fn build_all(&self, catalog: &ZoneCatalog) -> Result<BuildOutcome, PipelineError> {
        let waves = build_waves(catalog).map_err(|stuck| PipelineError::InvalidRecipe {
            zone: stuck.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            message: "derived-zone dependency cycle".to_string(),
        })?;

        let total = catalog.zone_count();
        let done = AtomicUsize::new(0);
        let mut results = ZoneResults::new();
        let mut failures = BTreeMap::new();
        info!(zones = total, waves = waves.len(), "building zones");

        for wave in waves {
            let outcomes: Vec<(BuildNode, Result<ZoneResult, PipelineError>)> = wave
                .par_iter()
                .map(|node| {
                    let outcome = catalog
                        .get(node.variant)
                        .and_then(|recipes| recipes.get(&node.zone))
                        .ok_or_else(|| PipelineError::InvalidRecipe {
                            zone: node.to_string(),
                            message: "zone vanished from the catalog".to_string(),
                        })
                        .and_then(|recipe| self.build(node, recipe, &results));
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    match &outcome {
                        Ok(result) => info!(
                            zone = %node,
                            reused = result.reused,
                            polygons = result.geometry.polygon_count(),
                            "[{finished}/{total}] built"
                        ),
                        Err(err) => error!(zone = %node, error = %err, "[{finished}/{total}] failed"),
                    }
                    (node.clone(), outcome)
                })
                .collect();

            for (node, outcome) in outcomes {
                match outcome {
                    Ok(result) => results.insert(node, result),
                    Err(err) => {
                        failures.insert(node, err);
                    }
                }
            }
        }

        Ok(BuildOutcome { results, failures })
    }
}

/// Results and failures of [`ZoneBuilder::build_all`].
#[derive(Debug)]
pub struct BuildOutcome {
    pub results: ZoneResults,
    pub failures: BTreeMap<BuildNode, PipelineError>,
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn report(&self) -> BuildReport {
        let failures: Vec<BuildFailure> = self
            .failures
            .iter()
            .map(|(node, err)| BuildFailure {
                zone: node.to_string(),
                class: err.class().to_string(),
                message: err.to_string(),
            })
            .collect();
        let failure_classes = failures
            .iter()
            .map(|failure| failure.class.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let reused_count = self.results.iter().filter(|(_, result)| result.reused).count();
        let summary = BuildSummary {
            zone_count: self.results.len() + self.failures.len(),
            built_count: self.results.len() - reused_count,
            reused_count,
            failed_count: self.failures.len(),
        };
        BuildReport {
            check_kind: BUILD_REPORT_KIND.to_string(),
            result: if failures.is_empty() { "accepted" } else { "rejected" }.to_string(),
            failure_classes,
            failures,
            summary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildFailure {
    pub zone: String,
    pub class: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub zone_count: usize,
    pub built_count: usize,
    pub reused_count: usize,
    pub failed_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub check_kind: String,
    pub result: String,
    pub failure_classes: Vec<String>,
    pub failures: Vec<BuildFailure>,
    pub summary: BuildSummary,
}

impl BuildReport {
    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tzb_config::{Operation, SourceRef};

    fn square(x: f64, y: f64, size: f64) -> SourceRef {
        SourceRef::ManualPolygon {
            coordinates: vec![vec![
                [x, y],
                [x + size, y],
                [x + size, y + size],
                [x, y + size],
                [x, y],
            ]],
        }
    }

    fn run(recipe: &Recipe) -> Result<Geometry, PipelineError> {
        let node = BuildNode::base("Etc/Test");
        let ops = GeometryOps::default();
        let store = SourceStore::new(std::env::temp_dir().join("tzb-no-downloads"));
        let built = ZoneResults::new();
        let resolver = SourceResolver::for_recipe(&node, recipe, &ops, &store, &built)?;
        run_recipe(&ops, &node, recipe, &resolver)
    }

    #[test]
    fn each_operation_kind_dispatches() {
        let base = Operation::new(OperationKind::Init, square(0.0, 0.0, 2.0));
        let cases = [
            (OperationKind::Union, 4.0 + 3.0),
            (OperationKind::Intersect, 1.0),
            (OperationKind::Difference, 3.0),
            (OperationKind::DifferenceReversed, 3.0),
        ];
        for (kind, expected) in cases {
            let recipe = Recipe::new(vec![base.clone(), Operation::new(kind, square(1.0, 1.0, 2.0))]);
            let area = run(&recipe).expect("recipe").planar_area();
            assert!((area - expected).abs() < 1e-9, "{kind}: area {area}, expected {expected}");
        }
    }

    #[test]
    fn operation_before_init_is_invalid() {
        let recipe = Recipe::new(vec![Operation::new(OperationKind::Union, square(0.0, 0.0, 1.0))]);
        assert!(matches!(run(&recipe), Err(PipelineError::InvalidRecipe { .. })));
    }

    #[test]
    fn second_init_is_invalid() {
        let recipe = Recipe::new(vec![
            Operation::new(OperationKind::Init, square(0.0, 0.0, 1.0)),
            Operation::new(OperationKind::Init, square(2.0, 0.0, 1.0)),
        ]);
        let err = run(&recipe).expect_err("second init");
        assert!(err.to_string().contains("`init` after"));
    }

    #[test]
    fn empty_recipe_is_invalid() {
        assert!(matches!(run(&Recipe::default()), Err(PipelineError::InvalidRecipe { .. })));
    }

    #[test]
    fn missing_download_is_missing_source_data() {
        let recipe = Recipe::new(vec![Operation::new(
            OperationKind::Init,
            SourceRef::Fetched {
                query_id: "Never Downloaded".to_string(),
            },
        )]);
        assert!(matches!(
            run(&recipe),
            Err(PipelineError::MissingSourceData { ref query_id, .. }) if query_id == "Never Downloaded"
        ));
    }
}
