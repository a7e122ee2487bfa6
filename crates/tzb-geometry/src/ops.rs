//! Boolean operations with the topology-failure recovery ladder.
//!
//! Ladder for union / intersection / difference:
//!
//! 1. run at input precision;
//! 2. on a topology failure, snap both operands to the 1e-6 grid and rerun;
//! 3. with [`Recovery::AllowBuffer`] only, buffer both snapped operands by
//!    [`BUFFER_DISTANCE`], snap again and rerun;
//! 4. otherwise persist both original operands through the
//!    [`DiagnosticSink`] and return [`GeometryError::Topology`].
//!
//! The planar kernel (`geo`) does not report robustness problems as values.
//! A failure is therefore detected as a panic inside the kernel, a
//! non-finite coordinate in the result, or a result whose area breaks the
//! algebra of the operation (e.g. a union smaller than one of its operands).
//! Operand areas for that check are taken after the kernel has normalised
//! any invalid operand, so a self-intersecting ring is measured by the
//! region it encloses rather than by its shoelace sum.

use crate::diagnostics::{DiagnosticSink, NullSink};
use crate::error::GeometryError;
use crate::geojson::geometry_to_value;
use crate::geometry::Geometry;
use geo::{Area, BooleanOps, Buffer, Intersects, MultiPolygon, Validation};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Outward buffer applied at the last ladder step and before release diffs.
pub const BUFFER_DISTANCE: f64 = 0.01;

/// Relative slack allowed when checking result areas against operand areas.
const AREA_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
}

impl BooleanOp {
    /// Short name used in logs and diagnostic artifact names.
    pub fn name(self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Intersection => "intersection",
            BooleanOp::Difference => "diff",
        }
    }

    fn apply(self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        match self {
            BooleanOp::Union => a.union(b),
            BooleanOp::Intersection => a.intersection(b),
            BooleanOp::Difference => a.difference(b),
        }
    }

    fn area_consistent(self, a: f64, b: f64, result: f64) -> bool {
        let slack = AREA_TOLERANCE * (a + b) + f64::EPSILON;
        match self {
            BooleanOp::Union => result + slack >= a.max(b) && result <= a + b + slack,
            BooleanOp::Intersection => result <= a.min(b) + slack,
            BooleanOp::Difference => result <= a + slack && result + slack >= a - b,
        }
    }
}

/// How far the ladder may escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recovery {
    /// Input precision, then the precision grid.
    #[default]
    Standard,
    /// As `Standard`, then buffered operands on the precision grid.
    AllowBuffer,
}

/// Pure boolean operations over [`Geometry`] values.
///
/// Cloning is cheap; clones share the diagnostic sink.
#[derive(Clone)]
pub struct GeometryOps {
    sink: Arc<dyn DiagnosticSink>,
    label: Option<String>,
}

impl Default for GeometryOps {
    fn default() -> Self {
        Self::new(Arc::new(NullSink))
    }
}

impl GeometryOps {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink, label: None }
    }

    /// A copy whose diagnostic artifacts are additionally tagged with
    /// `label` (typically the zone being built).
    pub fn scoped(&self, label: &str) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            label: Some(label.replace('/', "-")),
        }
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    pub fn union(&self, a: &Geometry, b: &Geometry) -> Result<Geometry, GeometryError> {
        self.apply(BooleanOp::Union, a, b, Recovery::Standard)
    }

    pub fn intersection(&self, a: &Geometry, b: &Geometry) -> Result<Geometry, GeometryError> {
        self.apply(BooleanOp::Intersection, a, b, Recovery::Standard)
    }

    pub fn difference(&self, a: &Geometry, b: &Geometry) -> Result<Geometry, GeometryError> {
        self.apply(BooleanOp::Difference, a, b, Recovery::Standard)
    }

    /// Run `op` through the recovery ladder.
    pub fn apply(
        &self,
        op: BooleanOp,
        a: &Geometry,
        b: &Geometry,
        recovery: Recovery,
    ) -> Result<Geometry, GeometryError> {
        self.ladder(op, a, b, recovery, |op, a, b| op.apply(a, b))
    }

    /// Whether the two geometries share any point.
    ///
    /// A kernel failure is retried once on the precision grid. No diagnostic
    /// artifacts are written for this predicate.
    pub fn intersects(&self, a: &Geometry, b: &Geometry) -> Result<bool, GeometryError> {
        let probe = |a: &Geometry, b: &Geometry| {
            catch_unwind(AssertUnwindSafe(|| {
                a.as_multi_polygon().intersects(b.as_multi_polygon())
            }))
            .map_err(panic_message)
        };
        match probe(a, b) {
            Ok(hit) => return Ok(hit),
            Err(reason) => warn!(
                op = "intersects",
                label = self.label.as_deref().unwrap_or(""),
                %reason,
                "topology failure, retrying on the precision grid"
            ),
        }
        probe(&a.snapped(), &b.snapped()).map_err(|reason| {
            warn!(op = "intersects", %reason, "topology failure on the precision grid");
            GeometryError::Topology {
                op: "intersects",
                attempts: 2,
                diagnostics: Vec::new(),
            }
        })
    }

    /// Buffer outward by `distance` degrees.
    pub fn buffer(&self, geometry: &Geometry, distance: f64) -> Result<Geometry, GeometryError> {
        raw_buffer(geometry, distance).map_err(|reason| {
            error!(op = "buffer", %reason, "buffer failed");
            let diagnostics = self
                .persist_operand("buffer", "a", geometry)
                .into_iter()
                .collect();
            GeometryError::Topology {
                op: "buffer",
                attempts: 1,
                diagnostics,
            }
        })
    }

    fn ladder<K>(
        &self,
        op: BooleanOp,
        a: &Geometry,
        b: &Geometry,
        recovery: Recovery,
        kernel: K,
    ) -> Result<Geometry, GeometryError>
    where
        K: Fn(BooleanOp, &MultiPolygon<f64>, &MultiPolygon<f64>) -> MultiPolygon<f64>,
    {
        let label = self.label.as_deref().unwrap_or("");
        debug!(op = op.name(), label, "geometry operation");

        let mut attempts = 1;
        match attempt(op, a, b, &kernel) {
            Ok(result) => return Ok(result),
            Err(reason) => warn!(
                op = op.name(),
                label,
                %reason,
                "topology failure, retrying on the precision grid"
            ),
        }

        let snapped_a = a.snapped();
        let snapped_b = b.snapped();
        attempts += 1;
        match attempt(op, &snapped_a, &snapped_b, &kernel) {
            Ok(result) => return Ok(result),
            Err(reason) => warn!(
                op = op.name(),
                label,
                %reason,
                "topology failure after reducing precision"
            ),
        }

        if recovery == Recovery::AllowBuffer {
            attempts += 1;
            warn!(op = op.name(), label, "retrying with buffered operands");
            let buffered = raw_buffer(&snapped_a, BUFFER_DISTANCE)
                .and_then(|ba| raw_buffer(&snapped_b, BUFFER_DISTANCE).map(|bb| (ba, bb)));
            match buffered {
                Ok((buffered_a, buffered_b)) => {
                    match attempt(op, &buffered_a.snapped(), &buffered_b.snapped(), &kernel) {
                        Ok(result) => return Ok(result),
                        Err(reason) => warn!(
                            op = op.name(),
                            label,
                            %reason,
                            "topology failure after buffering"
                        ),
                    }
                }
                Err(reason) => warn!(op = op.name(), label, %reason, "buffering failed"),
            }
        }

        Err(self.fail(op.name(), attempts, a, b))
    }

    fn fail(&self, op: &'static str, attempts: usize, a: &Geometry, b: &Geometry) -> GeometryError {
        let diagnostics: Vec<_> = [("a", a), ("b", b)]
            .into_iter()
            .filter_map(|(suffix, operand)| self.persist_operand(op, suffix, operand))
            .collect();
        error!(
            op,
            attempts,
            artifacts = diagnostics.len(),
            "recovery ladder exhausted"
        );
        GeometryError::Topology {
            op,
            attempts,
            diagnostics,
        }
    }

    fn persist_operand(&self, op: &str, suffix: &str, operand: &Geometry) -> Option<std::path::PathBuf> {
        let name = match &self.label {
            Some(label) => format!("debug_{op}_{label}_{suffix}"),
            None => format!("debug_{op}_{suffix}"),
        };
        match self.sink.persist(&name, &geometry_to_value(operand)) {
            Ok(path) => Some(path),
            Err(err) => {
                error!(artifact = %name, error = %err, "failed to persist diagnostic operand");
                None
            }
        }
    }
}

fn attempt<K>(op: BooleanOp, a: &Geometry, b: &Geometry, kernel: &K) -> Result<Geometry, String>
where
    K: Fn(BooleanOp, &MultiPolygon<f64>, &MultiPolygon<f64>) -> MultiPolygon<f64>,
{
    let raw = catch_unwind(AssertUnwindSafe(|| {
        kernel(op, a.as_multi_polygon(), b.as_multi_polygon())
    }))
    .map_err(panic_message)?;
    let result = Geometry::new(raw);
    if !result.is_finite() {
        return Err("non-finite coordinate in result".to_string());
    }
    let (area_a, area_b) = (reference_area(a)?, reference_area(b)?);
    let area_r = result.planar_area();
    if !op.area_consistent(area_a, area_b, area_r) {
        return Err(format!(
            "result area {area_r} inconsistent with operand areas {area_a} and {area_b}"
        ));
    }
    Ok(result)
}

/// Area of `operand` as the kernel resolves it. Valid operands are measured
/// directly; invalid ones (self-intersections, bowties) are first passed
/// through a union with the empty geometry.
fn reference_area(operand: &Geometry) -> Result<f64, String> {
    let inner = operand.as_multi_polygon();
    if inner.is_valid() {
        return Ok(inner.unsigned_area());
    }
    catch_unwind(AssertUnwindSafe(|| {
        inner.union(&MultiPolygon::new(Vec::new())).unsigned_area()
    }))
    .map_err(panic_message)
}

fn raw_buffer(geometry: &Geometry, distance: f64) -> Result<Geometry, String> {
    catch_unwind(AssertUnwindSafe(|| geometry.as_multi_polygon().buffer(distance)))
        .map(Geometry::new)
        .map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "geometry kernel panicked".to_string()
    }
}
