//! # tzb-geometry
//!
//! The geometry kernel for timezone boundary building.
//!
//! Every value here is immutable: operations return new geometries and
//! never edit their operands. Planar boolean algebra itself is delegated to
//! `geo`; this crate owns the parts that sit around it.
//!
//! ## Architecture
//!
//! ```text
//! Geometry              ← Polygon/MultiPolygon value (lon/lat degrees)
//!     │
//! precision             ← 1e-6 degree grid snapping
//!     │
//! GeometryOps           ← union / intersection / difference / intersects
//!     │                   with the snap-then-buffer recovery ladder
//! post_process          ← sliver/hole filtering + grid snap
//!     │
//! geojson               ← serde_json codec at the file boundary
//! ```

pub mod bounds;
pub mod diagnostics;
pub mod error;
pub mod geojson;
pub mod geometry;
pub mod ops;
pub mod post_process;
pub mod precision;

pub use bounds::Bounds;
pub use diagnostics::{DiagnosticSink, NullSink};
pub use error::GeometryError;
pub use geojson::{feature_value, geometry_from_value, geometry_to_value};
pub use geometry::Geometry;
pub use ops::{BUFFER_DISTANCE, BooleanOp, GeometryOps, Recovery};
pub use post_process::{MIN_POLYGON_AREA_M2, MIN_RING_AREA_M2, post_process};
pub use precision::{PRECISION_SCALE, snap_coord};
