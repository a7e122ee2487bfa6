//! Error types for the build pipeline.

use thiserror::Error;
use tzb_config::{BuildNode, ConfigError};
use tzb_geometry::GeometryError;
use tzb_store::StoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The geometry recovery ladder was exhausted.
    #[error("{zone}: {source}")]
    Topology {
        zone: String,
        #[source]
        source: GeometryError,
    },

    /// A fetched source was never downloaded, or holds no boundary.
    #[error("missing source data for `{query_id}`: {reason}")]
    MissingSourceData { query_id: String, reason: String },

    /// A derived-zone source names a zone result that does not exist.
    #[error("{zone} depends on {dependency}, which has no result")]
    UnresolvedDependency { zone: String, dependency: BuildNode },

    #[error("invalid recipe for {zone}: {message}")]
    InvalidRecipe { zone: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl PipelineError {
    /// Attach the zone being built to a geometry failure.
    pub fn in_zone(zone: &impl ToString, err: GeometryError) -> Self {
        match err {
            topology @ GeometryError::Topology { .. } => PipelineError::Topology {
                zone: zone.to_string(),
                source: topology,
            },
            other => PipelineError::Geometry(other),
        }
    }

    /// Stable class name for reports.
    pub fn class(&self) -> &'static str {
        match self {
            PipelineError::Topology { .. } => "build.topology_failure",
            PipelineError::MissingSourceData { .. } => "build.missing_source_data",
            PipelineError::UnresolvedDependency { .. } => "build.unresolved_dependency",
            PipelineError::InvalidRecipe { .. } => "build.invalid_recipe",
            PipelineError::Config(_) => "build.config",
            PipelineError::Store(_) => "build.store",
            PipelineError::Geometry(_) => "build.geometry",
        }
    }
}
