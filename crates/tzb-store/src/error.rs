//! Error types for on-disk persistence.

use std::path::Path;
use thiserror::Error;
use tzb_geometry::GeometryError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid content at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl StoreError {
    pub(crate) fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(path: &Path, err: impl std::fmt::Display) -> Self {
        StoreError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
