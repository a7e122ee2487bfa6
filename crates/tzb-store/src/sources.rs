//! Downloaded boundary sources.

use crate::error::StoreError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read access to `<downloads>/<queryId>.json`.
///
/// A hand-corrected `<queryId>_fixed.json` is used when the plain download
/// is absent.
#[derive(Debug, Clone)]
pub struct SourceStore {
    dir: PathBuf,
}

impl SourceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file backing `query_id`, if any.
    pub fn locate(&self, query_id: &str) -> Option<PathBuf> {
        let plain = self.dir.join(format!("{query_id}.json"));
        if plain.is_file() {
            return Some(plain);
        }
        let fixed = self.dir.join(format!("{query_id}_fixed.json"));
        if fixed.is_file() {
            debug!(query_id, path = %fixed.display(), "using fixed source file");
            return Some(fixed);
        }
        None
    }

    /// Parsed source document, or `None` when it was never downloaded.
    pub fn read_value(&self, query_id: &str) -> Result<Option<(Value, Vec<u8>)>, StoreError> {
        let Some(path) = self.locate(query_id) else {
            return Ok(None);
        };
        let bytes = std::fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
        let value = serde_json::from_slice(&bytes).map_err(|e| StoreError::parse(&path, e))?;
        Ok(Some((value, bytes)))
    }
}
