//! Streaming GeoJSON FeatureCollection writer.
//!
//! Features are serialized one at a time, so a combined output never has to
//! exist in memory as a whole. The collection is written to a temp file and
//! renamed into place by [`FeatureWriter::finish`]; dropping an unfinished
//! writer leaves the destination untouched.

use crate::atomic::{commit, ensure_parent, rename_into_place, tmp_write_path};
use crate::error::StoreError;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tzb_geometry::{Geometry, feature_value};

const HEADER: &[u8] = br#"{"type":"FeatureCollection","features":["#;
const FOOTER: &[u8] = b"]}\n";

pub struct FeatureWriter {
    path: PathBuf,
    tmp_path: PathBuf,
    writer: Option<BufWriter<File>>,
    count: usize,
}

impl FeatureWriter {
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        ensure_parent(path)?;
        let tmp_path = tmp_write_path(path);
        let file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(HEADER)
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            tmp_path,
            writer: Some(writer),
            count: 0,
        })
    }

    /// Append a feature with a `tzid` property.
    pub fn write_zone(&mut self, tzid: &str, geometry: &Geometry) -> Result<(), StoreError> {
        self.write_feature(&feature_value(tzid, geometry))
    }

    /// Append an arbitrary feature object.
    pub fn write_feature(&mut self, feature: &Value) -> Result<(), StoreError> {
        let tmp_path = &self.tmp_path;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| StoreError::io(tmp_path, "writer already finished"))?;
        if self.count > 0 {
            writer.write_all(b",").map_err(|e| StoreError::io(tmp_path, e))?;
        }
        serde_json::to_writer(&mut *writer, feature)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Close the collection and move it into place. Returns the number of
    /// features written.
    pub fn finish(mut self) -> Result<usize, StoreError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(self.count);
        };
        writer
            .write_all(FOOTER)
            .map_err(|e| StoreError::io(&self.tmp_path, e))?;
        commit(writer, &self.tmp_path)?;
        rename_into_place(&self.tmp_path, &self.path)?;
        Ok(self.count)
    }
}

impl Drop for FeatureWriter {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}
