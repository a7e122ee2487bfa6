//! Diagnostic artifacts written to a directory.

use crate::atomic::write_json_atomic;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tzb_geometry::DiagnosticSink;

/// Writes each artifact as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl DiagnosticSink for DirectorySink {
    fn persist(&self, name: &str, geojson: &Value) -> io::Result<PathBuf> {
        let path = self.path_for(name);
        write_json_atomic(&path, geojson).map_err(|e| io::Error::other(e.to_string()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tzb_geometry::{GeometryOps, geometry_from_value};

    #[test]
    fn persisted_artifact_is_readable_geojson() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("tzb-diag-{}-{unique}", std::process::id()));
        let sink = DirectorySink::new(&dir);
        let square = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
        });

        let ops = GeometryOps::new(Arc::new(sink.clone()));
        let path = ops
            .sink()
            .persist("Asia-Shanghai-Asia-Urumqi-overlap", &square)
            .expect("persist");
        assert_eq!(path, dir.join("Asia-Shanghai-Asia-Urumqi-overlap.json"));

        let text = std::fs::read_to_string(&path).expect("read");
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(geometry_from_value(&value).expect("geometry").polygon_count(), 1);

        let _ = std::fs::remove_dir_all(dir);
    }
}
