//! Where failing operands go before a topology failure propagates.

use serde_json::Value;
use std::io;
use std::path::PathBuf;

/// Persists GeoJSON artifacts for post-mortem debugging.
///
/// Implementations must be safe to call from several zone builds at once.
pub trait DiagnosticSink: Send + Sync {
    /// Write `geojson` under the artifact name `name` (no extension) and
    /// return the location written.
    fn persist(&self, name: &str, geojson: &Value) -> io::Result<PathBuf>;
}

/// A sink that refuses every artifact. Used where no diagnostic directory is
/// configured, e.g. in unit tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn persist(&self, name: &str, _geojson: &Value) -> io::Result<PathBuf> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no diagnostic directory configured for {name}"),
        ))
    }
}
