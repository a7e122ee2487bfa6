//! Error types for geometry operations.

use std::path::PathBuf;

/// Errors arising from geometry construction, decoding, or boolean algebra.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// The recovery ladder was exhausted. Both operands were handed to the
    /// diagnostic sink before this error was produced.
    #[error("topology failure in {op} after {attempts} attempt(s); diagnostics: {}", render_paths(.diagnostics))]
    Topology {
        op: &'static str,
        attempts: usize,
        diagnostics: Vec<PathBuf>,
    },

    /// GeoJSON input is malformed.
    #[error("invalid geojson: {0}")]
    InvalidGeoJson(String),

    /// GeoJSON input is well formed but not polygonal.
    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),
}

fn render_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<none>".to_string();
    }
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_error_lists_diagnostic_paths() {
        let err = GeometryError::Topology {
            op: "diff",
            attempts: 3,
            diagnostics: vec![PathBuf::from("debug_diff_a.json"), PathBuf::from("debug_diff_b.json")],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("diff after 3 attempt(s)"));
        assert!(rendered.contains("debug_diff_a.json, debug_diff_b.json"));
    }

    #[test]
    fn topology_error_without_diagnostics_says_none() {
        let err = GeometryError::Topology {
            op: "union",
            attempts: 2,
            diagnostics: Vec::new(),
        };
        assert!(err.to_string().ends_with("<none>"));
    }
}
