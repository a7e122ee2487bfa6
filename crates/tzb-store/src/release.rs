//! Previously published releases, as input to release diffs.

use crate::error::StoreError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tzb_config::ZoneId;
use tzb_geometry::{Geometry, geometry_from_value};

/// Load a release FeatureCollection into `tzid -> geometry`.
pub fn load_release(path: &Path) -> Result<BTreeMap<ZoneId, Geometry>, StoreError> {
    let bytes = std::fs::read(path).map_err(|e| StoreError::io(path, e))?;
    let document: Value = serde_json::from_slice(&bytes).map_err(|e| StoreError::parse(path, e))?;
    parse_release(&document).map_err(|message| StoreError::parse(path, message))
}

/// Features without a `tzid` property are rejected; a zone listed twice
/// keeps its last geometry.
pub fn parse_release(document: &Value) -> Result<BTreeMap<ZoneId, Geometry>, String> {
    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| "expected a FeatureCollection with `features`".to_string())?;

    let mut zones = BTreeMap::new();
    for (index, feature) in features.iter().enumerate() {
        let tzid = feature
            .pointer("/properties/tzid")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("feature {index} has no `tzid` property"))?;
        let geometry = geometry_from_value(feature).map_err(|e| format!("feature {index} ({tzid}): {e}"))?;
        zones.insert(ZoneId::new(tzid), geometry);
    }
    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tzb_geometry::{Bounds, feature_value};

    #[test]
    fn release_features_are_keyed_by_tzid() {
        let square = Geometry::rectangle(Bounds::new(0.0, 0.0, 1.0, 1.0));
        let document = json!({
            "type": "FeatureCollection",
            "features": [feature_value("Europe/Paris", &square), feature_value("Etc/GMT", &square)]
        });
        let zones = parse_release(&document).expect("release");
        assert_eq!(
            zones.keys().map(ZoneId::as_str).collect::<Vec<_>>(),
            vec!["Etc/GMT", "Europe/Paris"]
        );
        assert_eq!(zones[&ZoneId::new("Europe/Paris")], square);
    }

    #[test]
    fn feature_without_tzid_is_rejected() {
        let document = json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "properties": {}, "geometry": null }]
        });
        let err = parse_release(&document).expect_err("no tzid");
        assert!(err.contains("feature 0"));
    }
}
