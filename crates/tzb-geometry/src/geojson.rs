//! GeoJSON codec over `serde_json::Value`.
//!
//! Decoding accepts `Polygon`, `MultiPolygon`, `GeometryCollection` (its
//! polygonal members, flattened) and `Feature` (its geometry). Encoding
//! emits `Polygon` for a single-part value and `MultiPolygon` otherwise.

use crate::error::GeometryError;
use crate::geometry::{Geometry, polygon_from_rings};
use geo::{LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value, json};

/// Decode a GeoJSON object into a polygonal geometry.
pub fn geometry_from_value(value: &Value) -> Result<Geometry, GeometryError> {
    let polygons = polygons_from_value(value)?;
    Ok(Geometry::new(MultiPolygon::new(polygons)))
}

/// Encode a geometry as a GeoJSON geometry object.
pub fn geometry_to_value(geometry: &Geometry) -> Value {
    let polygons: Vec<Value> = geometry.polygons().map(polygon_coordinates).collect();
    if polygons.len() == 1 {
        let mut polygons = polygons;
        json!({ "type": "Polygon", "coordinates": polygons.remove(0) })
    } else {
        json!({ "type": "MultiPolygon", "coordinates": polygons })
    }
}

/// A GeoJSON feature carrying a `tzid` property.
pub fn feature_value(tzid: &str, geometry: &Geometry) -> Value {
    json!({
        "type": "Feature",
        "properties": { "tzid": tzid },
        "geometry": geometry_to_value(geometry),
    })
}

fn polygons_from_value(value: &Value) -> Result<Vec<Polygon<f64>>, GeometryError> {
    let object = value
        .as_object()
        .ok_or_else(|| GeometryError::InvalidGeoJson("expected a JSON object".to_string()))?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryError::InvalidGeoJson("missing `type`".to_string()))?;

    match kind {
        "Polygon" => {
            let rings = parse_rings(coordinates(object)?)?;
            Ok(vec![polygon_from_rings(&rings)?])
        }
        "MultiPolygon" => coordinates(object)?
            .as_array()
            .ok_or_else(|| GeometryError::InvalidGeoJson("multipolygon coordinates must be an array".to_string()))?
            .iter()
            .map(|polygon| polygon_from_rings(&parse_rings(polygon)?))
            .collect(),
        "GeometryCollection" => {
            let members = object
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| GeometryError::InvalidGeoJson("missing `geometries`".to_string()))?;
            let mut polygons = Vec::new();
            for member in members {
                match member.get("type").and_then(Value::as_str) {
                    Some("Polygon") | Some("MultiPolygon") | Some("GeometryCollection") => {
                        polygons.extend(polygons_from_value(member)?);
                    }
                    _ => {}
                }
            }
            Ok(polygons)
        }
        "Feature" => {
            let geometry = object
                .get("geometry")
                .ok_or_else(|| GeometryError::InvalidGeoJson("feature has no geometry".to_string()))?;
            polygons_from_value(geometry)
        }
        other => Err(GeometryError::UnsupportedGeometry(other.to_string())),
    }
}

fn coordinates(object: &Map<String, Value>) -> Result<&Value, GeometryError> {
    object
        .get("coordinates")
        .ok_or_else(|| GeometryError::InvalidGeoJson("missing `coordinates`".to_string()))
}

fn parse_rings(value: &Value) -> Result<Vec<Vec<[f64; 2]>>, GeometryError> {
    value
        .as_array()
        .ok_or_else(|| GeometryError::InvalidGeoJson("polygon coordinates must be an array".to_string()))?
        .iter()
        .map(|ring| {
            ring.as_array()
                .ok_or_else(|| GeometryError::InvalidGeoJson("ring must be an array".to_string()))?
                .iter()
                .map(parse_position)
                .collect()
        })
        .collect()
}

fn parse_position(value: &Value) -> Result<[f64; 2], GeometryError> {
    let position = value
        .as_array()
        .filter(|p| p.len() >= 2)
        .ok_or_else(|| GeometryError::InvalidGeoJson(format!("invalid position: {value}")))?;
    match (position[0].as_f64(), position[1].as_f64()) {
        (Some(x), Some(y)) => Ok([x, y]),
        _ => Err(GeometryError::InvalidGeoJson(format!(
            "non-numeric position: {value}"
        ))),
    }
}

fn polygon_coordinates(polygon: &Polygon<f64>) -> Value {
    let rings: Vec<Value> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_coordinates)
        .collect();
    Value::Array(rings)
}

fn ring_coordinates(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_value(x: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]]
        })
    }

    #[test]
    fn single_polygon_encodes_as_polygon() {
        let geometry = geometry_from_value(&square_value(0.0)).expect("decode");
        let encoded = geometry_to_value(&geometry);
        assert_eq!(encoded, square_value(0.0));
    }

    #[test]
    fn collection_flattens_polygonal_members() {
        let collection = json!({
            "type": "GeometryCollection",
            "geometries": [
                square_value(0.0),
                { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                {
                    "type": "MultiPolygon",
                    "coordinates": [square_value(2.0)["coordinates"].clone(), square_value(4.0)["coordinates"].clone()]
                }
            ]
        });
        let geometry = geometry_from_value(&collection).expect("decode");
        assert_eq!(geometry.polygon_count(), 3);
        assert_eq!(geometry_to_value(&geometry)["type"], "MultiPolygon");
    }

    #[test]
    fn feature_carries_tzid() {
        let geometry = geometry_from_value(&square_value(0.0)).expect("decode");
        let feature = feature_value("Etc/GMT", &geometry);
        assert_eq!(feature["properties"]["tzid"], "Etc/GMT");
        assert_eq!(geometry_from_value(&feature).expect("decode feature"), geometry);
    }

    #[test]
    fn non_polygonal_geometry_is_unsupported() {
        let point = json!({ "type": "Point", "coordinates": [0.0, 0.0] });
        assert!(matches!(
            geometry_from_value(&point),
            Err(GeometryError::UnsupportedGeometry(kind)) if kind == "Point"
        ));
    }

    #[test]
    fn empty_geometry_encodes_as_empty_multipolygon() {
        let encoded = geometry_to_value(&Geometry::empty());
        assert_eq!(encoded, json!({ "type": "MultiPolygon", "coordinates": [] }));
    }
}
