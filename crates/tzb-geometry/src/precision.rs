//! The fixed precision grid: 1e-6 degree, i.e. six decimal places.
//!
//! Snapping is idempotent. A snapped coordinate is `k / PRECISION_SCALE` for
//! an integer `k`, and snapping it again recomputes the same `k`.

use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Grid cells per degree.
pub const PRECISION_SCALE: f64 = 1_000_000.0;

/// Round one coordinate onto the grid.
pub fn snap_coord(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x * PRECISION_SCALE).round() / PRECISION_SCALE,
        y: (coord.y * PRECISION_SCALE).round() / PRECISION_SCALE,
    }
}

/// Snap every ring of every polygon.
///
/// Consecutive vertices that collapse onto the same grid point are merged.
/// Rings left with fewer than four positions are dropped; a polygon whose
/// exterior collapses is dropped with its holes.
pub fn snap_multi_polygon(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    let polygons = geometry
        .0
        .iter()
        .filter_map(|polygon| {
            let exterior = snap_ring(polygon.exterior())?;
            let interiors = polygon.interiors().iter().filter_map(snap_ring).collect();
            Some(Polygon::new(exterior, interiors))
        })
        .collect();
    MultiPolygon::new(polygons)
}

fn snap_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for coord in ring.coords() {
        let snapped = snap_coord(*coord);
        if coords.last() != Some(&snapped) {
            coords.push(snapped);
        }
    }
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied())
        && first != last
    {
        coords.push(first);
    }
    if coords.len() < 4 {
        return None;
    }
    Some(LineString::new(coords))
}
