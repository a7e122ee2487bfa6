//! Final cleanup applied to every built zone and ocean band.
//!
//! Snap to the precision grid first, then drop polygons below
//! [`MIN_POLYGON_AREA_M2`] and holes not above [`MIN_RING_AREA_M2`]. The
//! exterior ring of a surviving polygon is always kept. Filtering runs on
//! already-snapped rings, so a second pass finds nothing left to remove.

use crate::geometry::Geometry;
use geo::{ChamberlainDuquetteArea, MultiPolygon, Polygon};

/// Polygons with less spherical area than this (m²) are dropped.
pub const MIN_POLYGON_AREA_M2: f64 = 1.0;

/// Holes with no more spherical area than this (m²) are filled in.
pub const MIN_RING_AREA_M2: f64 = 1.0;

pub fn post_process(geometry: &Geometry) -> Geometry {
    let snapped = geometry.snapped();
    let polygons = snapped
        .polygons()
        .filter(|polygon| polygon.chamberlain_duquette_unsigned_area() >= MIN_POLYGON_AREA_M2)
        .map(|polygon| {
            let holes = polygon
                .interiors()
                .iter()
                .filter(|ring| {
                    Polygon::new((*ring).clone(), Vec::new()).chamberlain_duquette_unsigned_area()
                        > MIN_RING_AREA_M2
                })
                .cloned()
                .collect();
            Polygon::new(polygon.exterior().clone(), holes)
        })
        .collect();
    Geometry::new(MultiPolygon::new(polygons))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;
    use geo::{Coord, LineString};

    fn ring(min_x: f64, min_y: f64, size: f64) -> LineString<f64> {
        LineString::from(vec![
            (min_x, min_y),
            (min_x + size, min_y),
            (min_x + size, min_y + size),
            (min_x, min_y + size),
            (min_x, min_y),
        ])
    }

    fn with_hole(hole_size: f64) -> Geometry {
        let mut hole = ring(0.4, 0.4, hole_size);
        hole.0.reverse();
        Geometry::from_polygon(Polygon::new(ring(0.0, 0.0, 1.0), vec![hole]))
    }

    #[test]
    fn tiny_hole_is_filled() {
        // 1e-5 degree is about a metre at the equator: well under 1 m².
        let processed = post_process(&with_hole(0.000_005));
        let polygon = processed.polygons().next().expect("polygon kept");
        assert!(polygon.interiors().is_empty());
    }

    #[test]
    fn large_hole_is_kept() {
        let processed = post_process(&with_hole(0.1));
        let polygon = processed.polygons().next().expect("polygon kept");
        assert_eq!(polygon.interiors().len(), 1);
    }

    #[test]
    fn tiny_exclave_is_dropped() {
        let main = Polygon::new(ring(0.0, 0.0, 1.0), Vec::new());
        let speck = Polygon::new(ring(5.0, 5.0, 0.000_003), Vec::new());
        let processed = post_process(&Geometry::new(MultiPolygon::new(vec![main, speck])));
        assert_eq!(processed.polygon_count(), 1);
    }

    #[test]
    fn coordinates_land_on_the_grid() {
        let raw = Geometry::rectangle(Bounds::new(0.123_456_78, 0.0, 1.0, 1.0));
        let processed = post_process(&raw);
        let first: Coord<f64> = processed.polygons().next().expect("polygon").exterior().0[0];
        assert_eq!(first.x, 0.123_457);
    }

    #[test]
    fn post_processing_is_idempotent() {
        let main = Polygon::new(
            ring(0.123_456_78, 10.000_000_4, 2.5),
            vec![ring(0.5, 10.5, 0.25), ring(1.0, 11.0, 0.000_002)],
        );
        let speck = Polygon::new(ring(5.0, 5.0, 0.000_003), Vec::new());
        let once = post_process(&Geometry::new(MultiPolygon::new(vec![main, speck])));
        let twice = post_process(&once);
        assert_eq!(once, twice);
        assert_eq!(once.polygon_count(), 1);
    }
}
