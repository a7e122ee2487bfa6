//! The immutable polygonal geometry value.

use crate::bounds::Bounds;
use crate::error::GeometryError;
use crate::precision::snap_multi_polygon;
use geo::{Area, BoundingRect, ChamberlainDuquetteArea, Coord, LineString, MultiPolygon, Polygon};

/// A polygon or multipolygon in lon/lat degrees.
///
/// Stored uniformly as a `MultiPolygon`; a single-polygon value is a
/// one-element multipolygon. Never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry(MultiPolygon<f64>);

impl Default for Geometry {
    fn default() -> Self {
        Self::empty()
    }
}

impl Geometry {
    pub fn new(inner: MultiPolygon<f64>) -> Self {
        Self(inner)
    }

    pub fn empty() -> Self {
        Self(MultiPolygon::new(Vec::new()))
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self(MultiPolygon::new(vec![polygon]))
    }

    /// Build from GeoJSON-style polygon coordinates: a list of rings, the
    /// first being the exterior.
    pub fn from_polygon_coords(rings: &[Vec<[f64; 2]>]) -> Result<Self, GeometryError> {
        Ok(Self::from_polygon(polygon_from_rings(rings)?))
    }

    /// Build from GeoJSON-style multipolygon coordinates.
    pub fn from_multi_polygon_coords(polygons: &[Vec<Vec<[f64; 2]>>]) -> Result<Self, GeometryError> {
        let polygons = polygons
            .iter()
            .map(|rings| polygon_from_rings(rings))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(MultiPolygon::new(polygons)))
    }

    /// An axis-aligned rectangle, wound counter-clockwise.
    pub fn rectangle(bounds: Bounds) -> Self {
        let ring = LineString::from(vec![
            (bounds.min_x, bounds.min_y),
            (bounds.max_x, bounds.min_y),
            (bounds.max_x, bounds.max_y),
            (bounds.min_x, bounds.max_y),
            (bounds.min_x, bounds.min_y),
        ]);
        Self::from_polygon(Polygon::new(ring, Vec::new()))
    }

    pub fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    pub fn into_inner(self) -> MultiPolygon<f64> {
        self.0
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Polygon<f64>> {
        self.0.0.iter()
    }

    pub fn polygon_count(&self) -> usize {
        self.0.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.0.is_empty()
    }

    /// Area in square degrees. This is the metric of the noise thresholds
    /// used for overlap detection and release diffs.
    pub fn planar_area(&self) -> f64 {
        self.0.unsigned_area()
    }

    /// Spherical area in square metres (Chamberlain-Duquette, WGS84
    /// equatorial radius). This is the metric of the sliver thresholds.
    pub fn spherical_area(&self) -> f64 {
        self.0.chamberlain_duquette_unsigned_area()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.0.bounding_rect().map(Bounds::from_rect)
    }

    /// A copy with every coordinate on the 1e-6 degree grid.
    pub fn snapped(&self) -> Self {
        Self(snap_multi_polygon(&self.0))
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.0.0.iter().all(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .flat_map(|ring| ring.coords())
                .all(|c| c.x.is_finite() && c.y.is_finite())
        })
    }
}

impl From<MultiPolygon<f64>> for Geometry {
    fn from(inner: MultiPolygon<f64>) -> Self {
        Self(inner)
    }
}

impl From<Polygon<f64>> for Geometry {
    fn from(polygon: Polygon<f64>) -> Self {
        Self::from_polygon(polygon)
    }
}

pub(crate) fn polygon_from_rings(rings: &[Vec<[f64; 2]>]) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = rings.iter().enumerate().map(|(idx, ring)| ring_from_positions(idx, ring));
    let exterior = rings
        .next()
        .ok_or_else(|| GeometryError::InvalidGeoJson("polygon has no rings".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring_from_positions(idx: usize, ring: &[[f64; 2]]) -> Result<LineString<f64>, GeometryError> {
    if ring.len() < 4 {
        return Err(GeometryError::InvalidGeoJson(format!(
            "ring {idx} has {} positions; at least 4 are required",
            ring.len()
        )));
    }
    if ring.first() != ring.last() {
        return Err(GeometryError::InvalidGeoJson(format!(
            "ring {idx} is not closed"
        )));
    }
    Ok(LineString::new(
        ring.iter().map(|[x, y]| Coord { x: *x, y: *y }).collect(),
    ))
}
