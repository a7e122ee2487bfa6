//! Axis-aligned bounding boxes in lon/lat degrees.

use geo::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed bounding box `[minX, minY, maxX, maxY]`.
///
/// Serialized as a four-element array, the form used by the expected-overlap
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        let min = rect.min();
        let max = rect.max();
        Self::new(min.x, min.y, max.x, max.y)
    }

    /// Whether min <= max on both axes.
    pub fn is_ordered(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Whether the two boxes share at least one point.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Whether `other` lies entirely inside this box (edges inclusive).
    pub fn contains(&self, other: &Bounds) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Whether the box overlaps the longitude range `[left, right]`.
    pub fn overlaps_longitudes(&self, left: f64, right: f64) -> bool {
        self.min_x <= right && left <= self.max_x
    }

    /// Expand outward to the enclosing tenth of a degree.
    pub fn rounded_outward(&self) -> Bounds {
        Bounds::new(
            (self.min_x * 10.0).floor() / 10.0,
            (self.min_y * 10.0).floor() / 10.0,
            (self.max_x * 10.0).ceil() / 10.0,
            (self.max_y * 10.0).ceil() / 10.0,
        )
    }
}

impl From<[f64; 4]> for Bounds {
    fn from(raw: [f64; 4]) -> Self {
        Self::new(raw[0], raw[1], raw[2], raw[3])
    }
}

impl From<Bounds> for [f64; 4] {
    fn from(bounds: Bounds) -> Self {
        [bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y]
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
