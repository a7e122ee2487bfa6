//! The fixed table of synthetic ocean zones.

use crate::zone::ZoneId;
use tzb_geometry::{Bounds, Geometry};

/// A longitude band `[left_lon, right_lon)` spanning all latitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct OceanBand {
    pub zone_id: ZoneId,
    pub left_lon: f64,
    pub right_lon: f64,
}

impl OceanBand {
    fn new(zone_id: &str, left_lon: f64, right_lon: f64) -> Self {
        Self {
            zone_id: ZoneId::new(zone_id),
            left_lon,
            right_lon,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.left_lon, -90.0, self.right_lon, 90.0)
    }

    /// The full band rectangle, before any land is removed.
    pub fn rectangle(&self) -> Geometry {
        Geometry::rectangle(self.bounds())
    }
}

/// Nautical time bands, east to west. The ±12 bands are half width so the
/// table tiles `[-180, 180)` exactly.
const BANDS: [(&str, f64, f64); 25] = [
    ("Etc/GMT-12", 172.5, 180.0),
    ("Etc/GMT-11", 157.5, 172.5),
    ("Etc/GMT-10", 142.5, 157.5),
    ("Etc/GMT-9", 127.5, 142.5),
    ("Etc/GMT-8", 112.5, 127.5),
    ("Etc/GMT-7", 97.5, 112.5),
    ("Etc/GMT-6", 82.5, 97.5),
    ("Etc/GMT-5", 67.5, 82.5),
    ("Etc/GMT-4", 52.5, 67.5),
    ("Etc/GMT-3", 37.5, 52.5),
    ("Etc/GMT-2", 22.5, 37.5),
    ("Etc/GMT-1", 7.5, 22.5),
    ("Etc/GMT", -7.5, 7.5),
    ("Etc/GMT+1", -22.5, -7.5),
    ("Etc/GMT+2", -37.5, -22.5),
    ("Etc/GMT+3", -52.5, -37.5),
    ("Etc/GMT+4", -67.5, -52.5),
    ("Etc/GMT+5", -82.5, -67.5),
    ("Etc/GMT+6", -97.5, -82.5),
    ("Etc/GMT+7", -112.5, -97.5),
    ("Etc/GMT+8", -127.5, -112.5),
    ("Etc/GMT+9", -142.5, -127.5),
    ("Etc/GMT+10", -157.5, -142.5),
    ("Etc/GMT+11", -172.5, -157.5),
    ("Etc/GMT+12", -180.0, -172.5),
];

pub fn ocean_bands() -> Vec<OceanBand> {
    BANDS
        .iter()
        .map(|(zone, left, right)| OceanBand::new(zone, *left, *right))
        .collect()
}

/// Check that `bands` tile `[-180, 180)` with no gap or overlap.
///
/// Returns a description of the first defect found.
pub fn check_band_tiling(bands: &[OceanBand]) -> Result<(), String> {
    let mut ranges: Vec<(f64, f64, &ZoneId)> = bands
        .iter()
        .map(|band| (band.left_lon, band.right_lon, &band.zone_id))
        .collect();
    ranges.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut cursor = -180.0;
    for (left, right, zone) in ranges {
        if right <= left {
            return Err(format!("{zone}: empty range [{left}, {right})"));
        }
        if left != cursor {
            return Err(format!("{zone}: expected band starting at {cursor}, found {left}"));
        }
        cursor = right;
    }
    if cursor != 180.0 {
        return Err(format!("bands end at {cursor}, not 180"));
    }
    Ok(())
}
