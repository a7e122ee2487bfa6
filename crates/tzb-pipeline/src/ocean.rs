//! Ocean filling: each band minus every land zone it touches.

use crate::error::PipelineError;
use rayon::prelude::*;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use tracing::info;
use tzb_config::{OceanBand, ZoneId};
use tzb_geometry::{Geometry, GeometryOps, post_process};

/// Subtract, in zone-id order, every land zone whose bounding box overlaps
/// the band's longitude range, then post-process.
pub fn fill_band<G>(ops: &GeometryOps, band: &OceanBand, land: &BTreeMap<ZoneId, G>) -> Result<Geometry, PipelineError>
where
    G: Borrow<Geometry>,
{
    let ops = ops.scoped(band.zone_id.as_str());
    let mut geometry = band.rectangle();
    let mut subtracted = 0usize;
    for zone in land.values() {
        let zone = zone.borrow();
        let touches = zone
            .bounds()
            .is_some_and(|bounds| bounds.overlaps_longitudes(band.left_lon, band.right_lon));
        if !touches {
            continue;
        }
        geometry = ops
            .difference(&geometry, zone)
            .map_err(|err| PipelineError::in_zone(&band.zone_id, err))?;
        subtracted += 1;
    }
    info!(zone = %band.zone_id, subtracted, "ocean band filled");
    Ok(post_process(&geometry))
}

/// Fill every band. Bands are independent and run concurrently.
pub fn fill_oceans<G>(
    ops: &GeometryOps,
    bands: &[OceanBand],
    land: &BTreeMap<ZoneId, G>,
) -> Result<BTreeMap<ZoneId, Geometry>, PipelineError>
where
    G: Borrow<Geometry> + Sync,
{
    bands
        .par_iter()
        .map(|band| fill_band(ops, band, land).map(|geometry| (band.zone_id.clone(), geometry)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tzb_config::ocean_bands;
    use tzb_geometry::Bounds;

    fn land() -> BTreeMap<ZoneId, Geometry> {
        BTreeMap::from([
            (ZoneId::new("Africa/Test"), Geometry::rectangle(Bounds::new(0.0, 0.0, 10.0, 10.0))),
            (ZoneId::new("Pacific/Test"), Geometry::rectangle(Bounds::new(-175.0, -5.0, -174.0, 5.0))),
        ])
    }

    fn band(zone: &str) -> OceanBand {
        ocean_bands()
            .into_iter()
            .find(|band| band.zone_id.as_str() == zone)
            .expect("band")
    }

    #[test]
    fn land_is_removed_from_every_band_it_touches() {
        let ops = GeometryOps::default();
        let land = land();

        let gmt = fill_band(&ops, &band("Etc/GMT"), &land).expect("Etc/GMT");
        assert!((gmt.planar_area() - (15.0 * 180.0 - 7.5 * 10.0)).abs() < 1e-6);

        let east = fill_band(&ops, &band("Etc/GMT-1"), &land).expect("Etc/GMT-1");
        assert!((east.planar_area() - (15.0 * 180.0 - 2.5 * 10.0)).abs() < 1e-6);

        let untouched = fill_band(&ops, &band("Etc/GMT-5"), &land).expect("Etc/GMT-5");
        assert!((untouched.planar_area() - 15.0 * 180.0).abs() < 1e-6);
    }

    #[test]
    fn oceans_are_disjoint_from_land() {
        let ops = GeometryOps::default();
        let land = land();
        let oceans = fill_oceans(&ops, &ocean_bands(), &land).expect("oceans");
        assert_eq!(oceans.len(), 25);
        for (ocean_id, ocean) in &oceans {
            for (land_id, zone) in &land {
                let overlap = ops.intersection(ocean, zone).expect("intersection").planar_area();
                assert!(overlap < 1e-9, "{ocean_id} overlaps {land_id} by {overlap}");
            }
        }
        let half_band = &oceans[&ZoneId::new("Etc/GMT+12")];
        assert!((half_band.planar_area() - (7.5 * 180.0 - 1.0 * 10.0)).abs() < 1e-6);
    }
}
