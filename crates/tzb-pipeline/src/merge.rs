//! Combined outputs: streamed FeatureCollections over all zones, the
//! downloaded OSM timezone boundaries, and the list of zone names.

use crate::error::PipelineError;
use crate::results::ZoneResults;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde_json::json;
use tracing::{info, warn};
use tzb_config::{ZoneId, ZoneVariant, timezone_query_id};
use tzb_geometry::{Bounds, Geometry};
use tzb_store::{FeatureWriter, SourceStore, write_json_atomic};

pub const COMBINED_FILE: &str = "combined.json";
pub const COMBINED_WITH_OCEANS_FILE: &str = "combined-with-oceans.json";
pub const TIMEZONE_NAMES_FILE: &str = "timezone-names.json";
pub const COMBINED_OSM_ZONES_FILE: &str = "combined-osm-zones.json";

/// Stand-in for a zone whose OSM timezone boundary was never downloaded.
pub fn null_island() -> Geometry {
    Geometry::rectangle(Bounds::new(-0.1, -0.1, 0.1, 0.1))
}

/// Path of the combined output of a non-base variant.
pub fn combined_variant_path(working_dir: &Path, variant: ZoneVariant) -> PathBuf {
    working_dir.join(format!("combined-{}.json", variant.as_str()))
}

/// Stream each group of zones, in order, into one FeatureCollection at
/// `path`. Returns the number of features written.
pub fn write_combined<G>(path: &Path, groups: &[&BTreeMap<ZoneId, G>]) -> Result<usize, PipelineError>
where
    G: Borrow<Geometry>,
{
    let mut writer = FeatureWriter::create(path)?;
    for group in groups {
        for (zone, geometry) in group.iter() {
            writer.write_zone(zone.as_str(), geometry.borrow())?;
        }
    }
    let count = writer.finish()?;
    info!(path = %path.display(), features = count, "wrote combined output");
    Ok(count)
}

/// Files written by [`write_combined_outputs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedOutputs {
    pub files: Vec<PathBuf>,
    pub feature_count: usize,
}

/// Write `combined.json`, `combined-with-oceans.json` (land zones, then
/// ocean bands) and one `combined-<variant>.json` per non-base variant that
/// has results.
pub fn write_combined_outputs(
    working_dir: &Path,
    results: &ZoneResults,
    oceans: &BTreeMap<ZoneId, Geometry>,
) -> Result<CombinedOutputs, PipelineError> {
    let mut outputs = CombinedOutputs::default();
    let land = results.variant(ZoneVariant::Base);

    let mut emit = |path: PathBuf, count: usize| {
        outputs.feature_count += count;
        outputs.files.push(path);
    };

    let path = working_dir.join(COMBINED_FILE);
    let count = write_combined(&path, &[&land])?;
    emit(path, count);

    let path = working_dir.join(COMBINED_WITH_OCEANS_FILE);
    let oceans: BTreeMap<ZoneId, &Geometry> = oceans.iter().map(|(zone, g)| (zone.clone(), g)).collect();
    let count = write_combined(&path, &[&land, &oceans])?;
    emit(path, count);

    for variant in ZoneVariant::ALL {
        if variant == ZoneVariant::Base {
            continue;
        }
        let zones = results.variant(variant);
        if zones.is_empty() {
            continue;
        }
        let path = combined_variant_path(working_dir, variant);
        let count = write_combined(&path, &[&zones])?;
        emit(path, count);
    }
    Ok(outputs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsmZonesOutput {
    pub path: PathBuf,
    pub feature_count: usize,
    pub placeholder_count: usize,
}

/// Stream the downloaded OSM timezone boundary of each zone
/// (`<downloads>/<timezone_query_id>.json`) into `combined-osm-zones.json`.
/// Downloaded geometries are copied verbatim; zones without a download get
/// [`null_island`].
pub fn write_combined_osm_zones<'a>(
    working_dir: &Path,
    store: &SourceStore,
    zones: impl IntoIterator<Item = &'a ZoneId>,
) -> Result<OsmZonesOutput, PipelineError> {
    let path = working_dir.join(COMBINED_OSM_ZONES_FILE);
    let mut writer = FeatureWriter::create(&path)?;
    let mut placeholder_count = 0;
    for zone in zones {
        match store.read_value(&timezone_query_id(zone))? {
            Some((geometry, _)) => writer.write_feature(&json!({
                "type": "Feature",
                "properties": { "tzid": zone.as_str() },
                "geometry": geometry,
            }))?,
            None => {
                warn!(zone = %zone, "no OSM timezone boundary downloaded, using null island");
                placeholder_count += 1;
                writer.write_zone(zone.as_str(), &null_island())?;
            }
        }
    }
    let feature_count = writer.finish()?;
    info!(
        path = %path.display(),
        features = feature_count,
        placeholders = placeholder_count,
        "wrote combined OSM zones"
    );
    Ok(OsmZonesOutput {
        path,
        feature_count,
        placeholder_count,
    })
}

/// Land zone ids followed by ocean zone ids.
pub fn timezone_names<'a>(
    land: impl IntoIterator<Item = &'a ZoneId>,
    oceans: impl IntoIterator<Item = &'a ZoneId>,
) -> Vec<String> {
    land.into_iter()
        .chain(oceans)
        .map(|zone| zone.as_str().to_string())
        .collect()
}

/// Write `<dist>/timezone-names.json`.
pub fn write_timezone_names(dist_dir: &Path, names: &[String]) -> Result<PathBuf, PipelineError> {
    let path = dist_dir.join(TIMEZONE_NAMES_FILE);
    write_json_atomic(&path, names)?;
    info!(path = %path.display(), names = names.len(), "wrote timezone names");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tzb_geometry::Bounds;
    use tzb_store::parse_release;

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("tzb-merge-{prefix}-{}-{unique}", std::process::id()))
    }

    #[test]
    fn combined_collection_lists_groups_in_order() {
        let dir = temp_path("combined");
        let square = Geometry::rectangle(Bounds::new(0.0, 0.0, 1.0, 1.0));
        let land = BTreeMap::from([(ZoneId::new("Europe/Paris"), square.clone())]);
        let oceans = BTreeMap::from([(ZoneId::new("Etc/GMT"), square.clone())]);

        let path = dir.join(COMBINED_WITH_OCEANS_FILE);
        assert_eq!(write_combined(&path, &[&land, &oceans]).expect("write"), 2);

        let bytes = std::fs::read(&path).expect("read combined");
        let document: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        let tzids: Vec<&str> = document["features"]
            .as_array()
            .expect("features")
            .iter()
            .filter_map(|feature| feature["properties"]["tzid"].as_str())
            .collect();
        assert_eq!(tzids, vec!["Europe/Paris", "Etc/GMT"]);
        assert_eq!(parse_release(&document).expect("release").len(), 2);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn osm_zones_copy_downloads_and_fill_gaps_with_null_island() {
        let dir = temp_path("osm-zones");
        let downloads = dir.join("downloads");
        std::fs::create_dir_all(&downloads).expect("downloads dir");
        let download = json!({ "type": "Polygon", "coordinates": [[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]] });
        std::fs::write(downloads.join("Europe-Paris-tz.json"), download.to_string()).expect("write download");

        let zones = [ZoneId::new("America/Lima"), ZoneId::new("Europe/Paris")];
        let output = write_combined_osm_zones(&dir, &SourceStore::new(&downloads), &zones).expect("write");
        assert_eq!(output.feature_count, 2);
        assert_eq!(output.placeholder_count, 1);

        let bytes = std::fs::read(&output.path).expect("read combined");
        let document: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        let features = document["features"].as_array().expect("features");
        assert_eq!(features[0]["properties"]["tzid"], "America/Lima");
        let release = parse_release(&document).expect("release");
        let lima = &release[&ZoneId::new("America/Lima")];
        assert_eq!(lima.bounds(), null_island().bounds());
        assert_eq!(features[1]["geometry"], download);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn names_put_land_before_oceans() {
        let land = [ZoneId::new("Europe/Paris"), ZoneId::new("America/Lima")];
        let oceans = [ZoneId::new("Etc/GMT")];
        assert_eq!(
            timezone_names(&land, &oceans),
            vec!["Europe/Paris", "America/Lima", "Etc/GMT"]
        );
    }
}
