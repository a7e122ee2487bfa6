//! Per-zone output files in the working directory.

use crate::atomic::write_atomic;
use crate::error::StoreError;
use crate::hash::ContentHash;
use std::path::{Path, PathBuf};
use tzb_config::{ZoneId, ZoneVariant};
use tzb_geometry::{Geometry, geometry_from_value, geometry_to_value};

/// `<working>/<zone stem>.json` for base zones, and
/// `<working>/<variant>/<zone stem>.json` for the cutoff variants.
#[derive(Debug, Clone)]
pub struct ZoneFiles {
    working_dir: PathBuf,
}

impl ZoneFiles {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn path(&self, variant: ZoneVariant, zone: &ZoneId) -> PathBuf {
        let dir = match variant.subdirectory() {
            Some(sub) => self.working_dir.join(sub),
            None => self.working_dir.clone(),
        };
        dir.join(format!("{}.json", zone.file_stem()))
    }

    /// Encode a zone geometry exactly as it is written to disk.
    pub fn encode(geometry: &Geometry) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(&geometry_to_value(geometry)).map_err(|e| StoreError::Serialize(e.to_string()))
    }

    /// Write a zone result; returns the digest of the bytes written.
    pub fn write(&self, variant: ZoneVariant, zone: &ZoneId, geometry: &Geometry) -> Result<ContentHash, StoreError> {
        let bytes = Self::encode(geometry)?;
        write_atomic(&self.path(variant, zone), &bytes)?;
        Ok(ContentHash::from_bytes(&bytes))
    }

    /// Read a previously written zone result and the digest of its bytes.
    pub fn read(&self, variant: ZoneVariant, zone: &ZoneId) -> Result<(Geometry, ContentHash), StoreError> {
        let path = self.path(variant, zone);
        let bytes = std::fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
        let value = serde_json::from_slice(&bytes).map_err(|e| StoreError::parse(&path, e))?;
        Ok((geometry_from_value(&value)?, ContentHash::from_bytes(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tzb_geometry::Bounds;

    #[test]
    fn paths_follow_variant_and_stem() {
        let files = ZoneFiles::new("/work");
        let zone = ZoneId::new("America/Indiana/Knox");
        assert_eq!(
            files.path(ZoneVariant::Base, &zone),
            PathBuf::from("/work/America__Indiana__Knox.json")
        );
        assert_eq!(
            files.path(ZoneVariant::Cutoff1970, &zone),
            PathBuf::from("/work/1970/America__Indiana__Knox.json")
        );
    }

    #[test]
    fn written_zone_reads_back_with_matching_digest() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("tzb-zones-{}-{unique}", std::process::id()));
        let files = ZoneFiles::new(&dir);
        let zone = ZoneId::new("Etc/Test");
        let geometry = Geometry::rectangle(Bounds::new(0.0, 0.0, 1.0, 1.0));

        let digest = files.write(ZoneVariant::Base, &zone, &geometry).expect("write");
        let on_disk = std::fs::read(files.path(ZoneVariant::Base, &zone)).expect("read bytes");
        assert_eq!(digest, ContentHash::from_bytes(&on_disk));

        assert_eq!(files.read(ZoneVariant::Base, &zone).expect("read"), (geometry, digest));

        let _ = std::fs::remove_dir_all(dir);
    }
}
