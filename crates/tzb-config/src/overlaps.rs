//! Documented exceptions to "zones must not overlap".

use crate::error::ConfigError;
use crate::zone::ZoneId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tzb_geometry::Bounds;

/// One tolerated overlap region between a zone pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedOverlap {
    #[serde(default)]
    pub description: String,
    pub bounds: Bounds,
}

/// Allowed overlaps keyed by `"<zoneA>-<zoneB>"`.
///
/// Keys are looked up in both orders, so either spelling of a pair works.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectedOverlaps {
    pub entries: BTreeMap<String, Vec<ExpectedOverlap>>,
}

impl ExpectedOverlaps {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let document = crate::read_json_file(path)?;
        serde_json::from_value(document).map_err(|err| {
            ConfigError::Shape(format!("{}: {err}", path.display()))
        })
    }

    pub fn pair_key(a: &ZoneId, b: &ZoneId) -> String {
        format!("{a}-{b}")
    }

    /// Entries for the unordered pair, trying `a-b` before `b-a`.
    pub fn lookup(&self, a: &ZoneId, b: &ZoneId) -> &[ExpectedOverlap] {
        self.entries
            .get(&Self::pair_key(a, b))
            .or_else(|| self.entries.get(&Self::pair_key(b, a)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether some allowed box fully contains `region`.
    pub fn allows(&self, a: &ZoneId, b: &ZoneId, region: &Bounds) -> bool {
        self.lookup(a, b)
            .iter()
            .any(|allowed| allowed.bounds.contains(region))
    }

    pub fn insert(&mut self, a: &ZoneId, b: &ZoneId, overlap: ExpectedOverlap) {
        self.entries
            .entry(Self::pair_key(a, b))
            .or_default()
            .push(overlap);
    }
}
