//! Built zone results, shared read-only once written.

use std::collections::BTreeMap;
use tzb_config::{BuildNode, ZoneId, ZoneVariant};
use tzb_geometry::Geometry;
use tzb_store::ContentHash;

/// The final geometry of one zone and the digest of its output file.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneResult {
    pub geometry: Geometry,
    pub digest: ContentHash,
    /// Whether the result was reused from a previous run.
    pub reused: bool,
}

/// Every zone result of a build. Each node is inserted exactly once, after
/// its build finished; later stages only read.
#[derive(Debug, Clone, Default)]
pub struct ZoneResults {
    results: BTreeMap<BuildNode, ZoneResult>,
}

impl ZoneResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &BuildNode) -> Option<&ZoneResult> {
        self.results.get(node)
    }

    pub fn contains(&self, node: &BuildNode) -> bool {
        self.results.contains_key(node)
    }

    pub(crate) fn insert(&mut self, node: BuildNode, result: ZoneResult) {
        let previous = self.results.insert(node, result);
        debug_assert!(previous.is_none(), "zone result written twice");
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Geometries of one variant, keyed by zone id.
    pub fn variant(&self, variant: ZoneVariant) -> BTreeMap<ZoneId, &Geometry> {
        self.results
            .iter()
            .filter(|(node, _)| node.variant == variant)
            .map(|(node, result)| (node.zone.clone(), &result.geometry))
            .collect()
    }

    /// Owned copy of one variant's geometries.
    pub fn variant_owned(&self, variant: ZoneVariant) -> BTreeMap<ZoneId, Geometry> {
        self.variant(variant)
            .into_iter()
            .map(|(zone, geometry)| (zone, geometry.clone()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BuildNode, &ZoneResult)> {
        self.results.iter()
    }
}
