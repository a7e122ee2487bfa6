//! Build ordering between zones.
//!
//! A zone depends on every zone its recipe reads through a derived-zone
//! source. [`build_waves`] layers the catalog so that every zone appears in
//! a later wave than everything it depends on; zones within one wave are
//! independent and may be built concurrently.

use crate::recipe::ZoneCatalog;
use crate::zone::{ZoneId, ZoneVariant};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One zone of one variant: the unit of scheduling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildNode {
    pub variant: ZoneVariant,
    pub zone: ZoneId,
}

impl BuildNode {
    pub fn new(variant: ZoneVariant, zone: ZoneId) -> Self {
        Self { variant, zone }
    }

    pub fn base(zone: impl Into<String>) -> Self {
        Self::new(ZoneVariant::Base, ZoneId::new(zone))
    }
}

impl fmt::Display for BuildNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            ZoneVariant::Base => write!(f, "{}", self.zone),
            variant => write!(f, "{}@{}", self.zone, variant),
        }
    }
}

/// Dependencies of every node that are themselves configured.
///
/// References to unconfigured zones do not constrain ordering; they fail
/// later, at resolution time.
pub fn dependency_map(catalog: &ZoneCatalog) -> BTreeMap<BuildNode, BTreeSet<BuildNode>> {
    catalog
        .iter()
        .map(|(variant, zone, recipe)| {
            let deps = recipe
                .dependencies()
                .into_iter()
                .filter(|(dep_variant, dep_zone)| catalog.contains(*dep_variant, dep_zone))
                .map(|(dep_variant, dep_zone)| BuildNode::new(dep_variant, dep_zone))
                .collect();
            (BuildNode::new(variant, zone.clone()), deps)
        })
        .collect()
}

/// Layer the catalog into dependency-respecting waves.
///
/// Each wave is sorted (variant, then zone id). On a cycle, the nodes that
/// could not be scheduled are returned in the error.
pub fn build_waves(catalog: &ZoneCatalog) -> Result<Vec<Vec<BuildNode>>, Vec<BuildNode>> {
    let mut pending = dependency_map(catalog);
    let mut done: BTreeSet<BuildNode> = BTreeSet::new();
    let mut waves = Vec::new();

    while !pending.is_empty() {
        let ready: Vec<BuildNode> = pending
            .iter()
            .filter(|(_, deps)| deps.iter().all(|dep| done.contains(dep)))
            .map(|(node, _)| node.clone())
            .collect();
        if ready.is_empty() {
            return Err(pending.into_keys().collect());
        }
        for node in &ready {
            pending.remove(node);
            done.insert(node.clone());
        }
        waves.push(ready);
    }
    Ok(waves)
}
