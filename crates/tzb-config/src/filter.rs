//! Included/excluded zone filtering.
//!
//! The builder accepts any subset of the configuration; this is how the
//! subset is cut.

use crate::error::ConfigError;
use crate::ocean::OceanBand;
use crate::recipe::{ZoneCatalog, ZoneRecipes};
use crate::sources::BoundarySources;
use crate::zone::ZoneId;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneFilter {
    /// When non-empty, only these zones are kept.
    pub included: BTreeSet<ZoneId>,
    pub excluded: BTreeSet<ZoneId>,
}

impl ZoneFilter {
    pub fn new<I, E>(included: I, excluded: E) -> Self
    where
        I: IntoIterator<Item = ZoneId>,
        E: IntoIterator<Item = ZoneId>,
    {
        Self {
            included: included.into_iter().collect(),
            excluded: excluded.into_iter().collect(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.included.is_empty() && self.excluded.is_empty()
    }

    pub fn keeps(&self, zone: &ZoneId) -> bool {
        (self.included.is_empty() || self.included.contains(zone)) && !self.excluded.contains(zone)
    }

    /// Filter one variant's recipes.
    ///
    /// An included zone that is neither a configured zone nor an ocean band
    /// is an [`ConfigError::UnknownZone`].
    pub fn apply_recipes(&self, recipes: &ZoneRecipes, bands: &[OceanBand]) -> Result<ZoneRecipes, ConfigError> {
        if let Some(unknown) = self
            .included
            .iter()
            .find(|zone| !recipes.contains_key(*zone) && !bands.iter().any(|band| &band.zone_id == *zone))
        {
            return Err(ConfigError::UnknownZone(unknown.to_string()));
        }
        Ok(recipes
            .iter()
            .filter(|(zone, _)| self.keeps(zone))
            .map(|(zone, recipe)| (zone.clone(), recipe.clone()))
            .collect())
    }

    /// Filter every variant of a catalog. Only base zones are checked for
    /// unknown inclusions; variant files commonly cover fewer zones.
    pub fn apply_catalog(&self, catalog: &ZoneCatalog, bands: &[OceanBand]) -> Result<ZoneCatalog, ConfigError> {
        let mut filtered = ZoneCatalog::new();
        for (variant, recipes) in &catalog.variants {
            let kept = if variant.subdirectory().is_none() {
                self.apply_recipes(recipes, bands)?
            } else {
                recipes
                    .iter()
                    .filter(|(zone, _)| self.keeps(zone))
                    .map(|(zone, recipe)| (zone.clone(), recipe.clone()))
                    .collect()
            };
            filtered.insert(*variant, kept);
        }
        Ok(filtered)
    }

    pub fn apply_bands(&self, bands: Vec<OceanBand>) -> Vec<OceanBand> {
        bands.into_iter().filter(|band| self.keeps(&band.zone_id)).collect()
    }
}

/// Drop boundary sources that no remaining recipe fetches.
pub fn retain_referenced_sources(sources: &mut BoundarySources, catalog: &ZoneCatalog) {
    let referenced: BTreeSet<String> = catalog
        .iter()
        .flat_map(|(_, _, recipe)| recipe.fetched_ids().map(str::to_string).collect::<Vec<_>>())
        .collect();
    sources.retain_ids(&referenced);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::ocean_bands;
    use crate::recipe::parse_recipes;
    use crate::sources::BoundaryQuery;
    use crate::zone::ZoneVariant;
    use serde_json::json;

    fn recipes() -> ZoneRecipes {
        parse_recipes(&json!({
            "Europe/Berlin": [{ "op": "init", "source": "overpass", "id": "Germany" }],
            "Europe/Paris": [{ "op": "init", "source": "overpass", "id": "France" }],
            "Europe/Rome": [{ "op": "init", "source": "overpass", "id": "Italy" }]
        }))
        .expect("recipes")
    }

    fn zones(recipes: &ZoneRecipes) -> Vec<&str> {
        recipes.keys().map(ZoneId::as_str).collect()
    }

    #[test]
    fn inclusion_keeps_only_named_zones() {
        let filter = ZoneFilter::new([ZoneId::new("Europe/Paris")], []);
        let kept = filter.apply_recipes(&recipes(), &ocean_bands()).expect("filter");
        assert_eq!(zones(&kept), vec!["Europe/Paris"]);
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        let filter = ZoneFilter::new(
            [ZoneId::new("Europe/Paris"), ZoneId::new("Europe/Rome")],
            [ZoneId::new("Europe/Rome")],
        );
        let kept = filter.apply_recipes(&recipes(), &ocean_bands()).expect("filter");
        assert_eq!(zones(&kept), vec!["Europe/Paris"]);
    }

    #[test]
    fn unknown_inclusion_is_an_error() {
        let filter = ZoneFilter::new([ZoneId::new("Europe/Atlantis")], []);
        assert!(matches!(
            filter.apply_recipes(&recipes(), &ocean_bands()),
            Err(ConfigError::UnknownZone(zone)) if zone == "Europe/Atlantis"
        ));
    }

    #[test]
    fn ocean_band_may_be_included_alone() {
        let filter = ZoneFilter::new([ZoneId::new("Etc/GMT")], []);
        let kept = filter.apply_recipes(&recipes(), &ocean_bands()).expect("filter");
        assert!(kept.is_empty());
        let bands = filter.apply_bands(ocean_bands());
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].zone_id.as_str(), "Etc/GMT");
    }

    #[test]
    fn unreferenced_sources_are_dropped() {
        let filter = ZoneFilter::new([], [ZoneId::new("Europe/Rome")]);
        let catalog = filter
            .apply_catalog(&ZoneCatalog::with_base(recipes()), &ocean_bands())
            .expect("filter");
        let mut sources = BoundarySources::default();
        for id in ["France", "Germany", "Italy"] {
            sources.queries.insert(id.to_string(), BoundaryQuery::relation(&[("name", id)]));
        }
        retain_referenced_sources(&mut sources, &catalog);
        assert_eq!(sources.ids().collect::<Vec<_>>(), vec!["France", "Germany"]);
        assert_eq!(catalog.get(ZoneVariant::Base).map(|r| r.len()), Some(2));
    }
}
