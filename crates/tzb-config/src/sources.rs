//! Boundary source queries (`osmBoundarySources.json`).
//!
//! Each entry names a set of OSM tags identifying one boundary. Fetching is
//! external; this module only renders the query text the fetcher sends.

use crate::error::ConfigError;
use crate::zone::ZoneId;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// One boundary query: ordered tag filters, optionally matching ways
/// instead of relations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundaryQuery {
    /// Tag filters in document order.
    pub tags: Vec<(String, String)>,
    pub way: bool,
}

impl BoundaryQuery {
    pub fn relation(tags: &[(&str, &str)]) -> Self {
        Self {
            tags: tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            way: false,
        }
    }

    /// The OSM `timezone=<tzid>` boundary of one zone.
    pub fn timezone(zone: &ZoneId) -> Self {
        Self::relation(&[("timezone", zone.as_str())])
    }

    /// Overpass QL for this boundary.
    ///
    /// Tag filters are emitted last-to-first, matching the query text the
    /// download cache was keyed on.
    pub fn overpass_query(&self) -> String {
        let element = if self.way { "way" } else { "relation" };
        let filters: String = self
            .tags
            .iter()
            .rev()
            .map(|(key, value)| format!("[\"{key}\"=\"{value}\"]"))
            .collect();
        format!("[out:json][timeout:60];({element}{filters};);out body;>;out meta qt;")
    }
}

impl<'de> Deserialize<'de> for BoundaryQuery {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct QueryVisitor;

        impl<'de> Visitor<'de> for QueryVisitor {
            type Value = BoundaryQuery;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of OSM tag filters")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut query = BoundaryQuery::default();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    if key == "way" {
                        query.way = value
                            .as_bool()
                            .ok_or_else(|| de::Error::custom("`way` must be a boolean"))?;
                        continue;
                    }
                    let value = match value {
                        Value::String(text) => text,
                        Value::Number(number) => number.to_string(),
                        other => {
                            return Err(de::Error::custom(format!(
                                "tag `{key}` must be a string, got {other}"
                            )));
                        }
                    };
                    query.tags.push((key, value));
                }
                Ok(query)
            }
        }

        deserializer.deserialize_map(QueryVisitor)
    }
}

/// Download id of the OSM timezone boundary for `zone`: `/` becomes `-`,
/// suffixed with `-tz`.
pub fn timezone_query_id(zone: &ZoneId) -> String {
    format!("{}-tz", zone.as_str().replace('/', "-"))
}

/// Every configured boundary query, keyed by query id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct BoundarySources {
    pub queries: BTreeMap<String, BoundaryQuery>,
}

impl BoundarySources {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::ParseJson {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn contains(&self, query_id: &str) -> bool {
        self.queries.contains_key(query_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    /// Overpass QL of every query, keyed by query id.
    pub fn overpass_queries(&self) -> BTreeMap<String, String> {
        self.queries
            .iter()
            .map(|(id, query)| (id.clone(), query.overpass_query()))
            .collect()
    }

    /// Keep only the named queries.
    pub fn retain_ids(&mut self, keep: &BTreeSet<String>) {
        self.queries.retain(|id, _| keep.contains(id));
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_query_lists_tags_last_first() {
        let sources: BoundarySources = serde_json::from_str(
            r#"{ "Ohio": { "ISO3166-2": "US-OH", "admin_level": "4" } }"#,
        )
        .expect("sources");
        let query = sources.overpass_queries()["Ohio"].clone();
        insta::assert_snapshot!(
            query,
            @r#"[out:json][timeout:60];(relation["admin_level"="4"]["ISO3166-2"="US-OH"];);out body;>;out meta qt;"#
        );
    }

    #[test]
    fn way_flag_switches_element_and_is_not_a_tag() {
        let sources: BoundarySources = serde_json::from_str(
            r#"{ "Lake": { "way": true, "name": "Lake Constance" } }"#,
        )
        .expect("sources");
        let lake = &sources.queries["Lake"];
        assert!(lake.way);
        assert_eq!(lake.tags.len(), 1);
        insta::assert_snapshot!(
            lake.overpass_query(),
            @r#"[out:json][timeout:60];(way["name"="Lake Constance"];);out body;>;out meta qt;"#
        );
    }

    #[test]
    fn timezone_boundary_query_uses_the_tzid_tag() {
        let zone = ZoneId::new("America/Argentina/Salta");
        assert_eq!(timezone_query_id(&zone), "America-Argentina-Salta-tz");
        insta::assert_snapshot!(
            BoundaryQuery::timezone(&zone).overpass_query(),
            @r#"[out:json][timeout:60];(relation["timezone"="America/Argentina/Salta"];);out body;>;out meta qt;"#
        );
    }

    #[test]
    fn non_string_tag_is_rejected() {
        let parsed: Result<BoundarySources, _> =
            serde_json::from_str(r#"{ "Bad": { "name": ["a", "b"] } }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn retain_ids_drops_unreferenced_queries() {
        let mut sources = BoundarySources::default();
        sources.queries.insert("a".to_string(), BoundaryQuery::relation(&[("name", "A")]));
        sources.queries.insert("b".to_string(), BoundaryQuery::relation(&[("name", "B")]));
        sources.retain_ids(&BTreeSet::from(["b".to_string()]));
        assert_eq!(sources.ids().collect::<Vec<_>>(), vec!["b"]);
    }
}
