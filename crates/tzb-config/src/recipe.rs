//! Zone recipes: the ordered operation list that derives each zone.
//!
//! The on-disk form is a JSON object mapping zone ids to arrays of
//! `{op, source, id?, data?, variant?}` entries. Parsing turns every entry
//! into a closed [`Operation`]; an unknown `op` or `source` string is an
//! [`ConfigError::InvalidRecipe`] and never reaches the builder.

use crate::error::ConfigError;
use crate::zone::{ZoneId, ZoneVariant};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Init,
    Intersect,
    Difference,
    /// `source - accumulator` rather than `accumulator - source`.
    DifferenceReversed,
    Union,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Init => "init",
            OperationKind::Intersect => "intersect",
            OperationKind::Difference => "difference",
            OperationKind::DifferenceReversed => "difference-reverse-order",
            OperationKind::Union => "union",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(OperationKind::Init),
            "intersect" => Ok(OperationKind::Intersect),
            "difference" => Ok(OperationKind::Difference),
            "difference-reverse-order" => Ok(OperationKind::DifferenceReversed),
            "union" => Ok(OperationKind::Union),
            other => Err(format!("unknown op `{other}`")),
        }
    }
}

/// Where an operation's operand comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRef {
    /// A previously downloaded boundary dataset.
    Fetched { query_id: String },
    /// Literal polygon coordinates (rings, exterior first).
    ManualPolygon { coordinates: Vec<Vec<[f64; 2]>> },
    /// Literal multipolygon coordinates.
    ManualMultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
    /// The already-built result of another zone.
    DerivedZone { zone_id: ZoneId, variant: ZoneVariant },
}

impl SourceRef {
    /// Tag as written in configuration files.
    pub fn tag(&self) -> &'static str {
        match self {
            SourceRef::Fetched { .. } => "overpass",
            SourceRef::ManualPolygon { .. } => "manual-polygon",
            SourceRef::ManualMultiPolygon { .. } => "manual-multipolygon",
            SourceRef::DerivedZone { .. } => "final",
        }
    }

    fn to_value(&self) -> Value {
        match self {
            SourceRef::Fetched { query_id } => json!({ "source": self.tag(), "id": query_id }),
            SourceRef::ManualPolygon { coordinates } => json!({ "source": self.tag(), "data": coordinates }),
            SourceRef::ManualMultiPolygon { coordinates } => {
                json!({ "source": self.tag(), "data": coordinates })
            }
            SourceRef::DerivedZone { zone_id, variant } => {
                json!({ "source": self.tag(), "id": zone_id, "variant": variant })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub source: SourceRef,
}

impl Operation {
    pub fn new(kind: OperationKind, source: SourceRef) -> Self {
        Self { kind, source }
    }

    /// Canonical JSON form, used as input to content digests.
    pub fn to_value(&self) -> Value {
        let mut value = self.source.to_value();
        if let Some(object) = value.as_object_mut() {
            object.insert("op".to_string(), Value::String(self.kind.as_str().to_string()));
        }
        value
    }
}

/// The ordered operation list of one zone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recipe {
    pub operations: Vec<Operation>,
}

impl Recipe {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Query ids of every fetched source in the recipe.
    pub fn fetched_ids(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().filter_map(|operation| match &operation.source {
            SourceRef::Fetched { query_id } => Some(query_id.as_str()),
            _ => None,
        })
    }

    /// Zones (with variant) this recipe reads through derived-zone sources.
    pub fn dependencies(&self) -> BTreeSet<(ZoneVariant, ZoneId)> {
        self.operations
            .iter()
            .filter_map(|operation| match &operation.source {
                SourceRef::DerivedZone { zone_id, variant } => Some((*variant, zone_id.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.operations.iter().map(Operation::to_value).collect())
    }
}

/// Recipes of one variant, keyed (and therefore iterated) by zone id.
pub type ZoneRecipes = BTreeMap<ZoneId, Recipe>;

/// Every configured variant's recipes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneCatalog {
    pub variants: BTreeMap<ZoneVariant, ZoneRecipes>,
}

impl ZoneCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(recipes: ZoneRecipes) -> Self {
        let mut catalog = Self::new();
        catalog.insert(ZoneVariant::Base, recipes);
        catalog
    }

    pub fn insert(&mut self, variant: ZoneVariant, recipes: ZoneRecipes) {
        self.variants.insert(variant, recipes);
    }

    pub fn get(&self, variant: ZoneVariant) -> Option<&ZoneRecipes> {
        self.variants.get(&variant)
    }

    pub fn base(&self) -> Option<&ZoneRecipes> {
        self.get(ZoneVariant::Base)
    }

    pub fn contains(&self, variant: ZoneVariant, zone: &ZoneId) -> bool {
        self.get(variant).is_some_and(|recipes| recipes.contains_key(zone))
    }

    /// All `(variant, zone, recipe)` triples in variant then zone order.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneVariant, &ZoneId, &Recipe)> {
        self.variants
            .iter()
            .flat_map(|(variant, recipes)| recipes.iter().map(move |(zone, recipe)| (*variant, zone, recipe)))
    }

    pub fn zone_count(&self) -> usize {
        self.variants.values().map(BTreeMap::len).sum()
    }
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    op: String,
    source: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    variant: Option<String>,
}

/// Load a recipe file.
pub fn load_recipes(path: &Path) -> Result<ZoneRecipes, ConfigError> {
    parse_recipes(&crate::read_json_file(path)?)
}

/// Parse the `{ zoneId: [operation, ...] }` recipe document.
pub fn parse_recipes(document: &Value) -> Result<ZoneRecipes, ConfigError> {
    let zones = document
        .as_object()
        .ok_or_else(|| ConfigError::Shape("recipe document must be a JSON object".to_string()))?;

    let mut recipes = ZoneRecipes::new();
    for (zone, entries) in zones {
        let entries = entries.as_array().ok_or_else(|| ConfigError::InvalidRecipe {
            zone: zone.clone(),
            index: 0,
            message: "recipe must be an array of operations".to_string(),
        })?;
        let operations = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_operation(zone, index, entry))
            .collect::<Result<Vec<_>, _>>()?;
        recipes.insert(ZoneId::new(zone.as_str()), Recipe::new(operations));
    }
    Ok(recipes)
}

fn parse_operation(zone: &str, index: usize, entry: &Value) -> Result<Operation, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidRecipe {
        zone: zone.to_string(),
        index,
        message,
    };

    let raw: RawOperation =
        serde_json::from_value(entry.clone()).map_err(|err| invalid(err.to_string()))?;
    let kind = raw.op.parse::<OperationKind>().map_err(invalid)?;

    let require_id = |raw: &RawOperation| {
        raw.id
            .clone()
            .ok_or_else(|| invalid(format!("source `{}` requires `id`", raw.source)))
    };
    let require_data = |raw: &RawOperation| {
        raw.data
            .clone()
            .ok_or_else(|| invalid(format!("source `{}` requires `data`", raw.source)))
    };

    let source = match raw.source.as_str() {
        "overpass" => SourceRef::Fetched {
            query_id: require_id(&raw)?,
        },
        "manual-polygon" => SourceRef::ManualPolygon {
            coordinates: serde_json::from_value(require_data(&raw)?)
                .map_err(|err| invalid(format!("manual-polygon data: {err}")))?,
        },
        "manual-multipolygon" => SourceRef::ManualMultiPolygon {
            coordinates: serde_json::from_value(require_data(&raw)?)
                .map_err(|err| invalid(format!("manual-multipolygon data: {err}")))?,
        },
        "final" => SourceRef::DerivedZone {
            zone_id: ZoneId::new(require_id(&raw)?),
            variant: match raw.variant.as_deref() {
                Some(variant) => variant.parse().map_err(invalid)?,
                None => ZoneVariant::Base,
            },
        },
        other => return Err(invalid(format!("unknown source `{other}`"))),
    };

    Ok(Operation::new(kind, source))
}
