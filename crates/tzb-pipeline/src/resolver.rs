//! Source resolution: turn a [`SourceRef`] into a geometry.

use crate::error::PipelineError;
use crate::results::ZoneResults;
use serde_json::Value;
use std::collections::BTreeMap;
use tzb_config::{BuildNode, Recipe, SourceRef};
use tzb_geometry::{Geometry, GeometryError, GeometryOps, geometry_from_value};
use tzb_store::{ContentHash, SourceStore};

/// Resolves the sources of one recipe.
///
/// Fetched documents are read once, up front, so that the same bytes feed
/// both the input digest and the geometry.
pub struct SourceResolver<'a> {
    zone: &'a BuildNode,
    ops: &'a GeometryOps,
    built: &'a ZoneResults,
    documents: BTreeMap<String, (Value, ContentHash)>,
}

impl<'a> SourceResolver<'a> {
    /// Load every fetched document `recipe` mentions. Documents that were
    /// never downloaded are skipped here and reported on resolution.
    pub fn for_recipe(
        zone: &'a BuildNode,
        recipe: &Recipe,
        ops: &'a GeometryOps,
        store: &SourceStore,
        built: &'a ZoneResults,
    ) -> Result<Self, PipelineError> {
        let mut documents = BTreeMap::new();
        for query_id in recipe.fetched_ids() {
            if documents.contains_key(query_id) {
                continue;
            }
            if let Some((value, bytes)) = store.read_value(query_id)? {
                documents.insert(query_id.to_string(), (value, ContentHash::from_bytes(&bytes)));
            }
        }
        Ok(Self {
            zone,
            ops,
            built,
            documents,
        })
    }

    /// Digest of everything the recipe's result depends on: the recipe
    /// itself, fetched document bytes, and dependency output digests.
    pub fn input_digest(&self, recipe: &Recipe) -> Result<ContentHash, PipelineError> {
        let mut builder = ContentHash::builder()
            .field("zone", self.zone.zone.as_str())
            .field("variant", self.zone.variant.as_str())
            .field("recipe", &recipe.to_value().to_string());
        for operation in &recipe.operations {
            match &operation.source {
                SourceRef::Fetched { query_id } => {
                    let digest = self.document(query_id)?.1.as_str();
                    builder = builder.field(&format!("source:{query_id}"), digest);
                }
                SourceRef::DerivedZone { zone_id, variant } => {
                    let dependency = BuildNode::new(*variant, zone_id.clone());
                    let result = self.dependency(&dependency)?;
                    builder = builder.field(&format!("zone:{dependency}"), result.digest.as_str());
                }
                SourceRef::ManualPolygon { .. } | SourceRef::ManualMultiPolygon { .. } => {}
            }
        }
        Ok(builder.build())
    }

    pub fn resolve(&self, source: &SourceRef) -> Result<Geometry, PipelineError> {
        match source {
            SourceRef::Fetched { query_id } => {
                let (document, _) = self.document(query_id)?;
                boundary_geometry(self.ops, query_id, document)
            }
            SourceRef::ManualPolygon { coordinates } => {
                Geometry::from_polygon_coords(coordinates).map_err(|err| self.invalid_manual(source, err))
            }
            SourceRef::ManualMultiPolygon { coordinates } => {
                Geometry::from_multi_polygon_coords(coordinates).map_err(|err| self.invalid_manual(source, err))
            }
            SourceRef::DerivedZone { zone_id, variant } => {
                let dependency = BuildNode::new(*variant, zone_id.clone());
                Ok(self.dependency(&dependency)?.geometry.clone())
            }
        }
    }

    fn invalid_manual(&self, source: &SourceRef, err: GeometryError) -> PipelineError {
        PipelineError::InvalidRecipe {
            zone: self.zone.to_string(),
            message: format!("{} source: {err}", source.tag()),
        }
    }

    fn document(&self, query_id: &str) -> Result<&(Value, ContentHash), PipelineError> {
        self.documents
            .get(query_id)
            .ok_or_else(|| PipelineError::MissingSourceData {
                query_id: query_id.to_string(),
                reason: "not downloaded".to_string(),
            })
    }

    fn dependency(&self, node: &BuildNode) -> Result<&crate::results::ZoneResult, PipelineError> {
        self.built
            .get(node)
            .ok_or_else(|| PipelineError::UnresolvedDependency {
                zone: self.zone.to_string(),
                dependency: node.clone(),
            })
    }
}

/// Geometry of a downloaded boundary document.
///
/// A bare Polygon/MultiPolygon is used as is. For a FeatureCollection,
/// every polygonal feature tagged `type: boundary` is unioned, last feature
/// first; other features (enclaves, labels) are ignored.
pub fn boundary_geometry(ops: &GeometryOps, query_id: &str, document: &Value) -> Result<Geometry, PipelineError> {
    let missing = |reason: &str| PipelineError::MissingSourceData {
        query_id: query_id.to_string(),
        reason: reason.to_string(),
    };

    if document.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return geometry_from_value(document).map_err(|err| missing(&err.to_string()));
    }

    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| missing("feature collection without `features`"))?;

    let mut combined: Option<Geometry> = None;
    for feature in features.iter().rev() {
        let polygonal = matches!(
            feature.pointer("/geometry/type").and_then(Value::as_str),
            Some("Polygon") | Some("MultiPolygon")
        );
        let boundary = feature.pointer("/properties/type").and_then(Value::as_str) == Some("boundary");
        if !(polygonal && boundary) {
            continue;
        }
        let geometry = geometry_from_value(&feature["geometry"]).map_err(|err| missing(&err.to_string()))?;
        combined = Some(match combined {
            None => geometry,
            Some(acc) => ops
                .union(&geometry, &acc)
                .map_err(|err| PipelineError::in_zone(&query_id, err))?,
        });
    }
    combined.ok_or_else(|| missing("no boundary features in collection"))
}
