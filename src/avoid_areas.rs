//! Polygons the route and isochrones must stay out of.

use crate::error::RoutingError;
use crate::geometry::{Geometry, MultiPolygon, Polygon};
use crate::render::{FeatureId, FeatureLayer, LayerKind};
use crate::traits::ProjectionAdapter;

/// Unordered set of avoid polygons, keyed by their render feature.
#[derive(Debug, Clone)]
pub struct AvoidAreaStore {
    layer: FeatureLayer,
}

impl Default for AvoidAreaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AvoidAreaStore {
    pub fn new() -> Self {
        Self {
            layer: FeatureLayer::new(LayerKind::AvoidAreas),
        }
    }

    pub fn add(&mut self, polygon: Polygon) -> FeatureId {
        let id = self.layer.allocate();
        self.layer.insert(id, Geometry::Polygon(polygon));
        id
    }

    pub fn remove(&mut self, id: FeatureId) -> bool {
        self.layer.remove(id).is_some()
    }

    /// Replaces the polygon of an existing area. False if unknown.
    pub fn modify(&mut self, id: FeatureId, polygon: Polygon) -> bool {
        self.layer.update(id, Geometry::Polygon(polygon))
    }

    pub fn clear(&mut self) {
        self.layer.clear();
    }

    pub fn len(&self) -> usize {
        self.layer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layer.is_empty()
    }

    pub fn layer(&self) -> &FeatureLayer {
        &self.layer
    }

    /// Owned copy of the polygons, taken before any transformation awaits.
    pub fn snapshot(&self) -> AvoidAreaSnapshot {
        let polygons = self
            .layer
            .iter()
            .filter_map(|(_, geometry)| match geometry {
                Geometry::Polygon(polygon) => Some(polygon.clone()),
                _ => None,
            })
            .collect();
        AvoidAreaSnapshot { polygons }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvoidAreaSnapshot {
    pub polygons: Vec<Polygon>,
}

impl AvoidAreaSnapshot {
    /// Transforms every ring point to WGS84, one awaited call per point.
    pub async fn avoid_polygons_wgs84<P>(&self, projection: &P) -> Result<MultiPolygon, RoutingError>
    where
        P: ProjectionAdapter,
    {
        let mut polygons = Vec::with_capacity(self.polygons.len());
        for polygon in &self.polygons {
            let mut rings = Vec::with_capacity(polygon.rings.len());
            for ring in &polygon.rings {
                let mut points = Vec::with_capacity(ring.len());
                for point in ring {
                    points.push(projection.to_wgs84(*point).await?);
                }
                rings.push(points);
            }
            polygons.push(rings);
        }
        Ok(MultiPolygon::new(polygons))
    }
}
