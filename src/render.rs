//! Backing render store.
//!
//! Each map layer the engine draws into is a [`FeatureLayer`]. The renderer
//! reads these; the engine only adds, mutates and removes features.

use std::collections::BTreeMap;

use crate::geometry::Geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    Waypoints,
    Route,
    AvoidAreas,
    Isochrones,
}

/// Stable handle to a feature in one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId {
    pub layer: LayerKind,
    pub key: u64,
}

#[derive(Debug, Clone)]
pub struct FeatureLayer {
    kind: LayerKind,
    features: BTreeMap<FeatureId, Geometry>,
    next_key: u64,
    insertions: usize,
}

impl FeatureLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            features: BTreeMap::new(),
            next_key: 0,
            insertions: 0,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Reserves a handle without adding anything to the layer.
    pub fn allocate(&mut self) -> FeatureId {
        let id = FeatureId {
            layer: self.kind,
            key: self.next_key,
        };
        self.next_key += 1;
        id
    }

    pub fn insert(&mut self, id: FeatureId, geometry: Geometry) {
        debug_assert_eq!(id.layer, self.kind);
        if self.features.insert(id, geometry).is_none() {
            self.insertions += 1;
        }
    }

    /// Mutates an existing feature in place. Returns false if absent.
    pub fn update(&mut self, id: FeatureId, geometry: Geometry) -> bool {
        match self.features.get_mut(&id) {
            Some(existing) => {
                *existing = geometry;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: FeatureId) -> Option<Geometry> {
        self.features.remove(&id)
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }

    pub fn get(&self, id: FeatureId) -> Option<&Geometry> {
        self.features.get(&id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.features.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of times a feature was newly added.
    pub fn insertions(&self) -> usize {
        self.insertions
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FeatureId, &Geometry)> {
        self.features.iter()
    }
}
