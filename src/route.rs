//! The committed route the renderer draws.

use crate::config::{AvoidFeature, Preference, SpeedProfile};
use crate::geometry::{Coordinate, Extent, Geometry};
use crate::polyline::Polyline;
use crate::render::{FeatureId, FeatureLayer, LayerKind};

/// One turn-by-turn instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub distance: f64,
    pub duration: f64,
    pub instruction: String,
    /// Street name, empty where the service has none.
    pub name: String,
    /// Maneuver type code reported by the service.
    pub instruction_type: u32,
    /// Inclusive `[start, end]` range into the route polyline.
    pub way_points: [usize; 2],
}

/// Leg between two consecutive waypoints.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    pub distance: f64,
    pub duration: f64,
    pub steps: Vec<Step>,
}

/// Everything a successful, current response writes into the route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCommit {
    pub bounding_box: Option<Extent>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub polyline: Polyline,
    pub per_waypoint_polyline_index: Vec<usize>,
    pub segments: Vec<Segment>,
    pub avoid_features: Vec<AvoidFeature>,
    pub speed_profile: SpeedProfile,
    pub preference: Preference,
}

#[derive(Debug, Clone)]
pub struct Route {
    feature: FeatureId,
    layer: FeatureLayer,
    /// WGS84 bounding box as reported by the service.
    pub bounding_box: Option<Extent>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    polyline: Polyline,
    pub per_waypoint_polyline_index: Vec<usize>,
    pub segments: Vec<Segment>,
    pub avoid_features: Vec<AvoidFeature>,
    pub speed_profile: Option<SpeedProfile>,
    pub preference: Option<Preference>,
}

impl Default for Route {
    fn default() -> Self {
        Self::new()
    }
}

impl Route {
    pub fn new() -> Self {
        let mut layer = FeatureLayer::new(LayerKind::Route);
        let feature = layer.allocate();
        Self {
            feature,
            layer,
            bounding_box: None,
            distance_meters: 0.0,
            duration_seconds: 0.0,
            polyline: Polyline::default(),
            per_waypoint_polyline_index: Vec::new(),
            segments: Vec::new(),
            avoid_features: Vec::new(),
            speed_profile: None,
            preference: None,
        }
    }

    pub fn feature(&self) -> FeatureId {
        self.feature
    }

    pub fn layer(&self) -> &FeatureLayer {
        &self.layer
    }

    pub fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    /// True once a response has been committed and not cleared since.
    pub fn is_committed(&self) -> bool {
        self.speed_profile.is_some()
    }

    pub fn extent(&self) -> Option<Extent> {
        self.polyline.extent()
    }

    /// Empties the drawn line. Summary fields stay until the next commit.
    pub fn clear_geometry(&mut self) {
        self.polyline.clear();
        self.set_rendered(Vec::new());
    }

    /// Forgets the committed route entirely.
    pub fn clear(&mut self) {
        self.clear_geometry();
        self.bounding_box = None;
        self.distance_meters = 0.0;
        self.duration_seconds = 0.0;
        self.per_waypoint_polyline_index.clear();
        self.segments.clear();
        self.avoid_features.clear();
        self.speed_profile = None;
        self.preference = None;
    }

    /// Writes a response into the route; the rendered feature is kept and
    /// only its coordinates change.
    pub fn commit(&mut self, commit: RouteCommit) {
        self.set_rendered(commit.polyline.points().to_vec());
        self.bounding_box = commit.bounding_box;
        self.distance_meters = commit.distance_meters;
        self.duration_seconds = commit.duration_seconds;
        self.polyline = commit.polyline;
        self.per_waypoint_polyline_index = commit.per_waypoint_polyline_index;
        self.segments = commit.segments;
        self.avoid_features = commit.avoid_features;
        self.speed_profile = Some(commit.speed_profile);
        self.preference = Some(commit.preference);
    }

    fn set_rendered(&mut self, points: Vec<Coordinate>) {
        let geometry = Geometry::LineString(points);
        if !self.layer.update(self.feature, geometry.clone()) {
            self.layer.insert(self.feature, geometry);
        }
    }
}
