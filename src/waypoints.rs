//! Ordered waypoint list backing the directions request.

use crate::geometry::{Coordinate, Geometry};
use crate::line_string_index;
use crate::render::{FeatureId, FeatureLayer, LayerKind};

/// Route mode never shows fewer waypoints than this.
pub const MIN_WAYPOINTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub index: usize,
    pub coordinates: Option<Coordinate>,
    pub display_name: Option<String>,
    /// Position along the last committed route polyline.
    pub line_string_index: Option<usize>,
    pub feature: FeatureId,
    pub added_to_backing_store: bool,
}

impl Waypoint {
    fn new(index: usize, feature: FeatureId) -> Self {
        Self {
            index,
            coordinates: None,
            display_name: None,
            line_string_index: None,
            feature,
            added_to_backing_store: false,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.coordinates.is_some()
    }

    /// Explicit name, else the coordinates, else empty.
    pub fn label(&self) -> String {
        match (&self.display_name, self.coordinates) {
            (Some(name), _) => name.clone(),
            (None, Some(coordinates)) => format_coordinate(coordinates),
            (None, None) => String::new(),
        }
    }
}

/// `"y, x"` with six decimals, i.e. `"lat, lon"` for WGS84 input.
pub fn format_coordinate(coordinate: Coordinate) -> String {
    format!("{:.6}, {:.6}", coordinate[1], coordinate[0])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// List was at the floor; the waypoint was cleared in place.
    Reset,
    Removed,
}

#[derive(Debug, Clone)]
pub struct WaypointStore {
    waypoints: Vec<Waypoint>,
    layer: FeatureLayer,
    revision: u64,
}

impl Default for WaypointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WaypointStore {
    pub fn new() -> Self {
        Self {
            waypoints: Vec::new(),
            layer: FeatureLayer::new(LayerKind::Waypoints),
            revision: 0,
        }
    }

    /// Store pre-filled with `count` unplaced waypoints.
    pub fn with_empty(count: usize) -> Self {
        let mut store = Self::new();
        for _ in 0..count {
            store.add_waypoint(None, None, None);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn layer(&self) -> &FeatureLayer {
        &self.layer
    }

    /// Bumped on every change to the list or to any waypoint's coordinates.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn position_of(&self, feature: FeatureId) -> Option<usize> {
        self.waypoints.iter().position(|w| w.feature == feature)
    }

    /// Coordinates of every placed waypoint, with its list position.
    pub fn placed(&self) -> Vec<(usize, Coordinate)> {
        self.waypoints
            .iter()
            .filter_map(|w| w.coordinates.map(|c| (w.index, c)))
            .collect()
    }

    /// Adds a waypoint, or fills the first unplaced one.
    ///
    /// When `coordinates` are given and some waypoint has none yet, they go
    /// onto that waypoint instead of growing the list. Returns the position
    /// of the waypoint that received the data.
    pub fn add_waypoint(
        &mut self,
        index: Option<usize>,
        coordinates: Option<Coordinate>,
        display_name: Option<String>,
    ) -> usize {
        if let Some(coordinates) = coordinates {
            if let Some(empty) = self.waypoints.iter().position(|w| !w.is_placed()) {
                self.set_coordinates(empty, coordinates);
                if display_name.is_some() {
                    self.waypoints[empty].display_name = display_name;
                }
                return empty;
            }
        }

        let position = index.unwrap_or(self.waypoints.len()).min(self.waypoints.len());
        let feature = self.layer.allocate();
        self.waypoints.insert(position, Waypoint::new(position, feature));
        self.reindex(position);
        self.revision += 1;

        if let Some(coordinates) = coordinates {
            self.set_coordinates(position, coordinates);
        }
        self.waypoints[position].display_name = display_name;
        position
    }

    /// Removes a waypoint; at the floor it is reset instead.
    ///
    /// The caller clears the committed route on `Reset` and re-requests on
    /// `Removed` if it wants to reload.
    pub fn remove_waypoint(&mut self, index: usize) -> Option<RemoveOutcome> {
        if index >= self.waypoints.len() {
            return None;
        }
        if self.waypoints.len() <= MIN_WAYPOINTS {
            self.reset(index);
            return Some(RemoveOutcome::Reset);
        }
        let removed = self.waypoints.remove(index);
        self.layer.remove(removed.feature);
        self.reindex(index);
        self.revision += 1;
        Some(RemoveOutcome::Removed)
    }

    /// Clears coordinates, name and polyline index, and drops the geometry.
    pub fn reset(&mut self, index: usize) {
        let Some(waypoint) = self.waypoints.get_mut(index) else {
            return;
        };
        waypoint.coordinates = None;
        waypoint.display_name = None;
        waypoint.line_string_index = None;
        if waypoint.added_to_backing_store {
            self.layer.remove(waypoint.feature);
            waypoint.added_to_backing_store = false;
        }
        self.revision += 1;
    }

    /// Swaps with the previous waypoint. False at the top of the list.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.waypoints.len() {
            return false;
        }
        self.waypoints.swap(index - 1, index);
        self.reindex(index - 1);
        self.revision += 1;
        true
    }

    /// Swaps with the next waypoint. False at the bottom of the list.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.waypoints.len() {
            return false;
        }
        self.move_up(index + 1)
    }

    /// Assigns coordinates, adding the geometry to the layer on first use.
    pub fn set_coordinates(&mut self, index: usize, coordinates: Coordinate) {
        let Some(waypoint) = self.waypoints.get_mut(index) else {
            return;
        };
        if waypoint.coordinates == Some(coordinates) && waypoint.added_to_backing_store {
            return;
        }
        waypoint.coordinates = Some(coordinates);
        if waypoint.added_to_backing_store {
            self.layer.update(waypoint.feature, Geometry::Point(coordinates));
        } else {
            self.layer.insert(waypoint.feature, Geometry::Point(coordinates));
            waypoint.added_to_backing_store = true;
        }
        self.revision += 1;
    }

    pub fn set_display_name(&mut self, index: usize, name: Option<String>) {
        if let Some(waypoint) = self.waypoints.get_mut(index) {
            waypoint.display_name = name;
        }
    }

    /// Assigns polyline indices to the placed waypoints, in list order.
    ///
    /// Unplaced waypoints keep no index.
    pub fn assign_line_string_indices(&mut self, indices: &[usize]) {
        let mut indices = indices.iter();
        for waypoint in &mut self.waypoints {
            waypoint.line_string_index = if waypoint.is_placed() {
                indices.next().copied()
            } else {
                None
            };
        }
    }

    pub fn clear_line_string_indices(&mut self) {
        for waypoint in &mut self.waypoints {
            waypoint.line_string_index = None;
        }
    }

    pub fn find_waypoint_between_line_string_index(&self, target: usize) -> Option<usize> {
        line_string_index::find_waypoint_between(&self.waypoints, target)
    }

    fn reindex(&mut self, from: usize) {
        for (index, waypoint) in self.waypoints.iter_mut().enumerate().skip(from) {
            waypoint.index = index;
        }
    }
}
