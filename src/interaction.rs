//! Editing gestures and the controller that keeps exactly one set attached.

use tracing::debug;

use crate::geometry::Geometry;
use crate::render::{FeatureId, LayerKind};
use crate::traits::MapView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Waypoints,
    AvoidAreas,
    DeleteAvoidAreas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawType {
    Point,
    Polygon,
}

/// A map interaction the portal should install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Draw { layer: LayerKind, draw_type: DrawType },
    Modify { layer: LayerKind },
    Select { layer: LayerKind },
}

/// Opaque handle returned by the map for an installed interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InteractionHandle(pub u64);

impl InteractionMode {
    pub fn interactions(&self) -> Vec<Interaction> {
        match self {
            InteractionMode::Waypoints => vec![
                Interaction::Draw {
                    layer: LayerKind::Waypoints,
                    draw_type: DrawType::Point,
                },
                Interaction::Modify {
                    layer: LayerKind::Waypoints,
                },
                Interaction::Modify {
                    layer: LayerKind::Route,
                },
            ],
            InteractionMode::AvoidAreas => vec![
                Interaction::Draw {
                    layer: LayerKind::AvoidAreas,
                    draw_type: DrawType::Polygon,
                },
                Interaction::Modify {
                    layer: LayerKind::AvoidAreas,
                },
            ],
            InteractionMode::DeleteAvoidAreas => vec![Interaction::Select {
                layer: LayerKind::AvoidAreas,
            }],
        }
    }
}

/// Events the map emits for the installed interactions.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    DrawEnd { geometry: Geometry },
    ModifyEnd { feature: FeatureId, geometry: Geometry },
    Select { feature: FeatureId },
}

/// Owns every interaction the routing tool has on the map.
///
/// Interactions are only added through [`set_mode`](Self::set_mode) and
/// [`attach`](Self::attach), which first remove whatever is installed.
#[derive(Debug, Default)]
pub struct InteractionModeController {
    mode: InteractionMode,
    installed: Vec<(Interaction, InteractionHandle)>,
}

impl InteractionModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn installed(&self) -> impl Iterator<Item = &Interaction> {
        self.installed.iter().map(|(interaction, _)| interaction)
    }

    pub fn is_attached(&self) -> bool {
        !self.installed.is_empty()
    }

    /// Installs the current mode's interactions.
    pub fn attach(&mut self, map: &dyn MapView) {
        self.detach(map);
        self.install(map);
    }

    pub fn set_mode(&mut self, map: &dyn MapView, mode: InteractionMode) {
        if mode == self.mode && self.is_attached() {
            return;
        }
        debug!(from = ?self.mode, to = ?mode, "switching interaction mode");
        self.detach(map);
        self.mode = mode;
        self.install(map);
    }

    /// Aborts pending sketches and removes every installed interaction.
    pub fn detach(&mut self, map: &dyn MapView) {
        for (interaction, handle) in &self.installed {
            if matches!(interaction, Interaction::Draw { .. }) {
                map.abort_drawing(*handle);
            }
        }
        for (_, handle) in self.installed.drain(..) {
            map.remove_interaction(handle);
        }
    }

    fn install(&mut self, map: &dyn MapView) {
        for interaction in self.mode.interactions() {
            let handle = map.add_interaction(interaction);
            self.installed.push((interaction, handle));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::geometry::Extent;
    use crate::traits::FitOptions;

    #[derive(Default)]
    struct Map {
        next: RefCell<u64>,
        attached: RefCell<Vec<(InteractionHandle, Interaction)>>,
        aborted: RefCell<Vec<InteractionHandle>>,
    }

    impl MapView for Map {
        fn fit(&self, _extent: Extent, _options: FitOptions) {}

        fn add_interaction(&self, interaction: Interaction) -> InteractionHandle {
            let mut next = self.next.borrow_mut();
            *next += 1;
            let handle = InteractionHandle(*next);
            self.attached.borrow_mut().push((handle, interaction));
            handle
        }

        fn remove_interaction(&self, handle: InteractionHandle) {
            self.attached.borrow_mut().retain(|(h, _)| *h != handle);
        }

        fn abort_drawing(&self, handle: InteractionHandle) {
            self.aborted.borrow_mut().push(handle);
        }
    }

    fn attached(map: &Map) -> Vec<Interaction> {
        map.attached.borrow().iter().map(|(_, i)| *i).collect()
    }

    #[test]
    fn starts_in_waypoint_mode() {
        let map = Map::default();
        let mut controller = InteractionModeController::new();
        controller.attach(&map);
        assert_eq!(controller.mode(), InteractionMode::Waypoints);
        assert_eq!(attached(&map), InteractionMode::Waypoints.interactions());
    }

    #[test]
    fn only_one_mode_attached_after_transitions() {
        let map = Map::default();
        let mut controller = InteractionModeController::new();
        controller.attach(&map);
        for mode in [
            InteractionMode::AvoidAreas,
            InteractionMode::DeleteAvoidAreas,
            InteractionMode::Waypoints,
            InteractionMode::AvoidAreas,
        ] {
            controller.set_mode(&map, mode);
            assert_eq!(attached(&map), mode.interactions());
            assert_eq!(controller.installed().count(), mode.interactions().len());
        }
    }

    #[test]
    fn transition_aborts_pending_draw() {
        let map = Map::default();
        let mut controller = InteractionModeController::new();
        controller.attach(&map);
        let draw = map.attached.borrow()[0].0;
        controller.set_mode(&map, InteractionMode::DeleteAvoidAreas);
        assert_eq!(*map.aborted.borrow(), vec![draw]);

        // select has no sketch to abort
        controller.set_mode(&map, InteractionMode::Waypoints);
        assert_eq!(map.aborted.borrow().len(), 1);
    }

    #[test]
    fn same_mode_is_not_reinstalled() {
        let map = Map::default();
        let mut controller = InteractionModeController::new();
        controller.attach(&map);
        let before = map.attached.borrow().clone();
        controller.set_mode(&map, InteractionMode::Waypoints);
        assert_eq!(*map.attached.borrow(), before);
    }

    #[test]
    fn detach_removes_everything() {
        let map = Map::default();
        let mut controller = InteractionModeController::new();
        controller.attach(&map);
        controller.detach(&map);
        assert!(map.attached.borrow().is_empty());
        assert!(!controller.is_attached());
    }
}
