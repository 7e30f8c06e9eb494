//! The routing tool: lifecycle, map event wiring and list operations.
//!
//! A [`RoutingTool`] is created when the user opens the tool and dropped
//! (via [`RoutingTool::close`]) when it closes. All methods take `&self` so
//! several gesture callbacks can be in progress on the same task; state is
//! only borrowed between suspension points.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::RoutingConfig;
use crate::context::{IsochroneOptions, RouteOptions, RoutingContext};
use crate::directions::{RequestOutcome, RouteRequestCoordinator};
use crate::error::{Alert, AlertSink, RoutingError};
use crate::export::{ExportFormat, RouteExport};
use crate::geometry::{Coordinate, Geometry};
use crate::interaction::{InteractionMode, InteractionModeController, MapEvent};
use crate::isochrones::IsochronesRequestCoordinator;
use crate::ors::OrsClient;
use crate::providers::{DirectionsService, isochrones_from_settings};
use crate::render::{FeatureId, LayerKind};
use crate::traits::{
    DirectionsProvider, Geosearch, GeosearchResult, IsochronesProvider, MapView,
    ProjectionAdapter,
};
use crate::waypoints::{RemoveOutcome, format_coordinate};

/// Which coordinator store mutations re-trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceMode {
    #[default]
    Directions,
    Isochrones,
}

/// Portal-side collaborators handed to the tool on open.
pub struct Collaborators<P, G> {
    pub projection: P,
    pub geosearch: G,
    pub map: Rc<dyn MapView>,
    pub alerts: Rc<dyn AlertSink>,
}

pub struct RoutingTool<D, I, P, G> {
    context: RefCell<RoutingContext>,
    modes: RefCell<InteractionModeController>,
    service_mode: Cell<ServiceMode>,
    directions: D,
    isochrones: I,
    projection: P,
    geosearch: G,
    map: Rc<dyn MapView>,
    alerts: Rc<dyn AlertSink>,
}

impl<P, G> RoutingTool<DirectionsService, OrsClient, P, G>
where
    P: ProjectionAdapter,
    G: Geosearch,
{
    /// Opens the tool with the providers named in the configuration.
    pub fn open(config: &RoutingConfig, collaborators: Collaborators<P, G>) -> Result<Self, RoutingError> {
        config.validate()?;
        let (Some(directions), Some(isochrones)) =
            (&config.directions_service, &config.isochrones_service)
        else {
            return Err(RoutingError::Configuration("service settings missing".to_string()));
        };
        let directions = DirectionsService::from_settings(directions)?;
        let isochrones = isochrones_from_settings(isochrones)?;
        Self::open_with(config, directions, isochrones, collaborators)
    }
}

impl<D, I, P, G> RoutingTool<D, I, P, G>
where
    D: DirectionsProvider,
    I: IsochronesProvider,
    P: ProjectionAdapter,
    G: Geosearch,
{
    pub fn open_with(
        config: &RoutingConfig,
        directions: D,
        isochrones: I,
        collaborators: Collaborators<P, G>,
    ) -> Result<Self, RoutingError> {
        config.validate()?;
        let mut modes = InteractionModeController::new();
        modes.attach(&*collaborators.map);
        info!("routing tool opened");

        Ok(Self {
            context: RefCell::new(RoutingContext::new(config)),
            modes: RefCell::new(modes),
            service_mode: Cell::new(ServiceMode::Directions),
            directions,
            isochrones,
            projection: collaborators.projection,
            geosearch: collaborators.geosearch,
            map: collaborators.map,
            alerts: collaborators.alerts,
        })
    }

    /// Removes the tool's interactions and discards all session state.
    pub fn close(self) {
        self.modes.borrow_mut().detach(&*self.map);
        info!("routing tool closed");
    }

    pub fn context(&self) -> Ref<'_, RoutingContext> {
        self.context.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.context.borrow().is_loading()
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.modes.borrow().mode()
    }

    pub fn set_interaction_mode(&self, mode: InteractionMode) {
        self.modes.borrow_mut().set_mode(&*self.map, mode);
    }

    pub fn service_mode(&self) -> ServiceMode {
        self.service_mode.get()
    }

    pub async fn set_service_mode(&self, mode: ServiceMode) -> RequestOutcome {
        if self.service_mode.replace(mode) == mode {
            return RequestOutcome::Skipped;
        }
        self.refresh().await
    }

    pub async fn set_route_options(&self, options: RouteOptions) -> RequestOutcome {
        self.context.borrow_mut().route_options = options;
        self.find_directions().await
    }

    pub async fn set_isochrone_options(&self, options: IsochroneOptions) -> RequestOutcome {
        self.context.borrow_mut().isochrone_options = options;
        self.find_isochrones().await
    }

    pub async fn find_directions(&self) -> RequestOutcome {
        RouteRequestCoordinator::new(
            &self.directions,
            &self.projection,
            &*self.map,
            &*self.alerts,
        )
        .find_directions(&self.context)
        .await
    }

    pub async fn find_isochrones(&self) -> RequestOutcome {
        IsochronesRequestCoordinator::new(
            &self.isochrones,
            &self.projection,
            &*self.map,
            &*self.alerts,
        )
        .find_isochrones(&self.context)
        .await
    }

    /// Re-requests whatever the current service mode shows.
    pub async fn refresh(&self) -> RequestOutcome {
        match self.service_mode.get() {
            ServiceMode::Directions => self.find_directions().await,
            ServiceMode::Isochrones => self.find_isochrones().await,
        }
    }

    /// Adds an unplaced waypoint slot; no request is made.
    pub fn add_waypoint(&self, index: Option<usize>) -> usize {
        self.context.borrow_mut().waypoints.add_waypoint(index, None, None)
    }

    pub async fn remove_waypoint(&self, index: usize, reload: bool) -> RequestOutcome {
        let outcome = {
            let mut ctx = self.context.borrow_mut();
            let outcome = ctx.waypoints.remove_waypoint(index);
            if outcome == Some(RemoveOutcome::Reset) {
                ctx.route.clear();
                ctx.waypoints.clear_line_string_indices();
            }
            outcome
        };
        match outcome {
            Some(RemoveOutcome::Removed) if reload => self.find_directions().await,
            _ => RequestOutcome::Skipped,
        }
    }

    pub async fn move_waypoint_up(&self, index: usize) -> RequestOutcome {
        if !self.context.borrow_mut().waypoints.move_up(index) {
            return RequestOutcome::Skipped;
        }
        self.find_directions().await
    }

    pub async fn move_waypoint_down(&self, index: usize) -> RequestOutcome {
        if !self.context.borrow_mut().waypoints.move_down(index) {
            return RequestOutcome::Skipped;
        }
        self.find_directions().await
    }

    /// Address search; failures are logged and yield no results.
    pub async fn search(&self, text: &str) -> Vec<GeosearchResult> {
        match self.geosearch.search_by_text(text).await {
            Ok(results) => results,
            Err(err) => {
                warn!(error = %err, "address search failed");
                Vec::new()
            }
        }
    }

    /// Places a waypoint (or the isochrone center) at a search result.
    pub async fn select_search_result(&self, index: usize, result: GeosearchResult) -> RequestOutcome {
        let local = match self.projection.from_wgs84([result.lng, result.lat]).await {
            Ok(local) => local,
            Err(err) => {
                warn!(error = %err, "search result outside the map projection");
                self.alerts.alert(Alert::from_error(&err));
                return RequestOutcome::Failed(err);
            }
        };
        match self.service_mode.get() {
            ServiceMode::Directions => {
                {
                    let mut ctx = self.context.borrow_mut();
                    if ctx.waypoints.get(index).is_none() {
                        return RequestOutcome::Skipped;
                    }
                    ctx.waypoints.set_coordinates(index, local);
                    ctx.waypoints.set_display_name(index, Some(result.display_name));
                }
                self.find_directions().await
            }
            ServiceMode::Isochrones => {
                {
                    let mut ctx = self.context.borrow_mut();
                    ctx.isochrones.set_center(local);
                    ctx.isochrones.set_center_name(Some(result.display_name));
                }
                self.find_isochrones().await
            }
        }
    }

    /// Entry point for `drawend`, `modifyend` and `select` events.
    ///
    /// In isochrone mode the waypoint layer shows the isochrone center, so
    /// waypoint events are routed to it.
    pub async fn handle_event(&self, event: MapEvent) -> RequestOutcome {
        let mode = self.interaction_mode();
        match event {
            MapEvent::DrawEnd { geometry } => match (mode, geometry) {
                (InteractionMode::Waypoints, Geometry::Point(point)) => {
                    self.place_waypoint(point).await
                }
                (InteractionMode::AvoidAreas, Geometry::Polygon(polygon)) => {
                    self.context.borrow_mut().avoid_areas.add(polygon);
                    self.refresh().await
                }
                (mode, geometry) => {
                    debug!(?mode, ?geometry, "ignoring draw end");
                    RequestOutcome::Skipped
                }
            },
            MapEvent::ModifyEnd { feature, geometry } => match (feature.layer, geometry) {
                (LayerKind::Waypoints, Geometry::Point(point)) => {
                    self.move_waypoint_to(feature, point).await
                }
                (LayerKind::Route, Geometry::LineString(points)) => {
                    self.insert_waypoint_from_route_drag(points).await
                }
                (LayerKind::AvoidAreas, Geometry::Polygon(polygon)) => {
                    if !self.context.borrow_mut().avoid_areas.modify(feature, polygon) {
                        return RequestOutcome::Skipped;
                    }
                    self.refresh().await
                }
                (layer, _) => {
                    debug!(?layer, "ignoring modify end");
                    RequestOutcome::Skipped
                }
            },
            MapEvent::Select { feature } => {
                if mode != InteractionMode::DeleteAvoidAreas || feature.layer != LayerKind::AvoidAreas {
                    return RequestOutcome::Skipped;
                }
                if !self.context.borrow_mut().avoid_areas.remove(feature) {
                    return RequestOutcome::Skipped;
                }
                self.refresh().await
            }
        }
    }

    async fn place_waypoint(&self, point: Coordinate) -> RequestOutcome {
        match self.service_mode.get() {
            ServiceMode::Directions => {
                let feature = {
                    let mut ctx = self.context.borrow_mut();
                    let position = ctx.waypoints.add_waypoint(None, Some(point), None);
                    ctx.waypoints.get(position).map(|w| w.feature)
                };
                let name = self.resolve_display_name(point).await;
                if let Some(feature) = feature {
                    self.name_waypoint(feature, name);
                }
                self.find_directions().await
            }
            ServiceMode::Isochrones => {
                self.context.borrow_mut().isochrones.set_center(point);
                let name = self.resolve_display_name(point).await;
                self.context.borrow_mut().isochrones.set_center_name(name);
                self.find_isochrones().await
            }
        }
    }

    async fn move_waypoint_to(&self, feature: FeatureId, point: Coordinate) -> RequestOutcome {
        match self.service_mode.get() {
            ServiceMode::Directions => {
                {
                    let mut ctx = self.context.borrow_mut();
                    let Some(position) = ctx.waypoints.position_of(feature) else {
                        return RequestOutcome::Skipped;
                    };
                    ctx.waypoints.set_coordinates(position, point);
                }
                let name = self.resolve_display_name(point).await;
                self.name_waypoint(feature, name);
                self.find_directions().await
            }
            ServiceMode::Isochrones => {
                self.context.borrow_mut().isochrones.set_center(point);
                let name = self.resolve_display_name(point).await;
                self.context.borrow_mut().isochrones.set_center_name(name);
                self.find_isochrones().await
            }
        }
    }

    /// Drag-to-insert: the user pulled the drawn route to a new position.
    ///
    /// Only the first point where `points` leaves the committed polyline is
    /// turned into a waypoint.
    async fn insert_waypoint_from_route_drag(&self, points: Vec<Coordinate>) -> RequestOutcome {
        let inserted = {
            let mut ctx = self.context.borrow_mut();
            let polyline = ctx.route.polyline();
            let divergence = polyline.first_divergence(&points);
            // a vertex inserted at `index` sits on the segment starting at `index - 1`
            let added_vertex = points.len() > polyline.len();
            match divergence.and_then(|index| points.get(index).map(|p| (index, *p))) {
                Some((index, point)) => {
                    let segment_start = if added_vertex {
                        index.saturating_sub(1)
                    } else {
                        index
                    };
                    match ctx.waypoints.find_waypoint_between_line_string_index(segment_start) {
                        Some(lower) => {
                            let position = ctx.waypoints.add_waypoint(Some(lower + 1), None, None);
                            ctx.waypoints.set_coordinates(position, point);
                            debug!(polyline_index = index, position, "waypoint inserted from route drag");
                            ctx.waypoints.get(position).map(|w| (w.feature, point))
                        }
                        None => {
                            debug!(polyline_index = index, "route drag outside any waypoint pair");
                            None
                        }
                    }
                }
                None => None,
            }
        };

        if let Some((feature, point)) = inserted {
            let name = self.resolve_display_name(point).await;
            self.name_waypoint(feature, name);
        }
        self.find_directions().await
    }

    /// Reverse geocodes a local position. Falls back to the formatted WGS84
    /// coordinates when the lookup fails.
    async fn resolve_display_name(&self, local: Coordinate) -> Option<String> {
        let lon_lat = match self.projection.to_wgs84(local).await {
            Ok(lon_lat) => lon_lat,
            Err(err) => {
                warn!(error = %err, "cannot name waypoint");
                return None;
            }
        };
        match self.geosearch.search_by_coordinate(lon_lat).await {
            Ok(result) => Some(result.display_name),
            Err(err) => {
                debug!(error = %err, "reverse geocoding failed");
                Some(format_coordinate(lon_lat))
            }
        }
    }

    fn name_waypoint(&self, feature: FeatureId, name: Option<String>) {
        let mut ctx = self.context.borrow_mut();
        if let Some(position) = ctx.waypoints.position_of(feature) {
            ctx.waypoints.set_display_name(position, name);
        }
    }

    /// Serializes the committed route, `None` if there is none.
    pub async fn export_route(&self, format: ExportFormat) -> Result<Option<String>, RoutingError> {
        let export = RouteExport::collect(&self.context, &self.projection).await?;
        Ok(export.map(|export| export.render(format)))
    }
}
