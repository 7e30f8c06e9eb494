//! Test fixtures for routing-tool.
//!
//! Provides:
//! - Scripted directions/isochrones providers, optionally gated so a test can
//!   act while a request is in flight
//! - A recording map, alert sink and geosearch
//! - Builders for contexts and tools

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use tokio::sync::Notify;

use routing_tool::config::{RoutingConfig, ServiceSettings};
use routing_tool::context::RoutingContext;
use routing_tool::directions::{DirectionsRequest, DirectionsResponse};
use routing_tool::error::{Alert, AlertSink, RoutingError};
use routing_tool::geometry::{Coordinate, Extent};
use routing_tool::interaction::{Interaction, InteractionHandle};
use routing_tool::isochrones::{IsochroneFeature, IsochronesRequest, IsochronesResponse};
use routing_tool::projection::IdentityProjection;
use routing_tool::route::{Segment, Step};
use routing_tool::tool::{Collaborators, RoutingTool};
use routing_tool::traits::{
    DirectionsProvider, FitOptions, Geosearch, GeosearchResult, IsochronesProvider, MapView,
};

// ============================================================================
// Gates
// ============================================================================

/// Holds the first `remaining` calls until the test releases them.
#[derive(Default)]
pub struct Gate {
    pub started: Notify,
    pub release: Notify,
    remaining: Cell<usize>,
}

impl Gate {
    pub fn holding(calls: usize) -> Self {
        let gate = Self::default();
        gate.remaining.set(calls);
        gate
    }

    async fn pass(&self) {
        if self.remaining.get() == 0 {
            return;
        }
        self.remaining.set(self.remaining.get() - 1);
        self.started.notify_one();
        self.release.notified().await;
    }
}

// ============================================================================
// Providers
// ============================================================================

/// Answers directions requests from a queue, in call order.
#[derive(Default)]
pub struct ScriptedDirections {
    responses: RefCell<VecDeque<Result<DirectionsResponse, RoutingError>>>,
    pub gate: Gate,
    pub requests: RefCell<Vec<DirectionsRequest>>,
}

impl ScriptedDirections {
    pub fn new(responses: Vec<Result<DirectionsResponse, RoutingError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn gated(responses: Vec<Result<DirectionsResponse, RoutingError>>, calls: usize) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            gate: Gate::holding(calls),
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl DirectionsProvider for ScriptedDirections {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, RoutingError> {
        self.requests.borrow_mut().push(request.clone());
        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(RoutingError::Fetch("no scripted response".to_string())));
        self.gate.pass().await;
        response
    }
}

#[derive(Default)]
pub struct ScriptedIsochrones {
    responses: RefCell<VecDeque<Result<IsochronesResponse, RoutingError>>>,
    pub gate: Gate,
    pub requests: RefCell<Vec<IsochronesRequest>>,
}

impl ScriptedIsochrones {
    pub fn new(responses: Vec<Result<IsochronesResponse, RoutingError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn gated(responses: Vec<Result<IsochronesResponse, RoutingError>>, calls: usize) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            gate: Gate::holding(calls),
            ..Self::default()
        }
    }
}

impl IsochronesProvider for ScriptedIsochrones {
    async fn isochrones(
        &self,
        request: &IsochronesRequest,
    ) -> Result<IsochronesResponse, RoutingError> {
        self.requests.borrow_mut().push(request.clone());
        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(RoutingError::Fetch("no scripted response".to_string())));
        self.gate.pass().await;
        response
    }
}

// ============================================================================
// Map, alerts, geosearch
// ============================================================================

#[derive(Default)]
pub struct RecordingMap {
    next_handle: Cell<u64>,
    pub attached: RefCell<Vec<(InteractionHandle, Interaction)>>,
    pub aborted: RefCell<Vec<InteractionHandle>>,
    pub fits: RefCell<Vec<Extent>>,
}

impl RecordingMap {
    pub fn attached_interactions(&self) -> Vec<Interaction> {
        self.attached.borrow().iter().map(|(_, i)| *i).collect()
    }
}

impl MapView for RecordingMap {
    fn fit(&self, extent: Extent, _options: FitOptions) {
        self.fits.borrow_mut().push(extent);
    }

    fn add_interaction(&self, interaction: Interaction) -> InteractionHandle {
        self.next_handle.set(self.next_handle.get() + 1);
        let handle = InteractionHandle(self.next_handle.get());
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

#[derive(Default)]
pub struct RecordingAlerts {
    pub alerts: RefCell<Vec<Alert>>,
}

impl AlertSink for RecordingAlerts {
    fn alert(&self, alert: Alert) {
        self.alerts.borrow_mut().push(alert);
    }
}

/// Reverse lookups return `name`; `None` makes every lookup fail.
#[derive(Default)]
pub struct StaticGeosearch {
    pub name: Option<String>,
    pub lookups: RefCell<Vec<Coordinate>>,
}

impl StaticGeosearch {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            lookups: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }
}

impl Geosearch for StaticGeosearch {
    async fn search_by_text(&self, text: &str) -> Result<Vec<GeosearchResult>, RoutingError> {
        match &self.name {
            Some(name) => Ok(vec![GeosearchResult {
                lat: 51.0,
                lng: 8.0,
                display_name: format!("{name} ({text})"),
            }]),
            None => Err(RoutingError::Geosearch("offline".to_string())),
        }
    }

    async fn search_by_coordinate(
        &self,
        lon_lat: Coordinate,
    ) -> Result<GeosearchResult, RoutingError> {
        self.lookups.borrow_mut().push(lon_lat);
        match &self.name {
            Some(name) => Ok(GeosearchResult {
                lat: lon_lat[1],
                lng: lon_lat[0],
                display_name: name.clone(),
            }),
            None => Err(RoutingError::Geosearch("offline".to_string())),
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn config() -> RoutingConfig {
    RoutingConfig {
        directions_service: Some(ServiceSettings::ors("http://localhost:8082/ors")),
        isochrones_service: Some(ServiceSettings::ors("http://localhost:8082/ors")),
        ..RoutingConfig::default()
    }
}

/// Context whose waypoints are placed at `points`, in order.
pub fn placed_context(points: &[Coordinate]) -> RoutingContext {
    let mut context = RoutingContext::new(&config());
    for point in points {
        context.waypoints.add_waypoint(None, Some(*point), None);
    }
    context
}

/// Route response along `points` with the given waypoint indices.
pub fn route_response(
    points: Vec<Coordinate>,
    way_points: Vec<usize>,
    distance: f64,
    duration: f64,
) -> DirectionsResponse {
    let segments = way_points
        .windows(2)
        .map(|pair| Segment {
            distance: distance / (way_points.len() - 1) as f64,
            duration: duration / (way_points.len() - 1) as f64,
            steps: vec![Step {
                distance: distance / (way_points.len() - 1) as f64,
                duration: duration / (way_points.len() - 1) as f64,
                instruction: "Head north".to_string(),
                name: "Hauptstraße".to_string(),
                instruction_type: 11,
                way_points: [pair[0], pair[1]],
            }],
        })
        .collect();
    DirectionsResponse {
        bbox: Extent::from_points(&points),
        distance,
        duration,
        coordinates: points,
        segments,
        way_points,
    }
}

/// The `[8,51] -> [9,52]` scenario answer.
pub fn scenario_response() -> DirectionsResponse {
    route_response(
        vec![[10.21, 51.38], [10.4, 51.5], [10.6, 51.7], [10.8, 51.9]],
        vec![0, 3],
        262.4,
        10.5,
    )
}

pub fn isochrones_response(values: &[f64]) -> IsochronesResponse {
    let features = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let r = 0.01 * (i + 1) as f64;
            IsochroneFeature {
                group_index: 0,
                value: *value,
                rings: vec![vec![[7.1 - r, 50.7 - r], [7.1 + r, 50.7 - r], [7.1, 50.7 + r], [7.1 - r, 50.7 - r]]],
            }
        })
        .collect();
    IsochronesResponse {
        bbox: Some(Extent {
            min_x: 7.0,
            min_y: 50.6,
            max_x: 7.2,
            max_y: 50.8,
        }),
        features,
    }
}

pub struct Harness<G> {
    pub tool: RoutingTool<Rc<ScriptedDirections>, Rc<ScriptedIsochrones>, IdentityProjection, G>,
    pub directions: Rc<ScriptedDirections>,
    pub isochrones: Rc<ScriptedIsochrones>,
    pub map: Rc<RecordingMap>,
    pub alerts: Rc<RecordingAlerts>,
}

pub fn harness<G: Geosearch>(
    directions: ScriptedDirections,
    isochrones: ScriptedIsochrones,
    geosearch: G,
) -> Harness<G> {
    let directions = Rc::new(directions);
    let isochrones = Rc::new(isochrones);
    let map = Rc::new(RecordingMap::default());
    let alerts = Rc::new(RecordingAlerts::default());
    let tool = RoutingTool::open_with(
        &config(),
        directions.clone(),
        isochrones.clone(),
        Collaborators {
            projection: IdentityProjection,
            geosearch,
            map: map.clone(),
            alerts: alerts.clone(),
        },
    )
    .expect("open routing tool");
    Harness {
        tool,
        directions,
        isochrones,
        map,
        alerts,
    }
}
