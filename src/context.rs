//! Per-session state of the routing tool.
//!
//! One [`RoutingContext`] exists while the tool is open. Coordinators borrow
//! it through a `RefCell` and release the borrow before every `.await`, so
//! interaction callbacks can run while a request is in flight.

use crate::avoid_areas::AvoidAreaStore;
use crate::config::{AvoidFeature, Optimization, Preference, RoutingConfig, SpeedProfile};
use crate::isochrones::IsochroneStore;
use crate::route::Route;
use crate::waypoints::{MIN_WAYPOINTS, WaypointStore};

#[derive(Debug, Clone, PartialEq)]
pub struct RouteOptions {
    pub language: String,
    pub speed_profile: SpeedProfile,
    pub avoid_features: Vec<AvoidFeature>,
    pub preference: Preference,
    pub instructions: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneOptions {
    pub speed_profile: SpeedProfile,
    pub optimization: Optimization,
    pub value: f64,
    pub interval: f64,
    pub avoid_features: Vec<AvoidFeature>,
}

/// Captured when a request is dispatched.
///
/// The response may be committed only if no newer request of the same kind
/// was dispatched and the waypoints have not changed since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessToken {
    generation: u64,
    revision: u64,
}

#[derive(Debug, Clone, Default)]
struct RequestTracker {
    generation: u64,
    in_flight: usize,
}

impl RequestTracker {
    fn dispatch(&mut self, revision: u64) -> StalenessToken {
        self.generation += 1;
        StalenessToken {
            generation: self.generation,
            revision,
        }
    }

    fn is_current(&self, token: StalenessToken, revision: u64) -> bool {
        token.generation == self.generation && token.revision == revision
    }
}

#[derive(Debug, Clone)]
pub struct RoutingContext {
    pub waypoints: WaypointStore,
    pub avoid_areas: AvoidAreaStore,
    pub route: Route,
    pub isochrones: IsochroneStore,
    pub route_options: RouteOptions,
    pub isochrone_options: IsochroneOptions,
    directions: RequestTracker,
    isochrone_requests: RequestTracker,
}

impl RoutingContext {
    pub fn new(config: &RoutingConfig) -> Self {
        let directions = &config.directions;
        let isochrones = &config.isochrones;
        Self {
            waypoints: WaypointStore::with_empty(MIN_WAYPOINTS),
            avoid_areas: AvoidAreaStore::new(),
            route: Route::new(),
            isochrones: IsochroneStore::new(isochrones.start_color, isochrones.end_color),
            route_options: RouteOptions {
                language: directions.language.clone(),
                speed_profile: directions.speed_profile,
                avoid_features: directions.avoid_features.clone(),
                preference: directions.preference,
                instructions: directions.instructions,
            },
            isochrone_options: IsochroneOptions {
                speed_profile: isochrones.speed_profile,
                optimization: isochrones.optimization,
                value: isochrones.value,
                interval: isochrones.interval,
                avoid_features: isochrones.avoid_features.clone(),
            },
            directions: RequestTracker::default(),
            isochrone_requests: RequestTracker::default(),
        }
    }

    pub fn dispatch_directions(&mut self) -> StalenessToken {
        self.directions.dispatch(self.waypoints.revision())
    }

    pub fn is_current_directions(&self, token: StalenessToken) -> bool {
        self.directions.is_current(token, self.waypoints.revision())
    }

    pub fn dispatch_isochrones(&mut self) -> StalenessToken {
        self.isochrone_requests
            .dispatch(self.isochrones.center().revision())
    }

    pub fn is_current_isochrones(&self, token: StalenessToken) -> bool {
        self.isochrone_requests
            .is_current(token, self.isochrones.center().revision())
    }

    /// Marks one more request as in flight.
    pub fn begin_loading(&mut self) {
        self.directions.in_flight += 1;
    }

    pub fn end_loading(&mut self) {
        self.directions.in_flight = self.directions.in_flight.saturating_sub(1);
    }

    pub fn begin_isochrones_loading(&mut self) {
        self.isochrone_requests.in_flight += 1;
    }

    pub fn end_isochrones_loading(&mut self) {
        self.isochrone_requests.in_flight = self.isochrone_requests.in_flight.saturating_sub(1);
    }

    /// Any directions or isochrones request outstanding.
    pub fn is_loading(&self) -> bool {
        self.directions.in_flight > 0 || self.isochrone_requests.in_flight > 0
    }
}
