//! Directions request lifecycle.
//!
//! [`RouteRequestCoordinator::find_directions`] snapshots the waypoints,
//! calls the provider and commits the answer only if nothing the answer
//! depends on changed while it was outstanding. Requests are never
//! cancelled; a superseded response simply completes and is dropped.

use std::cell::RefCell;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{AvoidFeature, Preference, SpeedProfile};
use crate::context::{RouteOptions, RoutingContext, StalenessToken};
use crate::error::{Alert, AlertSink, RoutingError};
use crate::geometry::{Coordinate, Extent, MultiPolygon};
use crate::polyline::Polyline;
use crate::route::{RouteCommit, Segment};
use crate::traits::{DirectionsProvider, FitOptions, MapView, ProjectionAdapter};
use crate::waypoints::MIN_WAYPOINTS;

/// Body of a directions request. Coordinates are WGS84 `[lon, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsRequest {
    #[serde(skip)]
    pub profile: SpeedProfile,
    pub coordinates: Vec<Coordinate>,
    pub language: String,
    pub options: DirectionsRequestOptions,
    pub preference: Preference,
    pub units: &'static str,
    pub geometry: bool,
    pub instructions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsRequestOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub avoid_features: Vec<AvoidFeature>,
    pub avoid_polygons: MultiPolygon,
}

impl DirectionsRequest {
    pub fn new(
        coordinates: Vec<Coordinate>,
        options: &RouteOptions,
        avoid_polygons: MultiPolygon,
    ) -> Self {
        Self {
            profile: options.speed_profile,
            coordinates,
            language: options.language.clone(),
            options: DirectionsRequestOptions {
                avoid_features: options
                    .speed_profile
                    .filter_avoid_features(&options.avoid_features),
                avoid_polygons,
            },
            preference: options.preference,
            units: "m",
            geometry: true,
            instructions: options.instructions,
        }
    }
}

/// Provider answer, still in WGS84.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectionsResponse {
    pub bbox: Option<Extent>,
    pub distance: f64,
    pub duration: f64,
    pub coordinates: Vec<Coordinate>,
    pub segments: Vec<Segment>,
    /// Polyline index of each requested coordinate.
    pub way_points: Vec<usize>,
}

/// What a coordinator run did.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// Preconditions not met; nothing was sent.
    Skipped,
    Committed,
    /// The response arrived after the inputs changed and was dropped.
    Discarded,
    /// The failure was alerted; prior state was kept.
    Failed(RoutingError),
}

pub struct RouteRequestCoordinator<'a, D, P> {
    provider: &'a D,
    projection: &'a P,
    map: &'a dyn MapView,
    alerts: &'a dyn AlertSink,
}

impl<'a, D, P> RouteRequestCoordinator<'a, D, P>
where
    D: DirectionsProvider,
    P: ProjectionAdapter,
{
    pub fn new(
        provider: &'a D,
        projection: &'a P,
        map: &'a dyn MapView,
        alerts: &'a dyn AlertSink,
    ) -> Self {
        Self {
            provider,
            projection,
            map,
            alerts,
        }
    }

    pub async fn find_directions(&self, context: &RefCell<RoutingContext>) -> RequestOutcome {
        let (token, placed) = {
            let mut ctx = context.borrow_mut();
            let placed = ctx.waypoints.placed();
            if placed.len() < MIN_WAYPOINTS {
                debug!(placed = placed.len(), "not enough waypoints for a route");
                return RequestOutcome::Skipped;
            }
            (ctx.dispatch_directions(), placed)
        };

        let mut coordinates = Vec::with_capacity(placed.len());
        for (_, point) in &placed {
            match self.projection.to_wgs84(*point).await {
                Ok(lon_lat) => coordinates.push(lon_lat),
                Err(err) => return self.fail(err),
            }
        }

        {
            let mut ctx = context.borrow_mut();
            ctx.begin_loading();
            ctx.route.clear_geometry();
        }

        let result = self.request_and_commit(context, token, coordinates).await;
        context.borrow_mut().end_loading();

        match result {
            Ok(outcome) => outcome,
            Err(err) => self.fail(err),
        }
    }

    async fn request_and_commit(
        &self,
        context: &RefCell<RoutingContext>,
        token: StalenessToken,
        coordinates: Vec<Coordinate>,
    ) -> Result<RequestOutcome, RoutingError> {
        let (options, avoid_areas) = {
            let ctx = context.borrow();
            (ctx.route_options.clone(), ctx.avoid_areas.snapshot())
        };
        let avoid_polygons = avoid_areas.avoid_polygons_wgs84(self.projection).await?;
        let request = DirectionsRequest::new(coordinates, &options, avoid_polygons);

        debug!(
            waypoints = request.coordinates.len(),
            profile = request.profile.as_str(),
            "requesting directions"
        );
        let response = self.provider.directions(&request).await?;

        let mut points = Vec::with_capacity(response.coordinates.len());
        for point in &response.coordinates {
            points.push(self.projection.from_wgs84(*point).await?);
        }

        let extent = {
            let mut ctx = context.borrow_mut();
            if !ctx.is_current_directions(token) {
                debug!("waypoints changed while directions were in flight, discarding");
                return Ok(RequestOutcome::Discarded);
            }
            ctx.waypoints.assign_line_string_indices(&response.way_points);
            ctx.route.commit(RouteCommit {
                bounding_box: response.bbox,
                distance_meters: response.distance,
                duration_seconds: response.duration,
                polyline: Polyline::new(points),
                per_waypoint_polyline_index: response.way_points,
                segments: response.segments,
                avoid_features: request.options.avoid_features.clone(),
                speed_profile: request.profile,
                preference: request.preference,
            });
            ctx.route.extent()
        };

        info!(
            distance_m = response.distance,
            duration_s = response.duration,
            "route committed"
        );
        if let Some(extent) = extent {
            self.map.fit(extent, FitOptions::default());
        }
        Ok(RequestOutcome::Committed)
    }

    fn fail(&self, err: RoutingError) -> RequestOutcome {
        warn!(error = %err, "directions request failed");
        self.alerts.alert(Alert::from_error(&err));
        RequestOutcome::Failed(err)
    }
}
