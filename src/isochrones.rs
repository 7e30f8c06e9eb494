//! Reachability areas around a single waypoint.

use std::cell::RefCell;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{AvoidFeature, Optimization, Rgb, SpeedProfile};
use crate::context::{IsochroneOptions, RoutingContext, StalenessToken};
use crate::directions::RequestOutcome;
use crate::error::{Alert, AlertSink, RoutingError};
use crate::geometry::{Coordinate, Extent, Geometry, MultiPolygon, Polygon, Ring};
use crate::render::{FeatureId, FeatureLayer, LayerKind};
use crate::traits::{FitOptions, IsochronesProvider, MapView, ProjectionAdapter};
use crate::waypoints::WaypointStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsochronesRequest {
    #[serde(skip)]
    pub profile: SpeedProfile,
    pub interval: f64,
    pub locations: Vec<Coordinate>,
    pub location_type: &'static str,
    pub range_type: &'static str,
    pub range: Vec<f64>,
    pub options: IsochronesRequestOptions,
    pub area_units: &'static str,
    pub units: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsochronesRequestOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub avoid_features: Vec<AvoidFeature>,
    #[serde(skip_serializing_if = "MultiPolygon::is_empty")]
    pub avoid_polygons: MultiPolygon,
}

impl IsochronesRequest {
    pub fn new(location: Coordinate, options: &IsochroneOptions, avoid_polygons: MultiPolygon) -> Self {
        let multiplier = options.optimization.multiplier();
        Self {
            profile: options.speed_profile,
            interval: options.interval * multiplier,
            locations: vec![location],
            location_type: "start",
            range_type: options.optimization.range_type(),
            range: vec![options.value * multiplier],
            options: IsochronesRequestOptions {
                avoid_features: options
                    .speed_profile
                    .filter_avoid_features(&options.avoid_features),
                avoid_polygons,
            },
            area_units: "m",
            units: "m",
        }
    }

    pub fn maximum(&self) -> f64 {
        self.range.first().copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneFeature {
    pub group_index: usize,
    pub value: f64,
    pub rings: Vec<Ring>,
}

/// Provider answer in WGS84.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IsochronesResponse {
    pub bbox: Option<Extent>,
    pub features: Vec<IsochroneFeature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneArea {
    /// Rings in the local projection.
    pub coordinates: Vec<Ring>,
    pub group_index: usize,
    pub value: f64,
    pub maximum: f64,
    pub interval: f64,
    pub speed_profile: SpeedProfile,
    pub optimization: Optimization,
    pub avoided_options: Vec<AvoidFeature>,
    pub display_value: String,
    pub color: Rgb,
}

/// Position of `value` between the innermost ring and the outer range.
///
/// Zero when `value == interval` or `maximum == interval`.
pub fn color_fraction(value: f64, interval: f64, maximum: f64) -> f64 {
    let offset = value - interval;
    let span = maximum - interval;
    if offset == 0.0 || span == 0.0 {
        return 0.0;
    }
    (offset / span).clamp(0.0, 1.0)
}

/// The isochrone center and the areas last committed for it.
#[derive(Debug, Clone)]
pub struct IsochroneStore {
    center: WaypointStore,
    areas: Vec<(FeatureId, IsochroneArea)>,
    layer: FeatureLayer,
    start_color: Rgb,
    end_color: Rgb,
}

impl IsochroneStore {
    pub fn new(start_color: Rgb, end_color: Rgb) -> Self {
        Self {
            center: WaypointStore::with_empty(1),
            areas: Vec::new(),
            layer: FeatureLayer::new(LayerKind::Isochrones),
            start_color,
            end_color,
        }
    }

    /// Single-entry store holding the isochrone center.
    pub fn center(&self) -> &WaypointStore {
        &self.center
    }

    pub fn center_coordinates(&self) -> Option<Coordinate> {
        self.center.get(0).and_then(|w| w.coordinates)
    }

    pub fn center_feature(&self) -> Option<FeatureId> {
        self.center.get(0).map(|w| w.feature)
    }

    pub fn set_center(&mut self, coordinates: Coordinate) {
        self.center.set_coordinates(0, coordinates);
    }

    pub fn set_center_name(&mut self, name: Option<String>) {
        self.center.set_display_name(0, name);
    }

    pub fn clear_center(&mut self) {
        self.center.reset(0);
        self.clear_areas();
    }

    /// Areas in render order, outermost first.
    pub fn areas(&self) -> impl Iterator<Item = &IsochroneArea> {
        self.areas.iter().map(|(_, area)| area)
    }

    pub fn layer(&self) -> &FeatureLayer {
        &self.layer
    }

    pub fn clear_areas(&mut self) {
        for (id, _) in self.areas.drain(..) {
            self.layer.remove(id);
        }
    }

    fn replace_areas(&mut self, areas: Vec<IsochroneArea>) {
        self.clear_areas();
        for area in areas {
            let id = self.layer.allocate();
            self.layer
                .insert(id, Geometry::Polygon(Polygon::new(area.coordinates.clone())));
            self.areas.push((id, area));
        }
    }
}

/// Builds areas from local-projection features, outermost (highest index)
/// first.
fn derive_areas(
    features: Vec<IsochroneFeature>,
    request: &IsochronesRequest,
    optimization: Optimization,
    colors: (Rgb, Rgb),
) -> Vec<IsochroneArea> {
    let maximum = request.maximum();
    let interval = request.interval;
    let (start, end) = colors;
    features
        .into_par_iter()
        .rev()
        .map(|feature| {
            let fraction = color_fraction(feature.value, interval, maximum);
            IsochroneArea {
                display_value: format!(
                    "{} {}",
                    feature.value / optimization.multiplier(),
                    optimization.unit_label()
                ),
                color: start.interpolate(end, fraction),
                coordinates: feature.rings,
                group_index: feature.group_index,
                value: feature.value,
                maximum,
                interval,
                speed_profile: request.profile,
                optimization,
                avoided_options: request.options.avoid_features.clone(),
            }
        })
        .collect()
}

pub struct IsochronesRequestCoordinator<'a, I, P> {
    provider: &'a I,
    projection: &'a P,
    map: &'a dyn MapView,
    alerts: &'a dyn AlertSink,
}

impl<'a, I, P> IsochronesRequestCoordinator<'a, I, P>
where
    I: IsochronesProvider,
    P: ProjectionAdapter,
{
    pub fn new(
        provider: &'a I,
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

    pub async fn find_isochrones(&self, context: &RefCell<RoutingContext>) -> RequestOutcome {
        let (token, center) = {
            let mut ctx = context.borrow_mut();
            let Some(center) = ctx.isochrones.center_coordinates() else {
                debug!("isochrone center not placed");
                return RequestOutcome::Skipped;
            };
            (ctx.dispatch_isochrones(), center)
        };

        let location = match self.projection.to_wgs84(center).await {
            Ok(location) => location,
            Err(err) => return self.fail(err),
        };

        {
            let mut ctx = context.borrow_mut();
            ctx.begin_isochrones_loading();
            ctx.isochrones.clear_areas();
        }

        let result = self.request_and_commit(context, token, location).await;
        context.borrow_mut().end_isochrones_loading();

        match result {
            Ok(outcome) => outcome,
            Err(err) => self.fail(err),
        }
    }

    async fn request_and_commit(
        &self,
        context: &RefCell<RoutingContext>,
        token: StalenessToken,
        location: Coordinate,
    ) -> Result<RequestOutcome, RoutingError> {
        let (options, avoid_areas) = {
            let ctx = context.borrow();
            (ctx.isochrone_options.clone(), ctx.avoid_areas.snapshot())
        };
        let avoid_polygons = avoid_areas.avoid_polygons_wgs84(self.projection).await?;
        let request = IsochronesRequest::new(location, &options, avoid_polygons);

        debug!(
            range = request.maximum(),
            interval = request.interval,
            range_type = request.range_type,
            "requesting isochrones"
        );
        let response = self.provider.isochrones(&request).await?;

        let mut features = Vec::with_capacity(response.features.len());
        for feature in response.features {
            let mut rings = Vec::with_capacity(feature.rings.len());
            for ring in &feature.rings {
                let mut points = Vec::with_capacity(ring.len());
                for point in ring {
                    points.push(self.projection.from_wgs84(*point).await?);
                }
                rings.push(points);
            }
            features.push(IsochroneFeature { rings, ..feature });
        }

        let extent = match response.bbox {
            Some(bbox) => {
                let lower_left = self.projection.from_wgs84(bbox.lower_left()).await?;
                let upper_right = self.projection.from_wgs84(bbox.upper_right()).await?;
                Extent::from_points(&[lower_left, upper_right])
            }
            None => Extent::from_points(features.iter().flat_map(|f| f.rings.iter().flatten())),
        };

        let mut ctx = context.borrow_mut();
        if !ctx.is_current_isochrones(token) {
            debug!("isochrone center changed while the request was in flight, discarding");
            return Ok(RequestOutcome::Discarded);
        }
        let colors = (ctx.isochrones.start_color, ctx.isochrones.end_color);
        let areas = derive_areas(features, &request, options.optimization, colors);
        info!(areas = areas.len(), "isochrones committed");
        ctx.isochrones.replace_areas(areas);
        drop(ctx);

        if let Some(extent) = extent {
            self.map.fit(extent, FitOptions::default());
        }
        Ok(RequestOutcome::Committed)
    }

    fn fail(&self, err: RoutingError) -> RequestOutcome {
        warn!(error = %err, "isochrones request failed");
        self.alerts.alert(Alert::from_error(&err));
        RequestOutcome::Failed(err)
    }
}
