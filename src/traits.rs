//! Collaborator interfaces the engine is written against.
//!
//! Everything here runs on one cooperative task, so the async traits carry no
//! `Send` bounds. Concrete providers live in `ors` and `haversine`; the map,
//! projection and geosearch are supplied by the portal.

use std::rc::Rc;

use crate::directions::{DirectionsRequest, DirectionsResponse};
use crate::error::RoutingError;
use crate::geometry::{Coordinate, Extent};
use crate::interaction::{Interaction, InteractionHandle};
use crate::isochrones::{IsochronesRequest, IsochronesResponse};

/// Converts between the map's local projection and WGS84.
#[allow(async_fn_in_trait)]
pub trait ProjectionAdapter {
    async fn to_wgs84(&self, point: Coordinate) -> Result<Coordinate, RoutingError>;

    async fn from_wgs84(&self, point: Coordinate) -> Result<Coordinate, RoutingError>;
}

/// Computes a route through an ordered list of WGS84 coordinates.
#[allow(async_fn_in_trait)]
pub trait DirectionsProvider {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, RoutingError>;
}

/// Computes reachability areas around one WGS84 location.
#[allow(async_fn_in_trait)]
pub trait IsochronesProvider {
    async fn isochrones(
        &self,
        request: &IsochronesRequest,
    ) -> Result<IsochronesResponse, RoutingError>;
}

impl<T: DirectionsProvider> DirectionsProvider for Rc<T> {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, RoutingError> {
        (**self).directions(request).await
    }
}

impl<T: IsochronesProvider> IsochronesProvider for Rc<T> {
    async fn isochrones(
        &self,
        request: &IsochronesRequest,
    ) -> Result<IsochronesResponse, RoutingError> {
        (**self).isochrones(request).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeosearchResult {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
}

/// Address search service.
#[allow(async_fn_in_trait)]
pub trait Geosearch {
    async fn search_by_text(&self, text: &str) -> Result<Vec<GeosearchResult>, RoutingError>;

    /// Reverse lookup of a `[lon, lat]` position.
    async fn search_by_coordinate(
        &self,
        lon_lat: Coordinate,
    ) -> Result<GeosearchResult, RoutingError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Pixel padding `[top, right, bottom, left]`.
    pub padding: [f64; 4],
    pub duration_ms: u32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding: [40.0, 40.0, 40.0, 40.0],
            duration_ms: 300,
        }
    }
}

/// The portal's map and view wrapper.
///
/// Methods take `&self`: the map is a shared handle owned by the portal.
pub trait MapView {
    fn fit(&self, extent: Extent, options: FitOptions);

    fn add_interaction(&self, interaction: Interaction) -> InteractionHandle;

    fn remove_interaction(&self, handle: InteractionHandle);

    /// Drops a sketch the user has started but not finished.
    fn abort_drawing(&self, handle: InteractionHandle);
}
