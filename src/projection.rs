//! Projection adapters.

use std::f64::consts::PI;

use crate::error::RoutingError;
use crate::geometry::Coordinate;
use crate::traits::ProjectionAdapter;

/// Map already works in WGS84.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl ProjectionAdapter for IdentityProjection {
    async fn to_wgs84(&self, point: Coordinate) -> Result<Coordinate, RoutingError> {
        Ok(point)
    }

    async fn from_wgs84(&self, point: Coordinate) -> Result<Coordinate, RoutingError> {
        Ok(point)
    }
}

/// Spherical Web Mercator radius (EPSG:3857).
const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Latitude bound of the Web Mercator square.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// EPSG:3857 <-> EPSG:4326.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    fn forward(point: Coordinate) -> Result<Coordinate, RoutingError> {
        let [lon, lat] = point;
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return Err(RoutingError::Projection(format!(
                "not a WGS84 position: [{lon}, {lat}]"
            )));
        }
        let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        let x = MERCATOR_RADIUS_M * lon.to_radians();
        let y = MERCATOR_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Ok([x, y])
    }

    fn inverse(point: Coordinate) -> Result<Coordinate, RoutingError> {
        let [x, y] = point;
        if !x.is_finite() || !y.is_finite() {
            return Err(RoutingError::Projection(format!(
                "not a projected position: [{x}, {y}]"
            )));
        }
        let lon = (x / MERCATOR_RADIUS_M).to_degrees();
        let lat = (2.0 * (y / MERCATOR_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
        Ok([lon, lat])
    }
}

impl ProjectionAdapter for WebMercator {
    async fn to_wgs84(&self, point: Coordinate) -> Result<Coordinate, RoutingError> {
        Self::inverse(point)
    }

    async fn from_wgs84(&self, point: Coordinate) -> Result<Coordinate, RoutingError> {
        Self::forward(point)
    }
}
