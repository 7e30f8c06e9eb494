//! Straight-line directions provider (fallback when no routing service runs).
//!
//! Connects the waypoints directly and estimates travel time from
//! great-circle distance. Ignores roads and avoid areas, but is always
//! available.

use crate::config::SpeedProfile;
use crate::directions::{DirectionsRequest, DirectionsResponse};
use crate::error::RoutingError;
use crate::geometry::{Coordinate, Extent};
use crate::route::{Segment, Step};
use crate::traits::DirectionsProvider;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Maneuver code the services use for "arrive".
const ARRIVE: u32 = 10;

#[derive(Debug, Clone, Default)]
pub struct StraightLineDirections {
    /// Overrides the per-profile speed assumption, in km/h.
    pub speed_kmh: Option<f64>,
}

impl StraightLineDirections {
    pub fn new(speed_kmh: f64) -> Self {
        Self {
            speed_kmh: Some(speed_kmh),
        }
    }

    /// Average speed assumption per profile.
    fn speed_for(&self, profile: SpeedProfile) -> f64 {
        self.speed_kmh.unwrap_or(match profile {
            SpeedProfile::DrivingCar => 50.0,
            SpeedProfile::DrivingHgv => 40.0,
            SpeedProfile::CyclingRegular => 15.0,
            SpeedProfile::FootWalking => 5.0,
            SpeedProfile::Wheelchair => 4.0,
        })
    }

    /// Great-circle distance between two `[lon, lat]` points in kilometers.
    fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
        let [lng1, lat1] = from;
        let [lng2, lat2] = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    fn km_to_seconds(&self, km: f64, profile: SpeedProfile) -> f64 {
        km / self.speed_for(profile) * 3600.0
    }
}

impl DirectionsProvider for StraightLineDirections {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, RoutingError> {
        let points = &request.coordinates;
        if points.len() < 2 {
            return Err(RoutingError::ServiceNotFound);
        }

        let segments: Vec<Segment> = points
            .windows(2)
            .enumerate()
            .map(|(leg, pair)| {
                let km = Self::haversine_km(pair[0], pair[1]);
                let distance = km * 1000.0;
                let duration = self.km_to_seconds(km, request.profile);
                Segment {
                    distance,
                    duration,
                    steps: vec![Step {
                        distance,
                        duration,
                        instruction: format!("Head to waypoint {}", leg + 2),
                        name: String::new(),
                        instruction_type: ARRIVE,
                        way_points: [leg, leg + 1],
                    }],
                }
            })
            .collect();

        Ok(DirectionsResponse {
            bbox: Extent::from_points(points),
            distance: segments.iter().map(|s| s.distance).sum(),
            duration: segments.iter().map(|s| s.duration).sum(),
            coordinates: points.clone(),
            segments,
            way_points: (0..points.len()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let dist = StraightLineDirections::haversine_km([7.1, 50.7], [7.1, 50.7]);
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Bonn (7.10, 50.73) to Berlin (13.40, 52.52)
        // Actual distance ~478 km
        let dist = StraightLineDirections::haversine_km([7.10, 50.73], [13.40, 52.52]);
        assert!(dist > 460.0 && dist < 500.0, "Bonn to Berlin should be ~478km, got {}", dist);
    }

    #[test]
    fn test_reasonable_travel_time() {
        let provider = StraightLineDirections::new(40.0); // 40 km/h
        // 10 km at 40 km/h = 0.25 hours = 900 seconds
        let seconds = provider.km_to_seconds(10.0, SpeedProfile::FootWalking);
        assert_eq!(seconds, 900.0);
    }

    #[test]
    fn test_profile_speeds_differ() {
        let provider = StraightLineDirections::default();
        let car = provider.km_to_seconds(10.0, SpeedProfile::DrivingCar);
        let foot = provider.km_to_seconds(10.0, SpeedProfile::FootWalking);
        assert!(foot > car);
    }
}
