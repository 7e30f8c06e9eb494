//! openrouteservice HTTP adapter for directions and isochrones.

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ServiceSettings;
use crate::directions::{DirectionsRequest, DirectionsResponse};
use crate::error::RoutingError;
use crate::geometry::{Coordinate, Extent, Ring};
use crate::isochrones::{IsochroneFeature, IsochronesRequest, IsochronesResponse};
use crate::route::{Segment, Step};
use crate::traits::{DirectionsProvider, IsochronesProvider};

/// Service error code for avoid polygons exceeding the allowed size.
const POLYGON_TOO_COMPLEX: u64 = 2003;

/// Which service path a failed request was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Directions,
    Isochrones,
}

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Unset keeps the HTTP client's default.
    pub timeout_secs: Option<u64>,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8082/ors".to_string(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl From<&ServiceSettings> for OrsConfig {
    fn from(settings: &ServiceSettings) -> Self {
        Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            timeout_secs: settings.timeout_secs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, RoutingError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    async fn post<B, R>(&self, endpoint: Endpoint, url: String, body: &B) -> Result<R, RoutingError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<R>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%url, ?endpoint, status = status.as_u16(), "service returned an error");
        Err(classify_failure(endpoint, status.as_u16(), &body))
    }
}

impl DirectionsProvider for OrsClient {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, RoutingError> {
        let url = format!(
            "{}/v2/directions/{}/geojson",
            self.config.base_url,
            request.profile.as_str()
        );
        let body: OrsDirectionsCollection = self.post(Endpoint::Directions, url, request).await?;
        body.into_response()
    }
}

impl IsochronesProvider for OrsClient {
    async fn isochrones(
        &self,
        request: &IsochronesRequest,
    ) -> Result<IsochronesResponse, RoutingError> {
        let url = format!(
            "{}/v2/isochrones/{}",
            self.config.base_url,
            request.profile.as_str()
        );
        let body: OrsIsochroneCollection = self.post(Endpoint::Isochrones, url, request).await?;
        Ok(body.into_response())
    }
}

/// Maps an error response to the routing error taxonomy.
///
/// A 404 means "no route" only on the directions path; isochrone 404s are
/// plain fetch failures.
pub fn classify_failure(endpoint: Endpoint, status: u16, body: &str) -> RoutingError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|value| value.get("error"));
    let code = error.and_then(|e| e.get("code")).and_then(|c| c.as_u64());
    if code == Some(POLYGON_TOO_COMPLEX) {
        return RoutingError::PolygonTooComplex;
    }
    if status == 404 && endpoint == Endpoint::Directions {
        return RoutingError::ServiceNotFound;
    }
    let message = error
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(|m| m.as_str())
        .unwrap_or("no error message");
    RoutingError::Fetch(format!("HTTP {status}: {message}"))
}

fn to_coordinate(raw: &[f64]) -> Option<Coordinate> {
    match raw {
        [x, y, ..] => Some([*x, *y]),
        _ => None,
    }
}

fn to_ring(raw: &[Vec<f64>]) -> Ring {
    raw.iter().filter_map(|point| to_coordinate(point)).collect()
}

#[derive(Debug, Deserialize)]
struct OrsDirectionsCollection {
    #[serde(default)]
    bbox: Vec<f64>,
    features: Vec<OrsRouteFeature>,
}

#[derive(Debug, Deserialize)]
struct OrsRouteFeature {
    #[serde(default)]
    bbox: Vec<f64>,
    properties: OrsRouteProperties,
    geometry: OrsLineString,
}

#[derive(Debug, Deserialize)]
struct OrsRouteProperties {
    #[serde(default)]
    summary: OrsSummary,
    #[serde(default)]
    segments: Vec<OrsSegment>,
    #[serde(default)]
    way_points: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct OrsSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OrsSegment {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    steps: Vec<OrsStep>,
}

#[derive(Debug, Deserialize)]
struct OrsStep {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    instruction: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: u32,
    way_points: [usize; 2],
}

#[derive(Debug, Deserialize)]
struct OrsLineString {
    coordinates: Vec<Vec<f64>>,
}

impl OrsDirectionsCollection {
    fn into_response(self) -> Result<DirectionsResponse, RoutingError> {
        let collection_bbox = self.bbox;
        let feature = self
            .features
            .into_iter()
            .next()
            .ok_or(RoutingError::ServiceNotFound)?;
        let bbox = Extent::from_bbox(&feature.bbox).or_else(|| Extent::from_bbox(&collection_bbox));

        let segments = feature
            .properties
            .segments
            .into_iter()
            .map(|segment| Segment {
                distance: segment.distance,
                duration: segment.duration,
                steps: segment
                    .steps
                    .into_iter()
                    .map(|step| Step {
                        distance: step.distance,
                        duration: step.duration,
                        instruction: step.instruction,
                        name: step.name,
                        instruction_type: step.kind,
                        way_points: step.way_points,
                    })
                    .collect(),
            })
            .collect();

        Ok(DirectionsResponse {
            bbox,
            distance: feature.properties.summary.distance,
            duration: feature.properties.summary.duration,
            coordinates: to_ring(&feature.geometry.coordinates),
            segments,
            way_points: feature.properties.way_points,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OrsIsochroneCollection {
    #[serde(default)]
    bbox: Vec<f64>,
    #[serde(default)]
    features: Vec<OrsIsochroneFeature>,
}

#[derive(Debug, Deserialize)]
struct OrsIsochroneFeature {
    properties: OrsIsochroneProperties,
    geometry: OrsPolygon,
}

#[derive(Debug, Deserialize)]
struct OrsIsochroneProperties {
    #[serde(default)]
    group_index: usize,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct OrsPolygon {
    coordinates: Vec<Vec<Vec<f64>>>,
}

impl OrsIsochroneCollection {
    fn into_response(self) -> IsochronesResponse {
        IsochronesResponse {
            bbox: Extent::from_bbox(&self.bbox),
            features: self
                .features
                .into_iter()
                .map(|feature| IsochroneFeature {
                    group_index: feature.properties.group_index,
                    value: feature.properties.value,
                    rings: feature
                        .geometry
                        .coordinates
                        .iter()
                        .map(|ring| to_ring(ring))
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Alert, AlertCategory};

    const DIRECTIONS_BODY: &str = r#"{
        "type": "FeatureCollection",
        "bbox": [8.0, 51.0, 9.0, 52.0],
        "features": [{
            "bbox": [8.0, 51.0, 9.0, 52.0],
            "type": "Feature",
            "properties": {
                "segments": [{
                    "distance": 262.4,
                    "duration": 10.5,
                    "steps": [
                        {"distance": 200.0, "duration": 8.0, "type": 11, "instruction": "Head north", "name": "Hauptstraße", "way_points": [0, 2]},
                        {"distance": 62.4, "duration": 2.5, "type": 10, "instruction": "Arrive", "name": "-", "way_points": [2, 2]}
                    ]
                }],
                "summary": {"distance": 262.4, "duration": 10.5},
                "way_points": [0, 2]
            },
            "geometry": {"coordinates": [[8.0, 51.0, 120.5], [8.5, 51.5, 118.0], [9.0, 52.0, 110.0]], "type": "LineString"}
        }]
    }"#;

    #[test]
    fn parses_directions_geojson() {
        let body: OrsDirectionsCollection = serde_json::from_str(DIRECTIONS_BODY).unwrap();
        let response = body.into_response().unwrap();
        assert_eq!(response.distance, 262.4);
        assert_eq!(response.duration, 10.5);
        assert_eq!(response.coordinates, vec![[8.0, 51.0], [8.5, 51.5], [9.0, 52.0]]);
        assert_eq!(response.way_points, vec![0, 2]);
        assert_eq!(response.segments[0].steps.len(), 2);
        assert_eq!(response.segments[0].steps[0].instruction_type, 11);
        assert_eq!(response.bbox.unwrap().upper_right(), [9.0, 52.0]);
    }

    #[test]
    fn empty_feature_collection_is_not_found() {
        let body: OrsDirectionsCollection =
            serde_json::from_str(r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        assert_eq!(body.into_response(), Err(RoutingError::ServiceNotFound));
    }

    #[test]
    fn parses_isochrones_geojson() {
        let raw = r#"{
            "type": "FeatureCollection",
            "bbox": [7.0, 50.6, 7.2, 50.8],
            "features": [
                {"type": "Feature", "properties": {"group_index": 0, "value": 900.0, "center": [7.1, 50.7]},
                 "geometry": {"type": "Polygon", "coordinates": [[[7.05, 50.65], [7.15, 50.65], [7.1, 50.75], [7.05, 50.65]]]}},
                {"type": "Feature", "properties": {"group_index": 0, "value": 1800.0},
                 "geometry": {"type": "Polygon", "coordinates": [[[7.0, 50.6], [7.2, 50.6], [7.1, 50.8], [7.0, 50.6]]]}}
            ]
        }"#;
        let body: OrsIsochroneCollection = serde_json::from_str(raw).unwrap();
        let response = body.into_response();
        assert_eq!(response.features.len(), 2);
        assert_eq!(response.features[1].value, 1800.0);
        assert_eq!(response.features[0].rings[0].len(), 4);
        assert_eq!(response.bbox.unwrap().lower_left(), [7.0, 50.6]);
    }

    #[test]
    fn classifies_service_errors() {
        assert_eq!(
            classify_failure(Endpoint::Directions, 400, r#"{"error":{"code":2003,"message":"polygon too large"}}"#),
            RoutingError::PolygonTooComplex
        );
        assert_eq!(
            classify_failure(Endpoint::Directions, 404, r#"{"error":{"code":2010,"message":"Could not find routable point"}}"#),
            RoutingError::ServiceNotFound
        );
        assert_eq!(
            classify_failure(Endpoint::Directions, 500, r#"{"error":{"code":2099,"message":"Unknown internal error"}}"#),
            RoutingError::Fetch("HTTP 500: Unknown internal error".to_string())
        );
        assert_eq!(
            classify_failure(Endpoint::Directions, 403, r#"{"error":"Access to this API has been disallowed"}"#),
            RoutingError::Fetch("HTTP 403: Access to this API has been disallowed".to_string())
        );
        assert_eq!(
            classify_failure(Endpoint::Directions, 502, "<html>Bad Gateway</html>"),
            RoutingError::Fetch("HTTP 502: no error message".to_string())
        );
    }

    #[test]
    fn isochrones_not_found_is_fetch_failure() {
        let error = classify_failure(
            Endpoint::Isochrones,
            404,
            r#"{"error":{"code":3099,"message":"Not found"}}"#,
        );
        assert_eq!(error, RoutingError::Fetch("HTTP 404: Not found".to_string()));
        assert_eq!(Alert::from_error(&error).category, AlertCategory::Error);
        assert_eq!(
            classify_failure(
                Endpoint::Isochrones,
                400,
                r#"{"error":{"code":2003,"message":"polygon too large"}}"#
            ),
            RoutingError::PolygonTooComplex
        );
    }

    #[test]
    fn config_from_settings_trims_url() {
        let config = OrsConfig::from(&ServiceSettings::ors("https://ors.example/ors/"));
        assert_eq!(config.base_url, "https://ors.example/ors");
    }
}
