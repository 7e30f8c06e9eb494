//! GeoJSON and GPX export of the committed route.

use std::cell::RefCell;
use std::fmt::Write as _;

use serde_json::json;

use crate::context::RoutingContext;
use crate::error::RoutingError;
use crate::geometry::Coordinate;
use crate::traits::ProjectionAdapter;
use crate::waypoints::format_coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    GeoJson,
    Gpx,
}

/// Owned WGS84 copy of everything an export writes.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteExport {
    pub line: Vec<Coordinate>,
    pub waypoints: Vec<(String, Coordinate)>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub speed_profile: String,
    pub preference: String,
    pub avoid_features: Vec<String>,
}

impl RouteExport {
    /// `None` while no route is committed.
    pub async fn collect<P>(
        context: &RefCell<RoutingContext>,
        projection: &P,
    ) -> Result<Option<Self>, RoutingError>
    where
        P: ProjectionAdapter,
    {
        let (line, placed, summary) = {
            let ctx = context.borrow();
            let route = &ctx.route;
            let (Some(profile), Some(preference)) = (route.speed_profile, route.preference) else {
                return Ok(None);
            };
            if route.polyline().is_empty() {
                return Ok(None);
            }
            let placed: Vec<(Option<String>, Coordinate)> = ctx
                .waypoints
                .waypoints()
                .iter()
                .filter_map(|w| w.coordinates.map(|c| (w.display_name.clone(), c)))
                .collect();
            let summary = (
                route.distance_meters,
                route.duration_seconds,
                profile.as_str().to_string(),
                serde_json::to_value(preference)?
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                route
                    .avoid_features
                    .iter()
                    .filter_map(|f| serde_json::to_value(f).ok())
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect::<Vec<_>>(),
            );
            (route.polyline().points().to_vec(), placed, summary)
        };

        let mut wgs84_line = Vec::with_capacity(line.len());
        for point in line {
            wgs84_line.push(projection.to_wgs84(point).await?);
        }
        let mut waypoints = Vec::with_capacity(placed.len());
        for (name, point) in placed {
            let lon_lat = projection.to_wgs84(point).await?;
            waypoints.push((name.unwrap_or_else(|| format_coordinate(lon_lat)), lon_lat));
        }

        let (distance_meters, duration_seconds, speed_profile, preference, avoid_features) =
            summary;
        Ok(Some(Self {
            line: wgs84_line,
            waypoints,
            distance_meters,
            duration_seconds,
            speed_profile,
            preference,
            avoid_features,
        }))
    }

    pub fn render(&self, format: ExportFormat) -> String {
        match format {
            ExportFormat::GeoJson => self.to_geojson(),
            ExportFormat::Gpx => self.to_gpx(),
        }
    }

    pub fn to_geojson(&self) -> String {
        let mut features = vec![json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": self.line},
            "properties": {
                "distance": self.distance_meters,
                "duration": self.duration_seconds,
                "speed_profile": self.speed_profile,
                "preference": self.preference,
                "avoid_features": self.avoid_features,
            }
        })];
        for (index, (name, point)) in self.waypoints.iter().enumerate() {
            features.push(json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": point},
                "properties": {"index": index, "name": name}
            }));
        }
        json!({"type": "FeatureCollection", "features": features}).to_string()
    }

    pub fn to_gpx(&self) -> String {
        let mut gpx = String::new();
        gpx.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        gpx.push_str(
            "<gpx version=\"1.1\" creator=\"routing-tool\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n",
        );
        gpx.push_str("  <rte>\n");
        for (name, [lon, lat]) in &self.waypoints {
            let _ = writeln!(
                gpx,
                "    <rtept lat=\"{lat:.7}\" lon=\"{lon:.7}\"><name>{}</name></rtept>",
                escape_xml(name)
            );
        }
        gpx.push_str("  </rte>\n");
        gpx.push_str("  <trk>\n");
        let _ = writeln!(gpx, "    <name>{}</name>", escape_xml(&self.speed_profile));
        gpx.push_str("    <trkseg>\n");
        for [lon, lat] in &self.line {
            let _ = writeln!(gpx, "      <trkpt lat=\"{lat:.7}\" lon=\"{lon:.7}\"/>");
        }
        gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
        gpx
    }
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
