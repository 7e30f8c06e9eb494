//! Geometry primitives shared by the stores and the service adapters.
//!
//! Coordinates are `[x, y]` pairs. In the local projection that is whatever
//! the map uses; in WGS84 it is `[lon, lat]`, the order the services expect.

use serde::{Deserialize, Serialize};

pub type Coordinate = [f64; 2];

/// A closed ring of coordinates.
pub type Ring = Vec<Coordinate>;

/// Polygon as a list of rings, outer ring first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn point_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }
}

/// GeoJSON MultiPolygon, the shape `avoid_polygons` is sent in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon {
    #[serde(rename = "type")]
    kind: MultiPolygonTag,
    pub coordinates: Vec<Vec<Ring>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum MultiPolygonTag {
    MultiPolygon,
}

impl MultiPolygon {
    pub fn new(coordinates: Vec<Vec<Ring>>) -> Self {
        Self {
            kind: MultiPolygonTag::MultiPolygon,
            coordinates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

impl Default for MultiPolygon {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Axis-aligned extent, used to fit the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Smallest extent containing every point, `None` for no points.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut extent = Extent {
            min_x: first[0],
            min_y: first[1],
            max_x: first[0],
            max_y: first[1],
        };
        for point in iter {
            extent.min_x = extent.min_x.min(point[0]);
            extent.min_y = extent.min_y.min(point[1]);
            extent.max_x = extent.max_x.max(point[0]);
            extent.max_y = extent.max_y.max(point[1]);
        }
        Some(extent)
    }

    /// Reads a GeoJSON `bbox`: `[minx, miny, maxx, maxy]` or the 3D form
    /// `[minx, miny, minz, maxx, maxy, maxz]`.
    pub fn from_bbox(bbox: &[f64]) -> Option<Self> {
        match bbox.len() {
            4 => Some(Extent {
                min_x: bbox[0],
                min_y: bbox[1],
                max_x: bbox[2],
                max_y: bbox[3],
            }),
            6 => Some(Extent {
                min_x: bbox[0],
                min_y: bbox[1],
                max_x: bbox[3],
                max_y: bbox[4],
            }),
            _ => None,
        }
    }

    pub fn lower_left(&self) -> Coordinate {
        [self.min_x, self.min_y]
    }

    pub fn upper_right(&self) -> Coordinate {
        [self.max_x, self.max_y]
    }
}

/// Geometry held by a render-store feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    Polygon(Polygon),
}
