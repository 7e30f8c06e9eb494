//! routing-tool engine
//!
//! Keeps user-placed waypoints, avoid areas and a remotely computed route
//! (or isochrones) consistent while requests are in flight.

pub mod avoid_areas;
pub mod config;
pub mod context;
pub mod directions;
pub mod error;
pub mod export;
pub mod geometry;
pub mod haversine;
pub mod interaction;
pub mod isochrones;
pub mod line_string_index;
pub mod ors;
pub mod polyline;
pub mod projection;
pub mod providers;
pub mod render;
pub mod route;
pub mod tool;
pub mod traits;
pub mod waypoints;
