//! Maps a polyline position back to the waypoints around it.

use crate::waypoints::Waypoint;

/// Position `i` such that `waypoints[i]` and `waypoints[i + 1]` bracket
/// `target` on the committed polyline (`lower <= target < upper`).
///
/// Pairs where either side has no index are skipped.
pub fn find_waypoint_between(waypoints: &[Waypoint], target: usize) -> Option<usize> {
    waypoints.windows(2).position(|pair| {
        match (pair[0].line_string_index, pair[1].line_string_index) {
            (Some(lower), Some(upper)) => lower <= target && target < upper,
            _ => false,
        }
    })
}
