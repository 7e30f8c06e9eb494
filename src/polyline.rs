//! Polyline representation for route geometries.
//!
//! Points are kept decoded, in whatever projection the owner works in. The
//! route entity stores local-projection points; service adapters work in
//! WGS84 and convert at the boundary.

use serde::{Deserialize, Serialize};

use crate::geometry::{Coordinate, Extent};

/// An ordered sequence of route points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn extent(&self) -> Option<Extent> {
        Extent::from_points(&self.points)
    }

    /// First index at which `other` differs from this polyline.
    ///
    /// A length difference counts as a divergence at the end of the shorter
    /// sequence. Returns `None` for identical sequences.
    pub fn first_divergence(&self, other: &[Coordinate]) -> Option<usize> {
        let shared = self.points.len().min(other.len());
        (0..shared)
            .find(|&index| self.points[index] != other[index])
            .or_else(|| (self.points.len() != other.len()).then_some(shared))
    }

    /// Sub-range of the polyline, clamped to its bounds.
    pub fn slice(&self, start: usize, end_inclusive: usize) -> &[Coordinate] {
        if self.points.is_empty() || start >= self.points.len() {
            return &[];
        }
        let end = end_inclusive.min(self.points.len() - 1);
        if end < start {
            return &[];
        }
        &self.points[start..=end]
    }
}
