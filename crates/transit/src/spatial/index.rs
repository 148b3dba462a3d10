//! R-tree nodes for spatial indexing.
//!
//! Stations are keyed by their position on the unit sphere rather than by raw
//! `[lng, lat]` degrees. Straight-line (chord) distance between two points on
//! the sphere grows monotonically with their great-circle distance, so the
//! R-tree's nearest neighbour is also the Haversine nearest at any latitude.

use std::sync::Arc;

use rstar::{PointDistance, RTreeObject, AABB};

use crate::models::types::Coordinates;
use crate::provider::static_provider::StationImpl;

// ============================================================================
// Station Spatial Node
// ============================================================================

#[derive(Clone)]
pub struct StationNode {
    pub station: Arc<StationImpl>,
    point: [f64; 3],
}

impl StationNode {
    /// Returns `None` for stations that cannot be placed on the map.
    pub fn new(station: Arc<StationImpl>) -> Option<Self> {
        let coords = station.coords;
        if !coords.is_valid() {
            return None;
        }

        Some(Self {
            station,
            point: key(coords),
        })
    }
}

/// R-tree key for a position: unit vector `[x, y, z]` on the sphere.
pub fn key(coords: Coordinates) -> [f64; 3] {
    let (lat, lng) = (coords.lat.to_radians(), coords.lng.to_radians());
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

impl RTreeObject for StationNode {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StationNode {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        self.point
            .iter()
            .zip(point)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}
