//! Spatial query utilities for distance calculations.
//!
//! Uses Haversine formula for accurate distances on Earth's surface.

use geo::HaversineDistance;

use crate::models::types::Coordinates;

/// Calculate Haversine distance between two positions in meters
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    a.to_point().haversine_distance(&b.to_point())
}
