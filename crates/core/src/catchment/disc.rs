use geo::{Coord, Destination, Haversine, LineString, Point, Polygon};
use walkshed_transit::Coordinates;

/// Geodesic circle around `center`, approximated with `steps` segments.
///
/// Vertices are haversine destinations at bearings `0, -360/steps, ...`
/// (counter-clockwise), and the ring is closed explicitly.
pub fn disc(center: Coordinates, radius_km: f64, steps: usize) -> Polygon {
    let steps = steps.max(3);
    let origin = Point::new(center.lng, center.lat);
    let radius_m = radius_km * 1_000.0;

    let mut ring: Vec<Coord> = (0..steps)
        .map(|i| {
            let bearing = (i as f64 * -360.0) / steps as f64;
            Haversine.destination(origin, bearing, radius_m).0
        })
        .collect();
    ring.push(ring[0]);

    Polygon::new(LineString::new(ring), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Distance;

    #[test]
    fn ring_is_closed_with_requested_resolution() {
        let polygon = disc(Coordinates::new(25.05, 121.52), 0.4, 64);
        let ring = &polygon.exterior().0;

        assert_eq!(ring.len(), 65);
        assert_eq!(ring.first(), ring.last());
        assert!(polygon.interiors().is_empty());
    }

    #[test]
    fn vertices_sit_on_the_radius() {
        let center = Coordinates::new(25.05, 121.52);
        let polygon = disc(center, 0.64, 64);

        for vertex in polygon.exterior().points() {
            let distance = Haversine.distance(Point::new(center.lng, center.lat), vertex);
            assert_relative_eq!(distance, 640.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn first_vertex_points_north() {
        let polygon = disc(Coordinates::new(0.0, 0.0), 1.0, 64);
        let north = Point::from(polygon.exterior().0[0]);

        assert_relative_eq!(north.x(), 0.0, epsilon = 1e-12);
        assert!(north.y() > 0.0);
    }
}
