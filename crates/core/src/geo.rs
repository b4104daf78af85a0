//! Great-circle geometry on WGS84 coordinates.
//!
//! Distances use the Haversine formula with a spherical Earth of radius
//! 6371 km, and the bounding-box helper uses the flat-Earth approximation of
//! 111 320 m per degree of latitude. Both are well within the accuracy needed
//! for hotspot clustering at the scale of a single volcano.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (spherical approximation).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180].
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point from latitude/longitude degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance between two points in meters (Haversine).
#[must_use]
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * h.sqrt().asin()
}

/// An axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge in degrees.
    pub min_lat: f64,
    /// Western edge in degrees.
    pub min_lon: f64,
    /// Northern edge in degrees.
    pub max_lat: f64,
    /// Eastern edge in degrees.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Whether a point lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lon
            && point.longitude <= self.max_lon
    }
}

/// Bounding box spanning `radius_m` meters in every direction from `center`.
///
/// Longitude extent is widened by the cosine of the center latitude so the box
/// stays approximately square on the ground away from the equator.
#[must_use]
pub fn bounding_box(center: GeoPoint, radius_m: f64) -> BoundingBox {
    let lat_offset = radius_m / METERS_PER_DEGREE;
    let lon_offset = radius_m / (METERS_PER_DEGREE * center.latitude.to_radians().cos());

    BoundingBox {
        min_lat: center.latitude - lat_offset,
        min_lon: center.longitude - lon_offset,
        max_lat: center.latitude + lat_offset,
        max_lon: center.longitude + lon_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn haversine_one_degree_of_latitude() {
        // One degree of latitude is ~111.2 km on a 6371 km sphere
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = haversine_distance_m(a, b);
        assert_relative_eq!(d, 111_195.0, max_relative = 0.001);
    }

    #[test]
    fn haversine_zero_for_identical_points() {
        let p = GeoPoint::new(-2.005, -78.341);
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = GeoPoint::new(-2.0, -78.3);
        let b = GeoPoint::new(-2.1, -78.4);
        assert_relative_eq!(
            haversine_distance_m(a, b),
            haversine_distance_m(b, a),
            epsilon = 1e-9
        );
    }

    #[test]
    fn bounding_box_contains_center_and_excludes_far_points() {
        let vent = GeoPoint::new(-2.005, -78.341);
        let bbox = bounding_box(vent, 5_000.0);

        assert!(bbox.contains(vent));
        // ~5 km north of the vent is right at the edge; 10 km is outside
        assert!(!bbox.contains(GeoPoint::new(vent.latitude + 0.1, vent.longitude)));
        assert!(bbox.max_lat > vent.latitude);
        assert!(bbox.min_lon < vent.longitude);
    }

    #[test]
    fn bounding_box_widens_longitude_away_from_equator() {
        let equator = bounding_box(GeoPoint::new(0.0, 0.0), 1_000.0);
        let high_lat = bounding_box(GeoPoint::new(60.0, 0.0), 1_000.0);

        let eq_width = equator.max_lon - equator.min_lon;
        let high_width = high_lat.max_lon - high_lat.min_lon;
        // cos(60°) = 0.5, so the box must be about twice as wide in degrees
        assert_relative_eq!(high_width / eq_width, 2.0, max_relative = 0.01);
    }
}
