//! Great-circle distance evaluation.

use crate::types::Coordinates;

/// Mean Earth radius in miles, matching the upstream distance math.
pub const EARTH_RADIUS_MILES: f64 = 3_959.0;

/// Haversine great-circle distance between two points, in miles.
///
/// Symmetric, and zero (to floating-point tolerance) iff both points are
/// equal.
#[must_use]
pub fn distance_miles(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Inclusive radius predicate: a point exactly on the boundary is inside.
#[must_use]
pub fn within_radius(distance_miles: f64, radius_miles: f64) -> bool {
    distance_miles <= radius_miles
}
