//! Geofence membership checks
//!
//! Pure functions over planar latitude/longitude coordinates. Distances are
//! Euclidean in degrees ("degree-distance"), a cheap approximation that is only
//! meaningful at the local scale of a zone. Nothing here holds state, so every
//! function is safe to call from any thread.

use crate::domain::types::GeoPoint;
use crate::domain::zone::{Zone, ZoneShape};

/// Movement above this degree-distance between consecutive fixes is treated as
/// a probable GPS glitch (0.1 deg is roughly 11 km)
pub const ANOMALY_THRESHOLD_DEG: f64 = 0.1;

/// Planar Euclidean distance between two points, in degrees
#[inline]
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = a.latitude - b.latitude;
    let d_lon = a.longitude - b.longitude;
    (d_lat * d_lat + d_lon * d_lon).sqrt()
}

/// Circle membership; a point on the circumference counts as inside
#[inline]
pub fn point_in_circle(point: GeoPoint, center: GeoPoint, radius: f64) -> bool {
    distance(point, center) <= radius
}

/// Crossing-number (ray casting) test
///
/// Latitude is the x axis and longitude the y axis. A ray is cast from the
/// point towards increasing latitude and every edge it crosses flips the
/// result. Exact for simple polygons, convex or concave. Points lying exactly
/// on an edge may land on either side depending on rounding.
pub fn point_in_polygon(point: GeoPoint, vertices: &[GeoPoint]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let x = point.latitude;
    let y = point.longitude;
    let mut inside = false;

    let mut j = vertices.len() - 1;
    for (i, vi) in vertices.iter().enumerate() {
        let vj = vertices[j];
        let (xi, yi) = (vi.latitude, vi.longitude);
        let (xj, yj) = (vj.latitude, vj.longitude);

        // (yi > y) != (yj > y) guarantees yj != yi, so the division is safe
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Test a point against a zone of either shape
pub fn point_in_zone(point: GeoPoint, zone: &Zone) -> bool {
    match &zone.shape {
        ZoneShape::Polygon { vertices } => point_in_polygon(point, vertices),
        ZoneShape::Circle { center, radius } => point_in_circle(point, *center, *radius),
    }
}

/// First zone in iteration order that contains the point
///
/// Zones may overlap; order decides which one wins.
pub fn first_matching_zone(point: GeoPoint, zones: &[Zone]) -> Option<&Zone> {
    zones.iter().find(|zone| point_in_zone(point, zone))
}

/// Whether the jump from the previous fix exceeds [`ANOMALY_THRESHOLD_DEG`]
///
/// A first fix (no previous point) is never anomalous.
#[inline]
pub fn is_anomalous_movement(previous: Option<GeoPoint>, current: GeoPoint) -> bool {
    previous.is_some_and(|prev| distance(prev, current) > ANOMALY_THRESHOLD_DEG)
}
