//! Shared types for the geofence tracker

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Vehicle identifiers are opaque, caller-provided strings
pub type VehicleId = String;

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A WGS84 position in decimal degrees
///
/// Range checks (latitude in [-90, 90], longitude in [-180, 180]) happen at the
/// request boundary; everything past it assumes valid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl From<[f64; 2]> for GeoPoint {
    /// Config files list points as `[lat, lon]` pairs
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}
