//! Per-vehicle tracking state and the views handed to callers

use crate::domain::event::{CurrentZone, EventHistory, ZoneEvent};
use crate::domain::types::GeoPoint;
use serde::Serialize;

/// Number of events returned in a status view
pub const RECENT_EVENTS_LIMIT: usize = 10;

/// Mutable state kept for one vehicle
#[derive(Debug, Clone)]
pub struct VehicleState {
    /// Most recent accepted fix, compared against the next one
    pub last_location: GeoPoint,
    pub current_zone: CurrentZone,
    /// Client timestamp of the last update (epoch ms)
    pub last_update: i64,
    pub events: EventHistory,
}

impl VehicleState {
    /// State for a vehicle seen for the first time, starting outside every zone
    pub fn new(location: GeoPoint, timestamp: i64) -> Self {
        Self {
            last_location: location,
            current_zone: CurrentZone::Outside,
            last_update: timestamp,
            events: EventHistory::default(),
        }
    }

    pub fn status(&self, vehicle_id: &str) -> VehicleStatus {
        VehicleStatus {
            vehicle_id: vehicle_id.to_string(),
            current_zone: self.current_zone.clone(),
            last_location_update: self.last_update,
            last_location: self.last_location,
            recent_events: self.events.recent(RECENT_EVENTS_LIMIT),
            total_events_tracked: self.events.len(),
        }
    }
}

/// Read-only snapshot of a vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatus {
    pub vehicle_id: String,
    pub current_zone: CurrentZone,
    pub last_location_update: i64,
    pub last_location: GeoPoint,
    /// Up to the last 10 events, oldest first
    pub recent_events: Vec<ZoneEvent>,
    /// Events currently held in history (at most 50)
    pub total_events_tracked: usize,
}

/// Outcome of a single location update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResult {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub current_zone: CurrentZone,
    pub event_triggered: bool,
    /// Primary event of this update; on a zone-to-zone move this is the Enter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<ZoneEvent>,
    /// Whether the jump from the previous fix was flagged as anomalous
    pub anomalous: bool,
}
