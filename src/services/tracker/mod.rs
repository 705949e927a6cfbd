//! Vehicle state tracking
//!
//! The Tracker is the only stateful component. For every location update it:
//! - resolves the vehicle's zone against the catalog (first match wins)
//! - flags anomalous jumps from the previous fix (logged, never rejected)
//! - records enter/exit events for any membership change
//! - keeps the last 50 events per vehicle
//!
//! State lives in a sharded concurrent map. The read-diff-write cycle for a
//! vehicle runs while holding that vehicle's entry guard, so updates for the
//! same id are serialized in arrival order while other ids proceed in
//! parallel. Client timestamps only stamp events; they never reorder updates.

mod transition;
#[cfg(test)]
mod tests;

pub use transition::{primary_event, transition};

use crate::domain::event::ZoneEventType;
use crate::domain::types::{GeoPoint, VehicleId};
use crate::domain::vehicle::{TrackingResult, VehicleState, VehicleStatus};
use crate::domain::zone::ZoneSummary;
use crate::infra::metrics::Metrics;
use crate::services::catalog::ZoneCatalog;
use crate::services::geofence;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Owns per-vehicle state and turns location updates into zone events
pub struct Tracker {
    /// Tracked vehicles by id
    vehicles: DashMap<VehicleId, VehicleState>,
    /// Zones to resolve against
    catalog: Arc<ZoneCatalog>,
    /// Metrics collector
    metrics: Arc<Metrics>,
}

impl Tracker {
    pub fn new(catalog: Arc<ZoneCatalog>, metrics: Arc<Metrics>) -> Self {
        Self { vehicles: DashMap::new(), catalog, metrics }
    }

    /// Apply a location update
    ///
    /// Coordinates are expected to be validated already; out-of-range values
    /// simply resolve to no zone.
    pub fn track_location(
        &self,
        vehicle_id: &str,
        latitude: f64,
        longitude: f64,
        timestamp: i64,
    ) -> TrackingResult {
        let started = Instant::now();
        let location = GeoPoint::new(latitude, longitude);
        let new_zone = self.catalog.resolve(location);

        let (previous_location, events) = {
            let mut is_new = false;
            let mut state = self.vehicles.entry(vehicle_id.to_string()).or_insert_with(|| {
                is_new = true;
                VehicleState::new(location, timestamp)
            });

            let previous_location = (!is_new).then_some(state.last_location);
            let events = transition(&state.current_zone, &new_zone, timestamp);

            state.last_location = location;
            state.current_zone = new_zone.clone();
            state.last_update = timestamp;
            state.events.extend(events.iter().cloned());

            (previous_location, events)
        };

        let anomalous = geofence::is_anomalous_movement(previous_location, location);
        if let (true, Some(previous)) = (anomalous, previous_location) {
            self.metrics.record_anomaly();
            warn!(
                vehicle_id = %vehicle_id,
                from = %previous,
                to = %location,
                distance_deg = format!("{:.4}", geofence::distance(previous, location)),
                threshold_deg = %geofence::ANOMALY_THRESHOLD_DEG,
                "anomalous_movement"
            );
        }

        for event in &events {
            match event.event_type {
                ZoneEventType::Enter => self.metrics.record_enter(),
                ZoneEventType::Exit => self.metrics.record_exit(),
            }
            info!(
                vehicle_id = %vehicle_id,
                zone = %event.zone,
                ts = %event.timestamp,
                event = %event.event_type.as_str(),
                "zone_event"
            );
        }
        if events.is_empty() {
            debug!(vehicle_id = %vehicle_id, zone = %new_zone, location = %location, "location_updated");
        }

        self.metrics.record_update(started.elapsed().as_micros() as u64);

        TrackingResult {
            vehicle_id: vehicle_id.to_string(),
            latitude,
            longitude,
            current_zone: new_zone,
            event_triggered: !events.is_empty(),
            event: primary_event(&events).cloned(),
            anomalous,
        }
    }

    /// Snapshot of one vehicle, `None` if it was never tracked
    pub fn get_status(&self, vehicle_id: &str) -> Option<VehicleStatus> {
        self.vehicles.get(vehicle_id).map(|state| state.status(vehicle_id))
    }

    /// Snapshot of every tracked vehicle, ordered by id
    pub fn list_all(&self) -> Vec<VehicleStatus> {
        let mut all: Vec<VehicleStatus> =
            self.vehicles.iter().map(|entry| entry.value().status(entry.key())).collect();
        all.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        all
    }

    /// Vehicles currently inside the named zone
    pub fn filter_by_zone(&self, zone_name: &str) -> Vec<VehicleStatus> {
        self.list_all().into_iter().filter(|s| s.current_zone.is_inside(zone_name)).collect()
    }

    /// Forget every vehicle; returns how many were dropped
    pub fn reset(&self) -> usize {
        let mut cleared = 0;
        self.vehicles.retain(|_, _| {
            cleared += 1;
            false
        });
        info!(cleared = %cleared, "tracker_reset");
        cleared
    }

    pub fn list_zones(&self) -> Vec<ZoneSummary> {
        self.catalog.list()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn catalog(&self) -> &Arc<ZoneCatalog> {
        &self.catalog
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
