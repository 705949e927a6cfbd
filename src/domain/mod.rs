//! Domain models - core geofencing types
//!
//! This module contains the canonical data types used throughout the system:
//! - `GeoPoint` - a latitude/longitude position
//! - `Zone` / `ZoneShape` - named polygon or circle regions
//! - `ZoneEvent` - an enter or exit crossing
//! - `CurrentZone` - outside every zone, or inside a named one
//! - `EventHistory` - bounded per-vehicle event log
//! - `VehicleState` - what the tracker keeps per vehicle, plus its status views

pub mod event;
pub mod types;
pub mod vehicle;
pub mod zone;

// Re-export commonly used types at module level
pub use event::{CurrentZone, EventHistory, ZoneEvent, ZoneEventType, EVENT_HISTORY_CAPACITY};
pub use types::{epoch_ms, GeoPoint, VehicleId};
pub use vehicle::{TrackingResult, VehicleState, VehicleStatus, RECENT_EVENTS_LIMIT};
pub use zone::{Zone, ZoneKind, ZoneShape, ZoneSummary};
