//! Services - business logic and state management
//!
//! - `geofence` - Point-in-zone geometry and anomaly detection
//! - `catalog` - Validated, shared zone catalog
//! - `tracker` - Per-vehicle state and zone transition events

pub mod catalog;
pub mod geofence;
pub mod tracker;

// Re-export commonly used types
pub use catalog::{CatalogError, ZoneCatalog};
pub use tracker::Tracker;
