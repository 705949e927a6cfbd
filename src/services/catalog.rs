//! Ordered, read-mostly zone catalog
//!
//! Every location update resolves against the catalog, so reads go through a
//! shared `RwLock` guard and never block each other. Adding or removing a zone
//! takes the write lock for the whole change, so readers see either the old or
//! the new zone list, never a partial one.
//!
//! Catalog order is part of the contract: when zones overlap, the first zone
//! (in insertion order) containing a point is the vehicle's current zone.

use crate::domain::event::CurrentZone;
use crate::domain::types::GeoPoint;
use crate::domain::zone::{Zone, ZoneShape, ZoneSummary};
use crate::services::geofence;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::info;

/// Reasons a zone definition is refused
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("duplicate zone id '{0}'")]
    DuplicateId(String),

    #[error("duplicate zone name '{0}'")]
    DuplicateName(String),

    #[error("zone '{id}' has an empty {field}")]
    EmptyField { id: String, field: &'static str },

    #[error("polygon zone '{id}' needs at least 3 vertices, got {count}")]
    TooFewVertices { id: String, count: usize },

    #[error("circle zone '{id}' has invalid radius {radius}")]
    InvalidRadius { id: String, radius: f64 },

    #[error("zone '{id}' has a non-finite coordinate")]
    NonFiniteCoordinate { id: String },
}

/// Check a single zone definition in isolation
pub fn validate_zone(zone: &Zone) -> Result<(), CatalogError> {
    if zone.id.trim().is_empty() {
        return Err(CatalogError::EmptyField { id: zone.id.clone(), field: "id" });
    }
    if zone.name.trim().is_empty() {
        return Err(CatalogError::EmptyField { id: zone.id.clone(), field: "name" });
    }

    let finite = |p: &GeoPoint| p.latitude.is_finite() && p.longitude.is_finite();
    match &zone.shape {
        ZoneShape::Polygon { vertices } => {
            if vertices.len() < 3 {
                return Err(CatalogError::TooFewVertices {
                    id: zone.id.clone(),
                    count: vertices.len(),
                });
            }
            if !vertices.iter().all(finite) {
                return Err(CatalogError::NonFiniteCoordinate { id: zone.id.clone() });
            }
        }
        ZoneShape::Circle { center, radius } => {
            if !finite(center) {
                return Err(CatalogError::NonFiniteCoordinate { id: zone.id.clone() });
            }
            if !radius.is_finite() || *radius < 0.0 {
                return Err(CatalogError::InvalidRadius { id: zone.id.clone(), radius: *radius });
            }
        }
    }
    Ok(())
}

/// Check a full zone list: every zone valid, ids and names unique
pub fn validate_zones(zones: &[Zone]) -> Result<(), CatalogError> {
    let mut ids = FxHashSet::default();
    let mut names = FxHashSet::default();
    for zone in zones {
        validate_zone(zone)?;
        if !ids.insert(zone.id.as_str()) {
            return Err(CatalogError::DuplicateId(zone.id.clone()));
        }
        if !names.insert(zone.name.as_str()) {
            return Err(CatalogError::DuplicateName(zone.name.clone()));
        }
    }
    Ok(())
}

/// Zone catalog shared between the tracker and the HTTP layer
pub struct ZoneCatalog {
    zones: RwLock<Vec<Zone>>,
}

impl ZoneCatalog {
    /// Build a catalog, preserving the given order
    pub fn new(zones: Vec<Zone>) -> Result<Self, CatalogError> {
        validate_zones(&zones)?;
        Ok(Self { zones: RwLock::new(zones) })
    }

    /// Zone containing the point, first match wins
    pub fn resolve(&self, point: GeoPoint) -> CurrentZone {
        let zones = self.zones.read();
        match geofence::first_matching_zone(point, &zones) {
            Some(zone) => CurrentZone::Inside(zone.name.clone()),
            None => CurrentZone::Outside,
        }
    }

    /// Public listing in catalog order
    pub fn list(&self) -> Vec<ZoneSummary> {
        self.zones.read().iter().map(Zone::summary).collect()
    }

    pub fn get(&self, id: &str) -> Option<Zone> {
        self.zones.read().iter().find(|z| z.id == id).cloned()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.zones.read().iter().any(|z| z.name == name)
    }

    pub fn len(&self) -> usize {
        self.zones.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.read().is_empty()
    }

    /// Append a zone at the end of the iteration order
    pub fn add_zone(&self, zone: Zone) -> Result<(), CatalogError> {
        validate_zone(&zone)?;

        let mut zones = self.zones.write();
        if zones.iter().any(|z| z.id == zone.id) {
            return Err(CatalogError::DuplicateId(zone.id));
        }
        if zones.iter().any(|z| z.name == zone.name) {
            return Err(CatalogError::DuplicateName(zone.name));
        }

        info!(zone_id = %zone.id, zone = %zone.name, kind = %zone.shape.kind().as_str(), "zone_added");
        zones.push(zone);
        Ok(())
    }

    /// Remove a zone by id, keeping the relative order of the rest
    pub fn remove_zone(&self, id: &str) -> Option<Zone> {
        let mut zones = self.zones.write();
        let index = zones.iter().position(|z| z.id == id)?;
        let zone = zones.remove(index);
        info!(zone_id = %zone.id, zone = %zone.name, "zone_removed");
        Some(zone)
    }
}
