//! Location request validation
//!
//! Raw JSON bodies are checked here before anything reaches the tracker,
//! which assumes in-range coordinates and a non-empty vehicle id.

use serde::Deserialize;
use thiserror::Error;

/// Longest accepted vehicle id, in characters
pub const MAX_VEHICLE_ID_LEN: usize = 128;

/// Reasons a location request is refused
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("vehicleId cannot be empty")]
    EmptyVehicleId,

    #[error("vehicleId exceeds maximum length of {max}")]
    VehicleIdTooLong { max: usize },

    #[error("latitude {0} is out of range [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is out of range [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("timestamp {0} must not be negative")]
    NegativeTimestamp(i64),
}

/// Location request as sent by clients; every field is optional on the wire
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    pub vehicle_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timestamp: Option<i64>,
}

/// A location request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch ms; `None` means the caller should stamp it with the current time
    pub timestamp: Option<i64>,
}

/// Parse and validate a JSON location body
pub fn parse_location(body: &[u8]) -> Result<LocationUpdate, ValidationError> {
    let request: LocationRequest =
        serde_json::from_slice(body).map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
    validate_location(request)
}

pub fn validate_location(request: LocationRequest) -> Result<LocationUpdate, ValidationError> {
    let vehicle_id = request.vehicle_id.ok_or(ValidationError::MissingField("vehicleId"))?;
    let vehicle_id = vehicle_id.trim();
    if vehicle_id.is_empty() {
        return Err(ValidationError::EmptyVehicleId);
    }
    if vehicle_id.chars().count() > MAX_VEHICLE_ID_LEN {
        return Err(ValidationError::VehicleIdTooLong { max: MAX_VEHICLE_ID_LEN });
    }

    let latitude = request.latitude.ok_or(ValidationError::MissingField("latitude"))?;
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::LatitudeOutOfRange(latitude));
    }

    let longitude = request.longitude.ok_or(ValidationError::MissingField("longitude"))?;
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::LongitudeOutOfRange(longitude));
    }

    if let Some(ts) = request.timestamp {
        if ts < 0 {
            return Err(ValidationError::NegativeTimestamp(ts));
        }
    }

    Ok(LocationUpdate {
        vehicle_id: vehicle_id.to_string(),
        latitude,
        longitude,
        timestamp: request.timestamp,
    })
}
