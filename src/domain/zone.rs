//! Zone model: named regions shaped as a polygon or a circle

use crate::domain::types::GeoPoint;
use serde::Serialize;

/// Geometry of a zone
///
/// Polygons are closed rings: the last vertex connects back to the first.
/// Circle radii are in degree-distance units, the same units as
/// [`crate::services::geofence::distance`], not meters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ZoneShape {
    Polygon { vertices: Vec<GeoPoint> },
    Circle { center: GeoPoint, radius: f64 },
}

impl ZoneShape {
    #[inline]
    pub fn kind(&self) -> ZoneKind {
        match self {
            ZoneShape::Polygon { .. } => ZoneKind::Polygon,
            ZoneShape::Circle { .. } => ZoneKind::Circle,
        }
    }
}

/// Shape discriminant without the geometry payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Polygon,
    Circle,
}

impl ZoneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneKind::Polygon => "polygon",
            ZoneKind::Circle => "circle",
        }
    }
}

/// A named geographic region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub id: String,
    /// Display key; events and vehicle state refer to zones by name
    pub name: String,
    pub description: String,
    pub shape: ZoneShape,
}

impl Zone {
    pub fn polygon(id: &str, name: &str, description: &str, vertices: Vec<GeoPoint>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            shape: ZoneShape::Polygon { vertices },
        }
    }

    pub fn circle(id: &str, name: &str, description: &str, center: GeoPoint, radius: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            shape: ZoneShape::Circle { center, radius },
        }
    }

    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.shape.kind(),
        }
    }
}

/// Public listing entry for a zone (geometry omitted)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ZoneKind,
}
