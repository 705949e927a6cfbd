//! Zone membership events and per-vehicle event history

use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Maximum number of events retained per vehicle
pub const EVENT_HISTORY_CAPACITY: usize = 50;

/// Direction of a geofence crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneEventType {
    Enter,
    Exit,
}

impl ZoneEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneEventType::Enter => "enter",
            ZoneEventType::Exit => "exit",
        }
    }
}

/// A recorded zone membership change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneEvent {
    #[serde(rename = "type")]
    pub event_type: ZoneEventType,
    /// Zone name
    pub zone: String,
    /// Epoch ms, as reported by the client
    pub timestamp: i64,
}

impl ZoneEvent {
    pub fn enter(zone: &str, timestamp: i64) -> Self {
        Self { event_type: ZoneEventType::Enter, zone: zone.to_string(), timestamp }
    }

    pub fn exit(zone: &str, timestamp: i64) -> Self {
        Self { event_type: ZoneEventType::Exit, zone: zone.to_string(), timestamp }
    }
}

/// Zone a vehicle currently occupies
///
/// Serializes as `null` when outside every zone, otherwise as the zone name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CurrentZone {
    #[default]
    Outside,
    Inside(String),
}

impl CurrentZone {
    #[inline]
    pub fn name(&self) -> Option<&str> {
        match self {
            CurrentZone::Outside => None,
            CurrentZone::Inside(name) => Some(name),
        }
    }

    #[inline]
    pub fn is_inside(&self, zone_name: &str) -> bool {
        self.name() == Some(zone_name)
    }
}

impl std::fmt::Display for CurrentZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurrentZone::Outside => f.write_str("none"),
            CurrentZone::Inside(name) => f.write_str(name),
        }
    }
}

impl Serialize for CurrentZone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CurrentZone::Outside => serializer.serialize_none(),
            CurrentZone::Inside(name) => serializer.serialize_str(name),
        }
    }
}

/// Fixed-capacity, insertion-ordered event log
///
/// Pushing onto a full history evicts the oldest event.
#[derive(Debug, Clone)]
pub struct EventHistory {
    events: VecDeque<ZoneEvent>,
    capacity: usize,
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::with_capacity(EVENT_HISTORY_CAPACITY)
    }
}

impl EventHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { events: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, event: ZoneEvent) {
        if self.capacity == 0 {
            return;
        }
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn extend<I: IntoIterator<Item = ZoneEvent>>(&mut self, events: I) {
        for event in events {
            self.push(event);
        }
    }

    /// Last `n` events, oldest first
    pub fn recent(&self, n: usize) -> Vec<ZoneEvent> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip).cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneEvent> {
        self.events.iter()
    }
}
