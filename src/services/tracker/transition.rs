//! Zone membership diffing
//!
//! Each vehicle is either Outside or Inside(zone). A location update moves it
//! between those states and the move is recorded as events:
//!
//! | previous     | next         | events                   |
//! |--------------|--------------|--------------------------|
//! | Outside      | Outside      | none                     |
//! | Inside(A)    | Inside(A)    | none                     |
//! | Outside      | Inside(B)    | Enter(B)                 |
//! | Inside(A)    | Outside      | Exit(A)                  |
//! | Inside(A)    | Inside(B)    | Exit(A), Enter(B)        |

use crate::domain::event::{CurrentZone, ZoneEvent, ZoneEventType};
use smallvec::{smallvec, SmallVec};

/// Events produced by moving from `previous` to `next`, in recording order
pub fn transition(
    previous: &CurrentZone,
    next: &CurrentZone,
    timestamp: i64,
) -> SmallVec<[ZoneEvent; 2]> {
    match (previous, next) {
        (CurrentZone::Outside, CurrentZone::Outside) => SmallVec::new(),
        (CurrentZone::Outside, CurrentZone::Inside(to)) => {
            smallvec![ZoneEvent::enter(to, timestamp)]
        }
        (CurrentZone::Inside(from), CurrentZone::Outside) => {
            smallvec![ZoneEvent::exit(from, timestamp)]
        }
        (CurrentZone::Inside(from), CurrentZone::Inside(to)) if from == to => SmallVec::new(),
        (CurrentZone::Inside(from), CurrentZone::Inside(to)) => {
            smallvec![ZoneEvent::exit(from, timestamp), ZoneEvent::enter(to, timestamp)]
        }
    }
}

/// The single event reported back to the caller
///
/// An Enter takes precedence over a simultaneous Exit: a zone-to-zone move
/// records both, but only the Enter is surfaced. Callers that need the Exit
/// read it from the vehicle's history.
pub fn primary_event(events: &[ZoneEvent]) -> Option<&ZoneEvent> {
    events.iter().find(|e| e.event_type == ZoneEventType::Enter).or_else(|| events.first())
}
