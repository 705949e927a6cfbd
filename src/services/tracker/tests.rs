//! Tests for the Tracker module

use super::*;
use crate::domain::event::{CurrentZone, ZoneEvent, EVENT_HISTORY_CAPACITY};
use crate::domain::zone::Zone;
use crate::infra::config::Config;

const DOWNTOWN: (f64, f64) = (40.7128, -74.0060);
const DOWNTOWN_2: (f64, f64) = (40.7135, -74.0055);
const HARBOR: (f64, f64) = (40.6995, -74.0087);
/// Between Downtown and Harbor, inside neither
const NOWHERE: (f64, f64) = (40.7050, -74.0200);
const AIRPORT: (f64, f64) = (40.6413, -73.7781);

fn create_test_tracker() -> Tracker {
    create_test_tracker_with_zones(Config::default_zones())
}

fn create_test_tracker_with_zones(zones: Vec<Zone>) -> Tracker {
    let catalog = Arc::new(ZoneCatalog::new(zones).unwrap());
    Tracker::new(catalog, Arc::new(Metrics::new()))
}

fn track(tracker: &Tracker, id: &str, point: (f64, f64), ts: i64) -> TrackingResult {
    tracker.track_location(id, point.0, point.1, ts)
}

fn inside(name: &str) -> CurrentZone {
    CurrentZone::Inside(name.to_string())
}

#[test]
fn test_scenario_enter_downtown() {
    let tracker = create_test_tracker();

    let result = track(&tracker, "t1", DOWNTOWN, 1_000);

    assert_eq!(result.vehicle_id, "t1");
    assert_eq!(result.latitude, DOWNTOWN.0);
    assert_eq!(result.longitude, DOWNTOWN.1);
    assert_eq!(result.current_zone, inside("Downtown"));
    assert!(result.event_triggered);
    assert_eq!(result.event, Some(ZoneEvent::enter("Downtown", 1_000)));
    assert!(!result.anomalous);
}

#[test]
fn test_scenario_stay_in_downtown() {
    let tracker = create_test_tracker();
    track(&tracker, "t1", DOWNTOWN, 1_000);

    let result = track(&tracker, "t1", DOWNTOWN_2, 2_000);

    assert!(!result.event_triggered);
    assert!(result.event.is_none());
    assert_eq!(result.current_zone, inside("Downtown"));

    let status = tracker.get_status("t1").unwrap();
    assert_eq!(status.total_events_tracked, 1);
    assert_eq!(status.last_location_update, 2_000);
    assert_eq!(status.last_location, GeoPoint::new(DOWNTOWN_2.0, DOWNTOWN_2.1));
}

#[test]
fn test_scenario_downtown_to_harbor_reports_enter() {
    let tracker = create_test_tracker();
    track(&tracker, "t1", DOWNTOWN, 1_000);
    track(&tracker, "t1", DOWNTOWN_2, 2_000);

    let result = track(&tracker, "t1", HARBOR, 3_000);

    assert!(result.event_triggered);
    assert_eq!(result.current_zone, inside("Harbor"));
    assert_eq!(result.event, Some(ZoneEvent::enter("Harbor", 3_000)));

    let status = tracker.get_status("t1").unwrap();
    assert_eq!(status.current_zone, inside("Harbor"));
    assert_eq!(status.total_events_tracked, 3);
    assert_eq!(
        status.recent_events,
        vec![
            ZoneEvent::enter("Downtown", 1_000),
            ZoneEvent::exit("Downtown", 3_000),
            ZoneEvent::enter("Harbor", 3_000),
        ]
    );
}

#[test]
fn test_scenario_new_vehicle_outside_all_zones() {
    let tracker = create_test_tracker();

    let result = track(&tracker, "t2", NOWHERE, 1_000);

    assert_eq!(result.current_zone, CurrentZone::Outside);
    assert!(!result.event_triggered);
    assert!(result.event.is_none());

    // Still tracked, just without events
    let status = tracker.get_status("t2").unwrap();
    assert_eq!(status.current_zone, CurrentZone::Outside);
    assert_eq!(status.total_events_tracked, 0);
}

#[test]
fn test_exit_to_outside() {
    let tracker = create_test_tracker();
    track(&tracker, "t1", DOWNTOWN, 1_000);

    let result = track(&tracker, "t1", NOWHERE, 2_000);

    assert!(result.event_triggered);
    assert_eq!(result.current_zone, CurrentZone::Outside);
    assert_eq!(result.event, Some(ZoneEvent::exit("Downtown", 2_000)));
}

#[test]
fn test_repeated_fix_is_idempotent() {
    let tracker = create_test_tracker();
    assert!(track(&tracker, "t1", DOWNTOWN, 0).event_triggered);

    for ts in 1..20 {
        let result = track(&tracker, "t1", DOWNTOWN, ts);
        assert!(!result.event_triggered);
        assert_eq!(result.current_zone, inside("Downtown"));
    }

    for ts in 0..5 {
        assert!(!track(&tracker, "t2", NOWHERE, ts).event_triggered);
    }

    assert_eq!(tracker.get_status("t1").unwrap().total_events_tracked, 1);
}

#[test]
fn test_event_history_capped_at_fifty() {
    let tracker = create_test_tracker();

    // 60 alternating fixes produce 60 transitions
    for ts in 0..60 {
        let point = if ts % 2 == 0 { DOWNTOWN } else { NOWHERE };
        assert!(track(&tracker, "t1", point, ts).event_triggered);
    }

    let status = tracker.get_status("t1").unwrap();
    assert_eq!(status.total_events_tracked, EVENT_HISTORY_CAPACITY);
    assert_eq!(status.recent_events.len(), 10);
    assert_eq!(status.recent_events.first().unwrap().timestamp, 50);
    assert_eq!(status.recent_events.last().unwrap(), &ZoneEvent::exit("Downtown", 59));

    // The oldest ten transitions (ts 0..10) were evicted
    let state = tracker.vehicles.get("t1").unwrap();
    assert_eq!(state.events.iter().next().unwrap().timestamp, 10);
    assert!(state.events.iter().all(|e| e.timestamp >= 10));
}

#[test]
fn test_anomalous_jump_is_flagged_not_rejected() {
    let tracker = create_test_tracker();
    let first = track(&tracker, "t1", DOWNTOWN, 1_000);
    assert!(!first.anomalous);

    let jump = track(&tracker, "t1", AIRPORT, 2_000);

    assert!(jump.anomalous);
    assert_eq!(tracker.metrics().anomalies_total(), 1);
    // Update still applied, events still fire
    assert_eq!(jump.current_zone, inside("Airport"));
    assert_eq!(jump.event, Some(ZoneEvent::enter("Airport", 2_000)));
    assert_eq!(tracker.get_status("t1").unwrap().current_zone, inside("Airport"));

    // Small move afterwards is measured from the new position
    let settle = track(&tracker, "t1", (AIRPORT.0 + 0.001, AIRPORT.1), 3_000);
    assert!(!settle.anomalous);
    assert_eq!(tracker.metrics().anomalies_total(), 1);
}

#[test]
fn test_first_fix_never_anomalous() {
    let tracker = create_test_tracker();
    assert!(!track(&tracker, "far", (-45.0, 170.0), 0).anomalous);
    assert!(!track(&tracker, "other", AIRPORT, 0).anomalous);
    assert_eq!(tracker.metrics().anomalies_total(), 0);
}

#[test]
fn test_timestamp_only_stamps_events() {
    let tracker = create_test_tracker();
    track(&tracker, "t1", DOWNTOWN, 5_000);

    // An older client timestamp still applies in arrival order
    let result = track(&tracker, "t1", NOWHERE, 1_000);

    assert_eq!(result.event, Some(ZoneEvent::exit("Downtown", 1_000)));
    let status = tracker.get_status("t1").unwrap();
    assert_eq!(status.current_zone, CurrentZone::Outside);
    assert_eq!(status.last_location_update, 1_000);
}

#[test]
fn test_unknown_vehicle_has_no_status() {
    let tracker = create_test_tracker();
    assert!(tracker.get_status("ghost").is_none());
    assert!(tracker.list_all().is_empty());
}

#[test]
fn test_overlapping_zones_first_match_wins() {
    let outer = Zone::circle("outer", "Outer", "", GeoPoint::new(0.0, 0.0), 1.0);
    let inner = Zone::circle("inner", "Inner", "", GeoPoint::new(0.0, 0.0), 0.1);

    let tracker = create_test_tracker_with_zones(vec![inner.clone(), outer.clone()]);
    assert_eq!(track(&tracker, "v", (0.0, 0.05), 0).current_zone, inside("Inner"));

    let tracker = create_test_tracker_with_zones(vec![outer, inner]);
    assert_eq!(track(&tracker, "v", (0.0, 0.05), 0).current_zone, inside("Outer"));
}

#[test]
fn test_list_all_and_filter_by_zone() {
    let tracker = create_test_tracker();
    track(&tracker, "c", DOWNTOWN, 0);
    track(&tracker, "a", HARBOR, 0);
    track(&tracker, "b", DOWNTOWN_2, 0);
    track(&tracker, "d", NOWHERE, 0);

    let ids: Vec<String> = tracker.list_all().into_iter().map(|s| s.vehicle_id).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);

    let downtown: Vec<String> =
        tracker.filter_by_zone("Downtown").into_iter().map(|s| s.vehicle_id).collect();
    assert_eq!(downtown, vec!["b", "c"]);
    assert_eq!(tracker.filter_by_zone("Harbor").len(), 1);
    assert!(tracker.filter_by_zone("Midtown").is_empty());
    assert!(tracker.filter_by_zone("Nonexistent").is_empty());
}

#[test]
fn test_reset_clears_everything() {
    let tracker = create_test_tracker();
    track(&tracker, "a", DOWNTOWN, 0);
    track(&tracker, "b", HARBOR, 0);

    assert_eq!(tracker.reset(), 2);
    assert_eq!(tracker.vehicle_count(), 0);
    assert!(tracker.get_status("a").is_none());

    // A reset vehicle starts from Outside again
    let result = track(&tracker, "a", DOWNTOWN, 1);
    assert_eq!(result.event, Some(ZoneEvent::enter("Downtown", 1)));
    assert!(!result.anomalous);
}

#[test]
fn test_metrics_count_events() {
    let tracker = create_test_tracker();
    track(&tracker, "t1", DOWNTOWN, 0);
    track(&tracker, "t1", HARBOR, 1);
    track(&tracker, "t1", NOWHERE, 2);

    let metrics = tracker.metrics();
    assert_eq!(metrics.updates_total(), 3);
    assert_eq!(metrics.enter_events_total(), 2);
    assert_eq!(metrics.exit_events_total(), 2);
}

#[test]
fn test_list_zones_in_catalog_order() {
    let tracker = create_test_tracker();
    let names: Vec<String> = tracker.list_zones().into_iter().map(|z| z.name).collect();
    assert_eq!(names, vec!["Downtown", "Harbor", "Midtown", "Airport"]);
}

#[test]
fn test_concurrent_distinct_vehicles() {
    let tracker = create_test_tracker();

    std::thread::scope(|s| {
        for t in 0..8 {
            let tracker = &tracker;
            s.spawn(move || {
                let id = format!("v{t}");
                for ts in 0..100 {
                    let point = if ts % 2 == 0 { DOWNTOWN } else { NOWHERE };
                    tracker.track_location(&id, point.0, point.1, ts);
                }
            });
        }
    });

    assert_eq!(tracker.vehicle_count(), 8);
    for status in tracker.list_all() {
        assert_eq!(status.total_events_tracked, EVENT_HISTORY_CAPACITY);
        assert_eq!(status.current_zone, CurrentZone::Outside);
    }
    assert_eq!(tracker.metrics().updates_total(), 800);
}

#[test]
fn test_concurrent_same_vehicle_keeps_history_consistent() {
    let tracker = create_test_tracker();

    std::thread::scope(|s| {
        for t in 0..4 {
            let tracker = &tracker;
            s.spawn(move || {
                for i in 0..200 {
                    let point = if (i + t) % 2 == 0 { DOWNTOWN } else { NOWHERE };
                    tracker.track_location("shared", point.0, point.1, i);
                }
            });
        }
    });

    // Every update diffed against the state left by the previous one, so the
    // history must strictly alternate enter/exit for a single zone
    let state = tracker.vehicles.get("shared").unwrap();
    let events: Vec<&ZoneEvent> = state.events.iter().collect();
    assert!(!events.is_empty());
    assert!(events.len() <= EVENT_HISTORY_CAPACITY);
    for pair in events.windows(2) {
        assert_ne!(pair[0].event_type, pair[1].event_type);
    }
    let last_is_enter = events.last().unwrap().event_type == ZoneEventType::Enter;
    assert_eq!(state.current_zone.is_inside("Downtown"), last_is_enter);
}
