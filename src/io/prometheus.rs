//! Prometheus text exposition of tracker metrics
//!
//! Served by the HTTP layer at `/metrics`. Only monotonic counters, gauges and
//! the cumulative latency histogram are exposed; the interval counters behind
//! the periodic log line are left untouched by scrapes.

use crate::infra::metrics::{Metrics, METRICS_BUCKET_BOUNDS, METRICS_NUM_BUCKETS};
use std::fmt::Write;

/// Prometheus metric type
enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

fn write_metric(output: &mut String, name: &str, help: &str, typ: MetricType, val: u64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name} {val}");
}

fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    buckets: &[u64; METRICS_NUM_BUCKETS],
    sum: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} histogram");

    let mut cumulative = 0u64;
    for (i, &bound) in METRICS_BUCKET_BOUNDS.iter().enumerate() {
        cumulative += buckets[i];
        let _ = writeln!(output, "{name}_bucket{{le=\"{bound}\"}} {cumulative}");
    }
    cumulative += buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{le=\"+Inf\"}} {cumulative}");
    let _ = writeln!(output, "{name}_sum {sum}");
    let _ = writeln!(output, "{name}_count {cumulative}");
}

/// Format metrics in Prometheus text exposition format
pub fn format_prometheus_metrics(metrics: &Metrics, vehicles: usize, zones: usize) -> String {
    let mut output = String::with_capacity(2048);

    write_metric(
        &mut output,
        "geofence_location_updates_total",
        "Location updates applied",
        MetricType::Counter,
        metrics.updates_total(),
    );
    write_metric(
        &mut output,
        "geofence_enter_events_total",
        "Zone enter events recorded",
        MetricType::Counter,
        metrics.enter_events_total(),
    );
    write_metric(
        &mut output,
        "geofence_exit_events_total",
        "Zone exit events recorded",
        MetricType::Counter,
        metrics.exit_events_total(),
    );
    write_metric(
        &mut output,
        "geofence_anomalous_movements_total",
        "Location updates flagged as anomalous jumps",
        MetricType::Counter,
        metrics.anomalies_total(),
    );
    write_metric(
        &mut output,
        "geofence_rejected_requests_total",
        "Location requests rejected by validation",
        MetricType::Counter,
        metrics.rejected_total(),
    );
    write_metric(
        &mut output,
        "geofence_tracked_vehicles",
        "Vehicles currently tracked",
        MetricType::Gauge,
        vehicles as u64,
    );
    write_metric(
        &mut output,
        "geofence_zones",
        "Zones in the catalog",
        MetricType::Gauge,
        zones as u64,
    );

    let (buckets, sum) = metrics.latency_histogram();
    write_histogram(
        &mut output,
        "geofence_update_latency_us",
        "Location update processing latency in microseconds",
        &buckets,
        sum,
    );

    output
}
