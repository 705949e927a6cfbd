//! Lock-free metrics collection and periodic reporting
//!
//! Counters are plain atomics so the tracker hot path never takes a lock.
//! `report()` swaps the per-interval counters to zero to produce a snapshot.
//!
//! NOTE: All atomics use Relaxed ordering; these are statistical counters and
//! must not be used for coordination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Update latency bucket bounds (microseconds)
/// Buckets: ≤1, ≤2, ≤5, ≤10, ≤25, ≤50, ≤100, ≤250, ≤500, ≤1000, >1000
const BUCKET_BOUNDS: [u64; 10] = [1, 2, 5, 10, 25, 50, 100, 250, 500, 1000];
const NUM_BUCKETS: usize = 11;

/// Upper bound reported for each bucket (overflow bucket uses 2x the last bound)
const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] = [1, 2, 5, 10, 25, 50, 100, 250, 500, 1000, 2000];

/// Number of histogram buckets (exported for formatting)
pub const METRICS_NUM_BUCKETS: usize = NUM_BUCKETS;

/// Exported bucket bounds for Prometheus formatting
pub const METRICS_BUCKET_BOUNDS: [u64; 10] = BUCKET_BOUNDS;

#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Raise an atomic maximum with a CAS loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, value: u64) {
    let mut current = atomic_max.load(Ordering::Relaxed);
    while value > current {
        match atomic_max.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => break,
            Err(actual) => current = actual,
        }
    }
}

#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    std::array::from_fn(|i| buckets[i].swap(0, Ordering::Relaxed))
}

/// Upper bound of the bucket holding the given percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64 * percentile).ceil() as u64).max(1);
    let mut cumulative = 0u64;
    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector shared by the tracker and the HTTP layer
pub struct Metrics {
    /// Location updates applied (monotonic)
    updates_total: AtomicU64,
    /// Updates since last report (reset on report)
    updates_since_report: AtomicU64,
    /// Sum of update latencies in µs (reset on report)
    latency_sum_us: AtomicU64,
    /// Max update latency in µs (reset on report)
    latency_max_us: AtomicU64,
    /// Update latency histogram (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Update latency histogram since startup, for scraping
    latency_buckets_total: [AtomicU64; NUM_BUCKETS],
    /// Sum of update latencies since startup
    latency_sum_total_us: AtomicU64,
    /// Enter events recorded (monotonic)
    enter_events_total: AtomicU64,
    /// Exit events recorded (monotonic)
    exit_events_total: AtomicU64,
    /// Anomalous movements flagged (monotonic)
    anomalies_total: AtomicU64,
    /// Requests rejected by validation (monotonic)
    rejected_total: AtomicU64,
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            updates_total: AtomicU64::new(0),
            updates_since_report: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_buckets_total: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_sum_total_us: AtomicU64::new(0),
            enter_events_total: AtomicU64::new(0),
            exit_events_total: AtomicU64::new(0),
            anomalies_total: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record an applied location update and how long it took
    #[inline]
    pub fn record_update(&self, latency_us: u64) {
        self.updates_total.fetch_add(1, Ordering::Relaxed);
        self.updates_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_sum_total_us.fetch_add(latency_us, Ordering::Relaxed);

        let bucket = bucket_index(latency_us);
        self.latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);
        self.latency_buckets_total[bucket].fetch_add(1, Ordering::Relaxed);

        update_atomic_max(&self.latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_enter(&self) {
        self.enter_events_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_exit(&self) {
        self.exit_events_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_anomaly(&self) {
        self.anomalies_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn updates_total(&self) -> u64 {
        self.updates_total.load(Ordering::Relaxed)
    }

    pub fn enter_events_total(&self) -> u64 {
        self.enter_events_total.load(Ordering::Relaxed)
    }

    pub fn exit_events_total(&self) -> u64 {
        self.exit_events_total.load(Ordering::Relaxed)
    }

    pub fn anomalies_total(&self) -> u64 {
        self.anomalies_total.load(Ordering::Relaxed)
    }

    pub fn rejected_total(&self) -> u64 {
        self.rejected_total.load(Ordering::Relaxed)
    }

    /// Cumulative latency histogram and sum (µs), never reset
    pub fn latency_histogram(&self) -> ([u64; NUM_BUCKETS], u64) {
        let buckets = std::array::from_fn(|i| self.latency_buckets_total[i].load(Ordering::Relaxed));
        (buckets, self.latency_sum_total_us.load(Ordering::Relaxed))
    }

    /// Snapshot and reset the per-interval counters
    ///
    /// This is the only method that resets anything; monotonic totals are
    /// only read.
    pub fn report(&self, vehicles: usize, zones: usize) -> MetricsSummary {
        let updates_count = self.updates_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let updates_per_sec = if elapsed.as_secs_f64() > 0.0 {
            updates_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let avg_latency = if updates_count > 0 { latency_sum / updates_count } else { 0 };

        MetricsSummary {
            updates_total: self.updates_total(),
            updates_per_sec,
            avg_latency_us: avg_latency,
            max_latency_us: max_latency,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p95_us: percentile_from_buckets(&lat_buckets, 0.95),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
            lat_buckets,
            enter_events_total: self.enter_events_total(),
            exit_events_total: self.exit_events_total(),
            anomalies_total: self.anomalies_total(),
            rejected_total: self.rejected_total(),
            vehicles,
            zones,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub updates_total: u64,
    pub updates_per_sec: f64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
    /// Update latency histogram, bounds in [`METRICS_BUCKET_BOUNDS`]
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p95_us: u64,
    pub lat_p99_us: u64,
    pub enter_events_total: u64,
    pub exit_events_total: u64,
    pub anomalies_total: u64,
    pub rejected_total: u64,
    /// Vehicles currently tracked
    pub vehicles: usize,
    /// Zones in the catalog
    pub zones: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            updates_total = %self.updates_total,
            updates_per_sec = format!("{:.1}", self.updates_per_sec),
            avg_latency_us = %self.avg_latency_us,
            max_latency_us = %self.max_latency_us,
            p99_us = %self.lat_p99_us,
            enters = %self.enter_events_total,
            exits = %self.exit_events_total,
            anomalies = %self.anomalies_total,
            rejected = %self.rejected_total,
            vehicles = %self.vehicles,
            zones = %self.zones,
            "metrics"
        );
    }
}
