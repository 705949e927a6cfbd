//! Geofence tracker - vehicle zone membership service
//!
//! Accepts location updates over HTTP, resolves each fix against a catalog of
//! polygon and circle zones, and records enter/exit events per vehicle.
//!
//! Module structure:
//! - `domain/` - Core types (GeoPoint, Zone, ZoneEvent, VehicleState)
//! - `io/` - External interfaces (HTTP API, validation, Prometheus)
//! - `services/` - Business logic (geofence geometry, ZoneCatalog, Tracker)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use geofence_tracker::infra::{Config, Metrics};
use geofence_tracker::services::{Tracker, ZoneCatalog};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Geofence tracker - vehicle zone membership service
#[derive(Parser, Debug)]
#[command(name = "geofence-tracker", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/zones.toml")]
    config: String,

    /// Override the HTTP port from the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: INFO, use RUST_LOG=debug to see every location update
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("geofence-tracker starting");

    let args = Args::parse();

    let mut config = Config::load_from_path(&args.config);
    if let Some(port) = args.port {
        config = config.with_port(port);
    }

    info!(
        config_file = %config.config_file(),
        bind_address = %config.bind_address(),
        port = %config.port(),
        zones = %config.zones().len(),
        metrics_interval_secs = %config.metrics_interval_secs(),
        "config_loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let catalog = Arc::new(ZoneCatalog::new(config.zones().to_vec())?);
    let metrics = Arc::new(Metrics::new());
    let tracker = Arc::new(Tracker::new(catalog, metrics.clone()));

    // Periodic metrics summary (disabled when interval is 0)
    let metrics_interval = config.metrics_interval_secs();
    if metrics_interval > 0 {
        let reporter = tracker.clone();
        let mut reporter_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let summary = reporter
                            .metrics()
                            .report(reporter.vehicle_count(), reporter.catalog().len());
                        summary.log();
                    }
                    _ = reporter_shutdown.changed() => {
                        if *reporter_shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        });
    }

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    geofence_tracker::io::start_http_server(
        config.bind_address(),
        config.port(),
        tracker.clone(),
        shutdown_rx,
    )
    .await?;

    let summary = metrics.report(tracker.vehicle_count(), tracker.catalog().len());
    summary.log();
    info!("geofence-tracker shutdown complete");
    Ok(())
}
