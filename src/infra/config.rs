//! Configuration loading from TOML files
//!
//! Config file is selected via `--config <path>` (default `config/zones.toml`).
//! A missing or unreadable file falls back to the built-in defaults, which
//! include a small demo zone catalog.
//!
//! Zones are listed as `[[zones]]` tables. Their order in the file is the
//! catalog order, which decides the winner when zones overlap.

use crate::domain::types::GeoPoint;
use crate::domain::zone::Zone;
use crate::services::catalog;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: default_bind_address(), port: default_port() }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Interval for the periodic metrics log line (0 to disable)
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Polygon,
    Circle,
}

/// A `[[zones]]` table as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub shape: ShapeType,
    /// Polygon ring as `[lat, lon]` pairs
    #[serde(default)]
    pub vertices: Option<Vec<[f64; 2]>>,
    /// Circle center as `[lat, lon]`
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    /// Circle radius in degrees
    #[serde(default)]
    pub radius: Option<f64>,
}

impl ZoneEntry {
    fn into_zone(self) -> anyhow::Result<Zone> {
        match self.shape {
            ShapeType::Polygon => {
                let Some(vertices) = self.vertices else {
                    bail!("polygon zone '{}' is missing 'vertices'", self.id);
                };
                let vertices = vertices.into_iter().map(GeoPoint::from).collect();
                Ok(Zone::polygon(&self.id, &self.name, &self.description, vertices))
            }
            ShapeType::Circle => {
                let (Some(center), Some(radius)) = (self.center, self.radius) else {
                    bail!("circle zone '{}' needs both 'center' and 'radius'", self.id);
                };
                Ok(Zone::circle(&self.id, &self.name, &self.description, center.into(), radius))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// When absent, the built-in catalog is used
    #[serde(default)]
    pub zones: Option<Vec<ZoneEntry>>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    bind_address: String,
    port: u16,
    metrics_interval_secs: u64,
    zones: Vec<Zone>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            metrics_interval_secs: default_metrics_interval(),
            zones: Self::default_zones(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Built-in demo catalog around lower Manhattan
    ///
    /// Downtown is listed before Harbor; the two do not overlap, but order
    /// would decide if they did.
    pub fn default_zones() -> Vec<Zone> {
        vec![
            Zone::polygon(
                "zone-downtown",
                "Downtown",
                "Financial district core",
                vec![
                    GeoPoint::new(40.7100, -74.0100),
                    GeoPoint::new(40.7100, -74.0000),
                    GeoPoint::new(40.7200, -74.0000),
                    GeoPoint::new(40.7200, -74.0100),
                ],
            ),
            Zone::circle(
                "zone-harbor",
                "Harbor",
                "Battery waterfront",
                GeoPoint::new(40.7000, -74.0100),
                0.005,
            ),
            Zone::polygon(
                "zone-midtown",
                "Midtown",
                "Midtown business district",
                vec![
                    GeoPoint::new(40.7500, -73.9950),
                    GeoPoint::new(40.7500, -73.9750),
                    GeoPoint::new(40.7650, -73.9750),
                    GeoPoint::new(40.7650, -73.9950),
                ],
            ),
            Zone::circle(
                "zone-airport",
                "Airport",
                "JFK airport perimeter",
                GeoPoint::new(40.6413, -73.7781),
                0.02,
            ),
        ]
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content).context("Failed to parse config")?;

        let zones = match toml_config.zones {
            Some(entries) => entries
                .into_iter()
                .map(ZoneEntry::into_zone)
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => Self::default_zones(),
        };
        catalog::validate_zones(&zones).context("Invalid zone catalog")?;

        Ok(Self {
            bind_address: toml_config.server.bind_address,
            port: toml_config.server.port,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            zones,
            config_file: "inline".to_string(),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        config.config_file = path.display().to_string();
        Ok(config)
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Override the configured port (`--port`)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
