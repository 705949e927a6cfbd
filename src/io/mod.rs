//! IO modules - external interfaces
//!
//! - `http` - JSON API server over the tracker
//! - `validation` - Location request parsing and range checks
//! - `prometheus` - Prometheus text exposition for `/metrics`

pub mod http;
pub mod prometheus;
pub mod validation;

// Re-export commonly used types
pub use http::{route, serve, start_http_server};
pub use prometheus::format_prometheus_metrics;
pub use validation::{parse_location, LocationUpdate, ValidationError};
