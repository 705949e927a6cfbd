//! HTTP API
//!
//! JSON endpoints over the tracker plus `/health` and `/metrics`. Routing is a
//! plain match on method and path; `route` is synchronous so handlers can be
//! exercised without a socket.

use crate::domain::types::epoch_ms;
use crate::io::prometheus::format_prometheus_metrics;
use crate::io::validation::parse_location;
use crate::services::tracker::Tracker;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Largest request body accepted, in bytes
pub const MAX_BODY_BYTES: usize = 64 * 1024;

fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .expect("static response should not fail"),
        Err(e) => {
            error!(error = %e, "response_serialize_failed");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(r#"{"error":"internal"}"#)))
                .expect("static response should not fail")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "error": message }))
}

/// Decode `%XX` escapes in a path segment
///
/// `+` is a literal character in paths. Invalid escapes are kept literally.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                out.push(hex_value(bytes[i + 1]) << 4 | hex_value(bytes[i + 2]));
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// Decode a form-encoded query value, where `+` stands for a space
fn query_decode(input: &str) -> String {
    percent_decode(&input.replace('+', " "))
}

/// Value of `key` in a query string, decoded
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| query_decode(v))
}

/// Vehicle id from `/api/vehicles/{id}/status`
fn status_path_id(path: &str) -> Option<String> {
    let id = path.strip_prefix("/api/vehicles/")?.strip_suffix("/status")?;
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(percent_decode(id))
}

/// Dispatch one request against the tracker
pub fn route(
    tracker: &Tracker,
    method: &Method,
    path: &str,
    query: Option<&str>,
    body: &[u8],
) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::POST, "/api/location") => match parse_location(body) {
            Ok(update) => {
                let timestamp = update.timestamp.unwrap_or_else(epoch_ms);
                let result = tracker.track_location(
                    &update.vehicle_id,
                    update.latitude,
                    update.longitude,
                    timestamp,
                );
                json_response(StatusCode::OK, &result)
            }
            Err(e) => {
                tracker.metrics().record_rejected();
                warn!(error = %e, "location_rejected");
                error_response(StatusCode::BAD_REQUEST, &e.to_string())
            }
        },
        (&Method::GET, "/api/vehicles") => {
            let vehicles = match query_param(query, "zone") {
                Some(zone) => tracker.filter_by_zone(&zone),
                None => tracker.list_all(),
            };
            json_response(StatusCode::OK, &vehicles)
        }
        (&Method::GET, "/api/zones") => json_response(StatusCode::OK, &tracker.list_zones()),
        (&Method::POST, "/api/admin/reset") => {
            let cleared = tracker.reset();
            json_response(StatusCode::OK, &json!({ "ok": true, "cleared": cleared }))
        }
        (&Method::GET, "/health") => json_response(
            StatusCode::OK,
            &json!({
                "status": "ok",
                "vehicles": tracker.vehicle_count(),
                "zones": tracker.catalog().len(),
            }),
        ),
        (&Method::GET, "/metrics") => {
            let body = format_prometheus_metrics(
                tracker.metrics(),
                tracker.vehicle_count(),
                tracker.catalog().len(),
            );
            Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
                .body(Full::new(Bytes::from(body)))
                .expect("static response should not fail")
        }
        (&Method::GET, _) if path.starts_with("/api/vehicles/") => match status_path_id(path) {
            Some(id) => match tracker.get_status(&id) {
                Some(status) => json_response(StatusCode::OK, &status),
                None => error_response(StatusCode::NOT_FOUND, "vehicle_not_found"),
            },
            None => error_response(StatusCode::NOT_FOUND, "not_found"),
        },
        _ => error_response(StatusCode::NOT_FOUND, "not_found"),
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    tracker: Arc<Tracker>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!(error = %e, path = %parts.uri.path(), "request_body_rejected");
            tracker.metrics().record_rejected();
            return Ok(error_response(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"));
        }
    };

    Ok(route(&tracker, &parts.method, parts.uri.path(), parts.uri.query(), &body))
}

/// Accept connections until shutdown is signalled
pub async fn serve(
    listener: TcpListener,
    tracker: Arc<Tracker>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let tracker = tracker.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let tracker = tracker.clone();
                                async move { handle_request(req, tracker).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "http_connection_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "http_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("http_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}

/// Bind and run the API server
pub async fn start_http_server(
    bind_address: &str,
    port: u16,
    tracker: Arc<Tracker>,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind_address}:{port}").parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!(addr = %addr, "http_server_started");

    serve(listener, tracker, shutdown).await?;
    Ok(())
}
