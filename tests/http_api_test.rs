//! End-to-end tests against a live HTTP server on an ephemeral port

use geofence_tracker::infra::{Config, Metrics};
use geofence_tracker::io::serve;
use geofence_tracker::services::{Tracker, ZoneCatalog};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

struct TestServer {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let catalog = Arc::new(ZoneCatalog::new(Config::default_zones()).unwrap());
        let tracker = Arc::new(Tracker::new(catalog, Arc::new(Metrics::new())));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(serve(listener, tracker, shutdown_rx));

        Self { addr, shutdown, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_location_lifecycle_over_http() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // Enter Downtown
    let resp = client
        .post(server.url("/api/location"))
        .json(&json!({"vehicleId": "truck-1", "latitude": 40.7128, "longitude": -74.0060, "timestamp": 1000}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["currentZone"], "Downtown");
    assert_eq!(body["event"]["type"], "enter");

    // Move to Harbor: exit then enter, enter reported
    let body: Value = client
        .post(server.url("/api/location"))
        .json(&json!({"vehicleId": "truck-1", "latitude": 40.6995, "longitude": -74.0087, "timestamp": 2000}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["currentZone"], "Harbor");
    assert_eq!(body["event"]["type"], "enter");
    assert_eq!(body["event"]["zone"], "Harbor");

    let status: Value = client
        .get(server.url("/api/vehicles/truck-1/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["currentZone"], "Harbor");
    assert_eq!(status["totalEventsTracked"], 3);
    let kinds: Vec<&str> = status["recentEvents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["enter", "exit", "enter"]);

    let harbor: Value = client
        .get(server.url("/api/vehicles?zone=Harbor"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(harbor.as_array().unwrap().len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_error_responses_over_http() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/api/location"))
        .header("Content-Type", "application/json")
        .body(r#"{"vehicleId":"x","latitude":200,"longitude":0}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("latitude"));

    let resp = client.get(server.url("/api/vehicles/ghost/status")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client.get(server.url("/does/not/exist")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let health: Value =
        client.get(server.url("/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["vehicles"], 0);
    assert_eq!(health["zones"], 4);

    let metrics = client.get(server.url("/metrics")).send().await.unwrap().text().await.unwrap();
    assert!(metrics.contains("geofence_rejected_requests_total 1\n"));

    server.stop().await;
}
