//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use weather_monitor::health::HealthState;
use weather_monitor::http::{AppState, HttpServer};
use weather_monitor::lifecycle::Shutdown;
use weather_monitor::observability::metrics::init_metrics;
use weather_monitor::storage::{Location, MemoryStore, NewObservation, ObservationStore};
use weather_monitor::config::ServerConfig;

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` receives the raw request head and returns status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let head = read_request_head(&mut socket).await;
                        let (status, body) = f(head).await;
                        let status_text = match status {
                            200 => "200 OK",
                            401 => "401 Unauthorized",
                            403 => "403 Forbidden",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// A WeatherAPI.com style payload.
pub fn provider_payload(temp_c: f64, humidity: f64, pressure_mb: f64) -> String {
    serde_json::json!({
        "location": {"name": "Toronto", "country": "Canada"},
        "current": {"temp_c": temp_c, "humidity": humidity, "pressure_mb": pressure_mb}
    })
    .to_string()
}

/// HTTP server over a store, running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub health: Arc<HealthState>,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_server(store: Arc<dyn ObservationStore>) -> TestServer {
    start_server_with(store, ServerConfig::default()).await
}

pub async fn start_server_with(store: Arc<dyn ObservationStore>, config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let health = Arc::new(HealthState::new());
    let shutdown = Shutdown::new();

    let state = AppState::new(store, health.clone(), init_metrics());
    let server = HttpServer::new(config, state);
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    TestServer {
        addr,
        health,
        shutdown,
        client,
    }
}

/// Reading for Mississauga, `minutes_ago` before now.
pub fn reading(temperature: f64, minutes_ago: i64) -> NewObservation {
    reading_at(temperature, Utc::now() - chrono::Duration::minutes(minutes_ago))
}

pub fn reading_at(temperature: f64, timestamp: DateTime<Utc>) -> NewObservation {
    NewObservation {
        temperature,
        humidity: Some(65.0),
        pressure: Some(1013.0),
        timestamp,
        location: Location::new("Mississauga", "Canada"),
    }
}

pub async fn seeded_store(readings: Vec<NewObservation>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for r in readings {
        store.insert(r).await.unwrap();
    }
    store
}
