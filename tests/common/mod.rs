//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use mock_api_server::config::ServerConfig;
use mock_api_server::http::HttpServer;
use mock_api_server::lifecycle::Shutdown;
use mock_api_server::store::RouteStore;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// A server wired to a route file inside its own temporary directory.
pub struct TestApp {
    pub dir: TempDir,
    pub store: Arc<RouteStore>,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(ServerConfig::default()).await
    }

    pub async fn with_config(mut config: ServerConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        config.store.path = path.display().to_string();

        let store = Arc::new(RouteStore::open(&path).await);
        let server = HttpServer::new(config, store.clone()).unwrap();

        Self {
            dir,
            store,
            router: server.router(),
        }
    }

    pub fn db_path(&self) -> std::path::PathBuf {
        self.dir.path().join("db.json")
    }
}

/// Send a request with a JSON body.
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Send a request with a raw body that may not be valid JSON.
pub async fn send_raw(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Send a request without a body.
pub async fn send_empty(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a prepared request and decode the body as JSON (`Null` when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// A server running on a real socket.
pub struct LiveServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
    _dir: TempDir,
}

impl LiveServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a live server on an ephemeral port.
pub async fn start_live_server(mut config: ServerConfig) -> LiveServer {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    config.store.path = path.display().to_string();
    config.listener.host = "127.0.0.1".into();

    let store = Arc::new(RouteStore::open(&path).await);
    let server = HttpServer::new(config, store).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, signal).await });

    tokio::time::sleep(Duration::from_millis(50)).await;

    LiveServer {
        addr,
        shutdown,
        handle,
        _dir: dir,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
