//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, origin gate, CORS, timeout, body limit)
//! - Route `/admin/routes*` to the admin interface and `GET /` to liveness
//! - Send everything else to the dispatcher
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::config::ServerConfig;
use crate::health;
use crate::http::middleware::{origin_gate, OriginPolicy};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::ShutdownSignal;
use crate::routing::dispatch;
use crate::store::RouteStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RouteStore>,
}

impl AppState {
    pub fn new(store: Arc<RouteStore>) -> Self {
        Self { store }
    }
}

/// HTTP server for the mock API.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server backed by `store`.
    pub fn new(config: ServerConfig, store: Arc<RouteStore>) -> Result<Self, regex::Error> {
        let origins = Arc::new(OriginPolicy::from_config(&config.cors)?);
        let router = build_router(&config, AppState::new(store), origins);
        Ok(Self { router, config })
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            store = %self.config.store.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the assembled router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layers added last run first: request id, then tracing, origin gate and
/// CORS, then timeout and body limit closest to the handlers.
#[allow(deprecated)]
pub fn build_router(config: &ServerConfig, state: AppState, origins: Arc<OriginPolicy>) -> Router {
    Router::new()
        .route("/", get(health::liveness).fallback(dispatch))
        .merge(admin::router())
        .fallback(dispatch)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(origins.cors_layer())
        .layer(middleware::from_fn_with_state(origins, origin_gate))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}
