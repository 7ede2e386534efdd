//! Startup orchestration.

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::http::HttpServer;
use crate::store::RouteStore;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid cors.dev_origin_pattern: {0}")]
    OriginPattern(#[from] regex::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Open the route store, build the server and bind its listener.
///
/// The store never blocks startup; only an unusable config or a taken port
/// do.
pub async fn bind(config: ServerConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    let store = Arc::new(RouteStore::open(&config.store.path).await);
    let server = HttpServer::new(config, store)?;

    let address = server.config().listener.address();
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(source) => return Err(StartupError::Bind { address, source }),
    };

    Ok((server, listener))
}
