//! Cross-origin policy.
//! Rejects browser callers from origins outside the allow-list.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::ORIGIN, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::http::response::ApiError;
use crate::observability::metrics;

/// Compiled allow-list of caller origins.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allow_any: bool,
    exact: Vec<String>,
    dev_pattern: Option<Regex>,
}

impl OriginPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, regex::Error> {
        let any_listed = config.allowed_origins.iter().any(|o| o.trim() == "*");
        let dev_pattern = match config.dev_origin_pattern.trim() {
            "" => None,
            pattern => Some(Regex::new(pattern)?),
        };

        Ok(Self {
            allow_any: config.allow_any_origin || any_listed,
            exact: config
                .allowed_origins
                .iter()
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty() && o != "*")
                .collect(),
            dev_pattern,
        })
    }

    /// True when requests carrying `origin` may proceed.
    pub fn allows(&self, origin: &str) -> bool {
        if self.allow_any {
            return true;
        }
        if self.exact.iter().any(|allowed| allowed == origin) {
            return true;
        }
        self.dev_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(origin))
    }

    /// CORS response decoration for allowed origins.
    pub fn cors_layer(self: &Arc<Self>) -> CorsLayer {
        let allow_origin = if self.allow_any {
            AllowOrigin::any()
        } else {
            let policy = Arc::clone(self);
            AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
                origin.to_str().is_ok_and(|o| policy.allows(o))
            })
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    }
}

/// Middleware refusing requests whose `Origin` is not allowed.
///
/// Requests without an `Origin` header are not browser cross-origin calls
/// and pass through.
pub async fn origin_gate(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(ORIGIN) {
        let origin = origin.to_str().unwrap_or_default();
        if !policy.allows(origin) {
            tracing::warn!(origin = %origin, path = %request.uri().path(), "Origin rejected");
            metrics::record_origin_rejected();
            return ApiError::OriginRejected.into_response();
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(origins: &[&str], pattern: &str) -> OriginPolicy {
        OriginPolicy::from_config(&CorsConfig {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            allow_any_origin: false,
            dev_origin_pattern: pattern.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_exact_origins_are_allowed() {
        let policy = policy(&["https://admin.example.com/"], "");
        assert!(policy.allows("https://admin.example.com"));
        assert!(!policy.allows("https://evil.example.com"));
    }

    #[test]
    fn test_default_dev_pattern_covers_local_port_range() {
        let policy = OriginPolicy::from_config(&CorsConfig::default()).unwrap();
        assert!(policy.allows("http://localhost:5173"));
        assert!(policy.allows("http://127.0.0.1:5000"));
        assert!(!policy.allows("http://localhost:8080"));
        assert!(!policy.allows("http://localhost:51730"));
        assert!(!policy.allows("https://example.com"));
    }

    #[test]
    fn test_wildcard_allows_everything() {
        let policy = policy(&["*"], "");
        assert!(policy.allows("https://anything.test"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = OriginPolicy::from_config(&CorsConfig {
            allowed_origins: Vec::new(),
            allow_any_origin: false,
            dev_origin_pattern: "(".to_string(),
        });
        assert!(result.is_err());
    }
}
