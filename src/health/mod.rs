//! Liveness check.
//!
//! `GET /` answers `200 OK` with a plain-text body as soon as the listener
//! is bound. It never touches the route store.

/// Body returned by the liveness check.
pub const LIVENESS_BODY: &str = "OK";

pub async fn liveness() -> &'static str {
    LIVENESS_BODY
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_liveness_is_plain_text_ok() {
        let response = liveness().await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
