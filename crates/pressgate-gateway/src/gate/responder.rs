//! Built-in 503 rejection.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// `503` with `Retry-After` and the configured message as the exact body.
pub fn default_rejection(retry_after_secs: u64, message: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, retry_after_secs.to_string())],
        message.to_owned(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_503_with_retry_after() {
        let resp = default_rejection(20, "Custom Message");
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.headers()[header::RETRY_AFTER], "20");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Custom Message");
    }
}
