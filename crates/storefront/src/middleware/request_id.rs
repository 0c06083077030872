//! Correlation ids for storefront requests.
//!
//! An id forwarded by the upstream authenticator is reused when it looks sane,
//! otherwise a fresh UUID v4 is minted. The id is tagged on the tracing span and
//! the Sentry scope, stored in request extensions as [`RequestId`], and echoed
//! back on the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_FORWARDED_LEN: usize = 128;

/// Correlation id of the request being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuse a forwarded id, or mint one when it is missing or malformed.
    #[must_use]
    pub fn from_forwarded(forwarded: Option<&str>) -> Self {
        forwarded
            .map(str::trim)
            .filter(|id| is_acceptable(id))
            .map_or_else(|| Self(Uuid::new_v4().to_string()), |id| Self(id.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_acceptable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_FORWARDED_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Attach a [`RequestId`] to every request and its response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_forwarded(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok()),
    );

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", request_id.as_str());
    });

    request.extensions_mut().insert(request_id.clone());
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Extension, Router, body::Body, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    #[test]
    fn test_forwarded_id_is_reused() {
        let id = RequestId::from_forwarded(Some(" cf-ray.8a1b_2 "));
        assert_eq!(id.as_str(), "cf-ray.8a1b_2");
    }

    #[test]
    fn test_malformed_ids_are_replaced() {
        for forwarded in [None, Some(""), Some("has space"), Some("<script>")] {
            let id = RequestId::from_forwarded(forwarded);
            assert!(Uuid::parse_str(id.as_str()).is_ok());
        }
        let long = "a".repeat(MAX_FORWARDED_LEN + 1);
        let id = RequestId::from_forwarded(Some(&long));
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[tokio::test]
    async fn test_middleware_echoes_id_and_exposes_extension() {
        let app = Router::new()
            .route(
                "/",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(from_fn(request_id_middleware));

        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "upstream-42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "upstream-42"
        );
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        assert_eq!(&body[..], b"upstream-42");
    }
}
