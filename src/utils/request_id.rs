use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::str::FromStr;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuse a caller-supplied id when it parses as a UUID
    fn from_request(request: &Request) -> Self {
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::from_str(s.trim()).ok())
            .map(Self)
            .unwrap_or_else(Self::new)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self(Uuid::nil())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tags every request with an id, stored in the request extensions and echoed
/// back in the `X-Request-ID` response header.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_request(&request);
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-request-id"), header_value);
    }

    response
}

pub trait RequestIdExt {
    fn request_id(&self) -> RequestId;
}

impl RequestIdExt for axum::http::Extensions {
    fn request_id(&self) -> RequestId {
        self.get::<RequestId>().copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        extract::Extension,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    async fn echo_id(Extension(request_id): Extension<RequestId>) -> String {
        request_id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/subscriptions", get(echo_id))
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_generates_id_when_missing() {
        let request = HttpRequest::builder()
            .uri("/subscriptions")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let header = response.headers().get("x-request-id").unwrap();
        assert!(Uuid::from_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_preserves_incoming_id() {
        let existing_id = Uuid::new_v4();
        let request = HttpRequest::builder()
            .uri("/subscriptions")
            .header(REQUEST_ID_HEADER, existing_id.to_string())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let header = response.headers().get("x-request-id").unwrap();
        assert_eq!(header.to_str().unwrap(), existing_id.to_string());
    }

    #[tokio::test]
    async fn test_replaces_malformed_id() {
        let request = HttpRequest::builder()
            .uri("/subscriptions")
            .header(REQUEST_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let header = response.headers().get("x-request-id").unwrap();
        assert_ne!(header.to_str().unwrap(), "not-a-uuid");
        assert!(Uuid::from_str(header.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_missing_extension_is_nil() {
        let extensions = axum::http::Extensions::new();
        assert_eq!(extensions.request_id(), RequestId::default());
    }
}
