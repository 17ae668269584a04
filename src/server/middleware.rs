use crate::utils::RequestIdExt;
use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use tracing::{info, warn};

/// Structured request/response logging
pub async fn request_response_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    let request_id = req.extensions().request_id().to_string();

    info!(
        method = %method,
        path = %path,
        query = %query,
        request_id = %request_id,
        "API request"
    );

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        warn!(
            method = %method,
            path = %path,
            status = status,
            latency_ms = %latency_ms,
            request_id = %request_id,
            "API response"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status,
            latency_ms = %latency_ms,
            request_id = %request_id,
            "API response"
        );
    }

    response
}
