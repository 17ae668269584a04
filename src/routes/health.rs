use crate::{health::HealthResponse, server::Server};
use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct HealthCheckQuery {
    /// `all` runs every registered check, a component name runs just that one
    #[serde(default)]
    pub check: Option<String>,
}

/// Create health check routes
pub fn create_health_routes() -> Router<Server> {
    Router::new().route("/", get(health_check))
}

/// Service health
#[utoipa::path(
    get,
    path = "/health",
    summary = "Health check",
    params(HealthCheckQuery),
    responses(
        (status = 200, description = "Health summary", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(
    State(server): State<Server>,
    Query(params): Query<HealthCheckQuery>,
) -> Json<HealthResponse> {
    let filter = params.check.as_deref();
    Json(server.health_service.check_health(filter).await)
}
