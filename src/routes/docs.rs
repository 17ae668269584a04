use crate::{error::AppError, server::Server};
use axum::{Router, http::header, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Subscription Service API",
        version = "1.0.0",
        description = "Tracks recurring user subscriptions and reports spend over month windows"
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::subscriptions::create_subscription,
        crate::routes::subscriptions::list_subscriptions,
        crate::routes::subscriptions::get_subscription,
        crate::routes::subscriptions::update_subscription,
        crate::routes::subscriptions::delete_subscription,
        crate::routes::aggregate::aggregate_details,
        crate::routes::aggregate::aggregate_total,
    ),
    components(
        schemas(
            crate::routes::ApiErrorResponse,
            crate::routes::health::HealthCheckQuery,
            crate::health::HealthResponse,
            crate::health::HealthStatus,
            crate::health::HealthCheckResult,
            crate::health::HealthSummary,
            crate::routes::subscriptions::SubscriptionRequest,
            crate::routes::subscriptions::SubscriptionResponse,
            crate::routes::subscriptions::SubscriptionListParams,
            crate::routes::aggregate::AggregateQuery,
            crate::routes::aggregate::AggregateDetailsResponse,
            crate::routes::aggregate::AggregateTotalResponse,
            crate::aggregation::AggregateEntry,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Subscriptions", description = "Subscription records"),
        (name = "Aggregates", description = "Spend over month windows"),
    )
)]
pub struct ApiDoc;

/// Create documentation routes
pub fn create_docs_routes() -> Router<Server> {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", ApiDoc::openapi()))
        .route("/docs/openapi.yaml", get(openapi_yaml))
}

/// Serve OpenAPI specification as YAML
async fn openapi_yaml() -> Result<([(header::HeaderName, &'static str); 1], String), AppError> {
    let spec = ApiDoc::openapi();
    let yaml = serde_yaml_ng::to_string(&spec).map_err(|e| {
        AppError::Internal(format!("Failed to serialize OpenAPI spec to YAML: {e}"))
    })?;

    Ok(([(header::CONTENT_TYPE, "application/yaml")], yaml))
}
