pub mod aggregate;
pub mod docs;
pub mod health;
pub mod subscriptions;

use crate::server::Server;
use axum::{Router, routing::get};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use docs::create_docs_routes;
pub use health::create_health_routes;

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error category
    #[schema(example = "Bad request")]
    pub error: String,
    /// Human-readable detail
    #[schema(example = "price must be >= 0")]
    pub message: String,
}

/// Routes mounted under `/subscriptions`
pub fn create_subscription_routes() -> Router<Server> {
    Router::new()
        .route(
            "/",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route("/aggregate", get(aggregate::aggregate_details))
        .route("/aggregate/total", get(aggregate::aggregate_total))
        .route(
            "/{id}",
            get(subscriptions::get_subscription)
                .put(subscriptions::update_subscription)
                .delete(subscriptions::delete_subscription),
        )
}
