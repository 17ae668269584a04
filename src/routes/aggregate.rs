use crate::{
    aggregation::{AggregateEntry, AggregateFilter, Month, Window},
    error::AppError,
    routes::{
        ApiErrorResponse,
        subscriptions::{bad_request, non_empty, parse_user_id},
    },
    server::Server,
};
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Window and filters shared by both aggregate endpoints
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct AggregateQuery {
    /// First month of the window, `MM-YYYY`
    pub from: Option<String>,
    /// Last month of the window, `MM-YYYY`, inclusive
    pub to: Option<String>,
    /// Restrict to one user
    pub user_id: Option<String>,
    /// Case-insensitive substring of the service name
    pub service_name: Option<String>,
}

impl AggregateQuery {
    fn parse(self) -> Result<(Window, AggregateFilter), AppError> {
        let (Some(from), Some(to)) = (non_empty(self.from), non_empty(self.to)) else {
            return Err(bad_request("from and to are required (MM-YYYY)"));
        };

        let from: Month = from
            .parse()
            .map_err(|_| bad_request("invalid from format, expected MM-YYYY"))?;
        let to: Month = to
            .parse()
            .map_err(|_| bad_request("invalid to format, expected MM-YYYY"))?;
        let window = Window::new(from, to)
            .map_err(|_| bad_request("`from` must be less than or equal to `to`"))?;

        let user_id = non_empty(self.user_id)
            .map(|raw| parse_user_id(&raw))
            .transpose()?;

        Ok((window, AggregateFilter::new(user_id, self.service_name)))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AggregateDetailsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub subscriptions: Vec<AggregateEntry>,
    #[schema(value_type = String, example = "01-2025")]
    pub from: Month,
    #[schema(value_type = String, example = "12-2025")]
    pub to: Month,
    /// Sum of the nominal monthly prices of the listed subscriptions
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AggregateTotalResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[schema(value_type = String, example = "01-2025")]
    pub from: Month,
    #[schema(value_type = String, example = "12-2025")]
    pub to: Month,
    /// Price times months of overlap with the window, summed
    pub total: i64,
}

/// Numbered breakdown of subscriptions active in a window
#[utoipa::path(
    get,
    path = "/subscriptions/aggregate",
    summary = "Aggregate subscriptions",
    description = "List subscriptions overlapping the window, ordered by service name, with the sum of their monthly prices",
    params(AggregateQuery),
    responses(
        (status = 200, description = "Aggregate computed", body = AggregateDetailsResponse),
        (status = 400, description = "Invalid window or filters", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Aggregates"
)]
pub async fn aggregate_details(
    State(server): State<Server>,
    Query(query): Query<AggregateQuery>,
) -> Result<Json<AggregateDetailsResponse>, AppError> {
    let (window, filter) = query.parse()?;
    let details = server.engine.aggregate_with_details(&window, &filter).await?;

    Ok(Json(AggregateDetailsResponse {
        user_id: filter.user_id,
        subscriptions: details.subscriptions,
        from: window.from(),
        to: window.to(),
        total: details.total,
    }))
}

/// Overlap-weighted spend over a window
#[utoipa::path(
    get,
    path = "/subscriptions/aggregate/total",
    summary = "Total spend",
    description = "Sum of price times months of overlap for every subscription active in the window",
    params(AggregateQuery),
    responses(
        (status = 200, description = "Total computed", body = AggregateTotalResponse),
        (status = 400, description = "Invalid window or filters", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Aggregates"
)]
pub async fn aggregate_total(
    State(server): State<Server>,
    Query(query): Query<AggregateQuery>,
) -> Result<Json<AggregateTotalResponse>, AppError> {
    let (window, filter) = query.parse()?;
    let total = server.engine.aggregate_total(&window, &filter).await?;

    Ok(Json(AggregateTotalResponse {
        user_id: filter.user_id,
        service_name: filter.service_name,
        from: window.from(),
        to: window.to(),
        total,
    }))
}
