use crate::{
    aggregation::Month,
    database::{NewSubscription, SubscriptionListQuery, entities::SubscriptionRecord},
    error::AppError,
    routes::ApiErrorResponse,
    server::Server,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 500;

/// Body of create and update requests
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct SubscriptionRequest {
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    /// Monthly price in minor currency units
    #[schema(example = 400)]
    pub price: i64,
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,
    #[schema(example = "07-2025")]
    pub start_date: String,
    /// Empty or absent means open-ended
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
}

impl SubscriptionRequest {
    /// Checks run in order; the first failure is reported
    pub fn validate(self) -> Result<NewSubscription, AppError> {
        if self.service_name.trim().is_empty() {
            return Err(bad_request("service_name is required"));
        }
        if self.price < 0 {
            return Err(bad_request("price must be >= 0"));
        }
        let price = i32::try_from(self.price).map_err(|_| bad_request("price is too large"))?;
        let user_id = parse_user_id(&self.user_id)?;

        let start: Month = self
            .start_date
            .parse()
            .map_err(|_| bad_request("invalid start_date format, expected MM-YYYY"))?;

        let end = match self.end_date.as_deref() {
            None | Some("") => None,
            Some(raw) => {
                let end: Month = raw
                    .parse()
                    .map_err(|_| bad_request("invalid end_date format"))?;
                if end < start {
                    return Err(bad_request("end_date must be the same or after start_date"));
                }
                Some(end)
            }
        };

        Ok(NewSubscription {
            service_name: self.service_name,
            price,
            user_id,
            start,
            end,
        })
    }
}

/// Stored subscription as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    #[schema(value_type = String, example = "07-2025")]
    pub start_date: Month,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<Month>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionRecord> for SubscriptionResponse {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            id: record.id,
            start_date: record.start_month(),
            end_date: record.end_month(),
            service_name: record.service_name,
            price: record.price,
            user_id: record.user_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// List filters. Unparsable `limit`/`offset` fall back to their defaults.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct SubscriptionListParams {
    /// User UUID, any letter case
    pub user_id: Option<String>,
    /// Case-insensitive substring of the service name
    pub service_name: Option<String>,
    /// Page size, default 50, at most 500
    pub limit: Option<String>,
    /// Rows to skip, default 0
    pub offset: Option<String>,
}

impl SubscriptionListParams {
    fn into_query(self) -> Result<SubscriptionListQuery, AppError> {
        let limit = self
            .limit
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let offset = self
            .offset
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0);

        let user_id = non_empty(self.user_id)
            .map(|raw| parse_user_id(&raw))
            .transpose()?;

        Ok(SubscriptionListQuery {
            user_id,
            service_name: non_empty(self.service_name),
            limit,
            offset,
        })
    }
}

pub(crate) fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse a user id and return its canonical lowercase hyphenated form
pub(crate) fn parse_user_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| bad_request("user_id must be a valid UUID"))
}

/// A malformed id can never match a stored row
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("not found".to_string()))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(format!("invalid json: {}", rejection.body_text())))
}

/// Create a subscription
#[utoipa::path(
    post,
    path = "/subscriptions",
    summary = "Create subscription",
    request_body = SubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = SubscriptionResponse,
            headers(("Location" = String, description = "URL of the new subscription"))),
        (status = 400, description = "Validation failed", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn create_subscription(
    State(server): State<Server>,
    payload: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = json_body(payload)?.validate()?;
    let record = server.database.subscriptions().create(&subscription).await?;

    info!(
        id = %record.id,
        user_id = %record.user_id,
        service_name = %record.service_name,
        "Created subscription"
    );

    let location = format!("/subscriptions/{}", record.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(SubscriptionResponse::from(record)),
    ))
}

/// List subscriptions, most recent start first
#[utoipa::path(
    get,
    path = "/subscriptions",
    summary = "List subscriptions",
    params(SubscriptionListParams),
    responses(
        (status = 200, description = "Subscriptions retrieved", body = [SubscriptionResponse]),
        (status = 400, description = "Invalid user_id", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn list_subscriptions(
    State(server): State<Server>,
    Query(params): Query<SubscriptionListParams>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let query = params.into_query()?;
    let records = server.database.subscriptions().list(&query).await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Get a subscription by id
#[utoipa::path(
    get,
    path = "/subscriptions/{id}",
    summary = "Get subscription",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription found", body = SubscriptionResponse),
        (status = 404, description = "Subscription not found", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn get_subscription(
    State(server): State<Server>,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let id = parse_id(&id)?;
    let record = server
        .database
        .subscriptions()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("not found".to_string()))?;

    Ok(Json(record.into()))
}

/// Replace a subscription
#[utoipa::path(
    put,
    path = "/subscriptions/{id}",
    summary = "Update subscription",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    request_body = SubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = SubscriptionResponse),
        (status = 400, description = "Validation failed", body = ApiErrorResponse),
        (status = 404, description = "Subscription not found", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn update_subscription(
    State(server): State<Server>,
    Path(id): Path<String>,
    payload: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let id = parse_id(&id)?;
    let subscription = json_body(payload)?.validate()?;
    let record = server
        .database
        .subscriptions()
        .update(id, &subscription)
        .await?;

    info!(id = %record.id, "Updated subscription");
    Ok(Json(record.into()))
}

/// Delete a subscription
#[utoipa::path(
    delete,
    path = "/subscriptions/{id}",
    summary = "Delete subscription",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 404, description = "Subscription not found", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Subscriptions"
)]
pub async fn delete_subscription(
    State(server): State<Server>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    server.database.subscriptions().delete(id).await?;

    info!(id = %id, "Deleted subscription");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SubscriptionRequest {
        SubscriptionRequest {
            service_name: "Yandex Plus".to_string(),
            price: 400,
            user_id: "60601FEE-2BF1-4721-AE6F-7636E79A0CBA".to_string(),
            start_date: "07-2025".to_string(),
            end_date: None,
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) => msg,
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request_is_normalized() {
        let subscription = request().validate().unwrap();
        assert_eq!(subscription.user_id, "60601fee-2bf1-4721-ae6f-7636e79a0cba");
        assert_eq!(subscription.start, Month::new(2025, 7).unwrap());
        assert_eq!(subscription.end, None);
    }

    #[test]
    fn test_empty_end_date_means_open_ended() {
        let req = SubscriptionRequest {
            end_date: Some(String::new()),
            ..request()
        };
        assert_eq!(req.validate().unwrap().end, None);
    }

    #[test]
    fn test_validation_messages() {
        let cases = [
            (
                SubscriptionRequest {
                    service_name: "   ".to_string(),
                    ..request()
                },
                "service_name is required",
            ),
            (
                SubscriptionRequest {
                    price: -1,
                    ..request()
                },
                "price must be >= 0",
            ),
            (
                SubscriptionRequest {
                    user_id: "user-1".to_string(),
                    ..request()
                },
                "user_id must be a valid UUID",
            ),
            (
                SubscriptionRequest {
                    start_date: "2025-07".to_string(),
                    ..request()
                },
                "invalid start_date format, expected MM-YYYY",
            ),
            (
                SubscriptionRequest {
                    end_date: Some("13-2025".to_string()),
                    ..request()
                },
                "invalid end_date format",
            ),
            (
                SubscriptionRequest {
                    end_date: Some("06-2025".to_string()),
                    ..request()
                },
                "end_date must be the same or after start_date",
            ),
        ];

        for (req, expected) in cases {
            assert_eq!(message(req.validate().unwrap_err()), expected);
        }
    }

    #[test]
    fn test_price_overflow_is_rejected() {
        let req = SubscriptionRequest {
            price: i64::from(i32::MAX) + 1,
            ..request()
        };
        assert_eq!(message(req.validate().unwrap_err()), "price is too large");
    }

    #[test]
    fn test_list_params_fall_back_to_defaults() {
        let query = SubscriptionListParams {
            user_id: Some(String::new()),
            service_name: Some("net".to_string()),
            limit: Some("abc".to_string()),
            offset: Some("-3".to_string()),
        }
        .into_query()
        .unwrap();

        assert_eq!(query.user_id, None);
        assert_eq!(query.service_name.as_deref(), Some("net"));
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_list_limit_is_capped() {
        let query = SubscriptionListParams {
            limit: Some("10000".to_string()),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.limit, MAX_LIMIT);
    }

    #[test]
    fn test_list_user_filter_is_canonicalized() {
        let query = SubscriptionListParams {
            user_id: Some("60601FEE-2BF1-4721-AE6F-7636E79A0CBA".to_string()),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(
            query.user_id.as_deref(),
            Some("60601fee-2bf1-4721-ae6f-7636e79a0cba")
        );

        let invalid = SubscriptionListParams {
            user_id: Some("bob".to_string()),
            ..Default::default()
        }
        .into_query()
        .unwrap_err();
        assert_eq!(message(invalid), "user_id must be a valid UUID");
    }
}
