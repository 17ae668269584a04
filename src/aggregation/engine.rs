use super::interval::{AggregateFilter, Subscription, overlap_months};
use super::month::Window;
use crate::database::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

/// Aggregation failures. Retrieval errors are passed through untouched.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error(transparent)]
    Retrieval(#[from] DatabaseError),
}

/// Record-providing side of the aggregation engine.
///
/// Implementations return every subscription that satisfies the candidate
/// predicate (`start <= to AND (end IS NULL OR end >= from)`) and the filters,
/// in a single round-trip. Order is not significant.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    async fn find_overlapping(
        &self,
        window: &Window,
        filter: &AggregateFilter,
    ) -> DatabaseResult<Vec<Subscription>>;
}

/// One numbered row of a detailed aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AggregateEntry {
    /// Position in the service-name ordering, starting at 1
    pub number: u32,
    pub service_name: String,
    /// Nominal monthly price, not weighted by overlap
    pub price: i32,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDetails {
    pub subscriptions: Vec<AggregateEntry>,
    /// Sum of nominal prices of the listed subscriptions
    pub total: i64,
}

/// Computes spend over month windows from whatever the source returns.
///
/// Holds no mutable state; clones share the same source.
#[derive(Clone)]
pub struct AggregationEngine {
    source: Arc<dyn SubscriptionSource>,
}

impl AggregationEngine {
    pub fn new(source: Arc<dyn SubscriptionSource>) -> Self {
        Self { source }
    }

    /// Overlap-weighted spend: `sum(price * overlap_months)` over the candidates
    pub async fn aggregate_total(
        &self,
        window: &Window,
        filter: &AggregateFilter,
    ) -> Result<i64, AggregationError> {
        let candidates = self.source.find_overlapping(window, filter).await?;

        let total = candidates
            .iter()
            .map(|sub| i64::from(sub.price) * i64::from(overlap_months(sub, window)))
            .sum();

        debug!(
            from = %window.from(),
            to = %window.to(),
            user_id = ?filter.user_id,
            service_name = ?filter.service_name,
            candidates = candidates.len(),
            total,
            "Computed aggregate total"
        );

        Ok(total)
    }

    /// Numbered breakdown ordered by service name, with the flat sum of nominal prices.
    ///
    /// The total here is intentionally not overlap-weighted; it differs from
    /// [`AggregationEngine::aggregate_total`] and existing callers depend on that.
    pub async fn aggregate_with_details(
        &self,
        window: &Window,
        filter: &AggregateFilter,
    ) -> Result<AggregateDetails, AggregationError> {
        let mut candidates = self.source.find_overlapping(window, filter).await?;

        // Byte order regardless of the store's collation, same as SQLite BINARY.
        // Stable: equal names keep retrieval order.
        candidates.sort_by(|a, b| a.service_name.as_bytes().cmp(b.service_name.as_bytes()));

        let total = candidates.iter().map(|sub| i64::from(sub.price)).sum();

        let subscriptions: Vec<AggregateEntry> = candidates
            .into_iter()
            .enumerate()
            .map(|(idx, sub)| AggregateEntry {
                number: idx as u32 + 1,
                service_name: sub.service_name,
                price: sub.price,
                user_id: sub.user_id,
            })
            .collect();

        debug!(
            from = %window.from(),
            to = %window.to(),
            user_id = ?filter.user_id,
            service_name = ?filter.service_name,
            count = subscriptions.len(),
            total,
            "Computed aggregate breakdown"
        );

        Ok(AggregateDetails {
            subscriptions,
            total,
        })
    }
}
