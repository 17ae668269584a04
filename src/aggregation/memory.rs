use super::engine::SubscriptionSource;
use super::interval::{AggregateFilter, Subscription, may_overlap};
use super::month::Window;
use crate::database::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory subscription source applying the candidate predicate in Rust
#[derive(Default)]
pub struct MemorySubscriptionSource {
    subscriptions: RwLock<Vec<Subscription>>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl MemorySubscriptionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        Self {
            subscriptions: RwLock::new(subscriptions),
            ..Default::default()
        }
    }

    pub async fn insert(&self, subscription: Subscription) {
        self.subscriptions.write().await.push(subscription);
    }

    /// Make every subsequent retrieval fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `find_overlapping` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionSource for MemorySubscriptionSource {
    async fn find_overlapping(
        &self,
        window: &Window,
        filter: &AggregateFilter,
    ) -> DatabaseResult<Vec<Subscription>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::Database(
                "subscription source unavailable".to_string(),
            ));
        }

        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .iter()
            .filter(|sub| may_overlap(sub, window) && filter.matches(sub))
            .cloned()
            .collect())
    }
}
