use crate::{
    aggregation::{Month, SubscriptionSource},
    config::Config,
    database::{NewSubscription, entities::SubscriptionRecord},
    server::Server,
};
use std::sync::Arc;

/// Test server builder backed by an in-memory SQLite database
pub struct TestServerBuilder {
    config: Config,
    subscription_source: Option<Arc<dyn SubscriptionSource>>,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.logging.log_request = false;
        Self {
            config,
            subscription_source: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Serve aggregates from `source` instead of the database
    pub fn with_subscription_source(mut self, source: Arc<dyn SubscriptionSource>) -> Self {
        self.subscription_source = Some(source);
        self
    }

    /// Build the server and run migrations
    pub async fn build(self) -> Server {
        let mut config = self.config;

        // Every pooled connection would get its own empty memory database
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;

        let server = Server::new(config).await.unwrap();
        server.database.migrate().await.unwrap();

        match self.subscription_source {
            Some(source) => server.with_subscription_source(source),
            None => server,
        }
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an `MM-YYYY` literal
pub fn month(value: &str) -> Month {
    value.parse().unwrap()
}

/// Build a subscription input from literals; `end` may be `None` for open-ended
pub fn new_subscription(
    service_name: &str,
    price: i32,
    user_id: &str,
    start: &str,
    end: Option<&str>,
) -> NewSubscription {
    NewSubscription {
        service_name: service_name.to_string(),
        price,
        user_id: user_id.to_string(),
        start: month(start),
        end: end.map(month),
    }
}

/// Insert a subscription straight through the DAO
pub async fn create_test_subscription(
    server: &Server,
    subscription: &NewSubscription,
) -> SubscriptionRecord {
    server
        .database
        .subscriptions()
        .create(subscription)
        .await
        .unwrap()
}
