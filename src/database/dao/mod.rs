pub mod subscriptions;

pub use subscriptions::{NewSubscription, SubscriptionListQuery, SubscriptionsDao};
