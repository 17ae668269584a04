//! Spend aggregation over whole-month windows.
//!
//! [`interval`] decides how many months a subscription overlaps a window;
//! [`engine`] pulls candidates from a [`SubscriptionSource`] and produces the
//! overlap-weighted total or the numbered per-subscription breakdown.

pub mod engine;
pub mod interval;
pub mod memory;
pub mod month;

#[cfg(test)]
mod proptest_overlap;

pub use engine::{
    AggregateDetails, AggregateEntry, AggregationEngine, AggregationError, SubscriptionSource,
};
pub use interval::{
    AggregateFilter, Subscription, may_overlap, overlap_months, service_name_matches,
};
pub use memory::MemorySubscriptionSource;
pub use month::{Month, MonthParseError, Window, WindowError};
