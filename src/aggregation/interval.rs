use super::month::{Month, Window};
use uuid::Uuid;

/// A subscription as seen by the aggregation core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: Uuid,
    pub service_name: String,
    /// Monthly price in minor currency units
    pub price: i32,
    pub user_id: String,
    pub start: Month,
    /// Last active month, inclusive. `None` means still active.
    pub end: Option<Month>,
}

/// Number of whole months shared by the subscription's active interval and the window.
///
/// Open-ended subscriptions are clipped to `window.to()`.
pub fn overlap_months(sub: &Subscription, window: &Window) -> u32 {
    let effective_end = sub.end.unwrap_or(window.to());

    let lo = sub.start.max(window.from());
    let hi = effective_end.min(window.to());

    if hi < lo {
        return 0;
    }

    (lo.months_until(hi) + 1) as u32
}

/// Candidate retrieval predicate: `start <= to AND (end IS NULL OR end >= from)`
pub fn may_overlap(sub: &Subscription, window: &Window) -> bool {
    sub.start <= window.to() && sub.end.is_none_or(|end| end >= window.from())
}

/// Optional user and service-name filters shared by both aggregation entry points
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateFilter {
    pub user_id: Option<String>,
    /// Case-insensitive substring of the service name
    pub service_name: Option<String>,
}

impl AggregateFilter {
    /// Empty strings count as "no filter"
    pub fn new(user_id: Option<String>, service_name: Option<String>) -> Self {
        Self {
            user_id: user_id.filter(|v| !v.is_empty()),
            service_name: service_name.filter(|v| !v.is_empty()),
        }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self::new(Some(user_id.into()), None)
    }

    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self::new(None, Some(service_name.into()))
    }

    pub fn matches(&self, sub: &Subscription) -> bool {
        if let Some(user_id) = &self.user_id {
            if &sub.user_id != user_id {
                return false;
            }
        }
        if let Some(needle) = &self.service_name {
            if !service_name_matches(&sub.service_name, needle) {
                return false;
            }
        }
        true
    }
}

/// Unicode-aware case-insensitive substring match on a service name
pub fn service_name_matches(service_name: &str, needle: &str) -> bool {
    service_name
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Month {
        s.parse().unwrap()
    }

    fn window(from: &str, to: &str) -> Window {
        Window::new(m(from), m(to)).unwrap()
    }

    fn sub(start: &str, end: Option<&str>, price: i32) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            service_name: "Netflix".to_string(),
            price,
            user_id: "60601fee-2bf1-4721-ae6f-7636e79a0cba".to_string(),
            start: m(start),
            end: end.map(m),
        }
    }

    #[test]
    fn test_closed_subscription_inside_window() {
        let s = sub("01-2024", Some("03-2024"), 100);
        assert_eq!(overlap_months(&s, &window("01-2024", "12-2024")), 3);
    }

    #[test]
    fn test_open_ended_subscription_is_clipped() {
        let s = sub("01-2024", None, 50);
        assert_eq!(overlap_months(&s, &window("03-2024", "05-2024")), 3);
    }

    #[test]
    fn test_open_ended_matches_explicit_end_at_window_to() {
        let w = window("06-2023", "02-2024");
        let open = sub("09-2023", None, 10);
        let closed = sub("09-2023", Some("02-2024"), 10);
        assert_eq!(overlap_months(&open, &w), overlap_months(&closed, &w));
        assert_eq!(overlap_months(&open, &w), 6);
    }

    #[test]
    fn test_single_month_everywhere() {
        let s = sub("04-2024", Some("04-2024"), 10);
        assert_eq!(overlap_months(&s, &window("04-2024", "04-2024")), 1);
    }

    #[test]
    fn test_no_overlap_before_and_after() {
        let w = window("01-2024", "03-2024");
        let after = sub("06-2024", Some("08-2024"), 10);
        let before = sub("01-2023", Some("12-2023"), 10);
        let open_after = sub("04-2024", None, 10);

        assert_eq!(overlap_months(&after, &w), 0);
        assert_eq!(overlap_months(&before, &w), 0);
        assert_eq!(overlap_months(&open_after, &w), 0);

        assert!(!may_overlap(&after, &w));
        assert!(!may_overlap(&before, &w));
        assert!(!may_overlap(&open_after, &w));
    }

    #[test]
    fn test_partial_overlap_across_year_boundary() {
        let s = sub("10-2023", Some("02-2024"), 10);
        assert_eq!(overlap_months(&s, &window("12-2023", "06-2024")), 3);
        assert!(may_overlap(&s, &window("12-2023", "06-2024")));
    }

    #[test]
    fn test_edge_months_touch_window() {
        let w = window("03-2024", "05-2024");
        assert_eq!(overlap_months(&sub("01-2024", Some("03-2024"), 1), &w), 1);
        assert_eq!(overlap_months(&sub("05-2024", Some("09-2024"), 1), &w), 1);
        assert_eq!(overlap_months(&sub("05-2024", None, 1), &w), 1);
    }

    #[test]
    fn test_filter_matching() {
        let s = sub("01-2024", None, 10);

        assert!(AggregateFilter::default().matches(&s));
        assert!(AggregateFilter::for_service("net").matches(&s));
        assert!(AggregateFilter::for_service("NETFLIX").matches(&s));
        assert!(!AggregateFilter::for_service("spot").matches(&s));
        assert!(AggregateFilter::for_user(s.user_id.clone()).matches(&s));
        assert!(!AggregateFilter::for_user("someone-else").matches(&s));
    }

    #[test]
    fn test_service_name_matches_cyrillic() {
        assert!(service_name_matches("Яндекс Плюс", "яндекс"));
        assert!(service_name_matches("Яндекс Плюс", "ПЛЮС"));
        assert!(!service_name_matches("Яндекс Плюс", "кинопоиск"));
    }

    #[test]
    fn test_empty_filter_values_are_ignored() {
        let filter = AggregateFilter::new(Some(String::new()), Some(String::new()));
        assert_eq!(filter, AggregateFilter::default());
    }
}
