use super::{AggregateFilter, AggregationEngine, MemorySubscriptionSource, Month, Subscription, Window};
use super::{may_overlap, overlap_months};
use proptest::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

const USERS: [&str; 3] = [
    "60601fee-2bf1-4721-ae6f-7636e79a0cba",
    "1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed",
    "f47ac10b-58cc-4372-a567-0e02b2c3d479",
];

fn month_from_index(idx: i64) -> Month {
    Month::new(2000 + (idx / 12) as i32, (idx % 12) as u32 + 1).unwrap()
}

fn arb_month() -> impl Strategy<Value = Month> {
    (0i64..120).prop_map(month_from_index)
}

fn arb_window() -> impl Strategy<Value = Window> {
    (0i64..120, 0i64..24).prop_map(|(start, len)| {
        Window::new(month_from_index(start), month_from_index(start + len)).unwrap()
    })
}

fn arb_subscription() -> impl Strategy<Value = Subscription> {
    (
        0i64..120,
        prop::option::of(0i64..36),
        0i32..10_000,
        0usize..USERS.len(),
        "Netflix|Spotify|YouTube Premium|Yandex Plus",
    )
        .prop_map(|(start, len, price, user, name)| Subscription {
            id: Uuid::new_v4(),
            service_name: name,
            price,
            user_id: USERS[user].to_string(),
            start: month_from_index(start),
            end: len.map(|len| month_from_index(start + len)),
        })
}

fn total(subs: &[Subscription], window: &Window, filter: &AggregateFilter) -> i64 {
    let engine = AggregationEngine::new(Arc::new(MemorySubscriptionSource::with_subscriptions(
        subs.to_vec(),
    )));
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(engine.aggregate_total(window, filter))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_overlap_bounded_by_window(sub in arb_subscription(), window in arb_window()) {
        let months = overlap_months(&sub, &window);
        prop_assert!(months <= window.len_months());
        if !may_overlap(&sub, &window) {
            prop_assert_eq!(months, 0);
        } else {
            prop_assert!(months >= 1);
        }
    }

    #[test]
    fn test_open_end_equals_end_at_window_to(sub in arb_subscription(), window in arb_window()) {
        prop_assume!(sub.start <= window.to());
        let open = Subscription { end: None, ..sub.clone() };
        let closed = Subscription { end: Some(window.to()), ..sub };
        prop_assert_eq!(overlap_months(&open, &window), overlap_months(&closed, &window));
    }

    #[test]
    fn test_single_month_overlap(month in arb_month()) {
        let sub = Subscription {
            id: Uuid::new_v4(),
            service_name: "Netflix".to_string(),
            price: 1,
            user_id: USERS[0].to_string(),
            start: month,
            end: Some(month),
        };
        let window = Window::new(month, month).unwrap();
        prop_assert_eq!(overlap_months(&sub, &window), 1);
    }

    #[test]
    fn test_total_monotonic_in_window_length(
        subs in prop::collection::vec(arb_subscription(), 0..12),
        start in 0i64..120,
        len in 0i64..24,
        extend_back in 0i64..12,
        extend_forward in 0i64..12,
    ) {
        let narrow = Window::new(month_from_index(start + extend_back), month_from_index(start + extend_back + len)).unwrap();
        let wide = Window::new(month_from_index(start), month_from_index(start + extend_back + len + extend_forward)).unwrap();
        let filter = AggregateFilter::default();

        prop_assert!(total(&subs, &wide, &filter) >= total(&subs, &narrow, &filter));
    }

    #[test]
    fn test_user_filter_never_increases_total(
        subs in prop::collection::vec(arb_subscription(), 0..12),
        window in arb_window(),
        user in 0usize..USERS.len(),
    ) {
        let unfiltered = total(&subs, &window, &AggregateFilter::default());
        let filtered = total(&subs, &window, &AggregateFilter::for_user(USERS[user]));
        prop_assert!(filtered <= unfiltered);
    }
}
