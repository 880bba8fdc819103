// tests/calendar_rules.rs
//
// Calendar properties swept across a full week, plus host-timezone independence.

mod common;

use chrono::{Duration, Utc};

use gold_price_api::calendar::{is_market_open, is_shop_open, MarketHours, ShopHours};

use common::bkk;

/// 2025-09-08 (Mon) .. 2025-09-14 (Sun), every 5 minutes plus the boundary seconds.
fn week() -> Vec<chrono::DateTime<chrono::FixedOffset>> {
    let start = bkk(2025, 9, 8, 0, 0, 0);
    let mut out: Vec<_> = (0..7 * 24 * 12).map(|i| start + Duration::minutes(5 * i)).collect();
    for day in 8..=14 {
        for (h, m, s) in [(8, 59, 59), (9, 0, 0), (9, 29, 59), (9, 30, 0), (10, 0, 0), (10, 0, 1), (17, 45, 0), (17, 45, 1)] {
            out.push(bkk(2025, 9, day, h, m, s));
        }
    }
    out
}

fn secs(t: &chrono::DateTime<chrono::FixedOffset>) -> u32 {
    use chrono::Timelike;
    t.hour() * 3600 + t.minute() * 60 + t.second()
}

#[test]
fn weekday_market_window_is_inclusive_0900_to_1745() {
    let hours = MarketHours::default();
    for t in week().iter().filter(|t| (8..=12).contains(&chrono::Datelike::day(*t))) {
        let s = secs(t);
        let expected = (9 * 3600..=17 * 3600 + 45 * 60).contains(&s);
        assert_eq!(is_market_open(t, &hours).0, expected, "{t}");
    }
}

#[test]
fn saturday_market_open_only_0900_to_1000_and_shops_close_at_0930() {
    let hours = MarketHours::default();
    let shops = ShopHours::default();
    for t in week().iter().filter(|t| chrono::Datelike::day(*t) == 13) {
        let s = secs(t);
        assert_eq!(
            is_market_open(t, &hours).0,
            (9 * 3600..=10 * 3600).contains(&s),
            "{t}"
        );
        assert_eq!(is_shop_open(t, &shops).0, s < 9 * 3600 + 30 * 60, "{t}");
    }
}

#[test]
fn sunday_everything_closed() {
    for t in week().iter().filter(|t| chrono::Datelike::day(*t) == 14) {
        assert!(!is_market_open(t, &MarketHours::default()).0, "{t}");
        assert!(!is_shop_open(t, &ShopHours::default()).0, "{t}");
    }
}

#[test]
fn weekday_shops_open_around_the_clock() {
    for t in week().iter().filter(|t| (8..=12).contains(&chrono::Datelike::day(*t))) {
        assert!(is_shop_open(t, &ShopHours::default()).0, "{t}");
    }
}

#[test]
fn utc_instant_is_judged_in_thai_time() {
    // 2025-09-08 02:30 UTC is 09:30 in Bangkok (open); 11:00 UTC is 18:00 (closed)
    let open = bkk(2025, 9, 8, 9, 30, 0).with_timezone(&Utc);
    let closed = bkk(2025, 9, 8, 18, 0, 0).with_timezone(&Utc);
    assert!(is_market_open(&open, &MarketHours::default()).0);
    let (is_open, label) = is_market_open(&closed, &MarketHours::default());
    assert!(!is_open);
    assert_eq!(label, "Closed (Outside Hours 18:00:00)");
}
