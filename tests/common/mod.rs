// tests/common/mod.rs
//
// Shared fixtures: a config pointing at the default association URLs with short
// timeouts, and a FixtureBrowser pre-routed with canned pages.
#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, TimeZone};

use gold_price_api::browser::fixture::FixtureBrowser;
use gold_price_api::calendar::thai_offset;
use gold_price_api::config::AppConfig;

pub const NEW_PRICE: &str = include_str!("../fixtures/new_price.html");
pub const NEW_DAILY: &str = include_str!("../fixtures/new_daily.html");
pub const CLASSIC_PRICE: &str = include_str!("../fixtures/classic_price.html");
pub const CLASSIC_DAILY: &str = include_str!("../fixtures/classic_daily.html");

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.association.nav_timeout_secs = 2;
    cfg.association.rows_timeout_secs = 1;
    cfg.association.jewelry_timeout_secs = 1;
    cfg.browser.poll_ms = 50;
    cfg
}

/// Both association layouts live and serving data.
pub fn association_site(cfg: &AppConfig) -> FixtureBrowser {
    let browser = FixtureBrowser::new();
    let a = &cfg.association;
    browser.route(&a.new_price_url, NEW_PRICE);
    browser.route(&a.new_daily_url, NEW_DAILY);
    browser.route(&a.classic_price_url, CLASSIC_PRICE);
    browser.route(&a.classic_daily_url, CLASSIC_DAILY);
    browser
}

/// Thai-local wall clock; 2025-09-08 is a Monday.
pub fn bkk(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
    thai_offset()
        .with_ymd_and_hms(y, m, d, h, min, s)
        .single()
        .expect("valid local time")
}

/// Minimal shop page with a bid/ask pair under the given ids.
pub fn shop_page(buy_id: &str, buy: &str, sell_id: &str, sell: &str) -> String {
    format!(
        r#"<html><body><div class="price"><span id="{buy_id}">{buy}</span><span id="{sell_id}">{sell}</span></div></body></html>"#
    )
}
