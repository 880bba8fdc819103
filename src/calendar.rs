// src/calendar.rs
//! Business-hours rules for the association market and the retail shops.
//!
//! Pure functions of `now`; every input is first converted to Thai time (UTC+7)
//! so the host timezone never matters. Bounds are inclusive on both ends for the
//! market window; the Saturday shop cutoff closes at `>= cutoff`.

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Offset, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

const THAI_OFFSET_SECS: i32 = 7 * 3600;

pub fn thai_offset() -> FixedOffset {
    // 7h is always within FixedOffset's +/-24h range
    FixedOffset::east_opt(THAI_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn thai_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&thai_offset())
}

/// `YYYY-MM-DD HH:MM:SS` in Thai time, the format used for all "last updated" stamps.
pub fn format_stamp(ts: DateTime<FixedOffset>) -> String {
    ts.with_timezone(&thai_offset())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN)
}

/// Association trading window. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketHours {
    pub weekday_open: NaiveTime,
    pub weekday_close: NaiveTime,
    pub saturday_open: NaiveTime,
    pub saturday_close: NaiveTime,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            weekday_open: hms(9, 0, 0),
            weekday_close: hms(17, 45, 0),
            saturday_open: hms(9, 0, 0),
            saturday_close: hms(10, 0, 0),
        }
    }
}

impl MarketHours {
    /// Swap inverted windows so a misconfigured file still yields a usable calendar.
    pub fn sanitized(mut self) -> Self {
        if self.weekday_open > self.weekday_close {
            std::mem::swap(&mut self.weekday_open, &mut self.weekday_close);
        }
        if self.saturday_open > self.saturday_close {
            std::mem::swap(&mut self.saturday_open, &mut self.saturday_close);
        }
        self
    }
}

/// Retail shops: open around the clock on weekdays, Saturday until the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopHours {
    pub saturday_cutoff: NaiveTime,
}

impl Default for ShopHours {
    fn default() -> Self {
        Self {
            saturday_cutoff: hms(9, 30, 0),
        }
    }
}

fn local_parts<Tz: TimeZone>(now: &DateTime<Tz>) -> (Weekday, NaiveTime) {
    let local = now.with_timezone(&thai_offset());
    let t = local.time();
    // whole seconds only, so "17:45:00.4" still counts as 17:45:00
    let t = hms(t.hour(), t.minute(), t.second());
    (local.weekday(), t)
}

pub fn is_market_open<Tz: TimeZone>(now: &DateTime<Tz>, hours: &MarketHours) -> (bool, String) {
    let (day, t) = local_parts(now);
    match day {
        Weekday::Sun => (false, "Closed (Sunday)".to_string()),
        Weekday::Sat => {
            if hours.saturday_open <= t && t <= hours.saturday_close {
                (true, "Open (Saturday)".to_string())
            } else {
                (
                    false,
                    format!("Closed (Saturday, Outside Hours {})", t.format("%H:%M:%S")),
                )
            }
        }
        _ => {
            if hours.weekday_open <= t && t <= hours.weekday_close {
                (true, "Open".to_string())
            } else {
                (
                    false,
                    format!("Closed (Outside Hours {})", t.format("%H:%M:%S")),
                )
            }
        }
    }
}

pub fn is_shop_open<Tz: TimeZone>(now: &DateTime<Tz>, hours: &ShopHours) -> (bool, String) {
    let (day, t) = local_parts(now);
    match day {
        Weekday::Sun => (false, "Closed (Sunday)".to_string()),
        Weekday::Sat if t >= hours.saturday_cutoff => (
            false,
            format!(
                "Closed (Saturday after {})",
                hours.saturday_cutoff.format("%H:%M")
            ),
        ),
        Weekday::Sat => (true, "Open (Saturday morning)".to_string()),
        _ => (true, "Open".to_string()),
    }
}

/// Combined human-readable status served by the read API.
pub fn compose_status(market: &str, shops: &str) -> String {
    format!("Market: {market} | Shops: {shops}")
}
