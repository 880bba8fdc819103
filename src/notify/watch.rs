// src/notify/watch.rs
use crate::model::PriceQuoteRow;

use super::PriceChange;

/// Remembers the last bullion sell price seen on a successful association read.
/// - First observation after boot only primes the watch.
/// - A change yields one [`PriceChange`]; an unchanged price yields nothing.
#[derive(Debug, Clone, Default)]
pub struct PriceWatch {
    last_sell: Option<String>,
}

impl PriceWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, latest: &PriceQuoteRow, observed_at: &str) -> Option<PriceChange> {
        let current = latest.bullion_sell.trim();
        if current.is_empty() {
            return None;
        }
        let previous = self.last_sell.replace(current.to_string())?;
        if previous == current {
            return None;
        }
        Some(PriceChange {
            previous,
            current: current.to_string(),
            round: latest.round.clone(),
            observed_at: observed_at.to_string(),
        })
    }

    pub fn last_sell(&self) -> Option<&str> {
        self.last_sell.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sell: &str) -> PriceQuoteRow {
        PriceQuoteRow {
            round: "1".into(),
            bullion_sell: sell.into(),
            ..Default::default()
        }
    }

    #[test]
    fn first_observation_only_primes() {
        let mut w = PriceWatch::new();
        assert!(w.observe(&row("41,000.00"), "t0").is_none());
        assert_eq!(w.last_sell(), Some("41,000.00"));
    }

    #[test]
    fn unchanged_price_is_silent_change_fires_once() {
        let mut w = PriceWatch::new();
        w.observe(&row("41,000.00"), "t0");
        assert!(w.observe(&row("41,000.00"), "t1").is_none());

        let ev = w.observe(&row("41,050.00"), "t2").unwrap();
        assert_eq!(ev.previous, "41,000.00");
        assert_eq!(ev.current, "41,050.00");
        assert_eq!(ev.observed_at, "t2");

        assert!(w.observe(&row("41,050.00"), "t3").is_none());
    }

    #[test]
    fn blank_price_does_not_reset_memory() {
        let mut w = PriceWatch::new();
        w.observe(&row("41,000.00"), "t0");
        assert!(w.observe(&row(""), "t1").is_none());
        assert_eq!(w.last_sell(), Some("41,000.00"));
    }
}
