// src/extract/mod.rs
//! Association page extractors.
//!
//! Each layout is a total function from a page to an [`AssociationBatch`] or a
//! [`ScrapeError`]. Zero parsed price rows is a failure ("wrong layout"), so the
//! reconciler can fall back; jewelry tables are best effort and never fail the batch.

pub mod classic_layout;
pub mod jewelry;
pub mod new_layout;

pub use classic_layout::ClassicLayoutExtractor;
pub use new_layout::NewLayoutExtractor;

use crate::browser::Page;
use crate::error::ScrapeResult;
use crate::model::{AssociationBatch, JewelryQuote, Layout, PriceQuoteRow, WeightQuote};

#[async_trait::async_trait]
pub trait AssociationExtractor: Send + Sync {
    fn layout(&self) -> Layout;

    async fn extract(&self, page: &mut dyn Page) -> ScrapeResult<AssociationBatch>;
}

fn cell(cells: &[String], i: usize) -> String {
    cells.get(i).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn strip_breaks(s: &str) -> String {
    s.replace(['\n', '\r'], "").trim().to_string()
}

/// New layout: date, time, round, ornament buy/sell, bullion buy/sell, spot, thb, change.
pub fn parse_new_row(cells: &[String]) -> Option<PriceQuoteRow> {
    if cells.len() < 10 {
        return None;
    }
    Some(PriceQuoteRow {
        date: cell(cells, 0),
        time: cell(cells, 1),
        round: cell(cells, 2),
        ornament_buy: cell(cells, 3),
        ornament_sell: cell(cells, 4),
        bullion_buy: cell(cells, 5),
        bullion_sell: cell(cells, 6),
        spot: cell(cells, 7),
        thb: cell(cells, 8),
        change: strip_breaks(&cells[9]),
    })
}

/// Classic layout: "date time", round, bullion buy/sell, ornament buy/sell, spot, thb, change.
/// Bullion and ornament columns are swapped relative to the new layout.
pub fn parse_classic_row(cells: &[String]) -> Option<PriceQuoteRow> {
    if cells.len() < 9 {
        return None;
    }
    let stamp = cell(cells, 0);
    let (date, time) = match stamp.split_once(char::is_whitespace) {
        Some((d, t)) => (d.trim().to_string(), t.trim().to_string()),
        None => (stamp, String::new()),
    };
    Some(PriceQuoteRow {
        date,
        time,
        round: cell(cells, 1),
        bullion_buy: cell(cells, 2),
        bullion_sell: cell(cells, 3),
        ornament_buy: cell(cells, 4),
        ornament_sell: cell(cells, 5),
        spot: cell(cells, 6),
        thb: cell(cells, 7),
        change: strip_breaks(&cells[8]),
    })
}

/// Percent-jewelry rows: type, (unit), buy, sell.
pub fn parse_jewelry_rows(rows: &[Vec<String>]) -> Vec<JewelryQuote> {
    rows.iter()
        .filter(|c| c.len() >= 4)
        .map(|c| JewelryQuote {
            kind: cell(c, 0),
            buy: cell(c, 2),
            sell: cell(c, 3),
        })
        .collect()
}

pub fn parse_weight_rows(rows: &[Vec<String>]) -> Vec<WeightQuote> {
    rows.iter()
        .filter(|c| c.len() >= 3)
        .map(|c| WeightQuote {
            weight: cell(c, 0),
            price: cell(c, 1),
            total: cell(c, 2),
        })
        .collect()
}
