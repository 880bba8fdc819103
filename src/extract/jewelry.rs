// src/extract/jewelry.rs
//! Daily-prices tables (percent purity + by weight). Every failure here degrades to
//! an empty list: the caller keeps whatever jewelry data it already has.

use std::time::Duration;

use tracing::{debug, warn};

use super::{parse_jewelry_rows, parse_weight_rows};
use crate::browser::{dom, wait_for_text, Page};
use crate::model::{JewelryQuote, WeightQuote};

pub const PERCENT_NEEDLE: &str = "96.5%";
pub const WEIGHT_NEEDLE: &str = "น้ำหนักทอง";

#[derive(Debug, Clone)]
pub struct JewelryTarget {
    pub url: String,
    /// Tables considered when looking for the needle text.
    pub table_css: String,
    pub nav_timeout: Duration,
    pub wait_timeout: Duration,
    pub poll: Duration,
}

pub async fn extract_jewelry(
    page: &mut dyn Page,
    target: &JewelryTarget,
) -> (Vec<JewelryQuote>, Vec<WeightQuote>) {
    if let Err(e) = page.goto(&target.url, target.nav_timeout).await {
        warn!(target: "extract", url = %target.url, error = %e, "daily prices page unavailable");
        return (Vec::new(), Vec::new());
    }

    let percent = match wait_for_text(
        page,
        "td",
        PERCENT_NEEDLE,
        target.wait_timeout,
        target.poll,
    )
    .await
    .and_then(|html| dom::rows_of_table_containing(&html, &target.table_css, PERCENT_NEEDLE))
    {
        Ok(rows) => parse_jewelry_rows(&rows),
        Err(e) => {
            debug!(target: "extract", error = %e, "percent jewelry table missing");
            Vec::new()
        }
    };

    let weight = match wait_for_text(
        page,
        "th",
        WEIGHT_NEEDLE,
        target.wait_timeout,
        target.poll,
    )
    .await
    .and_then(|html| dom::rows_of_table_containing(&html, &target.table_css, WEIGHT_NEEDLE))
    {
        Ok(rows) => parse_weight_rows(&rows),
        Err(e) => {
            debug!(target: "extract", error = %e, "weight jewelry table missing");
            Vec::new()
        }
    };

    (percent, weight)
}
