// src/extract/classic_layout.rs
use std::time::Duration;

use tracing::debug;

use super::jewelry::{extract_jewelry, JewelryTarget};
use super::{parse_classic_row, AssociationExtractor};
use crate::browser::{dom, wait_for_selector, Page};
use crate::config::AssociationConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::model::{AssociationBatch, Layout};

/// Rows of the ASP.NET price grid on the legacy page.
pub const GRID_ROW_CSS: &str = "table[id$='GridView1'] tr";
pub const GRID_TABLE_CSS: &str = "table[id$='GridView1']";

/// Legacy `.aspx` price list; rows prepended newest-first.
#[derive(Debug, Clone)]
pub struct ClassicLayoutExtractor {
    pub price_url: String,
    pub nav_timeout: Duration,
    pub rows_timeout: Duration,
    pub poll: Duration,
    pub jewelry: JewelryTarget,
}

impl ClassicLayoutExtractor {
    pub fn from_config(cfg: &AssociationConfig, poll: Duration) -> Self {
        let nav_timeout = Duration::from_secs(cfg.nav_timeout_secs);
        Self {
            price_url: cfg.classic_price_url.clone(),
            nav_timeout,
            rows_timeout: Duration::from_secs(cfg.rows_timeout_secs),
            poll,
            jewelry: JewelryTarget {
                url: cfg.classic_daily_url.clone(),
                table_css: GRID_TABLE_CSS.to_string(),
                nav_timeout,
                wait_timeout: Duration::from_secs(cfg.jewelry_timeout_secs),
                poll,
            },
        }
    }
}

#[async_trait::async_trait]
impl AssociationExtractor for ClassicLayoutExtractor {
    fn layout(&self) -> Layout {
        Layout::Classic
    }

    async fn extract(&self, page: &mut dyn Page) -> ScrapeResult<AssociationBatch> {
        page.goto(&self.price_url, self.nav_timeout).await?;
        let html = wait_for_selector(page, GRID_ROW_CSS, self.rows_timeout, self.poll).await?;

        let gold_rows: Vec<_> = dom::rows(&html, GRID_ROW_CSS)?
            .iter()
            .filter_map(|cells| parse_classic_row(cells))
            .collect();
        if gold_rows.is_empty() {
            return Err(ScrapeError::Structure(
                "classic layout: no grid rows with 9+ cells".to_string(),
            ));
        }
        debug!(target: "extract", rows = gold_rows.len(), "classic layout price rows");

        let (jewelry_rows, weight_rows) = extract_jewelry(page, &self.jewelry).await;

        Ok(AssociationBatch {
            layout: Layout::Classic,
            gold_rows,
            jewelry_rows,
            weight_rows,
        })
    }
}
