// src/extract/new_layout.rs
use std::time::Duration;

use tracing::debug;

use super::jewelry::{extract_jewelry, JewelryTarget};
use super::{parse_new_row, AssociationExtractor};
use crate::browser::{dom, wait_for_count, Page};
use crate::config::AssociationConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::model::{AssociationBatch, Layout};

const ROW_CSS: &str = "table tbody tr";
/// Fewer rows than this means the table is still being populated.
const MIN_ROWS: usize = 3;

/// Clean-URL price list; rows appended newest-last.
#[derive(Debug, Clone)]
pub struct NewLayoutExtractor {
    pub price_url: String,
    pub nav_timeout: Duration,
    pub rows_timeout: Duration,
    pub poll: Duration,
    pub jewelry: JewelryTarget,
}

impl NewLayoutExtractor {
    pub fn from_config(cfg: &AssociationConfig, poll: Duration) -> Self {
        let nav_timeout = Duration::from_secs(cfg.nav_timeout_secs);
        Self {
            price_url: cfg.new_price_url.clone(),
            nav_timeout,
            rows_timeout: Duration::from_secs(cfg.rows_timeout_secs),
            poll,
            jewelry: JewelryTarget {
                url: cfg.new_daily_url.clone(),
                table_css: "table".to_string(),
                nav_timeout,
                wait_timeout: Duration::from_secs(cfg.jewelry_timeout_secs),
                poll,
            },
        }
    }
}

#[async_trait::async_trait]
impl AssociationExtractor for NewLayoutExtractor {
    fn layout(&self) -> Layout {
        Layout::New
    }

    async fn extract(&self, page: &mut dyn Page) -> ScrapeResult<AssociationBatch> {
        page.goto(&self.price_url, self.nav_timeout).await?;
        let html = wait_for_count(page, ROW_CSS, MIN_ROWS, self.rows_timeout, self.poll).await?;

        let gold_rows: Vec<_> = dom::rows(&html, ROW_CSS)?
            .iter()
            .filter_map(|cells| parse_new_row(cells))
            .collect();
        if gold_rows.is_empty() {
            return Err(ScrapeError::Structure(
                "new layout: no price rows with 10+ cells".to_string(),
            ));
        }
        debug!(target: "extract", rows = gold_rows.len(), "new layout price rows");

        let (jewelry_rows, weight_rows) = extract_jewelry(page, &self.jewelry).await;

        Ok(AssociationBatch {
            layout: Layout::New,
            gold_rows,
            jewelry_rows,
            weight_rows,
        })
    }
}
