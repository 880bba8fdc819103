// src/shops/mod.rs
//! Retail shop scraping: one [`ShopSource`] per shop, all run concurrently inside
//! one shared profile. Every failure is caught per shop and turned into a record
//! with `error` set, so siblings are never aborted.

pub mod descriptor;
pub mod registry;

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub use descriptor::{DescriptorShop, FieldSpec, ShopDescriptor, Side};

use crate::browser::{Page, Profile};
use crate::error::ScrapeResult;
use crate::model::{BuySell, ShopQuote};

pub type ShopData = BTreeMap<String, BuySell>;

#[async_trait::async_trait]
pub trait ShopSource: Send + Sync {
    fn name(&self) -> &str;
    fn url(&self) -> &str;

    async fn navigate(&self, page: &mut dyn Page) -> ScrapeResult<()>;

    /// Wait until the shop's prices are rendered; returns that DOM snapshot.
    async fn wait_ready(&self, page: &mut dyn Page) -> ScrapeResult<String>;

    fn extract_fields(&self, html: &str) -> ScrapeResult<ShopData>;

    async fn scrape(&self, page: &mut dyn Page) -> ScrapeResult<ShopData> {
        self.navigate(page).await?;
        let html = self.wait_ready(page).await?;
        self.extract_fields(&html)
    }
}

async fn scrape_one(profile: &dyn Profile, source: &dyn ShopSource) -> ShopQuote {
    let mut page = match profile.new_page().await {
        Ok(p) => p,
        Err(e) => return ShopQuote::failed(source.name(), source.url(), e),
    };
    let res = source.scrape(page.as_mut()).await;
    if let Err(e) = page.close().await {
        warn!(target: "shops", shop = source.name(), error = %e, "page close failed");
    }
    match res {
        Ok(data) => ShopQuote::ok(source.name(), source.url(), data),
        Err(e) => ShopQuote::failed(source.name(), source.url(), e),
    }
}

/// Run every source concurrently and return one record per source, in
/// registration order. A task that dies before producing a record (panic) is the
/// only case that leaves a gap.
pub async fn scrape_all(profile: Arc<dyn Profile>, sources: &[Arc<dyn ShopSource>]) -> Vec<ShopQuote> {
    let mut set = JoinSet::new();
    for (idx, source) in sources.iter().cloned().enumerate() {
        let profile = profile.clone();
        set.spawn(async move { (idx, scrape_one(profile.as_ref(), source.as_ref()).await) });
    }

    let mut slots: Vec<Option<ShopQuote>> = vec![None; sources.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, quote)) => {
                let outcome = if quote.is_ok() { "ok" } else { "error" };
                counter!("shop_scrape_total", "shop" => quote.shop.clone(), "outcome" => outcome)
                    .increment(1);
                if let Some(err) = &quote.error {
                    warn!(target: "shops", shop = %quote.shop, error = %err, "shop scrape failed");
                }
                if let Some(slot) = slots.get_mut(idx) {
                    *slot = Some(quote);
                }
            }
            Err(e) => warn!(target: "shops", error = %e, "shop task died before producing a record"),
        }
    }

    let out: Vec<ShopQuote> = slots.into_iter().flatten().collect();
    info!(
        target: "shops",
        attempted = sources.len(),
        ok = out.iter().filter(|q| q.is_ok()).count(),
        "shop fan-out finished"
    );
    out
}
