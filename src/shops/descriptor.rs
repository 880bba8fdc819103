// src/shops/descriptor.rs
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ShopData, ShopSource};
use crate::browser::{dom, wait_for_selector, Page};
use crate::error::{ScrapeError, ScrapeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

/// One price cell on a shop page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Product tier key in `ShopQuote.data`, e.g. `gold_bar_965`.
    pub tier: String,
    pub side: Side,
    pub css: String,
    /// Feature-flagged block: read only when present and visible, never an error.
    #[serde(default)]
    pub optional: bool,
}

impl FieldSpec {
    pub fn required(tier: &str, side: Side, css: &str) -> Self {
        Self {
            tier: tier.to_string(),
            side,
            css: css.to_string(),
            optional: false,
        }
    }

    pub fn optional(tier: &str, side: Side, css: &str) -> Self {
        Self {
            optional: true,
            ..Self::required(tier, side, css)
        }
    }
}

/// Declarative description of one shop page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopDescriptor {
    pub name: String,
    pub url: String,
    /// Selector whose presence means prices are rendered.
    pub ready_css: String,
    /// Fixed wait after navigation for pages that fill prices client-side.
    #[serde(default)]
    pub settle_ms: u64,
    #[serde(default = "default_nav_timeout_ms")]
    pub nav_timeout_ms: u64,
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    pub fields: Vec<FieldSpec>,
}

fn default_nav_timeout_ms() -> u64 {
    60_000
}
fn default_ready_timeout_ms() -> u64 {
    10_000
}

impl ShopDescriptor {
    pub fn extract(&self, html: &str) -> ScrapeResult<ShopData> {
        let mut data = ShopData::new();
        for f in &self.fields {
            if f.optional && !dom::is_visible(html, &f.css)? {
                continue;
            }
            let text = dom::inner_text(html, &f.css)?.filter(|t| !t.is_empty());
            let Some(text) = text else {
                if f.optional {
                    continue;
                }
                return Err(ScrapeError::Structure(format!(
                    "{}: `{}` missing or empty",
                    self.name, f.css
                )));
            };
            let entry = data.entry(f.tier.clone()).or_default();
            match f.side {
                Side::Buy => entry.buy = Some(text),
                Side::Sell => entry.sell = Some(text),
            }
        }
        Ok(data)
    }
}

/// A descriptor bound to the polling interval of the running browser config.
#[derive(Debug, Clone)]
pub struct DescriptorShop {
    pub desc: ShopDescriptor,
    pub poll: Duration,
}

impl DescriptorShop {
    pub fn new(desc: ShopDescriptor, poll: Duration) -> Self {
        Self { desc, poll }
    }
}

#[async_trait::async_trait]
impl ShopSource for DescriptorShop {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn url(&self) -> &str {
        &self.desc.url
    }

    async fn navigate(&self, page: &mut dyn Page) -> ScrapeResult<()> {
        page.goto(&self.desc.url, Duration::from_millis(self.desc.nav_timeout_ms))
            .await
    }

    async fn wait_ready(&self, page: &mut dyn Page) -> ScrapeResult<String> {
        if self.desc.settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.desc.settle_ms)).await;
        }
        wait_for_selector(
            page,
            &self.desc.ready_css,
            Duration::from_millis(self.desc.ready_timeout_ms),
            self.poll,
        )
        .await
    }

    fn extract_fields(&self, html: &str) -> ScrapeResult<ShopData> {
        self.desc.extract(html)
    }
}
