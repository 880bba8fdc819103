// src/model.rs
//! Records produced by the extractors and served by the read API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One time-stamped quotation from the association feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuoteRow {
    pub date: String,
    pub time: String,
    pub round: String,
    pub ornament_buy: String,
    pub ornament_sell: String,
    pub bullion_buy: String,
    pub bullion_sell: String,
    pub spot: String,
    pub thb: String,
    pub change: String,
}

/// Standard-purity jewelry row (e.g. "96.5%").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JewelryQuote {
    #[serde(rename = "type")]
    pub kind: String,
    pub buy: String,
    pub sell: String,
}

/// Jewelry price by weight (the "น้ำหนักทอง" table on the daily-prices page).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightQuote {
    pub weight: String,
    pub price: String,
    pub total: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuySell {
    pub buy: Option<String>,
    pub sell: Option<String>,
}

impl BuySell {
    pub fn is_empty(&self) -> bool {
        self.buy.is_none() && self.sell.is_none()
    }
}

/// One record per retail shop. A failed shop keeps its slot with `error` set and empty `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopQuote {
    pub shop: String,
    pub url: String,
    pub data: BTreeMap<String, BuySell>,
    pub error: Option<String>,
}

impl ShopQuote {
    pub fn ok(shop: &str, url: &str, data: BTreeMap<String, BuySell>) -> Self {
        Self {
            shop: shop.to_string(),
            url: url.to_string(),
            data,
            error: None,
        }
    }

    pub fn failed(shop: &str, url: &str, error: impl ToString) -> Self {
        Self {
            shop: shop.to_string(),
            url: url.to_string(),
            data: BTreeMap::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The two association page structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Clean-URL price list; rows appended newest-last.
    New,
    /// Legacy `.aspx` grid; rows prepended newest-first.
    Classic,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::New => "new",
            Layout::Classic => "classic",
        }
    }

    /// Index of the most recent row in a batch of `len` rows from this layout.
    pub fn latest_index(self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        match self {
            Layout::Classic => Some(0),
            Layout::New => Some(len - 1),
        }
    }
}

/// Everything one successful association extraction yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationBatch {
    pub layout: Layout,
    pub gold_rows: Vec<PriceQuoteRow>,
    pub jewelry_rows: Vec<JewelryQuote>,
    pub weight_rows: Vec<WeightQuote>,
}

impl AssociationBatch {
    pub fn latest(&self) -> Option<&PriceQuoteRow> {
        latest_row(&self.gold_rows, Some(self.layout))
    }
}

/// Pick the newest row according to the ordering convention of `layout`.
/// Without a known layout the last row is used.
pub fn latest_row(rows: &[PriceQuoteRow], layout: Option<Layout>) -> Option<&PriceQuoteRow> {
    let idx = layout.unwrap_or(Layout::New).latest_index(rows.len())?;
    rows.get(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_index_follows_layout_ordering() {
        assert_eq!(Layout::Classic.latest_index(3), Some(0));
        assert_eq!(Layout::New.latest_index(3), Some(2));
        assert_eq!(Layout::New.latest_index(0), None);
    }

    #[test]
    fn failed_shop_keeps_identity_with_empty_data() {
        let q = ShopQuote::failed("Ausiris", "https://example.test", "boom");
        assert!(!q.is_ok());
        assert!(q.data.is_empty());
        let v = serde_json::to_value(&q).unwrap();
        assert_eq!(v["error"], "boom");
        assert_eq!(v["shop"], "Ausiris");
    }

    #[test]
    fn jewelry_type_field_serializes_as_type() {
        let j = JewelryQuote {
            kind: "ทองคำแท่ง 96.5%".into(),
            buy: "40,000.00".into(),
            sell: "40,100.00".into(),
        };
        let v = serde_json::to_value(&j).unwrap();
        assert!(v.get("type").is_some());
    }
}
