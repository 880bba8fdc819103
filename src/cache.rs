// src/cache.rs
//! Last-known-good store shared by the scheduler (writer) and the read API.
//!
//! Every write replaces whole field groups; readers get an `Arc` snapshot and
//! never observe a half-applied batch.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, FixedOffset};

use crate::calendar::format_stamp;
use crate::model::{latest_row, AssociationBatch, JewelryQuote, Layout, PriceQuoteRow, ShopQuote, WeightQuote};
use crate::source_state::SourceState;

#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub gold_rows: Arc<Vec<PriceQuoteRow>>,
    /// Layout that produced `gold_rows`; fixes their ordering independently
    /// of where the reconciler will look next.
    pub gold_layout: Option<Layout>,
    pub jewelry_rows: Arc<Vec<JewelryQuote>>,
    pub weight_rows: Arc<Vec<WeightQuote>>,
    pub shops: Arc<Vec<ShopQuote>>,
    pub source_state: SourceState,
    pub association_updated: Option<String>,
    pub shops_updated: Option<String>,
    pub market_status: String,
}

impl Default for CacheSnapshot {
    fn default() -> Self {
        Self {
            gold_rows: Arc::default(),
            gold_layout: None,
            jewelry_rows: Arc::default(),
            weight_rows: Arc::default(),
            shops: Arc::default(),
            source_state: SourceState::Unknown,
            association_updated: None,
            shops_updated: None,
            market_status: "Initializing...".to_string(),
        }
    }
}

impl CacheSnapshot {
    /// Most recent cached association quote.
    pub fn latest_gold(&self) -> Option<&PriceQuoteRow> {
        latest_row(&self.gold_rows, self.gold_layout)
    }
}

#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<CacheSnapshot>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheSnapshot> {
        match self.inner.read() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheSnapshot> {
        match self.inner.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.read().clone()
    }

    pub fn source_state(&self) -> SourceState {
        self.read().source_state
    }

    pub fn set_source_state(&self, state: SourceState) {
        self.write().source_state = state;
    }

    pub fn set_market_status(&self, status: String) {
        self.write().market_status = status;
    }

    /// Install a successful association extraction. Price rows always replace the
    /// previous batch; jewelry tables only when the new ones are non-empty.
    pub fn apply_association(&self, batch: AssociationBatch, at: DateTime<FixedOffset>) {
        let AssociationBatch {
            layout,
            gold_rows,
            jewelry_rows,
            weight_rows,
        } = batch;

        let mut g = self.write();
        if !gold_rows.is_empty() {
            g.gold_rows = Arc::new(gold_rows);
            g.gold_layout = Some(layout);
        }
        if !jewelry_rows.is_empty() {
            g.jewelry_rows = Arc::new(jewelry_rows);
        }
        if !weight_rows.is_empty() {
            g.weight_rows = Arc::new(weight_rows);
        }
        g.source_state = g.source_state.on_success(layout);
        g.association_updated = Some(format_stamp(at));
    }

    /// Shop batches replace wholesale, failure markers included.
    pub fn replace_shops(&self, shops: Vec<ShopQuote>, at: DateTime<FixedOffset>) {
        let mut g = self.write();
        g.shops = Arc::new(shops);
        g.shops_updated = Some(format_stamp(at));
    }
}
