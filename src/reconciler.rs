// src/reconciler.rs
//! # Source Reconciler
//! Sticky fast-track on the last layout that worked; discovery across layouts
//! when it is unknown or just failed. A cycle that finds nothing leaves the
//! cached batches untouched (stale-but-available).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use metrics::{counter, gauge};
use tracing::{debug, info, warn};

use crate::browser::Profile;
use crate::cache::Store;
use crate::config::AppConfig;
use crate::error::ScrapeResult;
use crate::extract::{AssociationExtractor, ClassicLayoutExtractor, NewLayoutExtractor};
use crate::model::{AssociationBatch, Layout};
use crate::source_state::discovery_order;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The sticky layout worked again.
    FastTrack(Layout),
    /// Discovery found a working layout (boot, or the sticky one failed).
    Discovered(Layout),
    /// Every probed layout failed; cache left as it was.
    NoData,
}

impl ReconcileOutcome {
    pub fn layout(self) -> Option<Layout> {
        match self {
            ReconcileOutcome::FastTrack(l) | ReconcileOutcome::Discovered(l) => Some(l),
            ReconcileOutcome::NoData => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ReconcileOutcome::FastTrack(_) => "fast_track",
            ReconcileOutcome::Discovered(_) => "discovered",
            ReconcileOutcome::NoData => "no_data",
        }
    }
}

pub struct Reconciler {
    new_layout: Arc<dyn AssociationExtractor>,
    classic_layout: Arc<dyn AssociationExtractor>,
    classic_fallback: bool,
}

impl Reconciler {
    pub fn new(
        new_layout: Arc<dyn AssociationExtractor>,
        classic_layout: Arc<dyn AssociationExtractor>,
        classic_fallback: bool,
    ) -> Self {
        Self {
            new_layout,
            classic_layout,
            classic_fallback,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        let poll: Duration = cfg.browser.poll();
        Self::new(
            Arc::new(NewLayoutExtractor::from_config(&cfg.association, poll)),
            Arc::new(ClassicLayoutExtractor::from_config(&cfg.association, poll)),
            cfg.association.classic_fallback,
        )
    }

    pub fn classic_fallback(&self) -> bool {
        self.classic_fallback
    }

    fn extractor(&self, layout: Layout) -> &dyn AssociationExtractor {
        match layout {
            Layout::New => self.new_layout.as_ref(),
            Layout::Classic => self.classic_layout.as_ref(),
        }
    }

    /// One extraction on a fresh page; the page is closed on every path.
    async fn attempt(&self, profile: &dyn Profile, layout: Layout) -> ScrapeResult<AssociationBatch> {
        let extractor = self.extractor(layout);
        let label = extractor.layout().as_str();
        debug!(target: "reconciler", layout = label, "probing layout");
        let mut page = profile.new_page().await?;
        let res = extractor.extract(page.as_mut()).await;
        if let Err(e) = page.close().await {
            warn!(target: "reconciler", layout = label, error = %e, "page close failed");
        }
        res
    }

    fn install(&self, store: &Store, batch: AssociationBatch, now: DateTime<FixedOffset>) {
        info!(
            target: "reconciler",
            layout = batch.layout.as_str(),
            rows = batch.gold_rows.len(),
            jewelry = batch.jewelry_rows.len(),
            "association batch installed"
        );
        store.apply_association(batch, now);
        gauge!("association_last_success_ts").set(now.timestamp() as f64);
    }

    pub async fn reconcile(
        &self,
        profile: &dyn Profile,
        store: &Store,
        now: DateTime<FixedOffset>,
    ) -> ReconcileOutcome {
        let outcome = self.run(profile, store, now).await;
        counter!("association_scrape_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn run(
        &self,
        profile: &dyn Profile,
        store: &Store,
        now: DateTime<FixedOffset>,
    ) -> ReconcileOutcome {
        let state = store.source_state();
        let mut failed = None;

        if let Some(layout) = state.sticky() {
            match self.attempt(profile, layout).await {
                Ok(batch) => {
                    self.install(store, batch, now);
                    return ReconcileOutcome::FastTrack(layout);
                }
                Err(e) => {
                    warn!(
                        target: "reconciler",
                        layout = layout.as_str(),
                        error = %e,
                        "sticky layout failed, entering discovery"
                    );
                    counter!("association_layout_failures_total", "layout" => layout.as_str())
                        .increment(1);
                    store.set_source_state(state.on_failure());
                    failed = Some(layout);
                }
            }
        }

        for layout in discovery_order(self.classic_fallback, failed) {
            match self.attempt(profile, layout).await {
                Ok(batch) => {
                    self.install(store, batch, now);
                    return ReconcileOutcome::Discovered(layout);
                }
                Err(e) => {
                    warn!(target: "reconciler", layout = layout.as_str(), error = %e, "layout probe failed");
                    counter!("association_layout_failures_total", "layout" => layout.as_str())
                        .increment(1);
                }
            }
        }

        warn!(target: "reconciler", "no association layout produced data; keeping cached batch");
        ReconcileOutcome::NoData
    }
}
