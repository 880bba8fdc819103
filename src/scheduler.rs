// src/scheduler.rs
//! # Scheduler / hibernation controller
//! One sequential tick loop. Each tick evaluates both calendars, runs the due
//! scrape phases inside one shared profile, or releases the engine when nothing
//! is due. Ticks never overlap; a tick's cleanup finishes before the next sleep.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::{Engine, EngineLauncher, Profile};
use crate::cache::Store;
use crate::calendar::{compose_status, format_stamp, is_market_open, is_shop_open, thai_now};
use crate::calendar::{MarketHours, ShopHours};
use crate::config::{AppConfig, ScheduleConfig};
use crate::error::{ScrapeError, ScrapeResult};
use crate::notify::{spawn_notify, Notifier, PriceWatch};
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::shops::{self, registry, ShopSource};

/// Which phases a tick runs, decided from the calendar and the tick counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickPlan {
    pub tick: u64,
    pub run_association: bool,
    pub run_shops: bool,
    pub status: String,
}

impl TickPlan {
    pub fn is_idle(&self) -> bool {
        !self.run_association && !self.run_shops
    }
}

/// `(run_association, run_shops)` for one tick.
pub fn plan_phases(tick: u64, market_open: bool, shop_open: bool, cfg: &ScheduleConfig) -> (bool, bool) {
    let every = |n: u64| tick % n.max(1) == 0;
    (
        market_open && every(cfg.association_every),
        shop_open && every(cfg.shops_every),
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub association: Option<ReconcileOutcome>,
    /// Number of shop records written, when the shop phase ran.
    pub shops: Option<usize>,
    pub hibernated: bool,
    /// Phases were due but the engine could not be brought up.
    pub skipped: bool,
}

pub struct Scheduler {
    launcher: Arc<dyn EngineLauncher>,
    engine: Option<Box<dyn Engine>>,
    store: Arc<Store>,
    reconciler: Reconciler,
    shops: Vec<Arc<dyn ShopSource>>,
    user_agent: String,
    schedule: ScheduleConfig,
    market: MarketHours,
    shop_hours: ShopHours,
    watch: PriceWatch,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Scheduler {
    pub fn new(cfg: &AppConfig, launcher: Arc<dyn EngineLauncher>, store: Arc<Store>) -> Self {
        Self {
            launcher,
            engine: None,
            store,
            reconciler: Reconciler::from_config(cfg),
            shops: registry::sources(&cfg.shops, cfg.browser.poll()),
            user_agent: cfg.browser.user_agent.clone(),
            schedule: cfg.schedule,
            market: cfg.market,
            shop_hours: cfg.shop_hours,
            watch: PriceWatch::new(),
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn with_shops(mut self, shops: Vec<Arc<dyn ShopSource>>) -> Self {
        self.shops = shops;
        self
    }

    pub fn engine_running(&self) -> bool {
        self.engine.is_some()
    }

    pub fn plan(&self, tick: u64, now: &DateTime<FixedOffset>) -> TickPlan {
        let (market_open, market_label) = is_market_open(now, &self.market);
        let (shop_open, shop_label) = is_shop_open(now, &self.shop_hours);
        let (run_association, run_shops) = plan_phases(tick, market_open, shop_open, &self.schedule);
        TickPlan {
            tick,
            run_association,
            run_shops,
            status: compose_status(&market_label, &shop_label),
        }
    }

    /// Start the engine on demand; no-op while one is alive.
    async fn ensure_engine(&mut self) -> ScrapeResult<()> {
        if self.engine.is_none() {
            let engine = self.launcher.launch().await?;
            info!(target: "scheduler", "browser engine started");
            self.engine = Some(engine);
        }
        Ok(())
    }

    async fn open_profile(&mut self) -> ScrapeResult<Arc<dyn Profile>> {
        self.ensure_engine().await?;
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| ScrapeError::engine("engine missing after launch"))?;
        let res = engine.new_profile(&self.user_agent).await;
        match res {
            Ok(p) => Ok(p),
            Err(e) => {
                // a dead engine is replaced on the next tick that needs one
                self.release_engine().await;
                Err(e)
            }
        }
    }

    async fn release_engine(&mut self) -> bool {
        let Some(mut engine) = self.engine.take() else {
            return false;
        };
        if let Err(e) = engine.close().await {
            warn!(target: "scheduler", error = %e, "engine close failed");
        }
        true
    }

    /// Release the engine entirely (off-hours).
    pub async fn hibernate(&mut self) -> bool {
        let released = self.release_engine().await;
        if released {
            counter!("scheduler_hibernations_total").increment(1);
            info!(target: "scheduler", "hibernating: browser engine released");
        }
        released
    }

    fn check_price_change(&mut self, now: DateTime<FixedOffset>) {
        let snap = self.store.snapshot();
        let Some(latest) = snap.latest_gold() else {
            return;
        };
        let Some(change) = self.watch.observe(latest, &format_stamp(now)) else {
            return;
        };
        info!(
            target: "scheduler",
            previous = %change.previous,
            current = %change.current,
            "bullion sell price changed"
        );
        if let Some(n) = &self.notifier {
            spawn_notify(n.clone(), change);
        }
    }

    /// Run the requested phases sequentially in one profile; the profile is
    /// closed before returning.
    pub async fn run_phases(
        &mut self,
        association: bool,
        shops: bool,
        now: DateTime<FixedOffset>,
    ) -> TickReport {
        let mut report = TickReport::default();
        if !association && !shops {
            return report;
        }

        let profile = match self.open_profile().await {
            Ok(p) => p,
            Err(e) => {
                warn!(target: "scheduler", error = %e, "browser unavailable; skipping scrape phases");
                report.skipped = true;
                return report;
            }
        };

        if association {
            let outcome = self.reconciler.reconcile(profile.as_ref(), &self.store, now).await;
            if outcome.layout().is_some() {
                self.check_price_change(now);
            }
            report.association = Some(outcome);
        }

        if shops {
            let quotes = shops::scrape_all(profile.clone(), &self.shops).await;
            report.shops = Some(quotes.len());
            self.store.replace_shops(quotes, now);
        }

        if let Err(e) = profile.close().await {
            warn!(target: "scheduler", error = %e, "profile close failed");
        }
        report
    }

    /// Unconditional scrape of both sources, bypassing the calendar once.
    pub async fn boot(&mut self, now: DateTime<FixedOffset>) -> TickReport {
        let plan = self.plan(0, &now);
        self.store.set_market_status(plan.status);
        info!(target: "scheduler", "boot scrape");
        self.run_phases(true, true, now).await
    }

    pub async fn run_tick(&mut self, tick: u64, now: DateTime<FixedOffset>) -> TickReport {
        let plan = self.plan(tick, &now);
        counter!("scheduler_ticks_total").increment(1);
        debug!(
            target: "scheduler",
            tick,
            association = plan.run_association,
            shops = plan.run_shops,
            status = %plan.status,
            "tick"
        );
        self.store.set_market_status(plan.status.clone());

        if plan.is_idle() {
            let hibernated = self.hibernate().await;
            return TickReport {
                hibernated,
                ..TickReport::default()
            };
        }
        self.run_phases(plan.run_association, plan.run_shops, now).await
    }

    /// Boot scrape, then tick until `shutdown` flips to true. The engine is
    /// released before returning.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        if self.schedule.boot_scrape {
            self.boot(thai_now()).await;
        }

        let mut tick: u64 = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }
            self.run_tick(tick, thai_now()).await;
            tick = tick.wrapping_add(1);

            tokio::select! {
                _ = tokio::time::sleep(self.schedule.tick()) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.release_engine().await;
        info!(target: "scheduler", "scheduler stopped");
    }
}

/// A scheduler running on its own task, with the stop channel that ends it.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn spawn(scheduler: Scheduler) -> Self {
        let (stop, rx) = watch::channel(false);
        let task = tokio::spawn(scheduler.run(rx));
        Self { stop, task }
    }

    /// Signal stop and wait for the current tick to finish and the engine to
    /// be released.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!(target: "scheduler", error = %e, "scheduler task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_halves_association_and_fifths_shops() {
        let cfg = ScheduleConfig::default();
        assert_eq!(plan_phases(7, false, false, &cfg), (false, false));
        assert_eq!(plan_phases(7, true, true, &cfg), (false, false));
        assert_eq!(plan_phases(10, true, true, &cfg), (true, true));
        assert_eq!(plan_phases(4, true, true, &cfg), (true, false));
        assert_eq!(plan_phases(5, true, true, &cfg), (false, true));
        assert_eq!(plan_phases(10, false, true, &cfg), (false, true));
    }

    #[test]
    fn zero_cadence_never_divides_by_zero() {
        let cfg = ScheduleConfig {
            association_every: 0,
            shops_every: 0,
            ..ScheduleConfig::default()
        };
        assert_eq!(plan_phases(3, true, true, &cfg), (true, true));
    }
}
