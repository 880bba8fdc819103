// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "association_scrape_total",
            "Association reconcile cycles by outcome (fast_track, discovered, no_data)."
        );
        describe_counter!(
            "association_layout_failures_total",
            "Association extraction failures per layout."
        );
        describe_counter!(
            "shop_scrape_total",
            "Per-shop extraction attempts by outcome (ok, error)."
        );
        describe_counter!("scheduler_ticks_total", "Scheduler ticks executed.");
        describe_counter!(
            "scheduler_hibernations_total",
            "Ticks that released the browser engine."
        );
        describe_counter!("notify_errors_total", "Failed push notifications.");
        describe_gauge!(
            "association_last_success_ts",
            "Unix ts of the last successful association extraction."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder. Call once from the binary.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
