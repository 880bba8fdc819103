//! Thai gold price service: background scraper + read API.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use gold_price_api::browser::webdriver::WebDriverLauncher;
use gold_price_api::logging::init_logging;
use gold_price_api::metrics::Metrics;
use gold_price_api::notify::NtfyNotifier;
use gold_price_api::{router, AppConfig, AppState, Scheduler, SchedulerHandle, Store};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("ctrl-c handler failed: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler failed: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_logging();

    let cfg = AppConfig::load()?;
    let store = Arc::new(Store::new());

    let launcher = Arc::new(WebDriverLauncher::new(cfg.browser.clone()));
    let mut scheduler = Scheduler::new(&cfg, launcher, store.clone());
    if cfg.notify.enabled {
        info!(topic = %cfg.notify.topic, "price change push enabled");
        scheduler = scheduler.with_notifier(Arc::new(NtfyNotifier::from_config(&cfg.notify)));
    }

    let scraper = SchedulerHandle::spawn(scheduler);

    let mut app = router(AppState::new(store, &cfg.server));
    match Metrics::init() {
        Ok(m) => app = app.merge(m.router()),
        Err(e) => warn!("metrics disabled: {e:#}"),
    }

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind_addr)
        .await
        .with_context(|| format!("bind {}", cfg.server.bind_addr))?;
    info!(addr = %cfg.server.bind_addr, "listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // the scheduler finishes its tick and releases the browser on every exit path
    scraper.shutdown().await;
    served.context("http server")
}
