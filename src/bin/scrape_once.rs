//! One association reconcile and one shop fan-out, printed as JSON.
//! Handy for spotting selector drift against the live sites.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::warn;

use gold_price_api::browser::webdriver::WebDriverLauncher;
use gold_price_api::browser::{Engine, EngineLauncher, Profile};
use gold_price_api::calendar::thai_now;
use gold_price_api::logging::init_logging;
use gold_price_api::reconciler::Reconciler;
use gold_price_api::shops::{registry, scrape_all};
use gold_price_api::{AppConfig, Store};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let cfg = AppConfig::load()?;
    let store = Store::new();
    let reconciler = Reconciler::from_config(&cfg);
    let sources = registry::sources(&cfg.shops, cfg.browser.poll());

    let launcher = WebDriverLauncher::new(cfg.browser.clone());
    let mut engine = launcher.launch().await.context("start browser engine")?;
    let profile = engine
        .new_profile(&cfg.browser.user_agent)
        .await
        .context("open browsing profile")?;

    let outcome = reconciler.reconcile(profile.as_ref(), &store, thai_now()).await;
    let shops = scrape_all(Arc::clone(&profile), &sources).await;

    if let Err(e) = profile.close().await {
        warn!(error = %e, "profile close failed");
    }
    if let Err(e) = engine.close().await {
        warn!(error = %e, "engine close failed");
    }

    let snap = store.snapshot();
    let report = json!({
        "association": {
            "layout": outcome.layout().map(|l| l.as_str()),
            "rows": snap.gold_rows.as_slice(),
            "jewelry": snap.jewelry_rows.as_slice(),
            "weight": snap.weight_rows.as_slice(),
        },
        "shops": shops,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
