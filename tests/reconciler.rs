// tests/reconciler.rs
//
// Sticky/discovery behaviour of the association reconciler over the fixture engine.

mod common;

use std::sync::Arc;

use gold_price_api::browser::fixture::FixtureBrowser;
use gold_price_api::browser::{Engine, EngineLauncher, Profile};
use gold_price_api::cache::Store;
use gold_price_api::model::Layout;
use gold_price_api::reconciler::{ReconcileOutcome, Reconciler};
use gold_price_api::source_state::SourceState;

use common::{association_site, bkk, test_config, NEW_PRICE};

async fn profile(browser: &FixtureBrowser) -> Arc<dyn Profile> {
    let engine = browser.launch().await.expect("launch");
    engine.new_profile("test-agent").await.expect("profile")
}

#[tokio::test(start_paused = true)]
async fn boot_discovers_new_layout_then_fast_tracks_without_classic() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    let profile = profile(&browser).await;
    let store = Store::new();
    let rec = Reconciler::from_config(&cfg);
    let now = bkk(2025, 9, 8, 10, 15, 0);

    assert_eq!(
        rec.reconcile(profile.as_ref(), &store, now).await,
        ReconcileOutcome::Discovered(Layout::New)
    );
    for _ in 0..3 {
        assert_eq!(
            rec.reconcile(profile.as_ref(), &store, now).await,
            ReconcileOutcome::FastTrack(Layout::New)
        );
        assert_eq!(store.source_state(), SourceState::NewLayout);
    }

    assert_eq!(browser.visit_count(&cfg.association.new_price_url), 4);
    assert_eq!(browser.visit_count(&cfg.association.classic_price_url), 0);
    assert_eq!(browser.open_pages(), 0, "every page closed");
}

#[tokio::test(start_paused = true)]
async fn sticky_failure_heals_onto_classic_layout() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    let profile = profile(&browser).await;
    let store = Store::new();
    let rec = Reconciler::from_config(&cfg);
    let now = bkk(2025, 9, 8, 10, 15, 0);

    rec.reconcile(profile.as_ref(), &store, now).await;
    assert_eq!(store.source_state(), SourceState::NewLayout);

    browser.fail(&cfg.association.new_price_url, "404");
    let outcome = rec.reconcile(profile.as_ref(), &store, now).await;
    assert_eq!(outcome, ReconcileOutcome::Discovered(Layout::Classic));
    assert_eq!(store.source_state(), SourceState::ClassicLayout);

    let snap = store.snapshot();
    assert_eq!(snap.gold_rows.len(), 3);
    // classic batch is newest-first
    assert_eq!(snap.gold_rows[0].time, "10:12");
    assert_eq!(snap.gold_rows[2].time, "09:05");

    // the failed sticky layout is not probed a second time in the same cycle
    assert_eq!(browser.visit_count(&cfg.association.new_price_url), 2);

    // and the next cycle fast-tracks the classic layout
    assert_eq!(
        rec.reconcile(profile.as_ref(), &store, now).await,
        ReconcileOutcome::FastTrack(Layout::Classic)
    );
    assert_eq!(browser.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn classic_sticky_failure_heals_back_onto_new_layout() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    let profile = profile(&browser).await;
    let store = Store::new();
    let rec = Reconciler::from_config(&cfg);
    let now = bkk(2025, 9, 8, 10, 15, 0);

    // boot with the new layout down lands on classic
    browser.fail(&cfg.association.new_price_url, "404");
    rec.reconcile(profile.as_ref(), &store, now).await;
    assert_eq!(store.source_state(), SourceState::ClassicLayout);

    browser.route(&cfg.association.new_price_url, NEW_PRICE);
    browser.fail(&cfg.association.classic_price_url, "500");
    let outcome = rec.reconcile(profile.as_ref(), &store, now).await;
    assert_eq!(outcome, ReconcileOutcome::Discovered(Layout::New));
    assert_eq!(store.source_state(), SourceState::NewLayout);

    // the failed classic layout is not retried within the same cycle
    assert_eq!(browser.visit_count(&cfg.association.classic_price_url), 2);

    let snap = store.snapshot();
    assert_eq!(snap.gold_layout, Some(Layout::New));
    assert_eq!(snap.latest_gold().map(|r| r.time.as_str()), Some("10:12"));
    assert_eq!(browser.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn total_failure_keeps_cached_batches_untouched() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    let profile = profile(&browser).await;
    let store = Store::new();
    let rec = Reconciler::from_config(&cfg);

    rec.reconcile(profile.as_ref(), &store, bkk(2025, 9, 8, 10, 0, 0)).await;
    let before = store.snapshot();

    browser.fail(&cfg.association.new_price_url, "down");
    browser.fail(&cfg.association.classic_price_url, "down");
    let outcome = rec
        .reconcile(profile.as_ref(), &store, bkk(2025, 9, 8, 10, 2, 0))
        .await;
    assert_eq!(outcome, ReconcileOutcome::NoData);

    let after = store.snapshot();
    assert_eq!(*after.gold_rows, *before.gold_rows);
    assert_eq!(*after.jewelry_rows, *before.jewelry_rows);
    assert_eq!(*after.weight_rows, *before.weight_rows);
    assert_eq!(after.association_updated, before.association_updated);
    assert_eq!(after.source_state, SourceState::Unknown);
}

#[tokio::test(start_paused = true)]
async fn disabled_fallback_never_touches_classic_layout() {
    let mut cfg = test_config();
    cfg.association.classic_fallback = false;
    let browser = association_site(&cfg);
    browser.fail(&cfg.association.new_price_url, "down");
    let profile = profile(&browser).await;
    let store = Store::new();
    let rec = Reconciler::from_config(&cfg);
    assert!(!rec.classic_fallback());

    let outcome = rec
        .reconcile(profile.as_ref(), &store, bkk(2025, 9, 8, 10, 0, 0))
        .await;
    assert_eq!(outcome, ReconcileOutcome::NoData);
    assert_eq!(browser.visit_count(&cfg.association.classic_price_url), 0);
    assert!(store.snapshot().gold_rows.is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_jewelry_read_keeps_previous_jewelry() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    let profile = profile(&browser).await;
    let store = Store::new();
    let rec = Reconciler::from_config(&cfg);

    rec.reconcile(profile.as_ref(), &store, bkk(2025, 9, 8, 10, 0, 0)).await;
    assert_eq!(store.snapshot().jewelry_rows.len(), 2);

    browser.fail(&cfg.association.new_daily_url, "500");
    let outcome = rec
        .reconcile(profile.as_ref(), &store, bkk(2025, 9, 8, 10, 2, 0))
        .await;
    assert_eq!(outcome, ReconcileOutcome::FastTrack(Layout::New));

    let snap = store.snapshot();
    assert_eq!(snap.jewelry_rows.len(), 2);
    assert_eq!(snap.weight_rows.len(), 2);
    assert_eq!(snap.association_updated.as_deref(), Some("2025-09-08 10:02:00"));
}
