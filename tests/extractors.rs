// tests/extractors.rs
//
// Association extractors against canned pages served by the fixture engine.

mod common;

use std::time::Duration;

use gold_price_api::browser::fixture::FixtureBrowser;
use gold_price_api::browser::{Engine, EngineLauncher, Page, Profile};
use gold_price_api::config::AssociationConfig;
use gold_price_api::extract::{AssociationExtractor, ClassicLayoutExtractor, NewLayoutExtractor};
use gold_price_api::model::Layout;

use common::{association_site, test_config, CLASSIC_PRICE};

const POLL: Duration = Duration::from_millis(50);

async fn open_page(browser: &FixtureBrowser) -> Box<dyn Page> {
    let engine = browser.launch().await.expect("launch");
    let profile = engine.new_profile("test-agent").await.expect("profile");
    profile.new_page().await.expect("page")
}

fn assoc() -> AssociationConfig {
    test_config().association
}

#[test]
fn extractors_report_their_layout() {
    assert_eq!(NewLayoutExtractor::from_config(&assoc(), POLL).layout(), Layout::New);
    assert_eq!(ClassicLayoutExtractor::from_config(&assoc(), POLL).layout(), Layout::Classic);
}

#[tokio::test(start_paused = true)]
async fn new_layout_reads_rows_jewelry_and_weights() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    let mut page = open_page(&browser).await;

    let batch = NewLayoutExtractor::from_config(&assoc(), POLL)
        .extract(page.as_mut())
        .await
        .expect("new layout extracts");

    assert_eq!(batch.layout, Layout::New);
    assert_eq!(batch.gold_rows.len(), 3);

    // newest-last
    let latest = batch.latest().unwrap();
    assert_eq!(latest.round, "3");
    assert_eq!(latest.time, "10:12");
    assert_eq!(latest.ornament_buy, "52,462.76");
    assert_eq!(latest.bullion_sell, "53,400.00");
    assert_eq!(latest.change, "+50");

    assert_eq!(batch.jewelry_rows.len(), 2);
    assert_eq!(batch.jewelry_rows[0].kind, "96.5%");
    assert_eq!(batch.jewelry_rows[0].buy, "52,462.76");
    assert_eq!(batch.jewelry_rows[0].sell, "53,900.00");

    assert_eq!(batch.weight_rows.len(), 2);
    assert_eq!(batch.weight_rows[1].weight, "1 สลึง");
    assert_eq!(batch.weight_rows[1].total, "13,475.00");
}

#[tokio::test(start_paused = true)]
async fn classic_layout_splits_stamp_and_swaps_columns() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    let mut page = open_page(&browser).await;

    let batch = ClassicLayoutExtractor::from_config(&assoc(), POLL)
        .extract(page.as_mut())
        .await
        .expect("classic layout extracts");

    assert_eq!(batch.layout, Layout::Classic);
    assert_eq!(batch.gold_rows.len(), 3, "header row is skipped");

    // newest-first
    let latest = batch.latest().unwrap();
    assert_eq!(latest.date, "08/09/2568");
    assert_eq!(latest.time, "10:12");
    assert_eq!(latest.round, "3");
    assert_eq!(latest.bullion_buy, "53,200.00");
    assert_eq!(latest.bullion_sell, "53,400.00");
    assert_eq!(latest.ornament_buy, "52,462.76");
    assert_eq!(latest.ornament_sell, "53,900.00");

    assert_eq!(batch.jewelry_rows.len(), 1);
    assert_eq!(batch.weight_rows.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn new_layout_rejects_a_page_with_short_rows() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    // the legacy grid sits where the new list should be: rows exist but have 9 cells
    browser.route(&cfg.association.new_price_url, CLASSIC_PRICE);
    let mut page = open_page(&browser).await;

    let err = NewLayoutExtractor::from_config(&assoc(), POLL)
        .extract(page.as_mut())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "structure");
}

#[tokio::test(start_paused = true)]
async fn new_layout_times_out_on_an_empty_table() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    browser.route(
        &cfg.association.new_price_url,
        "<table><thead><tr><th>วันที่</th></tr></thead><tbody></tbody></table>",
    );
    let mut page = open_page(&browser).await;

    let err = NewLayoutExtractor::from_config(&assoc(), POLL)
        .extract(page.as_mut())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "timeout");
}

#[tokio::test(start_paused = true)]
async fn broken_daily_page_keeps_gold_rows() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    browser.fail(&cfg.association.new_daily_url, "503");
    let mut page = open_page(&browser).await;

    let batch = NewLayoutExtractor::from_config(&assoc(), POLL)
        .extract(page.as_mut())
        .await
        .expect("jewelry failure is not fatal");
    assert_eq!(batch.gold_rows.len(), 3);
    assert!(batch.jewelry_rows.is_empty());
    assert!(batch.weight_rows.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unreachable_price_list_is_a_navigation_error() {
    let cfg = test_config();
    let browser = association_site(&cfg);
    browser.fail(&cfg.association.classic_price_url, "connection refused");
    let mut page = open_page(&browser).await;

    let err = ClassicLayoutExtractor::from_config(&assoc(), POLL)
        .extract(page.as_mut())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "navigation");
}
