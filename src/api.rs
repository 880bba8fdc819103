// src/api.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::cache::Store;
use crate::config::ServerConfig;

pub const BANNER: &str = "Thai Gold Price API";

/// Responses that must never be cached (nothing scraped yet).
const NO_CACHE: &str = "no-cache";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub status_max_age: u32,
    pub price_max_age: u32,
    pub shop_max_age: u32,
}

impl AppState {
    pub fn new(store: Arc<Store>, cfg: &ServerConfig) -> Self {
        Self {
            store,
            status_max_age: cfg.status_max_age_secs,
            price_max_age: cfg.price_max_age_secs,
            shop_max_age: cfg.shop_max_age_secs,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/api/latest", get(latest))
        .route("/api/gold", get(gold))
        .route("/api/history", get(history))
        .route("/api/percent_jewelry", get(percent_jewelry))
        .route("/api/weight_jewelry", get(weight_jewelry))
        .route("/api/shops", get(shops))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn cache_control(max_age: u32) -> String {
    format!("public, max-age={max_age}, s-maxage={max_age}")
}

fn cached<T: Serialize>(max_age: u32, body: T) -> Response {
    let value = HeaderValue::from_str(&cache_control(max_age))
        .unwrap_or_else(|_| HeaderValue::from_static(NO_CACHE));
    ([(header::CACHE_CONTROL, value)], Json(body)).into_response()
}

fn waiting(market_status: &str) -> Response {
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE))],
        Json(json!({ "status": "waiting_for_data", "market_status": market_status })),
    )
        .into_response()
}

#[derive(Serialize)]
struct Listing<'a, T> {
    count: usize,
    data: &'a [T],
}

fn listing<T: Serialize>(data: &[T]) -> Listing<'_, T> {
    Listing {
        count: data.len(),
        data,
    }
}

async fn root(State(st): State<AppState>) -> Response {
    let snap = st.store.snapshot();
    let body: Value = json!({
        "message": BANNER,
        "market_status": snap.market_status,
        "last_updated": snap.association_updated,
        "shops_updated": snap.shops_updated,
        "source_state": snap.source_state.as_str(),
    });
    cached(st.status_max_age, body)
}

async fn latest(State(st): State<AppState>) -> Response {
    let snap = st.store.snapshot();
    let Some(row) = snap.latest_gold() else {
        return waiting(&snap.market_status);
    };
    cached(
        st.price_max_age,
        json!({
            "status": "success",
            "market_status": snap.market_status,
            "data": row,
            "updated_at": snap.association_updated,
        }),
    )
}

async fn gold(State(st): State<AppState>) -> Response {
    let snap = st.store.snapshot();
    let Some(row) = snap.latest_gold() else {
        return waiting(&snap.market_status);
    };
    cached(
        st.price_max_age,
        json!({
            "status": "success",
            "bullion_buy": row.bullion_buy,
            "ornament_buy": row.ornament_buy,
            "updated_at": snap.association_updated,
        }),
    )
}

async fn history(State(st): State<AppState>) -> Response {
    let snap = st.store.snapshot();
    cached(st.price_max_age, listing(snap.gold_rows.as_slice()))
}

async fn percent_jewelry(State(st): State<AppState>) -> Response {
    let snap = st.store.snapshot();
    cached(st.price_max_age, listing(snap.jewelry_rows.as_slice()))
}

async fn weight_jewelry(State(st): State<AppState>) -> Response {
    let snap = st.store.snapshot();
    cached(st.price_max_age, listing(snap.weight_rows.as_slice()))
}

async fn shops(State(st): State<AppState>) -> Response {
    let snap = st.store.snapshot();
    cached(
        st.shop_max_age,
        json!({
            "count": snap.shops.len(),
            "updated_at": snap.shops_updated,
            "data": snap.shops.as_slice(),
        }),
    )
}
