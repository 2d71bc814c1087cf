use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use pricefeed_market_data::QuoteResult;

use crate::{config::Config, main_lib::AppState, ws};

#[utoipa::path(get, path = "/api/v1/healthz", responses((status = 200, description = "Health")))]
pub async fn healthz() -> &'static str {
    "ok"
}

#[utoipa::path(get, path = "/api/v1/readyz", responses((status = 200, description = "Ready")))]
pub async fn readyz() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
pub struct PricesQuery {
    /// Comma-separated list of tickers, codes, or names.
    pub tickers: Option<String>,
}

#[derive(Serialize)]
pub struct PricesResponse {
    pub prices: HashMap<String, QuoteResult>,
    pub ts: DateTime<Utc>,
}

/// Resolve a batch of symbols. Always answers 200: per-symbol failures are
/// carried in each entry's `error` field and never break the batch.
#[utoipa::path(
    get,
    path = "/api/v1/prices",
    responses((status = 200, description = "Resolved prices keyed by the requested inputs"))
)]
async fn get_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PricesQuery>,
) -> Json<PricesResponse> {
    let tickers: Vec<String> = query
        .tickers
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    let results = join_all(tickers.iter().map(|t| state.resolver.resolve(t))).await;
    let prices = tickers.into_iter().zip(results).collect();

    Json(PricesResponse {
        prices,
        ts: Utc::now(),
    })
}

#[derive(OpenApi)]
#[openapi(paths(healthz, readyz, get_prices), tags((name = "pricefeed")))]
pub struct ApiDoc;

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .map(|o| o.parse().unwrap())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let openapi = ApiDoc::openapi();

    // The request timeout wraps the HTTP routes only; the websocket route
    // is long-lived and must not be cut off.
    let api = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/prices", get(get_prices))
        .layer(TimeoutLayer::new(config.request_timeout));

    Router::new()
        .nest("/api/v1", api)
        .route("/ws", get(ws::ws_handler))
        .route("/openapi.json", get(|| async { Json(openapi) }))
        .with_state(state)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
}
