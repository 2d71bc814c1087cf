use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

use pricefeed_market_data::errors::MarketDataError;
use pricefeed_market_data::{
    CodeSearch, PriceResolver, QuoteSource, SearchMatch, SymbolQuote,
};
use pricefeed_server::{api::app_router, config::Config, AppState};

struct StubSource {
    quotes: HashMap<String, SymbolQuote>,
}

#[async_trait]
impl QuoteSource for StubSource {
    fn id(&self) -> &'static str {
        "STUB"
    }

    async fn quote(&self, symbol: &str) -> SymbolQuote {
        self.quotes.get(symbol).cloned().unwrap_or_default()
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchMatch>, MarketDataError> {
        Ok(Vec::new())
    }
}

struct NoCodeSearch;

#[async_trait]
impl CodeSearch for NoCodeSearch {
    fn id(&self) -> &'static str {
        "STUB_AC"
    }

    async fn find_code(&self, _query: &str) -> Result<Option<String>, MarketDataError> {
        Ok(None)
    }
}

fn build_test_router(quotes: &[(&str, f64, &str)]) -> axum::Router {
    let quotes = quotes
        .iter()
        .map(|(symbol, price, currency)| {
            (
                symbol.to_string(),
                SymbolQuote {
                    price: Some(*price),
                    currency: Some(currency.to_string()),
                    name: None,
                },
            )
        })
        .collect();
    let resolver = Arc::new(PriceResolver::new(
        Arc::new(StubSource { quotes }),
        Arc::new(NoCodeSearch),
    ));
    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(5),
    };
    app_router(Arc::new(AppState { resolver }), &config)
}

async fn get_json(app: axum::Router, uri: &str) -> (u16, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status().as_u16();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_endpoints_respond() {
    for uri in ["/api/v1/healthz", "/api/v1/readyz"] {
        let app = build_test_router(&[]);
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn prices_resolves_a_batch() {
    let app = build_test_router(&[("AAPL", 190.5, "USD"), ("005930.KS", 71000.0, "KRW")]);

    let (status, json) = get_json(app, "/api/v1/prices?tickers=aapl,005930").await;
    assert_eq!(status, 200);

    let aapl = &json["prices"]["aapl"];
    assert_eq!(aapl["resolved"], "AAPL");
    assert_eq!(aapl["price"], 190.5);
    assert_eq!(aapl["currency"], "USD");
    assert!(aapl["error"].is_null());

    let samsung = &json["prices"]["005930"];
    assert_eq!(samsung["resolved"], "005930.KS");
    assert_eq!(samsung["price"], 71000.0);

    assert!(json["ts"].is_string());
}

#[tokio::test]
async fn prices_carries_per_symbol_failures() {
    // One good symbol and one unresolvable one in the same batch: the batch
    // still answers 200 and the failure stays inside its own entry.
    let app = build_test_router(&[("AAPL", 190.5, "USD")]);

    let (status, json) = get_json(app, "/api/v1/prices?tickers=aapl,zzzz").await;
    assert_eq!(status, 200);
    assert_eq!(json["prices"]["aapl"]["price"], 190.5);

    let missing = &json["prices"]["zzzz"];
    assert!(missing["price"].is_null());
    assert_eq!(missing["error"], "not found");
}

#[tokio::test]
async fn prices_without_tickers_returns_empty_map() {
    for uri in ["/api/v1/prices", "/api/v1/prices?tickers=", "/api/v1/prices?tickers=,%20,"] {
        let app = build_test_router(&[]);
        let (status, json) = get_json(app, uri).await;
        assert_eq!(status, 200);
        assert_eq!(json["prices"], serde_json::json!({}));
        assert!(json["ts"].is_string());
    }
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_test_router(&[]);
    let (status, json) = get_json(app, "/openapi.json").await;
    assert_eq!(status, 200);
    assert!(json["paths"]["/api/v1/prices"].is_object());
}
