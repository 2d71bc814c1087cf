//! Per-connection price push channel.
//!
//! A client holds one websocket, sends subscription updates as JSON text
//! frames, and receives one [`PriceSnapshot`] per cycle. The first parsed
//! update starts the push loop; later updates only mutate the shared
//! subscription state, which the loop re-reads at the start of every cycle.
//! Exactly one loop task exists per connection, and it is aborted when the
//! connection goes away.

use std::sync::{Arc, RwLock};

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::Utc;
use futures::future::join_all;
use pricefeed_market_data::{PriceResolver, PriceSnapshot};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::main_lib::AppState;

/// Default push interval when the client never supplies one.
const DEFAULT_INTERVAL_SECS: i64 = 5;

/// Recheck period while the tracked symbol set is empty.
const IDLE_RECHECK_SECS: u64 = 1;

/// Per-connection subscription state.
///
/// Written only by the connection's inbound handler, read only by the
/// connection's own push loop.
#[derive(Clone, Debug, PartialEq)]
pub struct Subscription {
    /// Tracked symbols: trimmed, upper-cased, deduplicated, in client order.
    pub tickers: Vec<String>,
    /// Push interval in seconds. May be stored non-positive; the loop
    /// clamps to a 1-second floor.
    pub interval: i64,
}

impl Default for Subscription {
    fn default() -> Self {
        Self {
            tickers: Vec::new(),
            interval: DEFAULT_INTERVAL_SECS,
        }
    }
}

/// Inbound control message. Both fields are optional; a supplied ticker
/// list replaces the tracked set, it never appends.
#[derive(Debug, Deserialize)]
pub struct SubscriptionUpdate {
    pub tickers: Option<Vec<String>>,
    pub interval: Option<Value>,
}

impl Subscription {
    /// Merge one inbound update. Unparsable intervals are ignored and the
    /// previous value is retained.
    pub fn apply(&mut self, update: SubscriptionUpdate) {
        if let Some(tickers) = update.tickers {
            let mut normalized: Vec<String> = Vec::with_capacity(tickers.len());
            for ticker in &tickers {
                let upper = ticker.trim().to_uppercase();
                if !upper.is_empty() && !normalized.contains(&upper) {
                    normalized.push(upper);
                }
            }
            self.tickers = normalized;
        }
        if let Some(raw) = update.interval {
            if let Some(secs) = parse_interval(&raw) {
                self.interval = secs;
            }
        }
    }
}

fn parse_interval(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Owns the socket for the lifetime of the connection.
///
/// Snapshots travel from the push loop over an mpsc channel and are sent
/// from here, so no send is ever attempted after the socket is known
/// closed. Disconnect aborts the loop task, which interrupts its sleep and
/// abandons in-flight lookups.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let subscription = Arc::new(RwLock::new(Subscription::default()));
    let (snapshot_tx, mut snapshot_rx) = mpsc::channel::<PriceSnapshot>(1);
    let mut push_task: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                let Some(Ok(message)) = inbound else { break };
                let Message::Text(text) = message else { continue };
                let Ok(update) = serde_json::from_str::<SubscriptionUpdate>(text.as_str()) else {
                    debug!("Ignoring non-JSON text frame");
                    continue;
                };
                subscription.write().unwrap().apply(update);
                if push_task.is_none() {
                    push_task = Some(tokio::spawn(run_push_loop(
                        subscription.clone(),
                        state.resolver.clone(),
                        snapshot_tx.clone(),
                    )));
                }
            }
            snapshot = snapshot_rx.recv() => {
                let Some(snapshot) = snapshot else { break };
                let Ok(payload) = serde_json::to_string(&snapshot) else { continue };
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(task) = push_task {
        task.abort();
    }
    debug!("Connection closed");
}

/// The per-connection polling loop.
///
/// Reads a consistent copy of the subscription at the start of each cycle;
/// mutations arriving mid-cycle apply to the next one. All tracked symbols
/// resolve concurrently and one slow symbol delays the whole snapshot.
pub async fn run_push_loop(
    subscription: Arc<RwLock<Subscription>>,
    resolver: Arc<PriceResolver>,
    snapshots: mpsc::Sender<PriceSnapshot>,
) {
    loop {
        let Subscription { tickers, interval } = subscription.read().unwrap().clone();

        if tickers.is_empty() {
            sleep(Duration::from_secs(IDLE_RECHECK_SECS)).await;
            continue;
        }

        let results = join_all(tickers.iter().map(|t| resolver.resolve(t))).await;
        let prices = tickers
            .into_iter()
            .zip(results)
            .map(|(ticker, result)| (ticker, result.price))
            .collect();
        let snapshot = PriceSnapshot {
            prices,
            ts: Utc::now(),
        };

        // A closed receiver means the connection went away.
        if snapshots.send(snapshot).await.is_err() {
            return;
        }

        sleep(Duration::from_secs(interval.max(1) as u64)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use pricefeed_market_data::errors::MarketDataError;
    use pricefeed_market_data::{CodeSearch, QuoteSource, SearchMatch, SymbolQuote};
    use tokio::time::timeout;

    use super::*;

    fn update(json: &str) -> SubscriptionUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_tickers_are_normalized() {
        let mut sub = Subscription::default();
        sub.apply(update(r#"{"tickers":["aapl"," tsla "]}"#));
        assert_eq!(sub.tickers, vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn test_tickers_deduplicate_and_drop_empties() {
        let mut sub = Subscription::default();
        sub.apply(update(r#"{"tickers":["aapl","AAPL ","","  "]}"#));
        assert_eq!(sub.tickers, vec!["AAPL"]);
    }

    #[test]
    fn test_ticker_list_replaces_previous() {
        let mut sub = Subscription::default();
        sub.apply(update(r#"{"tickers":["aapl"]}"#));
        sub.apply(update(r#"{"tickers":["tsla"]}"#));
        assert_eq!(sub.tickers, vec!["TSLA"]);
    }

    #[test]
    fn test_interval_from_number_and_string() {
        let mut sub = Subscription::default();
        sub.apply(update(r#"{"interval":2}"#));
        assert_eq!(sub.interval, 2);
        sub.apply(update(r#"{"interval":"7"}"#));
        assert_eq!(sub.interval, 7);
    }

    #[test]
    fn test_invalid_interval_is_ignored() {
        let mut sub = Subscription::default();
        sub.apply(update(r#"{"interval":2}"#));
        sub.apply(update(r#"{"interval":"abc"}"#));
        assert_eq!(sub.interval, 2);
        sub.apply(update(r#"{"interval":true}"#));
        assert_eq!(sub.interval, 2);
    }

    #[test]
    fn test_update_without_fields_changes_nothing() {
        let mut sub = Subscription::default();
        sub.apply(update(r#"{"tickers":["aapl"]}"#));
        sub.apply(update(r#"{}"#));
        assert_eq!(sub.tickers, vec!["AAPL"]);
        assert_eq!(sub.interval, DEFAULT_INTERVAL_SECS);
    }

    // ------------------------------------------------------------------
    // Push loop
    // ------------------------------------------------------------------

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

    fn stub_resolver(quotes: &[(&str, f64)]) -> Arc<PriceResolver> {
        let quotes = quotes
            .iter()
            .map(|(symbol, price)| {
                (
                    symbol.to_string(),
                    SymbolQuote {
                        price: Some(*price),
                        currency: None,
                        name: None,
                    },
                )
            })
            .collect();
        Arc::new(PriceResolver::new(
            Arc::new(StubSource { quotes }),
            Arc::new(NoCodeSearch),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_loop_emits_nothing() {
        let subscription = Arc::new(RwLock::new(Subscription::default()));
        let (tx, mut rx) = mpsc::channel(1);
        let task = tokio::spawn(run_push_loop(subscription, stub_resolver(&[]), tx));

        let outcome = timeout(Duration::from_secs(3), rx.recv()).await;
        assert!(outcome.is_err(), "idle loop must not emit snapshots");

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_emitted_once_subscribed() {
        let subscription = Arc::new(RwLock::new(Subscription {
            tickers: vec!["AAPL".to_string(), "BOGUS".to_string()],
            interval: 2,
        }));
        let (tx, mut rx) = mpsc::channel(1);
        let task = tokio::spawn(run_push_loop(
            subscription,
            stub_resolver(&[("AAPL", 190.5)]),
            tx,
        ));

        let snapshot = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("snapshot within one interval")
            .expect("loop alive");
        assert_eq!(snapshot.prices.get("AAPL"), Some(&Some(190.5)));
        // A symbol that fails to resolve reports a null price, it does not
        // break the cycle.
        assert_eq!(snapshot.prices.get("BOGUS"), Some(&None));

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_mid_cycle_update_applies_to_next_cycle() {
        let subscription = Arc::new(RwLock::new(Subscription {
            tickers: vec!["AAPL".to_string()],
            interval: 1,
        }));
        let (tx, mut rx) = mpsc::channel(1);
        let task = tokio::spawn(run_push_loop(
            subscription.clone(),
            stub_resolver(&[("AAPL", 190.5), ("TSLA", 250.0)]),
            tx,
        ));

        let first = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!first.prices.contains_key("TSLA"));

        subscription
            .write()
            .unwrap()
            .apply(update(r#"{"tickers":["tsla"]}"#));

        let second = timeout(Duration::from_secs(3), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.prices.get("TSLA"), Some(&Some(250.0)));
        assert!(!second.prices.contains_key("AAPL"));

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_when_receiver_dropped() {
        let subscription = Arc::new(RwLock::new(Subscription {
            tickers: vec!["AAPL".to_string()],
            interval: 1,
        }));
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(run_push_loop(
            subscription,
            stub_resolver(&[("AAPL", 190.5)]),
            tx,
        ));

        drop(rx);
        timeout(Duration::from_secs(5), task)
            .await
            .expect("loop must terminate once the connection is gone")
            .unwrap();
    }
}
