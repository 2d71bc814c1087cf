//! Yahoo Finance quote provider.
//!
//! Price lookup tries, in order:
//! - the most recent intraday close via the library API (fast path)
//! - the quoteSummary `price` module (several "current price" aliases, plus
//!   currency and display name)
//! - historical closes at decreasing granularity (intraday, then daily)
//!
//! Any step that fails is logged and skipped; the provider never errors out
//! of a price lookup.

mod models;

use std::sync::RwLock;

use async_trait::async_trait;
use lazy_static::lazy_static;
use reqwest::header;
use tracing::debug;
use urlencoding::encode;
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::{SearchMatch, SymbolQuote};
use crate::provider::QuoteSource;

use models::{YahooPriceData, YahooQuoteSummaryResponse};

const PROVIDER_ID: &str = "YAHOO";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// History window for the fallback close lookups. Minute bars may be missing
/// for thinly traded symbols, so the window is generous.
const HISTORY_RANGE: &str = "5d";

// ============================================================================
// Crumb/Cookie Authentication
// ============================================================================

/// Cached Yahoo authentication data
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

lazy_static! {
    /// Global cache for the Yahoo authentication crumb
    static ref YAHOO_CRUMB: RwLock<Option<CrumbData>> = RwLock::default();
}

// ============================================================================
// Yahoo Provider
// ============================================================================

/// Yahoo Finance quote provider.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider.
    pub fn new() -> Result<Self, MarketDataError> {
        let connector = yahoo::YahooConnector::new().map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to initialize Yahoo connector: {}", e),
        })?;
        Ok(Self { connector })
    }

    // ========================================================================
    // Crumb/Cookie Authentication
    // ========================================================================

    /// Ensure we have a valid Yahoo authentication crumb.
    async fn ensure_crumb(&self) -> Result<CrumbData, MarketDataError> {
        {
            let guard = YAHOO_CRUMB.read().unwrap();
            if let Some(crumb) = guard.as_ref() {
                return Ok(crumb.clone());
            }
        }

        self.fetch_crumb().await
    }

    /// Fetch a new Yahoo authentication crumb.
    async fn fetch_crumb(&self) -> Result<CrumbData, MarketDataError> {
        let client = reqwest::Client::new();

        // Step 1: Get cookie from fc.yahoo.com
        let response = client.get("https://fc.yahoo.com").send().await?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: "Failed to parse Yahoo cookie".to_string(),
            })?;

        // Step 2: Get crumb using cookie
        let crumb = client
            .get("https://query1.finance.yahoo.com/v1/test/getcrumb")
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &cookie)
            .send()
            .await?
            .text()
            .await?;

        let crumb_data = CrumbData { cookie, crumb };

        let mut guard = YAHOO_CRUMB.write().unwrap();
        *guard = Some(crumb_data.clone());

        Ok(crumb_data)
    }

    /// Clear the cached crumb (used when authentication fails)
    fn clear_crumb(&self) {
        let mut guard = YAHOO_CRUMB.write().unwrap();
        *guard = None;
    }

    // ========================================================================
    // Lookup Steps
    // ========================================================================

    /// Fast path: last intraday close via the library API.
    async fn latest_intraday_close(&self, symbol: &str) -> Result<f64, MarketDataError> {
        let response = self
            .connector
            .get_latest_quotes(symbol, "1m")
            .await
            .map_err(|e| map_yahoo_error(symbol, e))?;

        let quote = response
            .last_quote()
            .map_err(|_| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        Ok(quote.close)
    }

    /// quoteSummary `price` module: current-price aliases plus currency/name.
    async fn fetch_price_summary(&self, symbol: &str) -> Result<YahooPriceData, MarketDataError> {
        let crumb = self.ensure_crumb().await?;

        let url = format!(
            "https://query1.finance.yahoo.com/v10/finance/quoteSummary/{}?modules=price&crumb={}",
            encode(symbol),
            encode(&crumb.crumb)
        );

        let client = reqwest::Client::new();
        let response = client
            .get(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.clear_crumb();
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: "Yahoo authentication expired".to_string(),
            });
        }

        let data: YahooQuoteSummaryResponse = response.json().await?;

        data.quote_summary
            .result
            .into_iter()
            .next()
            .and_then(|r| r.price)
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
    }

    /// Last close in the recent history window at the given granularity.
    async fn last_close_in_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<f64, MarketDataError> {
        let response = self
            .connector
            .get_quote_range(symbol, interval, HISTORY_RANGE)
            .await
            .map_err(|e| map_yahoo_error(symbol, e))?;

        let quotes = response
            .quotes()
            .map_err(|_| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        quotes
            .last()
            .map(|q| q.close)
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
    }
}

// ============================================================================
// QuoteSource Implementation
// ============================================================================

#[async_trait]
impl QuoteSource for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn quote(&self, symbol: &str) -> SymbolQuote {
        debug!("Fetching quote for {} from Yahoo", symbol);

        let mut quote = SymbolQuote::absent();

        match self.latest_intraday_close(symbol).await {
            Ok(price) => quote.price = Some(price),
            Err(e) => debug!("Intraday fast path failed for {}: {}", symbol, e),
        }

        // The price module is fetched even when the fast path succeeded,
        // because it is the only source of currency and display name.
        match self.fetch_price_summary(symbol).await {
            Ok(price_data) => {
                if quote.price.is_none() {
                    quote.price = price_from_summary(&price_data);
                }
                quote.currency = price_data.currency;
                quote.name = price_data.long_name.or(price_data.short_name);
            }
            Err(e) => debug!("quoteSummary failed for {}: {}", symbol, e),
        }

        if quote.price.is_none() {
            for interval in ["1m", "1d"] {
                match self.last_close_in_range(symbol, interval).await {
                    Ok(price) => {
                        quote.price = Some(price);
                        break;
                    }
                    Err(e) => debug!("History ({}) failed for {}: {}", interval, symbol, e),
                }
            }
        }

        quote
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, MarketDataError> {
        let encoded_query = encode(query);

        debug!("Searching Yahoo for '{}'", query);

        let result = self
            .connector
            .search_ticker(&encoded_query)
            .await
            .map_err(|e| MarketDataError::SearchUnavailable {
                provider: format!("{}: {}", PROVIDER_ID, e),
            })?;

        let matches = result
            .quotes
            .iter()
            .filter(|item| !item.symbol.is_empty())
            .map(|item| {
                let name = if !item.long_name.is_empty() {
                    Some(item.long_name.clone())
                } else if !item.short_name.is_empty() {
                    Some(item.short_name.clone())
                } else {
                    None
                };
                SearchMatch::new(&item.symbol, name)
            })
            .collect();

        Ok(matches)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Pick the first present "current price" alias from the price module.
fn price_from_summary(price: &YahooPriceData) -> Option<f64> {
    price
        .regular_market_price
        .as_ref()
        .and_then(|p| p.raw)
        .or_else(|| {
            price
                .regular_market_previous_close
                .as_ref()
                .and_then(|p| p.raw)
        })
        .or_else(|| price.regular_market_open.as_ref().and_then(|p| p.raw))
}

fn map_yahoo_error(symbol: &str, error: yahoo::YahooError) -> MarketDataError {
    if matches!(
        error,
        yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult
    ) {
        MarketDataError::SymbolNotFound(symbol.to_string())
    } else {
        MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: error.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
