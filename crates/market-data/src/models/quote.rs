use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal outcome of resolving one user input.
///
/// Absent fields are serialized as `null` - clients rely on the keys being
/// present. On a finished resolution exactly one of `price` / `error` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteResult {
    /// The original input string, as the caller supplied it (trimmed).
    pub requested: String,

    /// The provider symbol that actually answered (e.g. "005930.KS").
    pub resolved: Option<String>,

    /// Display name, when the provider reported one.
    pub name: Option<String>,

    /// Last known price.
    pub price: Option<f64>,

    /// Quote currency (e.g. "KRW", "USD").
    pub currency: Option<String>,

    /// Failure reason when no price could be obtained.
    pub error: Option<String>,
}

impl QuoteResult {
    /// A successful resolution carrying a price.
    pub fn priced(
        requested: impl Into<String>,
        resolved: impl Into<String>,
        name: Option<String>,
        price: f64,
        currency: Option<String>,
    ) -> Self {
        Self {
            requested: requested.into(),
            resolved: Some(resolved.into()),
            name,
            price: Some(price),
            currency,
            error: None,
        }
    }

    /// A failed resolution with a reason and nothing else.
    pub fn failed(requested: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            requested: requested.into(),
            resolved: None,
            name: None,
            price: None,
            currency: None,
            error: Some(reason.into()),
        }
    }
}

/// Raw product of one symbol lookup against a provider.
///
/// All-absent means "the provider had nothing for this symbol"; a lookup
/// failure is indistinguishable from missing data by design.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolQuote {
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub name: Option<String>,
}

impl SymbolQuote {
    /// An empty quote, used when every lookup step came back with nothing.
    pub fn absent() -> Self {
        Self::default()
    }
}

/// One emitted batch of symbol -> price data.
///
/// Produced fresh each push cycle; a `null` price means the symbol failed to
/// resolve in that cycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub prices: HashMap<String, Option<f64>>,
    pub ts: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn new(prices: HashMap<String, Option<f64>>) -> Self {
        Self {
            prices,
            ts: Utc::now(),
        }
    }
}
