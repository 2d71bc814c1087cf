//! The price-resolution fallback chain.
//!
//! Turns free-form user input (a numeric issue code, a suffixed ticker, or a
//! company name) into a [`QuoteResult`]. Attempts are strictly sequential and
//! stop at the first one that produces a price:
//!
//! 1. curated name table hit, looked up directly
//! 2. the uppercased input verbatim
//! 3. purely numeric input with each regional suffix appended
//! 4. free-text search (structured search, then autocomplete code scan)
//! 5. regional suffixes appended as a last resort
//!
//! The resolver itself never fails; exhausting every attempt yields a
//! [`QuoteResult`] with the reason in its `error` field.

mod name_table;
mod suffix;

pub use suffix::{backfill_currency, has_regional_suffix, EXCHANGE_SUFFIXES, REGIONAL_CURRENCY};

use std::sync::Arc;

use tracing::debug;

use crate::models::{QuoteResult, SearchMatch, SymbolQuote};
use crate::provider::{CodeSearch, QuoteSource};

/// The resolver. Cheap to clone behind an `Arc`; holds no mutable state.
pub struct PriceResolver {
    source: Arc<dyn QuoteSource>,
    code_search: Arc<dyn CodeSearch>,
}

impl PriceResolver {
    pub fn new(source: Arc<dyn QuoteSource>, code_search: Arc<dyn CodeSearch>) -> Self {
        Self {
            source,
            code_search,
        }
    }

    /// Resolve one input string to a best-effort priced result.
    pub async fn resolve(&self, input: &str) -> QuoteResult {
        let requested = input.trim();
        if requested.is_empty() {
            return QuoteResult::failed(input, "empty ticker");
        }

        // Fast path: curated name table bypasses search resolution entirely.
        if let Some(mapped) = name_table::lookup(requested) {
            debug!("Name table hit for '{}': {}", requested, mapped);
            let quote = self.lookup(mapped).await;
            if let Some(price) = quote.price {
                return QuoteResult::priced(
                    requested,
                    mapped,
                    quote.name,
                    price,
                    quote
                        .currency
                        .or_else(|| Some(REGIONAL_CURRENCY.to_string())),
                );
            }
        }

        let upper = requested.to_uppercase();

        // 1) the input verbatim
        let quote = self.lookup(&upper).await;
        if let Some(price) = quote.price {
            return QuoteResult::priced(requested, upper, quote.name, price, quote.currency);
        }

        // 2) purely numeric codes with the regional suffixes appended
        if is_numeric_code(&upper) {
            if let Some(result) = self.try_suffixed(requested, &upper).await {
                return result;
            }
        }

        // 3) free text resolved through search
        if requested.chars().any(|c| c.is_alphabetic()) {
            if let Some(found) = self.resolve_by_name(requested).await {
                let quote = self.lookup(&found.symbol).await;
                let name = found.name.or(quote.name);
                if let Some(price) = quote.price {
                    return QuoteResult::priced(
                        requested,
                        found.symbol,
                        name,
                        price,
                        quote.currency,
                    );
                }
                // The symbol resolved but carries no price; terminal, not a
                // reason to keep walking the chain.
                return QuoteResult {
                    requested: requested.to_string(),
                    resolved: Some(found.symbol),
                    name,
                    price: None,
                    currency: quote.currency,
                    error: Some("symbol found but price unavailable".to_string()),
                };
            }
        }

        // 4) last resort: regional suffixes on whatever we were given
        if let Some(result) = self.try_suffixed(requested, &upper).await {
            return result;
        }

        QuoteResult::failed(requested, "not found")
    }

    /// One provider lookup with the regional currency backfill applied.
    async fn lookup(&self, symbol: &str) -> SymbolQuote {
        let mut quote = self.source.quote(symbol).await;
        quote.currency = backfill_currency(symbol, quote.currency);
        quote
    }

    /// Try the regional suffixes in order, stopping at the first price.
    async fn try_suffixed(&self, requested: &str, upper: &str) -> Option<QuoteResult> {
        for exchange_suffix in EXCHANGE_SUFFIXES {
            let candidate = format!("{}{}", upper, exchange_suffix);
            let quote = self.lookup(&candidate).await;
            if let Some(price) = quote.price {
                return Some(QuoteResult::priced(
                    requested,
                    candidate,
                    quote.name,
                    price,
                    quote.currency,
                ));
            }
        }
        None
    }

    /// Resolve free text to a symbol candidate.
    ///
    /// Structured search first, preferring regional-suffix candidates; when
    /// that is unusable or empty, the autocomplete code scan synthesizes a
    /// symbol from a bare issue code. Every failure degrades to `None`.
    async fn resolve_by_name(&self, query: &str) -> Option<SearchMatch> {
        match self.source.search(query).await {
            Ok(candidates) => {
                if let Some(preferred) = candidates.iter().find(|c| has_regional_suffix(&c.symbol))
                {
                    return Some(SearchMatch::new(
                        preferred.symbol.to_uppercase(),
                        preferred.name.clone(),
                    ));
                }
                if let Some(first) = candidates.into_iter().next() {
                    return Some(first);
                }
                debug!("Search returned no candidates for '{}'", query);
            }
            Err(e) => debug!("Search failed for '{}': {}", query, e),
        }

        match self.code_search.find_code(query).await {
            Ok(Some(code)) => Some(SearchMatch::new(
                format!("{}{}", code, EXCHANGE_SUFFIXES[0]),
                Some(query.to_string()),
            )),
            Ok(None) => None,
            Err(e) => {
                debug!("Code scan failed for '{}': {}", query, e);
                None
            }
        }
    }
}

/// Whether the input looks like a bare numeric issue code: no exchange
/// suffix, and nothing but digits once hyphens are stripped.
fn is_numeric_code(input: &str) -> bool {
    if input.contains('.') {
        return false;
    }
    let mut digits = input.chars().filter(|c| *c != '-');
    let has_digits = input.chars().any(|c| c.is_ascii_digit());
    has_digits && digits.all(|c| c.is_ascii_digit())
}
