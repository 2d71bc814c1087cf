//! Provider trait definitions.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{SearchMatch, SymbolQuote};

/// Trait for quote providers.
///
/// Implement this trait to add support for a new quote source. The resolver
/// drives the fallback chain through this seam, which also makes the chain
/// testable without network access.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Unique identifier for this provider, used in logs and error messages.
    fn id(&self) -> &'static str;

    /// Best-effort price lookup for a provider symbol.
    ///
    /// Never fails: any step that errors is treated as "absent" and the
    /// remaining fields are filled from whatever steps did succeed. An
    /// all-absent [`SymbolQuote`] means the provider had nothing.
    async fn quote(&self, symbol: &str) -> SymbolQuote;

    /// Search for symbols matching a free-text query.
    ///
    /// Unlike [`quote`](Self::quote) this surfaces failures, because the
    /// caller falls back to a second search endpoint when this one is
    /// unusable.
    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, MarketDataError>;
}

/// Trait for the last-resort issue-code search.
///
/// Given free text, scans an opaque autocomplete response for a 6-digit
/// issue code. `Ok(None)` means the endpoint answered but no code was found.
#[async_trait]
pub trait CodeSearch: Send + Sync {
    /// Unique identifier for this search source.
    fn id(&self) -> &'static str;

    /// Find a 6-digit issue code for the query, if any.
    async fn find_code(&self, query: &str) -> Result<Option<String>, MarketDataError>;
}
