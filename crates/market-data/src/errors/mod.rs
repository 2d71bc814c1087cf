//! Error types for the market data crate.
//!
//! Provider failures never propagate past the resolver boundary: they are
//! logged and degrade to absent values in the returned [`crate::QuoteResult`].
//! The variants here exist for logging and for deciding when the search
//! fallback kicks in.

use thiserror::Error;

/// Errors that can occur while talking to a quote or search provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The search endpoint answered with something unusable
    /// (non-200 status, non-JSON body, empty body).
    #[error("Search unavailable: {provider}")]
    SearchUnavailable {
        /// The provider whose search endpoint was unusable
        provider: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
