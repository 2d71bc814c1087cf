//! Pricefeed Market Data Crate
//!
//! Best-effort price resolution for free-form user input: numeric issue
//! codes, exchange-suffixed tickers, or company names.
//!
//! # Overview
//!
//! The crate is organised around one entry point, [`PriceResolver`], which
//! turns an arbitrary input string into a [`QuoteResult`]. Resolution is a
//! fixed fallback chain:
//!
//! ```text
//! +------------------+
//! |   input string   |
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  static name map |  (curated local names -> codes)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | verbatim lookup  |  (uppercased input as-is)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | suffixed lookups |  (.KS / .KQ appended)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   name search    |  (Yahoo search, Naver autocomplete fallback)
//! +------------------+
//! ```
//!
//! Every outbound call degrades to "absent" on failure; the resolver never
//! returns an error to its caller.
//!
//! # Core Types
//!
//! - [`QuoteResult`] - Terminal resolution outcome (price or error reason)
//! - [`SymbolQuote`] - Raw lookup product (price/currency/name, each optional)
//! - [`SearchMatch`] - Free-text search candidate
//! - [`PriceSnapshot`] - One batch of symbol -> price data with a timestamp

pub mod errors;
pub mod models;
pub mod provider;
pub mod resolver;

// Re-export all public types from models
pub use models::{PriceSnapshot, QuoteResult, SearchMatch, SymbolQuote};

// Re-export resolver types
pub use resolver::{
    backfill_currency, has_regional_suffix, PriceResolver, EXCHANGE_SUFFIXES, REGIONAL_CURRENCY,
};

// Re-export provider types
pub use provider::naver::NaverAutocomplete;
pub use provider::yahoo::YahooProvider;
pub use provider::{CodeSearch, QuoteSource};
