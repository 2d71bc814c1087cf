//! Market data models
//!
//! This module contains the core data types for price resolution:
//! - `quote` - Resolution outcomes (QuoteResult, SymbolQuote) and snapshots (PriceSnapshot)
//! - `search` - Free-text search candidates (SearchMatch)

mod quote;
mod search;

pub use quote::{PriceSnapshot, QuoteResult, SymbolQuote};
pub use search::SearchMatch;
