//! Search candidate models for free-text symbol lookup.

use serde::{Deserialize, Serialize};

/// One candidate from a free-text search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Symbol/ticker (e.g. "005930.KS", "AAPL")
    pub symbol: String,

    /// Display name, when the search endpoint reported one.
    pub name: Option<String>,
}

impl SearchMatch {
    pub fn new(symbol: impl Into<String>, name: Option<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name,
        }
    }
}
