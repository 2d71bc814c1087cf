//! Quote and search provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteSource` trait for price lookup and structured search
//! - The `CodeSearch` trait for the last-resort autocomplete code scan
//! - Concrete implementations (Yahoo Finance, Naver autocomplete)
//!
//! Providers are best-effort by contract: a lookup that fails for any reason
//! (network, parsing, missing data) comes back as absent values, and callers
//! treat "no data" and "provider down" identically.

mod traits;

pub mod naver;
pub mod yahoo;

// Re-exports
pub use traits::{CodeSearch, QuoteSource};
