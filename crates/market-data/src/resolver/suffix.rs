//! Regional exchange suffixes and the currency they imply.

/// Exchange suffixes tried when a bare input fails to resolve, in order.
pub const EXCHANGE_SUFFIXES: [&str; 2] = [".KS", ".KQ"];

/// Trading currency implied by the regional suffixes.
pub const REGIONAL_CURRENCY: &str = "KRW";

/// Whether a symbol carries one of the regional exchange suffixes.
pub fn has_regional_suffix(symbol: &str) -> bool {
    let upper = symbol.to_uppercase();
    EXCHANGE_SUFFIXES.iter().any(|s| upper.ends_with(s))
}

/// Default the currency to [`REGIONAL_CURRENCY`] for suffixed symbols that
/// did not report one.
pub fn backfill_currency(symbol: &str, currency: Option<String>) -> Option<String> {
    if currency.is_none() && has_regional_suffix(symbol) {
        return Some(REGIONAL_CURRENCY.to_string());
    }
    currency
}
