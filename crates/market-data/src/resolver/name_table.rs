//! Static name -> symbol table.
//!
//! Quick mapping for common Korean stocks to avoid unreliable remote
//! lookups. A hit here bypasses search resolution entirely.

use std::collections::HashMap;

use lazy_static::lazy_static;

lazy_static! {
    static ref NAME_TO_CODE: HashMap<&'static str, &'static str> = HashMap::from([
        ("삼성전자", "005930.KS"),
        ("SK하이닉스", "000660.KS"),
        ("네이버", "035420.KS"),
        ("카카오", "035720.KS"),
        ("현대자동차", "005380.KS"),
        ("알지노믹스", "476830.KQ"),
    ]);
}

/// Look up a curated display name, returning its mapped provider symbol.
pub fn lookup(name: &str) -> Option<&'static str> {
    NAME_TO_CODE.get(name).copied()
}
