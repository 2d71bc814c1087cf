//! Naver autocomplete code search.
//!
//! Last-resort symbol resolution: the finance autocomplete endpoint is
//! undocumented and its response shape has changed over time, so instead of
//! parsing it structurally the body is scanned for a 6-digit issue code
//! using the historically observed shapes. This is the least stable
//! collaborator in the chain and callers must treat every failure as
//! "no result".

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::provider::CodeSearch;

const PROVIDER_ID: &str = "NAVER";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const AUTOCOMPLETE_URL: &str = "https://ac.search.naver.com/nx/ac";

lazy_static! {
    /// `"code":"005930"` - plain JSON key, quotes optional around the value.
    static ref CODE_JSON: Regex = Regex::new(r#""code"\s*:\s*"?(\d{6})"?"#).unwrap();

    /// `code\":\"005930` - JSON escaped inside a JSON string value.
    static ref CODE_ESCAPED: Regex = Regex::new(r#"code\\":\\"(\d{6})"#).unwrap();

    /// `/item/main.naver?code=005930` - item link inside an HTML body.
    static ref CODE_ITEM_LINK: Regex = Regex::new(r"/item/main\.naver\?code=(\d{6})").unwrap();

    /// Any standalone 6-digit token, tried last.
    static ref CODE_BARE: Regex = Regex::new(r"\b(\d{6})\b").unwrap();
}

/// Naver finance autocomplete scraper.
pub struct NaverAutocomplete {
    client: reqwest::Client,
}

impl NaverAutocomplete {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for NaverAutocomplete {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeSearch for NaverAutocomplete {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn find_code(&self, query: &str) -> Result<Option<String>, MarketDataError> {
        debug!("Scanning Naver autocomplete for '{}'", query);

        let response = self
            .client
            .get(AUTOCOMPLETE_URL)
            .query(&[
                ("q", query),
                ("q_enc", "utf-8"),
                ("where", "finance"),
                ("st", "100"),
                ("frm", "autocomplete"),
                ("r_format", "json"),
            ])
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(MarketDataError::SearchUnavailable {
                provider: PROVIDER_ID.to_string(),
            });
        }

        let body = response.text().await?;
        if body.is_empty() {
            return Err(MarketDataError::SearchUnavailable {
                provider: PROVIDER_ID.to_string(),
            });
        }

        Ok(scan_for_code(&body))
    }
}

/// Scan a response body (JSON or HTML) for a 6-digit issue code.
///
/// Patterns are tried most-specific first; the bare 6-digit match is last
/// so that e.g. timestamps in unrelated fields do not shadow a real code
/// carried in a recognised shape.
fn scan_for_code(body: &str) -> Option<String> {
    for pattern in [&*CODE_JSON, &*CODE_ESCAPED, &*CODE_ITEM_LINK, &*CODE_BARE] {
        if let Some(captures) = pattern.captures(body) {
            return Some(captures[1].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_plain_json() {
        let body = r#"{"items":[[["삼성전자",{"code":"005930"}]]]}"#;
        assert_eq!(scan_for_code(body).as_deref(), Some("005930"));
    }

    #[test]
    fn test_scan_escaped_json() {
        let body = r#"{"raw":"{\"name\":\"samsung\",\"code\":\"005930\"}"}"#;
        assert_eq!(scan_for_code(body).as_deref(), Some("005930"));
    }

    #[test]
    fn test_scan_html_item_link() {
        let body = r#"<a href="/item/main.naver?code=035420">NAVER</a>"#;
        assert_eq!(scan_for_code(body).as_deref(), Some("035420"));
    }

    #[test]
    fn test_scan_bare_code() {
        let body = "no structure here, just 000660 somewhere";
        assert_eq!(scan_for_code(body).as_deref(), Some("000660"));
    }

    #[test]
    fn test_specific_shape_wins_over_bare_digits() {
        // 123456 appears first but the recognised JSON shape should win.
        let body = r#"{"ts":123456,"code":"005930"}"#;
        assert_eq!(scan_for_code(body).as_deref(), Some("005930"));
    }

    #[test]
    fn test_scan_no_code() {
        assert_eq!(scan_for_code(r#"{"items":[]}"#), None);
        assert_eq!(scan_for_code("plain text, 12345 too short"), None);
    }
}
