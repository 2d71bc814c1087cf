use std::sync::Arc;

use pricefeed_market_data::{NaverAutocomplete, PriceResolver, YahooProvider};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub resolver: Arc<PriceResolver>,
}

pub fn init_tracing() {
    let log_format = std::env::var("PF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(_config: &Config) -> anyhow::Result<Arc<AppState>> {
    let source = Arc::new(YahooProvider::new()?);
    let code_search = Arc::new(NaverAutocomplete::new());
    let resolver = Arc::new(PriceResolver::new(source, code_search));
    Ok(Arc::new(AppState { resolver }))
}
