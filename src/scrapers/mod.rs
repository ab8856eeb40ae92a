//! News source scrapers for fetching ticker headlines from various outlets.
//!
//! Each scraper module exports a `fetch_articles` function that returns a
//! `Vec<Article>` and never fails: network errors, bad statuses, missing page
//! elements and parse errors are logged and produce an empty list.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Finviz | [`finviz`] | HTML scraping | Parses the quote page's `#news-table` |
//! | Polygon.io | [`polygon`] | REST API | Requires API key; capped at 15 items |
//! | TradingView | [`tradingview`] | Headless Chromium | JavaScript-rendered news cards |
//!
//! Failed fetches are never retried; a source that is down simply contributes
//! nothing to the aggregate.

pub mod finviz;
pub mod polygon;
pub mod tradingview;

use std::time::Duration;

/// Browser-like user agent sent to sites that reject obvious bots.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Maximum number of items requested from Polygon and read from TradingView.
pub const MAX_ITEMS_PER_SOURCE: usize = 15;

const HTTP_TIMEOUT_SECS: u64 = 30;

/// Base URLs of the news sources.
///
/// Defaults point at the production hosts; tests swap them for mock servers.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub finviz: String,
    pub polygon: String,
    pub tradingview: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            finviz: "https://finviz.com".to_string(),
            polygon: "https://api.polygon.io".to_string(),
            tradingview: "https://www.tradingview.com".to_string(),
        }
    }
}

/// Build the HTTP client shared by the Finviz and Polygon scrapers.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
}
