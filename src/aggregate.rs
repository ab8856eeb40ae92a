//! Multi-source news aggregation.
//!
//! Runs every scraper for a ticker, concatenates the results in source order
//! (Finviz, Polygon.io, TradingView) and removes duplicate URLs. Scrapers
//! never fail, so the aggregate is simply whatever the healthy sources
//! returned, possibly nothing.

use crate::models::{Article, Credentials};
use crate::scrapers::{self, Endpoints, finviz, polygon, tradingview};
use std::collections::HashMap;
use tracing::{error, info, instrument};

/// Remove duplicate URLs from `articles`.
///
/// When a URL appears more than once, the last occurrence's record is kept
/// in the slot where the URL first appeared.
pub fn dedupe_by_url(articles: Vec<Article>) -> Vec<Article> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(articles.len());
    let mut unique: Vec<Article> = Vec::with_capacity(articles.len());

    for article in articles {
        match slots.get(&article.url) {
            Some(&i) => unique[i] = article,
            None => {
                slots.insert(article.url.clone(), unique.len());
                unique.push(article);
            }
        }
    }
    unique
}

/// Runs the configured scrapers against one shared HTTP client.
#[derive(Debug, Clone)]
pub struct Aggregator {
    client: reqwest::Client,
    endpoints: Endpoints,
    use_browser: bool,
}

impl Aggregator {
    pub fn new(endpoints: Endpoints) -> reqwest::Result<Self> {
        Ok(Self {
            client: scrapers::http_client()?,
            endpoints,
            use_browser: true,
        })
    }

    /// Skip the TradingView scraper, which needs a local Chromium.
    pub fn without_browser(mut self) -> Self {
        self.use_browser = false;
        self
    }

    /// Fetch, merge and deduplicate news for `ticker` from every source.
    #[instrument(level = "info", skip(self, credentials))]
    pub async fn aggregate(&self, ticker: &str, credentials: &Credentials) -> Vec<Article> {
        info!(use_browser = self.use_browser, "Starting news aggregation");

        let (finviz_news, polygon_news, tradingview_news) = futures::join!(
            finviz::fetch_articles(&self.client, &self.endpoints, ticker),
            polygon::fetch_articles(
                &self.client,
                &self.endpoints,
                ticker,
                &credentials.polygon_api_key
            ),
            async {
                if self.use_browser {
                    tradingview::fetch_articles(&self.endpoints, ticker).await
                } else {
                    Vec::new()
                }
            },
        );

        let finviz_count = finviz_news.len();
        let polygon_count = polygon_news.len();
        let tradingview_count = tradingview_news.len();

        let merged = [finviz_news, polygon_news, tradingview_news]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        let unique = dedupe_by_url(merged);

        info!(
            finviz_count,
            polygon_count,
            tradingview_count,
            unique = unique.len(),
            "Total unique articles found"
        );
        unique
    }
}

/// Aggregate news for `ticker` from the production endpoints.
pub async fn aggregate(ticker: &str, credentials: &Credentials) -> Vec<Article> {
    match Aggregator::new(Endpoints::default()) {
        Ok(aggregator) => aggregator.aggregate(ticker, credentials).await,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client; no sources fetched");
            Vec::new()
        }
    }
}
