//! Polygon.io ticker news client.
//!
//! Uses the `/v2/reference/news` endpoint, which returns the most recent
//! stories tagged with a ticker. Requires an API key, passed as the `apiKey`
//! query parameter.

use crate::models::{Article, Source};
use crate::scrapers::{Endpoints, MAX_ITEMS_PER_SOURCE};
use serde::Deserialize;
use std::error::Error;
use tracing::{debug, error, info, instrument};

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: Option<String>,
    article_url: Option<String>,
}

/// Fetch Polygon.io news for `ticker`.
///
/// Items missing a title or URL are dropped and at most
/// [`MAX_ITEMS_PER_SOURCE`] articles are kept. Any non-2xx response or
/// transport error yields an empty vector.
#[instrument(level = "info", skip(client, endpoints, api_key))]
pub async fn fetch_articles(
    client: &reqwest::Client,
    endpoints: &Endpoints,
    ticker: &str,
    api_key: &str,
) -> Vec<Article> {
    match try_fetch(client, &endpoints.polygon, ticker, api_key).await {
        Ok(articles) => {
            info!(count = articles.len(), %ticker, "Fetched Polygon.io articles");
            articles
        }
        Err(e) => {
            error!(error = %e, %ticker, "Polygon.io fetch failed");
            Vec::new()
        }
    }
}

async fn try_fetch(
    client: &reqwest::Client,
    base: &str,
    ticker: &str,
    api_key: &str,
) -> Result<Vec<Article>, Box<dyn Error>> {
    let url = format!("{}/v2/reference/news", base.trim_end_matches('/'));
    let limit = MAX_ITEMS_PER_SOURCE.to_string();

    // reqwest errors carry the request URL, which includes the API key.
    let response: NewsResponse = client
        .get(&url)
        .query(&[
            ("ticker", ticker),
            ("limit", limit.as_str()),
            ("apiKey", api_key),
        ])
        .send()
        .await
        .map_err(reqwest::Error::without_url)?
        .error_for_status()
        .map_err(reqwest::Error::without_url)?
        .json()
        .await
        .map_err(reqwest::Error::without_url)?;

    Ok(to_articles(response))
}

fn to_articles(response: NewsResponse) -> Vec<Article> {
    response
        .results
        .into_iter()
        .filter_map(|item| match (item.title, item.article_url) {
            (Some(title), Some(url)) => Some(Article::new(title.trim(), url, Source::Polygon)),
            (title, url) => {
                debug!(?title, ?url, "Skipping incomplete Polygon.io item");
                None
            }
        })
        .take(MAX_ITEMS_PER_SOURCE)
        .collect()
}
