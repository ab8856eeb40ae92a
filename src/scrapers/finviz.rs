//! Finviz quote page scraper.
//!
//! This module scrapes headlines from the news table on a Finviz quote page
//! (`/quote.ashx?t=TICKER`). The table is server-rendered, so a plain GET with
//! a browser-like user agent is enough.
//!
//! # Page Structure
//!
//! Headlines live in `#news-table`, one `<tr>` per story, with the first
//! `<a>` in each row carrying the title and link. Rows without a link (date
//! separators, ads) are skipped. Links are usually absolute but are resolved
//! against the Finviz base URL in case they are not.

use crate::models::{Article, Source};
use crate::scrapers::Endpoints;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{error, info, instrument, warn};
use url::Url;

static NEWS_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("#news-table").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Fetch Finviz headlines for `ticker`.
///
/// # Returns
///
/// The scraped articles, or an empty vector if the page could not be
/// fetched or has no news table.
#[instrument(level = "info", skip(client, endpoints))]
pub async fn fetch_articles(
    client: &reqwest::Client,
    endpoints: &Endpoints,
    ticker: &str,
) -> Vec<Article> {
    match try_fetch(client, &endpoints.finviz, ticker).await {
        Ok(Some(articles)) => {
            info!(count = articles.len(), %ticker, "Scraped Finviz articles");
            articles
        }
        Ok(None) => {
            warn!(%ticker, "No news table found on Finviz");
            Vec::new()
        }
        Err(e) => {
            error!(error = %e, %ticker, "Finviz fetch failed");
            Vec::new()
        }
    }
}

async fn try_fetch(
    client: &reqwest::Client,
    base: &str,
    ticker: &str,
) -> Result<Option<Vec<Article>>, Box<dyn Error>> {
    let base_url = Url::parse(base)?;
    let page_url = format!(
        "{}/quote.ashx?t={}",
        base.trim_end_matches('/'),
        urlencoding::encode(ticker)
    );

    let html = client
        .get(&page_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(parse_news_table(&html, &base_url))
}

/// Extract articles from a Finviz quote page.
///
/// Returns `None` when the page has no `#news-table` at all, which Finviz
/// serves for tickers without coverage.
pub fn parse_news_table(html: &str, base_url: &Url) -> Option<Vec<Article>> {
    let document = Html::parse_document(html);
    let table = document.select(&NEWS_TABLE).next()?;

    let mut articles = Vec::new();
    for row in table.select(&ROW) {
        let Some(link) = row.select(&LINK).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }
        match base_url.join(href) {
            Ok(resolved) => articles.push(Article::new(title, resolved.to_string(), Source::Finviz)),
            Err(e) => warn!(error = %e, %href, "Skipping Finviz row with unusable link"),
        }
    }
    Some(articles)
}
