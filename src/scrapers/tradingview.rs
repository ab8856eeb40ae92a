//! TradingView symbol news scraper.
//!
//! TradingView renders its news list client-side, so this scraper drives a
//! headless Chromium through `headless_chrome`. Every call launches its own
//! browser process and tears it down before returning, on success and on
//! failure alike (the [`Browser`] is owned by the scraping function and
//! killed when dropped).
//!
//! # URL Pattern
//!
//! `https://www.tradingview.com/symbols/NYSE-{TICKER}/news/`. Card links are
//! relative and are resolved against the TradingView base URL.

use crate::models::{Article, Source};
use crate::scrapers::{Endpoints, MAX_ITEMS_PER_SOURCE};
use headless_chrome::{Browser, LaunchOptions};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

const NEWS_CARD: &str = r#"[class*="news-card-"]"#;
const CARD_TITLE: &str = r#"[class*="title-"]"#;
const CARD_LINK: &str = "a[href]";

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const CARD_WAIT_TIMEOUT: Duration = Duration::from_secs(15);

type BlockingError = Box<dyn Error + Send + Sync>;

/// A news card as read off the rendered page, before URL resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCard {
    pub title: String,
    pub href: String,
}

/// Build the news page URL for `ticker`.
pub fn news_page_url(base: &str, ticker: &str) -> String {
    format!(
        "{}/symbols/NYSE-{}/news/",
        base.trim_end_matches('/'),
        urlencoding::encode(ticker)
    )
}

/// Fetch TradingView headlines for `ticker` using a headless browser.
///
/// Browser work is blocking, so it runs on tokio's blocking pool. Launch
/// failures, navigation timeouts and a missing news list all yield an empty
/// vector.
#[instrument(level = "info", skip(endpoints))]
pub async fn fetch_articles(endpoints: &Endpoints, ticker: &str) -> Vec<Article> {
    let page_url = news_page_url(&endpoints.tradingview, ticker);
    let base = endpoints.tradingview.clone();

    let scraped = tokio::task::spawn_blocking(move || scrape_cards(&page_url)).await;

    let cards = match scraped {
        Ok(Ok(cards)) => cards,
        Ok(Err(e)) => {
            error!(error = %e, %ticker, "TradingView scrape failed");
            return Vec::new();
        }
        Err(e) => {
            error!(error = %e, %ticker, "TradingView scrape task panicked or was cancelled");
            return Vec::new();
        }
    };

    match to_articles(&base, cards) {
        Ok(articles) => {
            info!(count = articles.len(), %ticker, "Scraped TradingView articles");
            articles
        }
        Err(e) => {
            error!(error = %e, %ticker, "Invalid TradingView base URL");
            Vec::new()
        }
    }
}

/// Launch a browser, load `page_url` and read up to
/// [`MAX_ITEMS_PER_SOURCE`] news cards.
fn scrape_cards(page_url: &str) -> Result<Vec<RawCard>, BlockingError> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .build()
        .map_err(|e| format!("invalid browser launch options: {e}"))?;
    let browser = Browser::new(options)?;
    let tab = browser.new_tab()?;
    tab.set_default_timeout(NAVIGATION_TIMEOUT);

    debug!(%page_url, "Navigating headless browser");
    tab.navigate_to(page_url)?.wait_until_navigated()?;
    tab.wait_for_element_with_custom_timeout(NEWS_CARD, CARD_WAIT_TIMEOUT)?;

    let mut cards = Vec::new();
    for card in tab.find_elements(NEWS_CARD)?.iter().take(MAX_ITEMS_PER_SOURCE) {
        let (Ok(title_el), Ok(link_el)) = (card.find_element(CARD_TITLE), card.find_element(CARD_LINK)) else {
            continue;
        };
        let title = title_el.get_inner_text()?.trim().to_string();
        let Some(href) = link_el.get_attribute_value("href")? else {
            continue;
        };
        cards.push(RawCard { title, href });
    }

    Ok(cards)
}

/// Turn raw cards into articles, resolving relative links against `base`.
///
/// Cards with an empty title or a link that cannot be resolved are skipped.
pub fn to_articles(base: &str, cards: Vec<RawCard>) -> Result<Vec<Article>, url::ParseError> {
    let base_url = Url::parse(base)?;
    let articles = cards
        .into_iter()
        .filter(|card| !card.title.is_empty())
        .filter_map(|card| match base_url.join(&card.href) {
            Ok(url) => Some(Article::new(card.title, url.to_string(), Source::TradingView)),
            Err(e) => {
                warn!(error = %e, href = %card.href, "Skipping TradingView card with unusable link");
                None
            }
        })
        .collect();
    Ok(articles)
}
