//! The on-demand refresh pipeline for one ticker.
//!
//! 1. **Aggregate**: fetch and deduplicate headlines from every source
//! 2. **Select**: let the model pick the most relevant 5–7 articles
//! 3. **Summarize**: generate today's summary with up to six earlier days as context
//! 4. **Save**: persist the summary, replacing any earlier run from the same day

use crate::aggregate::Aggregator;
use crate::api::AskAsync;
use crate::models::{Article, Credentials, SummaryRecord};
use crate::select::select_top_articles;
use crate::store::{HistoryStore, history_for_prompt};
use crate::summarize::generate_summary;
use crate::utils::normalize_ticker;
use chrono::NaiveDate;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Result of a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No source returned any article; history is left untouched.
    NoArticles,
    /// A summary was generated. `persisted` is false when the history file
    /// could not be written.
    Updated {
        record: SummaryRecord,
        persisted: bool,
    },
}

/// Run the full pipeline for `ticker`.
#[instrument(level = "info", skip(aggregator, model, store, credentials))]
pub async fn refresh<M>(
    aggregator: &Aggregator,
    model: &M,
    store: &HistoryStore,
    ticker: &str,
    credentials: &Credentials,
    today: NaiveDate,
) -> RefreshOutcome
where
    M: AskAsync<Response = String>,
{
    let t0 = Instant::now();
    let ticker = normalize_ticker(ticker);

    let articles = aggregator.aggregate(&ticker, credentials).await;
    if articles.is_empty() {
        warn!(%ticker, "Could not find any recent articles");
        return RefreshOutcome::NoArticles;
    }

    let outcome = summarize_and_save(model, store, &ticker, &articles, today).await;
    info!(%ticker, elapsed_ms = t0.elapsed().as_millis(), "Refresh complete");
    outcome
}

/// Select, summarize and persist an already aggregated article list.
///
/// An empty `articles` list yields [`RefreshOutcome::NoArticles`].
#[instrument(level = "info", skip(model, store, articles), fields(articles = articles.len()))]
pub async fn summarize_and_save<M>(
    model: &M,
    store: &HistoryStore,
    ticker: &str,
    articles: &[Article],
    today: NaiveDate,
) -> RefreshOutcome
where
    M: AskAsync<Response = String>,
{
    if articles.is_empty() {
        return RefreshOutcome::NoArticles;
    }
    let ticker = normalize_ticker(ticker);

    let top_articles = select_top_articles(model, articles, &ticker).await;

    let stored = store.get_summaries(&ticker).await;
    let history = history_for_prompt(&stored);

    let summary = generate_summary(model, &top_articles, &history, &ticker, today).await;

    match store.save_summary(&ticker, &summary, &top_articles, today).await {
        Ok(record) => RefreshOutcome::Updated {
            record,
            persisted: true,
        },
        Err(e) => {
            error!(%ticker, path = %store.path().display(), error = %e, "Failed to save summary");
            RefreshOutcome::Updated {
                record: SummaryRecord {
                    date: today.format("%Y-%m-%d").to_string(),
                    summary,
                    sources: top_articles,
                },
                persisted: false,
            }
        }
    }
}
