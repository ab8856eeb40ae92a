//! Daily summary generation with historical context.
//!
//! The prompt carries up to six earlier daily summaries so the model can say
//! whether today's news is a new development, a continuation, or a
//! contradiction, and it must close with a "What changed today" section.
//! Model failures are reported inline in the returned text.

use crate::api::AskAsync;
use crate::models::Article;
use chrono::NaiveDate;
use itertools::Itertools;
use tracing::{error, info, instrument, warn};

/// Returned without calling the model when there is nothing to summarize.
pub const NO_ARTICLES_MESSAGE: &str =
    "No new significant articles were found to generate a summary today.";

/// Heading the model is told to end every summary with.
pub const WHAT_CHANGED_HEADING: &str = "**What changed today**";

const NO_HISTORY: &str = "No historical data available.";

/// Render `(date, summary)` pairs oldest-to-newest.
fn history_context(history: &[(String, String)]) -> String {
    if history.is_empty() {
        return NO_HISTORY.to_string();
    }
    history
        .iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(date, summary)| format!("Date: {date}\nSummary: {summary}\n---"))
        .join("\n")
}

/// Build the summary prompt.
pub fn summary_prompt(
    articles: &[Article],
    history: &[(String, String)],
    ticker: &str,
    today: NaiveDate,
) -> String {
    let article_context = articles.iter().map(|a| format!("- {}", a.title)).join("\n");
    let history_context = history_context(history);

    format!(
        r#"You are a sharp, concise financial analyst. Your task is to provide a professional, data-driven summary for the stock ticker "{ticker}" as of {today}.

Your summary must be under 500 words.

**Historical Context (Summaries from the last 7 days):**
{history_context}

**Today's Key Articles:**
{article_context}

**Instructions:**
1.  Synthesize the information from today's key articles.
2.  Compare today's news with the historical context. Is this a new development, a continuation of a trend, or a contradiction of previous news?
3.  Generate a comprehensive summary of the current situation.
4.  Conclude with a mandatory section titled "{WHAT_CHANGED_HEADING}" that explicitly highlights the single most important new development or piece of information from today's articles.

Provide only the summary text. Do not include a title like "Summary for [TICKER]".
"#
    )
}

/// Generate today's summary for `ticker`.
///
/// `history` holds earlier `(date, summary)` pairs, excluding the most recent
/// stored day. Empty `articles` short-circuits to [`NO_ARTICLES_MESSAGE`];
/// a model failure is returned as an inline error message.
#[instrument(level = "info", skip(model, articles, history), fields(articles = articles.len(), history_days = history.len()))]
pub async fn generate_summary<M>(
    model: &M,
    articles: &[Article],
    history: &[(String, String)],
    ticker: &str,
    today: NaiveDate,
) -> String
where
    M: AskAsync<Response = String>,
{
    if articles.is_empty() {
        warn!(%ticker, "No articles provided to generate summary");
        return NO_ARTICLES_MESSAGE.to_string();
    }

    let prompt = summary_prompt(articles, history, ticker, today);
    match model.ask(&prompt).await {
        Ok(text) => {
            info!(%ticker, bytes = text.len(), "Generated summary");
            text.trim().to_string()
        }
        Err(e) => {
            error!(%ticker, error = %e, "Summary generation failed");
            format!("An error occurred during summary generation: {e}")
        }
    }
}
