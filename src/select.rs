//! Model-driven selection of the most relevant articles for a ticker.
//!
//! The model sees a numbered list of every aggregated headline and answers
//! with a JSON object naming the URLs it picked. Anything that goes wrong on
//! the way (transport error, fenced or truncated output, wrong shape) falls
//! back to the first [`FALLBACK_COUNT`] input articles.

use crate::api::AskAsync;
use crate::models::Article;
use crate::utils::{looks_truncated, strip_code_fences, truncate_for_log};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashSet;
use std::error::Error;
use tracing::{error, info, instrument, warn};

/// Number of articles returned when the model cannot be used.
pub const FALLBACK_COUNT: usize = 5;

#[derive(Debug, Deserialize)]
struct Selection {
    #[serde(default)]
    selected_urls: Vec<String>,
}

/// Build the selection prompt for `articles`.
pub fn selection_prompt(articles: &[Article], ticker: &str) -> String {
    let article_list = articles
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{}. {} ({})", i + 1, a.title, a.url))
        .join("\n");

    format!(
        r#"Analyze the following financial news articles for the ticker "{ticker}".
Select the top 5 to 7 most relevant, credible, and impactful articles that likely influenced today's market perception.
Prioritize articles from reputable sources, those with specific data or earnings information, and analysis over generic market updates.

Return your answer ONLY as a JSON object containing a single key "selected_urls", which is a list of the string URLs you have chosen. Do not include any other text, explanation, or markdown formatting.

Example format:
{{"selected_urls": ["https://url1.com/story", "https://url2.com/report"]}}

Article List:
{article_list}
"#
    )
}

/// Decode the model's answer into the list of chosen URLs.
///
/// Code fences are stripped first. A missing `selected_urls` key decodes to
/// an empty list; any other shape is an error.
pub fn parse_selection(response: &str) -> Result<Vec<String>, serde_json::Error> {
    let cleaned = strip_code_fences(response);
    serde_json::from_str::<Selection>(&cleaned).map(|s| s.selected_urls)
}

/// Ask the model to choose the most relevant articles for `ticker`.
///
/// The result preserves the order of `articles`, not the order the model
/// listed its URLs in. An empty input returns immediately without a model
/// call. On any model or decode failure the first [`FALLBACK_COUNT`]
/// articles are returned.
#[instrument(level = "info", skip(model, articles), fields(input = articles.len()))]
pub async fn select_top_articles<M>(model: &M, articles: &[Article], ticker: &str) -> Vec<Article>
where
    M: AskAsync<Response = String>,
{
    if articles.is_empty() {
        warn!(%ticker, "No articles provided for selection");
        return Vec::new();
    }

    match try_select(model, articles, ticker).await {
        Ok(selected) => {
            info!(%ticker, count = selected.len(), "Model selected top articles");
            selected
        }
        Err(e) => {
            error!(%ticker, error = %e, "Article selection failed; falling back to first articles");
            fallback(articles)
        }
    }
}

async fn try_select<M>(
    model: &M,
    articles: &[Article],
    ticker: &str,
) -> Result<Vec<Article>, Box<dyn Error>>
where
    M: AskAsync<Response = String>,
{
    let response = model.ask(&selection_prompt(articles, ticker)).await?;

    let urls = parse_selection(&response).inspect_err(|e| {
        if looks_truncated(e) {
            warn!(error = %e, "Selection response looks truncated");
        }
        warn!(
            response_preview = %truncate_for_log(&response, 300),
            "Model returned non-conforming selection JSON"
        );
    })?;

    let chosen: HashSet<&str> = urls.iter().map(String::as_str).collect();
    Ok(articles
        .iter()
        .filter(|a| chosen.contains(a.url.as_str()))
        .cloned()
        .collect())
}

fn fallback(articles: &[Article]) -> Vec<Article> {
    articles.iter().take(FALLBACK_COUNT).cloned().collect()
}
