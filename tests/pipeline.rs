use chrono::NaiveDate;
use std::cell::RefCell;
use std::error::Error;
use ticker_digest::pipeline::{RefreshOutcome, refresh, summarize_and_save};
use ticker_digest::scrapers::Endpoints;
use ticker_digest::{Aggregator, Article, AskAsync, Credentials, HistoryStore, Source};

/// Answers selection prompts with a fixed URL list and summary prompts with
/// a canned summary, recording every prompt it sees.
struct ScriptedModel {
    selection: Option<String>,
    summary: Option<String>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedModel {
    fn new(selection: &str, summary: &str) -> Self {
        Self {
            selection: Some(selection.to_string()),
            summary: Some(summary.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn unavailable() -> Self {
        Self {
            selection: None,
            summary: None,
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn summary_prompts(&self) -> Vec<String> {
        self.prompts
            .borrow()
            .iter()
            .filter(|p| !p.contains("selected_urls"))
            .cloned()
            .collect()
    }
}

impl AskAsync for ScriptedModel {
    type Response = String;

    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        self.prompts.borrow_mut().push(text.to_string());
        let reply = if text.contains("selected_urls") {
            &self.selection
        } else {
            &self.summary
        };
        reply.clone().ok_or_else(|| "503 Service Unavailable".into())
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
}

fn temp_store(dir: &tempfile::TempDir) -> HistoryStore {
    HistoryStore::new(dir.path().join("summaries.json"))
}

#[tokio::test]
async fn test_two_articles_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let articles = vec![
        Article::new("X up", "u1", Source::Finviz),
        Article::new("X down", "u2", Source::Polygon),
    ];
    let model = ScriptedModel::new(
        r#"{"selected_urls": ["u1", "u2"]}"#,
        "X traded in a wide range.\n\n**What changed today**\nVolatility returned.",
    );

    let outcome = summarize_and_save(&model, &store, "x", &articles, day(6)).await;

    let RefreshOutcome::Updated { record, persisted } = outcome else {
        panic!("expected an updated summary");
    };
    assert!(persisted);
    assert_eq!(record.sources, articles);
    assert!(!record.summary.is_empty());
    assert!(record.summary.contains("What changed today"));

    let summary_prompts = model.summary_prompts();
    let prompt = &summary_prompts[0];
    assert!(prompt.contains("No historical data available."));

    let history = store.get_summaries("X").await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].date, "2025-05-06");
}

#[tokio::test]
async fn test_history_context_skips_latest_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    store.save_summary("AAPL", "Day one summary", &[], day(1)).await.unwrap();
    store.save_summary("AAPL", "Day two summary", &[], day(2)).await.unwrap();

    let articles = vec![Article::new("AAPL rallies", "https://a", Source::Finviz)];
    let model = ScriptedModel::new(
        r#"{"selected_urls": ["https://a"]}"#,
        "Rally.\n\n**What changed today**\nNew high.",
    );

    summarize_and_save(&model, &store, "AAPL", &articles, day(3)).await;

    let summary_prompts = model.summary_prompts();
    let prompt = &summary_prompts[0];
    assert!(prompt.contains("Date: 2025-05-01\nSummary: Day one summary"));
    assert!(!prompt.contains("Day two summary"));

    let dates: Vec<String> = store
        .get_summaries("AAPL")
        .await
        .into_iter()
        .map(|r| r.date)
        .collect();
    assert_eq!(dates, vec!["2025-05-03", "2025-05-02", "2025-05-01"]);
}

#[tokio::test]
async fn test_model_outage_degrades_to_fallbacks() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let articles: Vec<Article> = (0..8)
        .map(|i| Article::new(format!("Story {i}"), format!("https://s/{i}"), Source::TradingView))
        .collect();
    let model = ScriptedModel::unavailable();

    let outcome = summarize_and_save(&model, &store, "MSFT", &articles, day(4)).await;

    let RefreshOutcome::Updated { record, persisted } = outcome else {
        panic!("expected an updated summary");
    };
    assert!(persisted);
    assert_eq!(record.sources, articles[..5].to_vec());
    assert!(record.summary.starts_with("An error occurred during summary generation:"));
}

#[tokio::test]
async fn test_empty_articles_leave_history_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let model = ScriptedModel::new("{}", "unused");

    let outcome = summarize_and_save(&model, &store, "AAPL", &[], day(4)).await;
    assert_eq!(outcome, RefreshOutcome::NoArticles);
    assert!(model.prompts.borrow().is_empty());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_refresh_against_mock_sources() {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote.ashx"))
        .and(query_param("t", "NVDA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table id="news-table">
                 <tr><td><a href="https://wire.test/nvda-guidance">Nvidia raises guidance</a></td></tr>
               </table>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/reference/news"))
        .and(query_param("ticker", "NVDA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"results": [
                {"title": "Nvidia guidance raised", "article_url": "https://wire.test/nvda-guidance"},
                {"title": "Chip stocks slide", "article_url": "https://wire.test/chips"}
            ]}"#,
        ))
        .mount(&server)
        .await;

    let endpoints = Endpoints {
        finviz: server.uri(),
        polygon: server.uri(),
        tradingview: server.uri(),
    };
    let aggregator = Aggregator::new(endpoints).unwrap().without_browser();
    let credentials = Credentials {
        polygon_api_key: "poly".to_string(),
        gemini_api_key: "gem".to_string(),
    };
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let model = ScriptedModel::new(
        r#"```json
{"selected_urls": ["https://wire.test/nvda-guidance"]}
```"#,
        "Guidance up.\n\n**What changed today**\nRaised outlook.",
    );

    let outcome = refresh(&aggregator, &model, &store, "nvda", &credentials, day(7)).await;

    let RefreshOutcome::Updated { record, .. } = outcome else {
        panic!("expected an updated summary");
    };
    assert_eq!(record.sources.len(), 1);
    assert_eq!(record.sources[0].title, "Nvidia guidance raised");
    assert_eq!(record.sources[0].source, Source::Polygon);
    assert_eq!(store.ticker_list().await, vec!["NVDA"]);

    let prompts = model.prompts.borrow();
    let selection_prompt = &prompts[0];
    assert!(selection_prompt.contains("1. Nvidia guidance raised (https://wire.test/nvda-guidance)"));
    assert!(selection_prompt.contains("2. Chip stocks slide (https://wire.test/chips)"));
}

#[tokio::test]
async fn test_refresh_with_all_sources_down() {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let endpoints = Endpoints {
        finviz: server.uri(),
        polygon: server.uri(),
        tradingview: server.uri(),
    };
    let aggregator = Aggregator::new(endpoints).unwrap().without_browser();
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let model = ScriptedModel::new("{}", "unused");

    let outcome = refresh(&aggregator, &model, &store, "AAPL", &Credentials::default(), day(1)).await;
    assert_eq!(outcome, RefreshOutcome::NoArticles);
    assert!(model.prompts.borrow().is_empty());
    assert!(store.get_summaries("AAPL").await.is_empty());
}
