//! LLM API interaction with exponential backoff retry logic.
//!
//! This module provides the text-completion capability used by the article
//! selector and the summary generator. The seam is the [`AskAsync`] trait, so
//! callers and tests can substitute any backend.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`GeminiClient`]: Calls Google's `generateContent` REST endpoint
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! - Configurable number of retry attempts
//! - Only transport errors, 429 and 5xx responses are retried
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Default Gemini model used for selection and summarization.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Trait for async LLM interaction.
///
/// Implementors of this trait can send text to an LLM and receive a response.
/// This abstraction allows for different LLM backends or decorators (like retry logic).
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = GeminiClient::new(api_key, DEFAULT_MODEL)?;
    /// let retry_client = RetryAsk::new(client, 3, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !is_retryable(e.as_ref()) {
                        error!(
                            attempt,
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() failed with a non-retryable error"
                        );
                        return Err(e);
                    }

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Whether a failed ask is worth retrying.
///
/// HTTP errors are retried only for 429 and 5xx statuses; other 4xx
/// responses (bad key, bad request) fail immediately. Transport failures
/// and errors from non-HTTP backends are retried.
pub fn is_retryable(e: &(dyn Error + 'static)) -> bool {
    match e.downcast_ref::<reqwest::Error>().and_then(reqwest::Error::status) {
        Some(status) => status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        None => true,
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for Google's Gemini `generateContent` endpoint.
///
/// The API key is sent in the `x-goog-api-key` header and never logged.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AskAsync for GeminiClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text }],
            }],
        };

        let response: GenerateResponse = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or("Gemini response contained no candidates")?;
        debug!(finish_reason = ?candidate.finish_reason, "Gemini candidate received");

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|t| !t.is_empty())
            .ok_or("Gemini candidate contained no text")?;

        info!(
            elapsed_ms = t0.elapsed().as_millis(),
            bytes = text.len(),
            "Gemini call succeeded"
        );
        Ok(text)
    }
}

/// Build the production model client: Gemini wrapped in retry logic.
pub fn build_model(
    api_key: &str,
    model: &str,
    max_retries: usize,
) -> reqwest::Result<RetryAsk<GeminiClient>> {
    let client = GeminiClient::new(api_key, model)?;
    Ok(RetryAsk::new(client, max_retries, StdDuration::from_secs(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug)]
    struct FlakyModel {
        failures_before_success: usize,
        calls: Cell<usize>,
    }

    impl AskAsync for FlakyModel {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            if n < self.failures_before_success {
                Err("transient failure".into())
            } else {
                Ok("ok".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_retry_ask_recovers_after_failures() {
        let model = FlakyModel {
            failures_before_success: 2,
            calls: Cell::new(0),
        };
        let retry = RetryAsk::new(model, 3, StdDuration::ZERO);

        let res = retry.ask("prompt").await.unwrap();
        assert_eq!(res, "ok");
        assert_eq!(retry.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_ask_gives_up_after_max_retries() {
        let model = FlakyModel {
            failures_before_success: usize::MAX,
            calls: Cell::new(0),
        };
        let retry = RetryAsk::new(model, 1, StdDuration::ZERO);

        assert!(retry.ask("prompt").await.is_err());
        assert_eq!(retry.inner.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_retry_ask_does_not_retry_auth_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new("bad", "gemini-test")
            .unwrap()
            .with_base_url(server.uri());
        let retry = RetryAsk::new(client, 3, StdDuration::ZERO);
        let t0 = Instant::now();

        assert!(retry.ask("hello").await.is_err());
        assert!(t0.elapsed() < StdDuration::from_secs(1));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_retry_ask_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = GeminiClient::new("key", "gemini-test")
            .unwrap()
            .with_base_url(server.uri());
        let retry = RetryAsk::new(client, 2, StdDuration::ZERO);

        assert!(retry.ask("hello").await.is_err());
        server.verify().await;
    }

    #[test]
    fn test_non_http_errors_are_retryable() {
        let e: Box<dyn Error> = "connection reset".into();
        assert!(is_retryable(e.as_ref()));
    }

    #[tokio::test]
    async fn test_gemini_client_extracts_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": "Hi "}, {"text": "there"}], "role": "model"},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new("secret", "gemini-test")
            .unwrap()
            .with_base_url(server.uri());
        let text = client.ask("hello").await.unwrap();
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn test_gemini_client_errors_on_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = GeminiClient::new("bad", "gemini-test")
            .unwrap()
            .with_base_url(server.uri());
        assert!(client.ask("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_gemini_client_errors_without_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new("key", "gemini-test")
            .unwrap()
            .with_base_url(server.uri());
        let err = client.ask("hello").await.unwrap_err();
        assert!(err.to_string().contains("no candidates"));
    }

    #[test]
    fn test_gemini_client_debug_hides_key() {
        let client = GeminiClient::new("super-secret", DEFAULT_MODEL).unwrap();
        assert!(!format!("{:?}", client).contains("super-secret"));
    }
}
