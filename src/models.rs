//! Data models for scraped articles and persisted daily summaries.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`Article`]: A normalized headline produced by one of the scrapers
//! - [`Source`]: The outlet an article was discovered on
//! - [`SummaryRecord`]: One day's summary for a ticker, with the articles it used
//! - [`Credentials`]: API keys needed by the Polygon scraper and the LLM client
//!
//! Articles are never persisted on their own; they only survive as the
//! `sources` of a [`SummaryRecord`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outlet an [`Article`] was scraped from.
///
/// Serialized with the outlet's display name so the history file stays
/// readable (`"Finviz"`, `"Polygon.io"`, `"TradingView"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Source {
    #[serde(rename = "Finviz")]
    Finviz,
    #[serde(rename = "Polygon.io")]
    Polygon,
    #[serde(rename = "TradingView")]
    TradingView,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::Finviz => "Finviz",
            Source::Polygon => "Polygon.io",
            Source::TradingView => "TradingView",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A news headline as normalized by a scraper.
///
/// The `url` is the identity key: two articles with the same URL are the
/// same article, regardless of title or source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// Headline text, trimmed.
    pub title: String,
    /// Absolute link to the story.
    pub url: String,
    /// Outlet the headline was found on.
    pub source: Source,
}

impl Article {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: Source) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source,
        }
    }
}

/// A single day's summary for one ticker.
///
/// The store keeps at most one record per ticker per `date`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SummaryRecord {
    /// Local calendar date in `YYYY-MM-DD` format.
    pub date: String,
    /// Model-generated summary text (or the inline error/no-news message).
    pub summary: String,
    /// The selected articles the summary was generated from.
    pub sources: Vec<Article>,
}

/// API keys for the external services.
///
/// Acquisition is the caller's business; the binary reads them from the
/// environment via [`crate::cli::Cli`].
#[derive(Clone, Default)]
pub struct Credentials {
    pub polygon_api_key: String,
    pub gemini_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("polygon_api_key", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .finish()
    }
}
