//! # Ticker Digest
//!
//! A news aggregation and summarization pipeline for stock tickers. Headlines
//! are scraped from several financial sources, a language model picks the
//! most relevant ones and writes a daily summary, and summaries are kept in a
//! rolling seven-day history per ticker.
//!
//! ## Architecture
//!
//! The crate follows a pipeline architecture:
//! 1. **Aggregation** ([`aggregate`]): Finviz, Polygon.io and TradingView
//!    headlines, deduplicated by URL
//! 2. **Selection** ([`select`]): the model chooses 5–7 articles, with a
//!    first-five fallback
//! 3. **Summarization** ([`summarize`]): a summary that compares today with
//!    earlier days and ends with a "What changed today" section
//! 4. **History** ([`store`]): one record per ticker per day, newest seven kept
//!
//! [`pipeline::refresh`] runs all four steps. Every step degrades instead of
//! failing: dead sources contribute nothing, model errors fall back or are
//! reported inline, and a corrupted history file reads as empty.

pub mod aggregate;
pub mod api;
pub mod cli;
pub mod models;
pub mod pipeline;
pub mod scrapers;
pub mod select;
pub mod store;
pub mod summarize;
pub mod utils;

pub use aggregate::{Aggregator, aggregate};
pub use api::{AskAsync, GeminiClient, RetryAsk};
pub use models::{Article, Credentials, Source, SummaryRecord};
pub use pipeline::{RefreshOutcome, refresh};
pub use select::select_top_articles;
pub use store::HistoryStore;
pub use summarize::generate_summary;
