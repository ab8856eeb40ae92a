//! Command-line interface definitions for Ticker Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! API keys are read from the environment unless passed explicitly.

use crate::api::DEFAULT_MODEL;
use crate::models::Credentials;
use crate::store::DEFAULT_DATA_FILE;
use crate::utils::normalize_ticker;
use clap::Parser;

/// Tickers refreshed when none are given and the history file is empty.
pub const DEFAULT_TICKERS: [&str; 3] = ["AAPL", "GOOGL", "MSFT"];

/// Command-line arguments for the Ticker Digest application.
///
/// # Examples
///
/// ```sh
/// # Refresh two tickers
/// ticker_digest AAPL nvda
///
/// # Refresh every ticker already in the history file, without Chromium
/// ticker_digest --no-browser
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Tickers to refresh (defaults to every ticker with stored history)
    pub tickers: Vec<String>,

    /// Path to the summary history JSON file
    #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
    pub data_file: String,

    /// Gemini model used for selection and summarization
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Retries for failed model calls
    #[arg(long, default_value_t = 3)]
    pub max_retries: usize,

    /// Skip the TradingView scraper (requires a local Chromium)
    #[arg(long)]
    pub no_browser: bool,

    /// Polygon.io API key
    #[arg(long, env = "POLYGON_API_KEY", hide_env_values = true)]
    pub polygon_api_key: String,

    /// Google Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,
}

impl Cli {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            polygon_api_key: self.polygon_api_key.clone(),
            gemini_api_key: self.gemini_api_key.clone(),
        }
    }

    /// Normalized, de-duplicated tickers from the command line, in order.
    pub fn requested_tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = Vec::new();
        for t in self.tickers.iter().map(|t| normalize_ticker(t)) {
            if !t.is_empty() && !tickers.contains(&t) {
                tickers.push(t);
            }
        }
        tickers
    }
}

/// Pick which tickers to refresh: explicit ones first, then stored ones,
/// then [`DEFAULT_TICKERS`].
pub fn resolve_tickers(requested: Vec<String>, stored: Vec<String>) -> Vec<String> {
    if !requested.is_empty() {
        requested
    } else if !stored.is_empty() {
        stored
    } else {
        DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect()
    }
}
