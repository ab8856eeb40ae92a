//! # Ticker Digest
//!
//! Refreshes the daily news summary for one or more stock tickers and prints
//! the result.
//!
//! ## Usage
//!
//! ```sh
//! POLYGON_API_KEY=... GEMINI_API_KEY=... ticker_digest AAPL MSFT
//! ```

use chrono::Local;
use clap::Parser;
use std::error::Error;
use ticker_digest::api::build_model;
use ticker_digest::cli::{Cli, resolve_tickers};
use ticker_digest::pipeline::{RefreshOutcome, refresh};
use ticker_digest::scrapers::Endpoints;
use ticker_digest::{Aggregator, HistoryStore, SummaryRecord};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ticker_digest starting up");

    let args = Cli::parse();
    debug!(data_file = %args.data_file, model = %args.model, no_browser = args.no_browser, "Parsed CLI arguments");

    let credentials = args.credentials();
    let store = HistoryStore::new(&args.data_file);
    let model = build_model(&credentials.gemini_api_key, &args.model, args.max_retries)?;
    let mut aggregator = Aggregator::new(Endpoints::default())?;
    if args.no_browser {
        aggregator = aggregator.without_browser();
    }

    let tickers = resolve_tickers(args.requested_tickers(), store.ticker_list().await);
    info!(?tickers, "Refreshing tickers");

    for ticker in &tickers {
        let today = Local::now().date_naive();
        match refresh(&aggregator, &model, &store, ticker, &credentials, today).await {
            RefreshOutcome::NoArticles => {
                warn!(%ticker, "No articles found; history unchanged");
                println!("== {ticker} ==\nCould not find any recent articles for this ticker.\n");
            }
            RefreshOutcome::Updated { record, persisted } => {
                if !persisted {
                    warn!(%ticker, "Summary generated but not saved");
                }
                print_record(ticker, &record);
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

fn print_record(ticker: &str, record: &SummaryRecord) {
    println!("== {ticker} ({}) ==\n{}\n", record.date, record.summary);
    if record.sources.is_empty() {
        println!("No specific sources were used for this summary.\n");
        return;
    }
    println!("Sources:");
    for source in &record.sources {
        println!("- {} ({}) via {}", source.title, source.url, source.source);
    }
    println!();
}
