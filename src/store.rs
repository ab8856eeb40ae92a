//! Rolling seven-day summary history, persisted as a single JSON document.
//!
//! # File Format
//!
//! ```text
//! {
//!   "AAPL": [
//!     {"date": "2025-05-06", "summary": "...", "sources": [{"title": ..., "url": ..., "source": "Finviz"}]},
//!     {"date": "2025-05-05", ...}
//!   ]
//! }
//! ```
//!
//! Each ticker's list is newest-first and never longer than
//! [`MAX_HISTORY_DAYS`]. Every save rewrites the whole document through a
//! temporary file and a rename. A missing, empty or unreadable file is
//! treated as an empty store. There is no locking: concurrent writers race
//! and the last one wins.

use crate::models::{Article, SummaryRecord};
use crate::utils::{ensure_parent_dir, normalize_ticker};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Maximum number of daily records kept per ticker.
pub const MAX_HISTORY_DAYS: usize = 7;

/// Number of earlier summaries handed to the model as context.
pub const PROMPT_HISTORY_DAYS: usize = MAX_HISTORY_DAYS - 1;

/// Default location of the history document.
pub const DEFAULT_DATA_FILE: &str = "data/summaries.json";

type AllSummaries = BTreeMap<String, Vec<SummaryRecord>>;

/// Insert `record` into a newest-first history, replacing any record for the
/// same date and dropping the oldest entries beyond [`MAX_HISTORY_DAYS`].
pub fn insert_record(history: &mut Vec<SummaryRecord>, record: SummaryRecord) {
    history.retain(|r| r.date != record.date);
    history.insert(0, record);
    history.truncate(MAX_HISTORY_DAYS);
}

/// Earlier summaries to use as model context: stored days 2 through 7 as
/// `(date, summary)` pairs, skipping the latest record so a same-day refresh
/// is not compared against itself.
pub fn history_for_prompt(records: &[SummaryRecord]) -> Vec<(String, String)> {
    records
        .iter()
        .skip(1)
        .take(PROMPT_HISTORY_DAYS)
        .map(|r| (r.date.clone(), r.summary.clone()))
        .collect()
}

/// File-backed store of per-ticker summary histories.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save today's summary for `ticker`, keeping a rolling seven-day window.
    ///
    /// A second save on the same `today` replaces the earlier record for that
    /// day. The file and its directory are created on first write.
    #[instrument(level = "info", skip(self, summary, sources), fields(path = %self.path.display(), sources = sources.len()))]
    pub async fn save_summary(
        &self,
        ticker: &str,
        summary: &str,
        sources: &[Article],
        today: NaiveDate,
    ) -> Result<SummaryRecord, Box<dyn Error>> {
        let ticker = normalize_ticker(ticker);
        let mut all = self.load_all().await;

        let record = SummaryRecord {
            date: today.format("%Y-%m-%d").to_string(),
            summary: summary.to_string(),
            sources: sources.to_vec(),
        };
        let history = all.entry(ticker.clone()).or_default();
        insert_record(history, record.clone());
        let kept = history.len();

        self.write_all(&all).await?;
        info!(%ticker, date = %record.date, kept, "Saved summary");
        Ok(record)
    }

    /// All stored summaries for `ticker`, newest first. Unknown tickers
    /// yield an empty list.
    pub async fn get_summaries(&self, ticker: &str) -> Vec<SummaryRecord> {
        let ticker = normalize_ticker(ticker);
        self.load_all().await.remove(&ticker).unwrap_or_default()
    }

    /// Sorted list of every ticker with stored history.
    pub async fn ticker_list(&self) -> Vec<String> {
        self.load_all().await.into_keys().collect()
    }

    async fn load_all(&self) -> AllSummaries {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "History file does not exist yet");
                return AllSummaries::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read history file; treating as empty");
                return AllSummaries::new();
            }
        };

        if raw.trim().is_empty() {
            return AllSummaries::new();
        }

        match serde_json::from_str(&raw) {
            Ok(all) => all,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "History file is corrupted; treating as empty");
                AllSummaries::new()
            }
        }
    }

    async fn write_all(&self, all: &AllSummaries) -> Result<(), Box<dyn Error>> {
        ensure_parent_dir(&self.path).await?;
        let json = serde_json::to_string_pretty(all)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temporary history file");
            }
            return Err(e.into());
        }
        debug!(path = %self.path.display(), tickers = all.len(), "Wrote history file");
        Ok(())
    }
}
