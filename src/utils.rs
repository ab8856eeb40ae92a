//! Utility functions for string handling, model output cleanup, and file system setup.
//!
//! This module provides helper functions used throughout the crate:
//! - Ticker normalization
//! - String truncation for logging
//! - Code-fence stripping and JSON error classification for model responses
//! - Parent directory creation for the history file

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z]*").unwrap());

/// Normalize a user-supplied ticker symbol: trimmed and uppercased.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_ticker(" nvda "), "NVDA");
/// ```
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to the
/// nearest character boundary) with an ellipsis and byte count indicator
/// appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Remove Markdown code-fence markers a model may wrap around its answer.
///
/// Both the opening marker (with an optional language tag, e.g. ```` ```json ````)
/// and the closing marker are removed, and the result is trimmed.
pub fn strip_code_fences(s: &str) -> String {
    CODE_FENCE.replace_all(s.trim(), "").trim().to_string()
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the model response is cut off (e.g., due to token limits), the
/// resulting JSON fails to parse with an EOF error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure the directory that will hold `path` exists.
///
/// Paths without a parent component (a bare filename) are left alone.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).await?;
            debug!(dir = %dir.display(), "Ensured parent directory");
            Ok(())
        }
        _ => Ok(()),
    }
}
