//! Output module for audit results
//!
//! This module handles:
//! - Assembling the run's `results.json` document
//! - Aggregating per-page results into a run summary
//! - Exporting page rows as CSV
//! - Rendering a human-readable markdown summary

mod csv;
mod markdown;
mod results;
pub mod stats;

pub use self::csv::{format_csv, pages_csv, parse_csv, PAGE_CSV_HEADERS};
pub use markdown::format_markdown_summary;
pub use results::{AuditResults, RunMetadata};
pub use stats::{print_summary, Summary};

use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RESULTS_FILE: &str = "results.json";
pub const PAGES_CSV_FILE: &str = "pages.csv";
pub const SUMMARY_FILE: &str = "summary.md";

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes a text file, creating the parent directory first
pub async fn write_text(path: &Path, content: &str) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| OutputError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|source| OutputError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes `results.json` (pretty-printed) into `dir`
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - Serialization or write failure
pub async fn write_results_json(dir: &Path, results: &AuditResults) -> OutputResult<PathBuf> {
    let path = dir.join(RESULTS_FILE);
    let json = serde_json::to_string_pretty(results)?;
    write_text(&path, &json).await?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}

/// Writes `pages.csv` into `dir`
pub async fn write_pages_csv(dir: &Path, results: &AuditResults) -> OutputResult<PathBuf> {
    let path = dir.join(PAGES_CSV_FILE);
    let csv = pages_csv(&results.pages)?;
    write_text(&path, &csv).await?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}

/// Writes `summary.md` into `dir`
pub async fn write_markdown_summary(dir: &Path, results: &AuditResults) -> OutputResult<PathBuf> {
    let path = dir.join(SUMMARY_FILE);
    write_text(&path, &format_markdown_summary(results)).await?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}
