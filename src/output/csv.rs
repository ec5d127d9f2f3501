//! CSV export
//!
//! Every cell is quoted, embedded quotes are doubled and missing values are
//! written as `""`, so spreadsheets never reinterpret a URL or a score.

use super::{OutputError, OutputResult};
use crate::audit::PageAuditResult;
use ::csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};

/// Columns of `pages.csv`
pub const PAGE_CSV_HEADERS: &[&str] = &[
    "url",
    "source",
    "status",
    "servedScore",
    "renderedScore",
    "seoScore",
    "accessibilityScore",
    "httpStatus",
    "servedFetchMs",
    "renderMs",
    "titleLength",
    "metaDescriptionLength",
    "h1Count",
    "accessibilityIssues",
    "error",
    "jsDependentPricing",
];

/// Formats records as CSV text with a header row
///
/// # Arguments
///
/// * `headers` - Column names
/// * `records` - Rows; `None` cells are written as empty quoted strings
///
/// # Returns
///
/// * `Ok(String)` - The CSV text, one `\n`-terminated line per row
/// * `Err(OutputError)` - A row's width differs from the header
pub fn format_csv(headers: &[&str], records: &[Vec<Option<String>>]) -> OutputResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for (index, record) in records.iter().enumerate() {
        if record.len() != headers.len() {
            return Err(OutputError::Format(format!(
                "row {} has {} cells, expected {}",
                index,
                record.len(),
                headers.len()
            )));
        }
        writer.write_record(record.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| OutputError::Format(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Format(e.to_string()))
}

/// Parses CSV text produced by [`format_csv`] into headers and rows
pub fn parse_csv(text: &str) -> OutputResult<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

fn cell<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// One `pages.csv` row per page result
pub fn pages_csv(pages: &[PageAuditResult]) -> OutputResult<String> {
    let records: Vec<Vec<Option<String>>> = pages
        .iter()
        .map(|page| {
            let served = page.served_metrics.as_ref();
            let perf = &page.performance_metrics;
            let source = serde_json::to_value(page.source)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string));
            vec![
                Some(page.url.clone()),
                source,
                Some(page.status.as_str().to_string()),
                cell(page.served_score),
                cell(page.rendered_score),
                cell(page.seo_score),
                cell(page.accessibility_score),
                cell(perf.http_status),
                cell(perf.served_fetch_ms),
                cell(perf.render_ms),
                cell(served.and_then(|b| b.title.get()).map(|t| t.length)),
                cell(served.and_then(|b| b.meta_description.get()).map(|m| m.length)),
                cell(served.and_then(|b| b.headings.get()).map(|h| h.h1_count)),
                Some(page.accessibility_issues.len().to_string()),
                page.error.clone(),
                page.pricing.map(|p| p.js_dependent.to_string()),
            ]
        })
        .collect();

    format_csv(PAGE_CSV_HEADERS, &records)
}
