//! Pattern extraction
//!
//! A batch pass over finished page results. Pages scoring at or above both
//! thresholds are mined for markup that explains their scores, and the
//! examples are written to `pattern_library.md`.

mod library;

use crate::audit::PageAuditResult;
use crate::config::PatternConfig;
use crate::context::AuditContext;
use crate::metrics::{DocumentAccess, HtmlDocument, MetricsBag, Node};
use crate::output::{write_text, OutputError};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use library::format_pattern_library;

pub const PATTERN_LIBRARY_FILE: &str = "pattern_library.md";

/// Longest snippet kept per example, in characters
const MAX_SNIPPET_CHARS: usize = 600;

/// Elements quoted per example when a category lists several
const ELEMENTS_PER_SNIPPET: usize = 3;

/// Thresholds and caps for one extraction pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOptions {
    pub min_served_score: u32,
    pub min_rendered_score: u32,
    pub max_examples: usize,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self::from(&PatternConfig::default())
    }
}

impl From<&PatternConfig> for PatternOptions {
    fn from(config: &PatternConfig) -> Self {
        Self {
            min_served_score: config.min_served_score,
            min_rendered_score: config.min_rendered_score,
            max_examples: config.max_examples,
        }
    }
}

/// A markup snippet taken from a qualifying page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternExample {
    pub url: String,
    pub snippet: String,
}

/// Examples collected for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternEntry {
    pub category: String,
    pub description: String,
    pub examples: Vec<PatternExample>,
}

/// Outcome of an extraction pass
///
/// `success == false` means no page qualified; that is a normal outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    pub success: bool,
    pub message: String,
    pub qualifying_pages: usize,
    pub patterns: Vec<PatternEntry>,
    pub output_path: Option<PathBuf>,
}

type SnippetFinder = fn(&MetricsBag, &HtmlDocument) -> Option<String>;

/// Categories in report order: key, description, snippet finder
const CATEGORIES: &[(&str, &str, SnippetFinder)] = &[
    (
        "structuredData",
        "Schema.org data as JSON-LD or microdata, readable without executing scripts",
        structured_data_snippet,
    ),
    (
        "semanticHTML",
        "Landmark elements (header, nav, main, article, footer) outlining the page",
        semantic_html_snippet,
    ),
    (
        "formFields",
        "Form fields with standard names, labels and autocomplete hints",
        form_fields_snippet,
    ),
    (
        "dynamicState",
        "data-* attributes exposing UI state such as loading or validation",
        dynamic_state_snippet,
    ),
    (
        "persistentErrors",
        "Error messages in alert live regions that stay in the DOM",
        persistent_errors_snippet,
    ),
];

/// Mines high-scoring pages for reusable markup patterns
///
/// Every category collects at most `options.max_examples` examples across the
/// whole batch. Once a category is full, later pages are skipped for that
/// category only.
///
/// # Arguments
///
/// * `results` - Finished page results
/// * `output_dir` - Directory receiving `pattern_library.md`
/// * `ctx` - Run context (domain and run id for the report header)
/// * `options` - Thresholds and example cap
///
/// # Returns
///
/// * `Ok(PatternReport)` - Extraction finished (possibly with no qualifying pages)
/// * `Err(OutputError)` - The pattern library could not be written
pub async fn extract_patterns(
    results: &[PageAuditResult],
    output_dir: &Path,
    ctx: &AuditContext,
    options: &PatternOptions,
) -> Result<PatternReport, OutputError> {
    let qualifying: Vec<&PageAuditResult> = results
        .iter()
        .filter(|page| page.meets_thresholds(options.min_served_score, options.min_rendered_score))
        .collect();

    tracing::info!("Found {} high-scoring pages", qualifying.len());

    if qualifying.is_empty() {
        return Ok(PatternReport {
            success: false,
            message: format!(
                "No high-scoring pages found (served >= {}, rendered >= {})",
                options.min_served_score, options.min_rendered_score
            ),
            qualifying_pages: 0,
            patterns: Vec::new(),
            output_path: None,
        });
    }

    let patterns = collect_patterns(&qualifying, options.max_examples);

    let path = output_dir.join(PATTERN_LIBRARY_FILE);
    let markdown = format_pattern_library(&ctx.domain(), qualifying.len(), &patterns, options);
    write_text(&path, &markdown).await?;
    tracing::info!("Wrote {}", path.display());

    Ok(PatternReport {
        success: true,
        message: format!("Extracted patterns from {} high-scoring pages", qualifying.len()),
        qualifying_pages: qualifying.len(),
        patterns,
        output_path: Some(path),
    })
}

/// Fills every category from the qualifying pages, respecting the cap
fn collect_patterns(pages: &[&PageAuditResult], max_examples: usize) -> Vec<PatternEntry> {
    let mut patterns: Vec<PatternEntry> = CATEGORIES
        .iter()
        .map(|(category, description, _)| PatternEntry {
            category: category.to_string(),
            description: description.to_string(),
            examples: Vec::new(),
        })
        .collect();

    for page in pages {
        if patterns.iter().all(|p| p.examples.len() >= max_examples) {
            break;
        }
        let Some(bag) = page.rendered_metrics.as_ref().or(page.served_metrics.as_ref()) else {
            continue;
        };
        let Some(html) = page.rendered_html.as_deref().or(page.served_html.as_deref()) else {
            continue;
        };
        let document = HtmlDocument::parse(html);

        for (entry, (_, _, finder)) in patterns.iter_mut().zip(CATEGORIES) {
            if entry.examples.len() >= max_examples {
                continue;
            }
            if let Some(snippet) = finder(bag, &document) {
                entry.examples.push(PatternExample {
                    url: page.url.clone(),
                    snippet,
                });
            }
        }
    }

    patterns
}

fn structured_data_snippet(bag: &MetricsBag, doc: &HtmlDocument) -> Option<String> {
    let data = bag.structured_data.get()?;
    if data.has_json_ld {
        let node = doc.first(r#"script[type="application/ld+json"]"#).ok()??;
        return Some(truncate(node.outer_html.trim()));
    }
    if data.has_microdata {
        let node = doc.first("[itemscope]").ok()??;
        return Some(truncate(&opening_tag(&node)));
    }
    None
}

fn semantic_html_snippet(bag: &MetricsBag, doc: &HtmlDocument) -> Option<String> {
    let semantic = bag.semantic_html.get()?;
    if !semantic.has_main {
        return None;
    }
    let landmarks = doc
        .select("header, nav, main, article, section, aside, footer")
        .ok()?;
    let outline: Vec<String> = landmarks.iter().take(12).map(opening_tag).collect();
    Some(truncate(&outline.join("\n")))
}

fn form_fields_snippet(bag: &MetricsBag, doc: &HtmlDocument) -> Option<String> {
    let forms = bag.form_patterns.get()?;
    if forms.standard_named_fields == 0 {
        return None;
    }
    let mut fields = doc.select("input[name][autocomplete], select[name][autocomplete]").ok()?;
    if fields.is_empty() {
        fields = doc.select("input[name], select[name], textarea[name]").ok()?;
    }
    quote_elements(&fields)
}

fn dynamic_state_snippet(bag: &MetricsBag, doc: &HtmlDocument) -> Option<String> {
    let data = bag.data_attributes.get()?;
    if data.total_data_attributes == 0 {
        return None;
    }
    let nodes = doc
        .select("[data-state], [data-authenticated], [data-validation-state], [data-error-code], [data-loading]")
        .ok()?;
    quote_elements(&nodes)
}

fn persistent_errors_snippet(bag: &MetricsBag, doc: &HtmlDocument) -> Option<String> {
    let errors = bag.error_handling.get()?;
    if !errors.has_persistent_errors {
        return None;
    }
    let node = doc.first(r#"[role="alert"]"#).ok()??;
    Some(truncate(node.outer_html.trim()))
}

fn quote_elements(nodes: &[Node]) -> Option<String> {
    if nodes.is_empty() {
        return None;
    }
    let tags: Vec<String> = nodes.iter().take(ELEMENTS_PER_SNIPPET).map(opening_tag).collect();
    Some(truncate(&tags.join("\n")))
}

/// Renders an element's start tag with its attributes
fn opening_tag(node: &Node) -> String {
    let mut tag = format!("<{}", node.tag);
    for (name, value) in &node.attributes {
        if value.is_empty() {
            tag.push_str(&format!(" {}", name));
        } else {
            tag.push_str(&format!(" {}=\"{}\"", name, value.replace('"', "&quot;")));
        }
    }
    tag.push('>');
    tag
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_SNIPPET_CHARS {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(MAX_SNIPPET_CHARS).collect();
        cut.push_str("...");
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::PageStatus;
    use crate::discovery::UrlSource;
    use crate::metrics::{collect_from_html, PageInputs};
    use tempfile::TempDir;

    const RICH_PAGE: &str = r#"<!doctype html>
<html><head><title>Running shoes</title>
<script type="application/ld+json">{"@context":"https://schema.org","@type":"Product","name":"Trail 2"}</script>
</head><body>
<header><nav><a href="/">Home</a></nav></header>
<main>
  <form data-state="idle">
    <label for="email">Email</label>
    <input id="email" name="email" type="email" autocomplete="email">
  </form>
  <div role="alert" aria-live="assertive">Card declined</div>
</main>
<footer>Contact</footer>
</body></html>"#;

    fn page(url: &str, served: u32, rendered: u32) -> PageAuditResult {
        let mut page = PageAuditResult::new(url, UrlSource::Sitemap);
        page.status = PageStatus::Audited;
        page.served_score = Some(served);
        page.rendered_score = Some(rendered);
        page.rendered_html = Some(RICH_PAGE.to_string());
        page.rendered_metrics = Some(collect_from_html(RICH_PAGE, &PageInputs::new(url)));
        page
    }

    fn context(dir: &Path) -> AuditContext {
        let toml = format!(
            "[audit]\ntarget = \"https://example.com/\"\n[output]\ndirectory = \"{}\"\n",
            dir.display()
        );
        AuditContext::from_toml(&toml).unwrap()
    }

    #[tokio::test]
    async fn test_no_results() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());

        let report = extract_patterns(&[], dir.path(), &ctx, &PatternOptions::default())
            .await
            .unwrap();

        assert!(!report.success);
        assert!(report.message.contains("No high-scoring pages found"));
        assert!(!dir.path().join(PATTERN_LIBRARY_FILE).exists());
    }

    #[tokio::test]
    async fn test_both_thresholds_required() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let results = vec![
            page("https://example.com/a", 75, 65),
            page("https://example.com/b", 65, 75),
            page("https://example.com/c", 80, 85),
        ];

        let report = extract_patterns(&results, dir.path(), &ctx, &PatternOptions::default())
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.qualifying_pages, 1);
    }

    #[tokio::test]
    async fn test_examples_capped_per_category() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let results: Vec<_> = (0..10)
            .map(|i| page(&format!("https://example.com/p{}", i), 90, 90))
            .collect();
        let options = PatternOptions {
            max_examples: 3,
            ..PatternOptions::default()
        };

        let report = extract_patterns(&results, dir.path(), &ctx, &options).await.unwrap();

        assert_eq!(report.qualifying_pages, 10);
        assert_eq!(report.patterns.len(), CATEGORIES.len());
        for pattern in &report.patterns {
            assert!(pattern.examples.len() <= 3, "{} over cap", pattern.category);
        }
        let structured = &report.patterns[0];
        assert_eq!(structured.category, "structuredData");
        assert_eq!(structured.examples.len(), 3);
        assert!(structured.examples[0].snippet.contains("schema.org"));
    }

    #[tokio::test]
    async fn test_writes_methodology() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let results = vec![page("https://example.com/", 80, 85)];

        let report = extract_patterns(&results, dir.path(), &ctx, &PatternOptions::default())
            .await
            .unwrap();

        let written = std::fs::read_to_string(report.output_path.unwrap()).unwrap();
        assert!(written.contains("## Methodology"));
        assert!(written.contains("high-scoring pages"));
        assert!(written.contains("served score >= 70"));
        assert!(written.contains("Card declined"));
    }

    #[test]
    fn test_snippets_by_category() {
        let bag = collect_from_html(RICH_PAGE, &PageInputs::new("https://example.com/"));
        let doc = HtmlDocument::parse(RICH_PAGE);

        let semantic = semantic_html_snippet(&bag, &doc).unwrap();
        assert!(semantic.starts_with("<header>"));
        assert!(semantic.contains("<main>"));

        let form = form_fields_snippet(&bag, &doc).unwrap();
        assert!(form.contains(r#"autocomplete="email""#));

        let state = dynamic_state_snippet(&bag, &doc).unwrap();
        assert_eq!(state, r#"<form data-state="idle">"#);
    }

    #[test]
    fn test_truncate() {
        let long = "x".repeat(MAX_SNIPPET_CHARS + 10);
        let cut = truncate(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), MAX_SNIPPET_CHARS + 3);
    }
}
