//! Metrics extractors
//!
//! Each extractor reads a document through [`DocumentAccess`] and writes one
//! category of the [`MetricsBag`]. A failing extractor records its error on its
//! own slot and the remaining extractors still run.

mod agent;
mod content;
mod document;
mod pricing;
mod state;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use agent::{
    AriaAttributes, FormPatterns, LlmsTxtSignals, RobotsSignals, SecurityHeaders, SemanticHtml,
    StructuredData, STANDARD_FIELD_NAMES,
};
pub use content::{
    estimate_pixel_width, HeadingMetrics, MetaDescriptionMetrics, TitleMetrics,
    HEADING_MAX_LENGTH, META_DESC_MAX_LENGTH, META_DESC_MIN_LENGTH, TITLE_MAX_LENGTH,
    TITLE_MIN_LENGTH,
};
pub use document::{DocumentAccess, HtmlDocument, Node, PageInputs};
pub use pricing::{mentions_price, PricingExposure};
pub use state::{DataAttributes, ErrorHandling};

/// Errors raised inside an extractor
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Invalid selector {0}")]
    InvalidSelector(String),

    #[error("Extraction failed: {0}")]
    Internal(String),
}

/// Signature shared by every extractor
pub type Extractor = fn(&dyn DocumentAccess, &PageInputs, &mut MetricsBag) -> Result<(), ExtractError>;

/// One category's result: metrics on success, the error message otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot<T> {
    pub metrics: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            metrics: None,
            error: None,
        }
    }
}

impl<T> Slot<T> {
    pub fn set(&mut self, metrics: T) {
        self.metrics = Some(metrics);
        self.error = None;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    /// Metrics, if the extractor succeeded
    pub fn get(&self) -> Option<&T> {
        self.metrics.as_ref()
    }
}

/// Per-document metrics, one slot per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsBag {
    #[serde(rename = "semanticHTML")]
    pub semantic_html: Slot<SemanticHtml>,
    pub structured_data: Slot<StructuredData>,
    pub form_patterns: Slot<FormPatterns>,
    pub llms_txt: Slot<LlmsTxtSignals>,
    pub security_headers: Slot<SecurityHeaders>,
    pub robots_txt: Slot<RobotsSignals>,
    pub data_attributes: Slot<DataAttributes>,
    pub error_handling: Slot<ErrorHandling>,
    pub aria_attributes: Slot<AriaAttributes>,
    pub title: Slot<TitleMetrics>,
    pub meta_description: Slot<MetaDescriptionMetrics>,
    pub headings: Slot<HeadingMetrics>,
}

impl MetricsBag {
    /// Records an extractor failure under its category key
    pub fn record_error(&mut self, category: &str, error: impl Into<String>) {
        let error = error.into();
        match category {
            "semanticHTML" => self.semantic_html.fail(error),
            "structuredData" => self.structured_data.fail(error),
            "formPatterns" => self.form_patterns.fail(error),
            "llmsTxt" => self.llms_txt.fail(error),
            "securityHeaders" => self.security_headers.fail(error),
            "robotsTxt" => self.robots_txt.fail(error),
            "dataAttributes" => self.data_attributes.fail(error),
            "errorHandling" => self.error_handling.fail(error),
            "ariaAttributes" => self.aria_attributes.fail(error),
            "title" => self.title.fail(error),
            "metaDescription" => self.meta_description.fail(error),
            "headings" => self.headings.fail(error),
            other => tracing::warn!("Unknown metrics category {}: {}", other, error),
        }
    }

    /// Categories whose extractor recorded an error
    pub fn failed_categories(&self) -> Vec<&'static str> {
        let slots: [(&'static str, bool); 12] = [
            ("semanticHTML", self.semantic_html.error.is_some()),
            ("structuredData", self.structured_data.error.is_some()),
            ("formPatterns", self.form_patterns.error.is_some()),
            ("llmsTxt", self.llms_txt.error.is_some()),
            ("securityHeaders", self.security_headers.error.is_some()),
            ("robotsTxt", self.robots_txt.error.is_some()),
            ("dataAttributes", self.data_attributes.error.is_some()),
            ("errorHandling", self.error_handling.error.is_some()),
            ("ariaAttributes", self.aria_attributes.error.is_some()),
            ("title", self.title.error.is_some()),
            ("metaDescription", self.meta_description.error.is_some()),
            ("headings", self.headings.error.is_some()),
        ];
        slots
            .into_iter()
            .filter(|(_, failed)| *failed)
            .map(|(name, _)| name)
            .collect()
    }
}

/// Extractors in the order they run
pub const EXTRACTORS: &[(&str, Extractor)] = &[
    ("semanticHTML", agent::extract_semantic_html),
    ("structuredData", agent::extract_structured_data),
    ("formPatterns", agent::extract_form_patterns),
    ("llmsTxt", agent::extract_llms_txt),
    ("securityHeaders", agent::extract_security_headers),
    ("robotsTxt", agent::extract_robots_signals),
    ("dataAttributes", state::extract_data_attributes),
    ("errorHandling", state::extract_error_handling),
    ("ariaAttributes", agent::extract_aria_attributes),
    ("title", content::extract_title),
    ("metaDescription", content::extract_meta_description),
    ("headings", content::extract_headings),
];

/// Runs every extractor against one document
///
/// # Arguments
///
/// * `doc` - The document to inspect (served or rendered)
/// * `inputs` - URL and response headers of the page
///
/// # Returns
///
/// A bag with one slot per category. Extractor failures never abort the run;
/// they are logged and stored as that slot's `error`.
pub fn collect_metrics(doc: &dyn DocumentAccess, inputs: &PageInputs) -> MetricsBag {
    let mut bag = MetricsBag::default();
    run_extractors(EXTRACTORS, doc, inputs, &mut bag);
    bag
}

/// Runs the given extractors in sequence into an existing bag
pub fn run_extractors(
    extractors: &[(&str, Extractor)],
    doc: &dyn DocumentAccess,
    inputs: &PageInputs,
    bag: &mut MetricsBag,
) {
    for (category, extractor) in extractors {
        if let Err(e) = extractor(doc, inputs, bag) {
            tracing::warn!("Extractor {} failed for {}: {}", category, inputs.url, e);
            bag.record_error(category, e.to_string());
        }
    }
}

/// Parses HTML and collects its metrics in one step
pub fn collect_from_html(html: &str, inputs: &PageInputs) -> MetricsBag {
    let doc = HtmlDocument::parse(html);
    collect_metrics(&doc, inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Document stub whose every query fails
    struct BrokenDocument;

    impl DocumentAccess for BrokenDocument {
        fn select(&self, selector: &str) -> Result<Vec<Node>, ExtractError> {
            Err(ExtractError::Internal(format!("cannot query {}", selector)))
        }
    }

    /// Document stub that only knows about `<title>`
    struct TitleOnly;

    impl DocumentAccess for TitleOnly {
        fn select(&self, selector: &str) -> Result<Vec<Node>, ExtractError> {
            if selector == "title" {
                Ok(vec![Node {
                    tag: "title".to_string(),
                    text: "Running shoes for trail and road | Example".to_string(),
                    attributes: Default::default(),
                    position: 3,
                    outer_html: String::new(),
                }])
            } else if selector.starts_with("meta") {
                Err(ExtractError::Internal("meta lookup exploded".to_string()))
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[test]
    fn test_every_category_filled() {
        let bag = collect_from_html(
            "<html><head><title>Example</title></head><body><main><h1>Hi</h1></main></body></html>",
            &PageInputs::new("https://example.com/"),
        );
        assert!(bag.failed_categories().is_empty());
        assert!(bag.semantic_html.get().is_some_and(|s| s.has_main));
        assert!(bag.title.get().is_some());
        assert!(bag.headings.get().is_some());
        assert!(bag.security_headers.get().is_some());
    }

    #[test]
    fn test_failures_recorded_per_category() {
        let bag = collect_metrics(&BrokenDocument, &PageInputs::new("https://example.com/"));
        assert_eq!(bag.failed_categories().len(), 12);
        assert!(bag.title.get().is_none());
        assert!(bag
            .title
            .error
            .as_deref()
            .is_some_and(|e| e.contains("cannot query")));
    }

    #[test]
    fn test_one_failure_does_not_stop_others() {
        let bag = collect_metrics(&TitleOnly, &PageInputs::new("https://example.com/"));
        assert!(bag.title.get().is_some_and(|t| t.missing == 0));
        assert!(bag.meta_description.error.is_some());
        assert!(bag.headings.get().is_some_and(|h| h.missing == 1));
    }

    #[test]
    fn test_bag_serializes_with_category_keys() {
        let bag = collect_from_html("<html></html>", &PageInputs::new("https://example.com/"));
        let json = serde_json::to_value(&bag).unwrap();
        for key in [
            "semanticHTML",
            "structuredData",
            "formPatterns",
            "llmsTxt",
            "securityHeaders",
            "robotsTxt",
            "dataAttributes",
            "errorHandling",
            "ariaAttributes",
            "title",
            "metaDescription",
            "headings",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(json["title"]["metrics"]["missing"], 1);
    }
}
