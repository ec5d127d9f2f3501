//! Scoring engine
//!
//! Reduces a [`MetricsBag`] to bounded composite scores. All weights come from
//! a [`ScoringWeights`] table; nothing here hard-codes a point value. Every
//! score is rounded and clamped to `0..=100`.

mod weights;

pub use weights::{
    AccessibilityWeights, DataAttributeWeights, ErrorHandlingWeights, FormFieldWeights,
    LlmsTxtWeights, PricingWeights, RenderedWeights, RobotsWeights, ScoringWeights, SecurityHeaderWeights,
    SemanticHtmlWeights, SeoWeights, ServedWeights, StructuredDataWeights, DEFAULT_WEIGHTS,
};

use crate::metrics::{MetricsBag, PricingExposure};
use serde::{Deserialize, Serialize};

/// Rounds and clamps a raw weighted sum into a score
pub fn clamp_score(raw: f64) -> u32 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u32
}

/// Weighted sum for the served baseline, before clamping
fn served_raw(bag: &MetricsBag, weights: &ServedWeights) -> f64 {
    let mut score = 0.0;

    if let Some(sem) = bag.semantic_html.get() {
        let w = &weights.semantic_html;
        if sem.has_main {
            score += w.has_main;
        }
        if sem.has_nav {
            score += w.has_nav;
        }
        if sem.has_header {
            score += w.has_header;
        }
        if sem.has_footer {
            score += w.has_footer;
        }
        if sem.has_article || sem.has_section {
            score += w.has_article_or_section;
        }
    }

    if let Some(form) = bag.form_patterns.get() {
        let w = &weights.form_fields;
        score += form.standard_name_ratio * w.standard_name_ratio;
        score += form.label_ratio * w.label_ratio;
        score += form.autocomplete_ratio * w.autocomplete_ratio;
    }

    if let Some(sd) = bag.structured_data.get() {
        let w = &weights.structured_data;
        if sd.has_schema_org {
            score += w.has_schema_org;
        }
        if sd.has_json_ld && sd.json_ld_count > sd.invalid_json_ld {
            score += w.has_json_ld;
        }
        if sd.has_microdata {
            score += w.has_microdata;
        }
    }

    if let Some(llms) = bag.llms_txt.get() {
        if llms.has_llms_txt_reference || llms.has_llms_txt_meta {
            score += weights.llms_txt.presence;
        }
    }

    if let Some(robots) = bag.robots_txt.get() {
        if robots.has_ai_txt_reference {
            score += weights.robots.has_ai_txt;
        }
        if robots.has_agent_restrictions {
            score += weights.robots.agent_restrictions;
        }
    }

    if let Some(sec) = bag.security_headers.get() {
        let w = &weights.security_headers;
        if sec.has_hsts {
            score += w.has_hsts;
        }
        if sec.has_csp {
            score += w.has_csp;
        }
        if sec.has_x_frame_options {
            score += w.has_x_frame_options;
        }
        if sec.has_x_content_type_options {
            score += w.has_x_content_type_options;
        }
    }

    score
}

/// Bonus for dynamic-state affordances, before the cap
fn rendered_bonus(bag: &MetricsBag, weights: &RenderedWeights) -> f64 {
    let mut bonus = 0.0;

    if let Some(data) = bag.data_attributes.get() {
        let w = &weights.data_attributes;
        if data.has_data_state {
            bonus += w.has_data_state;
        }
        if data.has_validation_state {
            bonus += w.has_validation_state;
        }
        if data.has_loading_indicators {
            bonus += w.has_loading_indicators;
        }
    }

    if let Some(errors) = bag.error_handling.get() {
        let w = &weights.error_handling;
        if errors.has_persistent_errors {
            bonus += w.has_persistent_errors;
        }
        if errors.has_aria_invalid {
            bonus += w.has_aria_invalid;
        }
    }

    bonus
}

/// Score for the served (pre-script) document
pub fn served_score(bag: &MetricsBag, weights: &ScoringWeights) -> u32 {
    clamp_score(served_raw(bag, &weights.served))
}

/// Score for the rendered document
///
/// The served formula applied to the rendered bag, plus the dynamic-state bonus
/// capped at `rendered.max-bonus`.
pub fn rendered_score(bag: &MetricsBag, weights: &ScoringWeights) -> u32 {
    rendered_score_with_pricing(bag, None, weights)
}

/// [`rendered_score`] with the served-versus-rendered price comparison applied
///
/// Script-only pricing adds `rendered.pricing.js-dependent` to the bonus band
/// before the cap, so the rendered score can fall below the served one.
pub fn rendered_score_with_pricing(
    bag: &MetricsBag,
    pricing: Option<&PricingExposure>,
    weights: &ScoringWeights,
) -> u32 {
    let mut bonus = rendered_bonus(bag, &weights.rendered);
    if pricing.is_some_and(|p| p.js_dependent) {
        bonus += weights.rendered.pricing.js_dependent;
    }
    let bonus = bonus.min(weights.rendered.max_bonus);
    clamp_score(served_raw(bag, &weights.served) + bonus)
}

/// Search-snippet quality: title, meta description and heading structure
pub fn seo_score(bag: &MetricsBag, weights: &ScoringWeights) -> u32 {
    let w = &weights.seo;
    let mut score = 0.0;

    if let Some(title) = bag.title.get() {
        if title.missing == 0 {
            score += w.title_present;
            if title.too_long == 0 && title.too_short == 0 {
                score += w.title_length_ok;
            }
        }
    }

    if let Some(meta) = bag.meta_description.get() {
        if meta.missing == 0 {
            score += w.meta_description_present;
            if meta.too_long == 0 && meta.too_short == 0 {
                score += w.meta_description_length_ok;
            }
        }
    }

    if let Some(headings) = bag.headings.get() {
        if headings.h1_count == 1 {
            score += w.single_h1;
        }
        if headings.h1_count + headings.h2_count > 0 && headings.too_long == 0 {
            score += w.no_long_headings;
        }
        if headings.missing == 0 && headings.non_sequential == 0 {
            score += w.sequential_headings;
        }
    }

    clamp_score(score)
}

/// How well assistive technology can navigate and operate the page
pub fn accessibility_score(bag: &MetricsBag, weights: &ScoringWeights) -> u32 {
    let w = &weights.accessibility;
    let mut score = 0.0;

    if let Some(form) = bag.form_patterns.get() {
        score += form.label_ratio * w.label_ratio;
    }

    let semantic = bag.semantic_html.get();
    let aria = bag.aria_attributes.get();

    if semantic.is_some_and(|s| s.has_main) {
        score += w.has_main;
    }

    let has_live_region = bag.error_handling.get().is_some_and(|e| e.has_aria_live)
        || aria.is_some_and(|a| a.aria_live_count > 0);
    if has_live_region {
        score += w.has_aria_live;
    }

    if bag.headings.get().is_some_and(|h| h.h1_count > 0) {
        score += w.has_h1;
    }

    let has_landmarks = aria.is_some_and(|a| a.landmark_role_count > 0)
        || semantic.is_some_and(|s| s.has_nav && s.has_header && s.has_footer);
    if has_landmarks {
        score += w.landmarks;
    }

    if let Some(aria) = aria {
        if aria.images_total == 0 {
            score += w.images_with_alt;
        } else {
            let with_alt = aria.images_total - aria.images_without_alt.min(aria.images_total);
            score += w.images_with_alt * with_alt as f64 / aria.images_total as f64;
        }
    }

    clamp_score(score)
}

/// One accessibility finding on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityIssue {
    pub rule: String,
    pub message: String,
    /// Number of offending elements, where countable
    pub count: usize,
}

impl AccessibilityIssue {
    fn new(rule: &str, message: impl Into<String>, count: usize) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
            count,
        }
    }
}

/// Lists concrete accessibility problems found in a metrics bag
pub fn accessibility_issues(bag: &MetricsBag) -> Vec<AccessibilityIssue> {
    let mut issues = Vec::new();

    if let Some(form) = bag.form_patterns.get() {
        let unlabelled = form.total_inputs.saturating_sub(form.fields_with_labels);
        if unlabelled > 0 {
            issues.push(AccessibilityIssue::new(
                "form-labels",
                format!("{} form field(s) have no associated label", unlabelled),
                unlabelled,
            ));
        }
    }

    if let Some(aria) = bag.aria_attributes.get() {
        if aria.images_without_alt > 0 {
            issues.push(AccessibilityIssue::new(
                "image-alt",
                format!("{} image(s) are missing alt text", aria.images_without_alt),
                aria.images_without_alt,
            ));
        }
    }

    if bag.semantic_html.get().is_some_and(|s| !s.has_main) {
        issues.push(AccessibilityIssue::new(
            "landmark-main",
            "Page has no <main> landmark",
            1,
        ));
    }

    if let Some(headings) = bag.headings.get() {
        if headings.missing > 0 {
            issues.push(AccessibilityIssue::new("heading-h1", "Page has no <h1>", 1));
        }
        if headings.multiple > 0 {
            issues.push(AccessibilityIssue::new(
                "heading-h1",
                format!("Page has {} <h1> elements", headings.h1_count),
                headings.h1_count,
            ));
        }
        if headings.non_sequential > 0 {
            issues.push(AccessibilityIssue::new(
                "heading-order",
                "An <h2> appears before the first <h1>",
                headings.non_sequential as usize,
            ));
        }
    }

    let has_forms = bag.form_patterns.get().is_some_and(|f| f.total_inputs > 0);
    let has_live_region = bag.error_handling.get().is_some_and(|e| e.has_aria_live);
    if has_forms && !has_live_region {
        issues.push(AccessibilityIssue::new(
            "live-region",
            "Form page has no aria-live region for announcing errors",
            1,
        ));
    }

    issues
}
