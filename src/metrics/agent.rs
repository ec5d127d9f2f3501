//! Structural signals agents rely on in served HTML

use super::document::{DocumentAccess, PageInputs};
use super::{ExtractError, MetricsBag};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Field names agents can fill without guessing
pub const STANDARD_FIELD_NAMES: &[&str] = &[
    "email",
    "firstName",
    "first_name",
    "lastName",
    "last_name",
    "fullName",
    "full_name",
    "phone",
    "telephone",
    "postcode",
    "postal_code",
    "address1",
    "street_address",
    "address2",
    "city",
    "county",
    "state",
    "country",
    "country_code",
    "cardNumber",
    "card_number",
    "expiryDate",
    "expiry",
    "cvv",
    "cvc",
    "password",
    "username",
    "dateOfBirth",
    "date_of_birth",
    "company",
    "company_name",
    "quantity",
];

const LANDMARK_ROLES: &[&str] = &[
    "banner",
    "navigation",
    "main",
    "contentinfo",
    "complementary",
    "search",
    "form",
    "region",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticHtml {
    pub has_main: bool,
    pub has_nav: bool,
    pub has_header: bool,
    pub has_footer: bool,
    pub has_article: bool,
    pub has_section: bool,
    pub nav_count: usize,
    pub article_count: usize,
    pub section_count: usize,
    pub div_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredData {
    pub has_json_ld: bool,
    pub json_ld_count: usize,
    /// JSON-LD blocks that failed to parse
    pub invalid_json_ld: usize,
    pub schema_types: Vec<String>,
    pub has_schema_org: bool,
    pub has_microdata: bool,
    pub microdata_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPatterns {
    pub form_count: usize,
    pub total_inputs: usize,
    pub standard_named_fields: usize,
    pub non_standard_named_fields: usize,
    pub fields_with_labels: usize,
    pub fields_with_type: usize,
    pub fields_with_required: usize,
    pub standard_name_ratio: f64,
    pub label_ratio: f64,
    /// Inputs that can carry autocomplete (hidden and button-like inputs excluded)
    pub autocomplete_candidates: usize,
    pub fields_with_autocomplete: usize,
    pub autocomplete_ratio: f64,
    pub autocomplete_values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmsTxtSignals {
    pub has_llms_txt_reference: bool,
    pub has_llms_txt_meta: bool,
    pub llms_txt_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsSignals {
    pub has_robots_txt_reference: bool,
    pub has_ai_txt_reference: bool,
    pub has_robots_meta: bool,
    pub robots_meta_content: String,
    pub is_no_index: bool,
    pub is_no_follow: bool,
    pub is_no_archive: bool,
    pub has_agent_restrictions: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityHeaders {
    pub has_hsts: bool,
    pub has_csp: bool,
    pub has_x_frame_options: bool,
    pub has_x_content_type_options: bool,
    pub has_referrer_policy: bool,
    pub has_permissions_policy: bool,
    pub present_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AriaAttributes {
    pub aria_label_count: usize,
    pub aria_labelledby_count: usize,
    pub aria_describedby_count: usize,
    pub aria_live_count: usize,
    pub aria_hidden_count: usize,
    pub role_count: usize,
    pub landmark_role_count: usize,
    pub images_total: usize,
    pub images_without_alt: usize,
}

pub(super) fn extract_semantic_html(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let nav_count = doc.count("nav")?;
    let article_count = doc.count("article")?;
    let section_count = doc.count("section")?;

    bag.semantic_html.set(SemanticHtml {
        has_main: doc.exists("main")?,
        has_nav: nav_count > 0,
        has_header: doc.exists("header")?,
        has_footer: doc.exists("footer")?,
        has_article: article_count > 0,
        has_section: section_count > 0,
        nav_count,
        article_count,
        section_count,
        div_count: doc.count("div")?,
    });
    Ok(())
}

pub(super) fn extract_structured_data(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let scripts = doc.select(r#"script[type="application/ld+json"]"#)?;
    let mut metrics = StructuredData {
        has_json_ld: !scripts.is_empty(),
        json_ld_count: scripts.len(),
        ..Default::default()
    };

    for script in &scripts {
        match serde_json::from_str::<serde_json::Value>(script.text.trim()) {
            Ok(value) => collect_schema(&value, None, &mut metrics),
            Err(e) => {
                tracing::debug!("Skipping invalid JSON-LD block: {}", e);
                metrics.invalid_json_ld += 1;
            }
        }
    }

    let microdata_count = doc.count("[itemscope]")?;
    metrics.has_microdata = microdata_count > 0;
    metrics.microdata_count = microdata_count;

    bag.structured_data.set(metrics);
    Ok(())
}

/// Walks a JSON-LD value, including top-level arrays and `@graph`, collecting `@type`s
fn collect_schema(value: &serde_json::Value, inherited_context: Option<&str>, metrics: &mut StructuredData) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                collect_schema(item, inherited_context, metrics);
            }
        }
        serde_json::Value::Object(map) => {
            let context = map
                .get("@context")
                .map(|c| c.to_string())
                .or_else(|| inherited_context.map(str::to_string));

            if let Some(types) = map.get("@type") {
                let names: Vec<String> = match types {
                    serde_json::Value::String(s) => vec![s.clone()],
                    serde_json::Value::Array(list) => list
                        .iter()
                        .filter_map(|t| t.as_str().map(str::to_string))
                        .collect(),
                    _ => Vec::new(),
                };
                if !names.is_empty() && context.as_deref().is_some_and(|c| c.contains("schema.org")) {
                    metrics.has_schema_org = true;
                }
                metrics.schema_types.extend(names);
            }

            if let Some(graph) = map.get("@graph") {
                collect_schema(graph, context.as_deref(), metrics);
            }
        }
        _ => {}
    }
}

pub(super) fn extract_form_patterns(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let inputs = doc.select("input, select, textarea")?;
    let labelled_ids: HashSet<String> = doc
        .select("label[for]")?
        .into_iter()
        .filter_map(|label| label.attr("for").map(str::to_string))
        .collect();

    let mut metrics = FormPatterns {
        form_count: doc.count("form")?,
        total_inputs: inputs.len(),
        ..Default::default()
    };

    for input in &inputs {
        let name = input.attr("name").unwrap_or("");
        let id = input.attr("id").unwrap_or("");

        if STANDARD_FIELD_NAMES.iter().any(|std| *std == name || *std == id) {
            metrics.standard_named_fields += 1;
        } else if !name.is_empty() {
            metrics.non_standard_named_fields += 1;
        }

        let has_aria_label = input.attr("aria-label").is_some_and(|v| !v.trim().is_empty());
        if has_aria_label || (!id.is_empty() && labelled_ids.contains(id)) {
            metrics.fields_with_labels += 1;
        }

        if input.has_attr("type") {
            metrics.fields_with_type += 1;
        }
        if input.has_attr("required") || input.attr("aria-required") == Some("true") {
            metrics.fields_with_required += 1;
        }

        let input_type = input.attr("type").unwrap_or("").to_lowercase();
        if matches!(input_type.as_str(), "hidden" | "submit" | "button") {
            continue;
        }
        metrics.autocomplete_candidates += 1;
        if let Some(value) = input.attr("autocomplete").filter(|v| !v.is_empty()) {
            metrics.fields_with_autocomplete += 1;
            if !metrics.autocomplete_values.iter().any(|v| v == value) {
                metrics.autocomplete_values.push(value.to_string());
            }
        }
    }

    metrics.standard_name_ratio = ratio(metrics.standard_named_fields, metrics.total_inputs);
    metrics.label_ratio = ratio(metrics.fields_with_labels, metrics.total_inputs);
    metrics.autocomplete_ratio = ratio(metrics.fields_with_autocomplete, metrics.autocomplete_candidates);

    bag.form_patterns.set(metrics);
    Ok(())
}

/// `part / whole`, or 1.0 when there is nothing to measure
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}

pub(super) fn extract_llms_txt(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let link = doc.first(r#"link[href*="llms.txt"], a[href*="llms.txt"]"#)?;
    let has_meta = doc.exists(r#"meta[name="llms-txt"], meta[property="llms:txt"]"#)?;

    bag.llms_txt.set(LlmsTxtSignals {
        has_llms_txt_reference: link.is_some(),
        has_llms_txt_meta: has_meta,
        llms_txt_url: link.and_then(|node| node.attr("href").map(str::to_string)),
    });
    Ok(())
}

pub(super) fn extract_robots_signals(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let robots_meta = doc
        .first(r#"meta[name="robots"]"#)?
        .and_then(|node| node.attr("content").map(str::to_lowercase));
    let content = robots_meta.clone().unwrap_or_default();

    let is_no_index = content.contains("noindex");
    let is_no_follow = content.contains("nofollow");
    let is_no_archive = content.contains("noarchive");

    bag.robots_txt.set(RobotsSignals {
        has_robots_txt_reference: doc.exists(r#"link[href*="robots.txt"], a[href*="robots.txt"]"#)?,
        has_ai_txt_reference: doc.exists(r#"link[href*="ai.txt"], a[href*="ai.txt"]"#)?,
        has_robots_meta: robots_meta.is_some(),
        robots_meta_content: content,
        is_no_index,
        is_no_follow,
        is_no_archive,
        has_agent_restrictions: is_no_index || is_no_follow || is_no_archive,
    });
    Ok(())
}

pub(super) fn extract_security_headers(
    doc: &dyn DocumentAccess,
    inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let csp_meta = doc.exists(r#"meta[http-equiv="Content-Security-Policy"]"#)?;

    let mut metrics = SecurityHeaders {
        has_hsts: inputs.header("strict-transport-security").is_some(),
        has_csp: inputs.header("content-security-policy").is_some() || csp_meta,
        has_x_frame_options: inputs.header("x-frame-options").is_some(),
        has_x_content_type_options: inputs.header("x-content-type-options").is_some(),
        has_referrer_policy: inputs.header("referrer-policy").is_some(),
        has_permissions_policy: inputs.header("permissions-policy").is_some(),
        present_count: 0,
    };
    metrics.present_count = [
        metrics.has_hsts,
        metrics.has_csp,
        metrics.has_x_frame_options,
        metrics.has_x_content_type_options,
        metrics.has_referrer_policy,
        metrics.has_permissions_policy,
    ]
    .iter()
    .filter(|present| **present)
    .count();

    bag.security_headers.set(metrics);
    Ok(())
}

pub(super) fn extract_aria_attributes(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let roles = doc.select("[role]")?;
    let landmark_role_count = roles
        .iter()
        .filter(|node| {
            node.attr("role")
                .is_some_and(|role| LANDMARK_ROLES.contains(&role.trim().to_lowercase().as_str()))
        })
        .count();
    let images = doc.select("img")?;

    bag.aria_attributes.set(AriaAttributes {
        aria_label_count: doc.count("[aria-label]")?,
        aria_labelledby_count: doc.count("[aria-labelledby]")?,
        aria_describedby_count: doc.count("[aria-describedby]")?,
        aria_live_count: doc.count("[aria-live]")?,
        aria_hidden_count: doc.count(r#"[aria-hidden="true"]"#)?,
        role_count: roles.len(),
        landmark_role_count,
        images_total: images.len(),
        images_without_alt: images.iter().filter(|img| !img.has_attr("alt")).count(),
    });
    Ok(())
}
