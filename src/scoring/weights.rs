//! Weight tables for the scoring engine

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;

/// Built-in weight table
pub const DEFAULT_WEIGHTS: &str = include_str!("default_weights.toml");

/// Every weight used to turn a metrics bag into scores
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringWeights {
    pub served: ServedWeights,
    pub rendered: RenderedWeights,
    pub seo: SeoWeights,
    pub accessibility: AccessibilityWeights,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServedWeights {
    pub semantic_html: SemanticHtmlWeights,
    pub form_fields: FormFieldWeights,
    pub structured_data: StructuredDataWeights,
    pub llms_txt: LlmsTxtWeights,
    pub robots: RobotsWeights,
    pub security_headers: SecurityHeaderWeights,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SemanticHtmlWeights {
    pub has_main: f64,
    pub has_nav: f64,
    pub has_header: f64,
    pub has_footer: f64,
    pub has_article_or_section: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FormFieldWeights {
    pub standard_name_ratio: f64,
    pub label_ratio: f64,
    pub autocomplete_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StructuredDataWeights {
    pub has_schema_org: f64,
    pub has_json_ld: f64,
    pub has_microdata: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LlmsTxtWeights {
    pub presence: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RobotsWeights {
    pub has_ai_txt: f64,
    /// Usually negative
    pub agent_restrictions: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SecurityHeaderWeights {
    pub has_hsts: f64,
    pub has_csp: f64,
    pub has_x_frame_options: f64,
    pub has_x_content_type_options: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RenderedWeights {
    /// Cap on the rendered-only bonus band
    pub max_bonus: f64,
    pub data_attributes: DataAttributeWeights,
    pub error_handling: ErrorHandlingWeights,
    pub pricing: PricingWeights,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DataAttributeWeights {
    pub has_data_state: f64,
    pub has_validation_state: f64,
    pub has_loading_indicators: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ErrorHandlingWeights {
    pub has_persistent_errors: f64,
    pub has_aria_invalid: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PricingWeights {
    /// Usually negative
    pub js_dependent: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SeoWeights {
    pub title_present: f64,
    pub title_length_ok: f64,
    pub meta_description_present: f64,
    pub meta_description_length_ok: f64,
    pub single_h1: f64,
    pub no_long_headings: f64,
    pub sequential_headings: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AccessibilityWeights {
    pub label_ratio: f64,
    pub has_main: f64,
    pub has_aria_live: f64,
    pub has_h1: f64,
    pub landmarks: f64,
    pub images_with_alt: f64,
}

impl ScoringWeights {
    /// Parses and validates a weight table from TOML text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let weights: ScoringWeights = toml::from_str(content)?;
        weights.validate()?;
        Ok(weights)
    }

    /// Loads a weight table from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Rejects non-finite weights and a negative bonus cap
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in self.entries() {
            if !value.is_finite() {
                return Err(ConfigError::InvalidWeights(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
        }

        if self.rendered.max_bonus < 0.0 {
            return Err(ConfigError::InvalidWeights(format!(
                "rendered.max-bonus must be >= 0, got {}",
                self.rendered.max_bonus
            )));
        }

        Ok(())
    }

    /// Every weight with its dotted table path
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let s = &self.served;
        let r = &self.rendered;
        let seo = &self.seo;
        let a = &self.accessibility;
        vec![
            ("served.semantic-html.has-main", s.semantic_html.has_main),
            ("served.semantic-html.has-nav", s.semantic_html.has_nav),
            ("served.semantic-html.has-header", s.semantic_html.has_header),
            ("served.semantic-html.has-footer", s.semantic_html.has_footer),
            (
                "served.semantic-html.has-article-or-section",
                s.semantic_html.has_article_or_section,
            ),
            ("served.form-fields.standard-name-ratio", s.form_fields.standard_name_ratio),
            ("served.form-fields.label-ratio", s.form_fields.label_ratio),
            ("served.form-fields.autocomplete-ratio", s.form_fields.autocomplete_ratio),
            ("served.structured-data.has-schema-org", s.structured_data.has_schema_org),
            ("served.structured-data.has-json-ld", s.structured_data.has_json_ld),
            ("served.structured-data.has-microdata", s.structured_data.has_microdata),
            ("served.llms-txt.presence", s.llms_txt.presence),
            ("served.robots.has-ai-txt", s.robots.has_ai_txt),
            ("served.robots.agent-restrictions", s.robots.agent_restrictions),
            ("served.security-headers.has-hsts", s.security_headers.has_hsts),
            ("served.security-headers.has-csp", s.security_headers.has_csp),
            (
                "served.security-headers.has-x-frame-options",
                s.security_headers.has_x_frame_options,
            ),
            (
                "served.security-headers.has-x-content-type-options",
                s.security_headers.has_x_content_type_options,
            ),
            ("rendered.max-bonus", r.max_bonus),
            ("rendered.data-attributes.has-data-state", r.data_attributes.has_data_state),
            (
                "rendered.data-attributes.has-validation-state",
                r.data_attributes.has_validation_state,
            ),
            (
                "rendered.data-attributes.has-loading-indicators",
                r.data_attributes.has_loading_indicators,
            ),
            (
                "rendered.error-handling.has-persistent-errors",
                r.error_handling.has_persistent_errors,
            ),
            ("rendered.error-handling.has-aria-invalid", r.error_handling.has_aria_invalid),
            ("rendered.pricing.js-dependent", r.pricing.js_dependent),
            ("seo.title-present", seo.title_present),
            ("seo.title-length-ok", seo.title_length_ok),
            ("seo.meta-description-present", seo.meta_description_present),
            ("seo.meta-description-length-ok", seo.meta_description_length_ok),
            ("seo.single-h1", seo.single_h1),
            ("seo.no-long-headings", seo.no_long_headings),
            ("seo.sequential-headings", seo.sequential_headings),
            ("accessibility.label-ratio", a.label_ratio),
            ("accessibility.has-main", a.has_main),
            ("accessibility.has-aria-live", a.has_aria_live),
            ("accessibility.has-h1", a.has_h1),
            ("accessibility.landmarks", a.landmarks),
            ("accessibility.images-with-alt", a.images_with_alt),
        ]
    }
}

impl ScoringWeights {
    /// The built-in table embedded from `default_weights.toml`
    ///
    /// Fails only if the embedded file itself is broken; callers treat that as
    /// a configuration error rather than scoring with an empty table.
    pub fn builtin() -> ConfigResult<Self> {
        Self::from_toml(DEFAULT_WEIGHTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_parses() {
        let weights = ScoringWeights::from_toml(DEFAULT_WEIGHTS).unwrap();
        assert_eq!(weights.served.semantic_html.has_main, 6.0);
        assert_eq!(weights.served.structured_data.has_schema_org, 15.0);
        assert_eq!(weights.served.form_fields.autocomplete_ratio, 15.0);
        assert_eq!(weights.served.robots.agent_restrictions, -5.0);
        assert_eq!(weights.rendered.max_bonus, 30.0);
        assert_eq!(weights.rendered.pricing.js_dependent, -15.0);
        assert_eq!(weights, ScoringWeights::builtin().unwrap());
    }

    #[test]
    fn test_rejects_non_finite_weight() {
        let broken = DEFAULT_WEIGHTS.replace("has-main = 6", "has-main = nan");
        let err = ScoringWeights::from_toml(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(ref msg) if msg.contains("has-main")));

        let infinite = DEFAULT_WEIGHTS.replace("presence = 10", "presence = inf");
        assert!(ScoringWeights::from_toml(&infinite).is_err());
    }

    #[test]
    fn test_rejects_negative_bonus_cap() {
        let broken = DEFAULT_WEIGHTS.replace("max-bonus = 30", "max-bonus = -1");
        let err = ScoringWeights::from_toml(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(ref msg) if msg.contains("max-bonus")));
    }

    #[test]
    fn test_rejects_non_numeric_and_unknown_keys() {
        let text = DEFAULT_WEIGHTS.replace("has-nav = 5", "has-nav = \"five\"");
        assert!(matches!(
            ScoringWeights::from_toml(&text).unwrap_err(),
            ConfigError::Parse(_)
        ));

        let extra = format!("{}\n[bogus]\nx = 1\n", DEFAULT_WEIGHTS);
        assert!(ScoringWeights::from_toml(&extra).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.toml");
        std::fs::write(&path, DEFAULT_WEIGHTS.replace("has-main = 6", "has-main = 8")).unwrap();
        let weights = ScoringWeights::load(&path).unwrap();
        assert_eq!(weights.served.semantic_html.has_main, 8.0);
    }
}
