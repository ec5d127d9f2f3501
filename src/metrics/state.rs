//! Explicit state and persistent error signals, mostly visible after rendering

use super::document::{DocumentAccess, PageInputs};
use super::{ExtractError, MetricsBag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAttributes {
    pub has_data_state: bool,
    pub data_state_count: usize,
    pub has_auth_state: bool,
    pub has_validation_state: bool,
    pub has_error_codes: bool,
    pub has_loading_indicators: bool,
    pub total_data_attributes: usize,
    pub has_agent_visibility_control: bool,
    pub agent_visible_count: usize,
    pub visible_to_agents: usize,
    pub hidden_from_agents: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandling {
    pub has_error_summary: bool,
    pub error_alert_count: usize,
    pub has_aria_live: bool,
    pub aria_live_count: usize,
    pub has_field_errors: bool,
    pub error_element_count: usize,
    pub has_aria_invalid: bool,
    pub invalid_field_count: usize,
    /// `role="alert"` together with an `aria-live` region
    pub has_persistent_errors: bool,
}

pub(super) fn extract_data_attributes(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let data_state_count = doc.count("[data-state]")?;
    let agent_visible = doc.select("[data-agent-visible]")?;
    let visible_to_agents = agent_visible
        .iter()
        .filter(|node| matches!(node.attr("data-agent-visible"), Some("true") | Some("")))
        .count();
    let hidden_from_agents = agent_visible
        .iter()
        .filter(|node| node.attr("data-agent-visible") == Some("false"))
        .count();

    bag.data_attributes.set(DataAttributes {
        has_data_state: data_state_count > 0,
        data_state_count,
        has_auth_state: doc.exists("[data-authenticated]")?,
        has_validation_state: doc.exists("[data-validation-state]")?,
        has_error_codes: doc.exists("[data-error-code]")?,
        has_loading_indicators: doc.exists(r#"[data-loading], [data-state="loading"]"#)?,
        total_data_attributes: doc.count(
            "[data-state], [data-authenticated], [data-validation-state], [data-error-code], [data-loading]",
        )?,
        has_agent_visibility_control: !agent_visible.is_empty(),
        agent_visible_count: agent_visible.len(),
        visible_to_agents,
        hidden_from_agents,
    });
    Ok(())
}

pub(super) fn extract_error_handling(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let error_alert_count = doc.count(r#"[role="alert"]"#)?;
    let aria_live_count = doc.count("[aria-live]")?;
    let error_element_count = doc.count(r#".error, .field-error, [class*="error"]"#)?;
    let invalid_field_count = doc.count(r#"[aria-invalid="true"]"#)?;

    bag.error_handling.set(ErrorHandling {
        has_error_summary: error_alert_count > 0,
        error_alert_count,
        has_aria_live: aria_live_count > 0,
        aria_live_count,
        has_field_errors: error_element_count > 0,
        error_element_count,
        has_aria_invalid: invalid_field_count > 0,
        invalid_field_count,
        has_persistent_errors: error_alert_count > 0 && aria_live_count > 0,
    });
    Ok(())
}
