//! Site-level agent files
//!
//! Health checks for the files a site publishes for agents (`/llms.txt`,
//! `/ai-agents.md`, `/query-index.json`, `/robots.txt`), plus quality
//! analysis of llms.txt and robots.txt when they exist.

mod llms;

pub use llms::{analyze_llms_txt, LlmsTxtBonus, LlmsTxtBreakdown, LlmsTxtQuality, MAX_LLMS_TXT_SCORE};

use crate::network::{Fetcher, NetworkError, RetryPolicy};
use crate::robots::{analyze_robots, RobotsReport};
use serde::{Deserialize, Serialize};
use url::Url;

/// Content rule applied to a fetched well-known file
type Validator = fn(&str) -> Result<(), String>;

/// Files checked on every site, with their content rules
const WELL_KNOWN_FILES: &[(&str, Validator)] = &[
    ("/llms.txt", validate_llms_txt),
    ("/ai-agents.md", validate_ai_agents_md),
    ("/query-index.json", validate_query_index),
    ("/robots.txt", validate_robots_txt),
];

/// Pass/fail result for one well-known file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCheck {
    pub path: String,
    pub url: String,
    pub passed: bool,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// Well-known file checks together with the llms.txt and robots.txt analyses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteFiles {
    pub checks: Vec<FileCheck>,
    pub llms_txt: Option<LlmsTxtQuality>,
    pub robots_txt: Option<RobotsReport>,
}

impl SiteFiles {
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }
}

fn validate_markdown(content: &str, required: &[&str]) -> Result<(), String> {
    for header in required {
        if !content.contains(header) {
            return Err(format!("Missing required header: {}", header.trim()));
        }
    }
    Ok(())
}

/// llms.txt needs a title and at least one section
pub fn validate_llms_txt(content: &str) -> Result<(), String> {
    validate_markdown(content, &["# ", "## "])
}

pub fn validate_ai_agents_md(content: &str) -> Result<(), String> {
    validate_markdown(content, &["## Identity", "## Skills"])
}

/// Requires `total`, a non-empty `data` array, and `path`/`title`/`description`
/// on the first entry
pub fn validate_query_index(content: &str) -> Result<(), String> {
    let parsed: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("Invalid JSON: {}", e))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| "Top level must be an object".to_string())?;

    for field in ["total", "data"] {
        if !object.contains_key(field) {
            return Err(format!("Missing required field: {}", field));
        }
    }

    let data = object
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| "data field must be an array".to_string())?;
    let first = data.first().ok_or_else(|| "data array is empty".to_string())?;

    for field in ["path", "title", "description"] {
        if first.get(field).is_none() {
            return Err(format!("Data entry missing required field: {}", field));
        }
    }
    Ok(())
}

pub fn validate_robots_txt(content: &str) -> Result<(), String> {
    if content.to_lowercase().contains("user-agent") {
        Ok(())
    } else {
        Err("No User-agent directive".to_string())
    }
}

/// Fetches one file and applies its rule, keeping the body for later analysis
async fn check_file(
    fetcher: &Fetcher,
    policy: &RetryPolicy,
    origin: &Url,
    path: &str,
    validator: Validator,
) -> (FileCheck, Option<String>) {
    let mut check = FileCheck {
        path: path.to_string(),
        url: String::new(),
        passed: false,
        status: None,
        error: None,
    };

    let url = match origin.join(path) {
        Ok(url) => url,
        Err(e) => {
            check.error = Some(e.to_string());
            return (check, None);
        }
    };
    check.url = url.to_string();

    match fetcher.fetch_with_retry(policy, &url).await {
        Ok(response) => {
            check.status = Some(response.status);
            match validator(&response.body) {
                Ok(()) => check.passed = true,
                Err(e) => check.error = Some(e),
            }
            (check, Some(response.body))
        }
        Err(e) => {
            if let NetworkError::Http { status, .. } = &e {
                check.status = Some(*status);
                check.error = Some(format!("HTTP {}", status));
            } else {
                check.error = Some(e.to_string());
            }
            (check, None)
        }
    }
}

/// Checks every well-known agent file on a site
///
/// # Arguments
///
/// * `fetcher` - HTTP fetcher
/// * `policy` - Retry policy for the fetches
/// * `origin` - Site root (`scheme://host[:port]/`)
///
/// # Returns
///
/// One [`FileCheck`] per file, in a fixed order. Never fails; fetch problems are
/// recorded as failed checks.
pub async fn check_well_known_files(fetcher: &Fetcher, policy: &RetryPolicy, origin: &Url) -> Vec<FileCheck> {
    let mut checks = Vec::with_capacity(WELL_KNOWN_FILES.len());
    for (path, validator) in WELL_KNOWN_FILES {
        let (check, _) = check_file(fetcher, policy, origin, path, *validator).await;
        checks.push(check);
    }
    checks
}

/// Runs the well-known checks and analyzes llms.txt and robots.txt
pub async fn audit_site_files(fetcher: &Fetcher, policy: &RetryPolicy, origin: &Url) -> SiteFiles {
    let mut site = SiteFiles::default();

    for (path, validator) in WELL_KNOWN_FILES {
        let (check, body) = check_file(fetcher, policy, origin, path, *validator).await;
        if check.passed {
            tracing::info!("{} passed", path);
        } else {
            tracing::warn!(
                "{} failed: {}",
                path,
                check.error.as_deref().unwrap_or("unknown error")
            );
        }

        if let Some(body) = body {
            match *path {
                "/llms.txt" => {
                    let quality = analyze_llms_txt(&body);
                    tracing::info!("llms.txt quality score: {}/{}", quality.score, MAX_LLMS_TXT_SCORE);
                    site.llms_txt = Some(quality);
                }
                "/robots.txt" => {
                    let report = analyze_robots(&body);
                    tracing::info!("robots.txt quality score: {}/100 ({:?})", report.score, report.level);
                    site.robots_txt = Some(report);
                }
                _ => {}
            }
        }
        site.checks.push(check);
    }

    site
}
