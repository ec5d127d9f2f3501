use super::stats::Summary;
use crate::audit::PageAuditResult;
use crate::context::AuditContext;
use crate::wellknown::SiteFiles;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run-level facts recorded at the top of `results.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub run_id: String,
    pub domain: String,
    pub target: String,
    pub timestamp: DateTime<Utc>,
    pub total_urls: usize,
    pub version: String,
    pub config_hash: String,
}

/// The complete `results.json` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResults {
    pub metadata: RunMetadata,
    pub summary: Summary,
    pub site_files: SiteFiles,
    pub pages: Vec<PageAuditResult>,
}

impl AuditResults {
    /// Assembles the document, computing the summary from the pages
    pub fn new(ctx: &AuditContext, pages: Vec<PageAuditResult>, site_files: SiteFiles) -> Self {
        let summary = Summary::from_results(&pages, &site_files);
        Self {
            metadata: RunMetadata {
                run_id: ctx.run_id.clone(),
                domain: ctx.domain(),
                target: ctx.target.to_string(),
                timestamp: Utc::now(),
                total_urls: pages.len(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                config_hash: ctx.config_hash.clone(),
            },
            summary,
            site_files,
            pages,
        }
    }
}
