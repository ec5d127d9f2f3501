use crate::browser::BrowserPool;
use crate::context::AuditContext;
use crate::discovery::{UrlEntry, UrlSource};
use crate::metrics::{collect_from_html, MetricsBag, PageInputs, PricingExposure};
use crate::network::{FetchedResponse, NetworkError};
use crate::scoring::{
    accessibility_issues, accessibility_score, rendered_score_with_pricing, seo_score,
    served_score, AccessibilityIssue,
};
use serde::{Deserialize, Serialize};

/// Outcome of auditing a single URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageStatus {
    /// Served and rendered documents both audited
    Audited,
    /// Served document audited; rendering failed
    ServedOnly,
    /// Fetched fine but not an HTML document (text, JSON, PDF, ...)
    NonHtml,
    /// An anti-bot interstitial was served instead of the page
    Challenge,
    /// The page could not be fetched
    Failed,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Audited => "audited",
            PageStatus::ServedOnly => "served-only",
            PageStatus::NonHtml => "non-html",
            PageStatus::Challenge => "challenge",
            PageStatus::Failed => "failed",
        }
    }
}

/// Timing and size figures gathered while auditing a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub http_status: Option<u16>,
    pub content_type: Option<String>,
    pub served_fetch_ms: Option<u64>,
    pub served_bytes: usize,
    pub render_ms: Option<u64>,
    pub rendered_bytes: usize,
}

/// Everything recorded for one audited URL
///
/// Owned by its page task until the run collects it. The raw documents are
/// kept in memory for pattern extraction but left out of `results.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAuditResult {
    pub url: String,
    pub source: UrlSource,
    pub status: PageStatus,
    #[serde(skip)]
    pub served_html: Option<String>,
    #[serde(skip)]
    pub rendered_html: Option<String>,
    pub served_metrics: Option<MetricsBag>,
    pub rendered_metrics: Option<MetricsBag>,
    pub served_score: Option<u32>,
    pub rendered_score: Option<u32>,
    pub seo_score: Option<u32>,
    pub accessibility_score: Option<u32>,
    /// Served-versus-rendered price comparison; needs both documents
    pub pricing: Option<PricingExposure>,
    pub performance_metrics: PerformanceMetrics,
    pub accessibility_issues: Vec<AccessibilityIssue>,
    pub error: Option<String>,
}

impl PageAuditResult {
    pub fn new(url: impl Into<String>, source: UrlSource) -> Self {
        Self {
            url: url.into(),
            source,
            status: PageStatus::Failed,
            served_html: None,
            rendered_html: None,
            served_metrics: None,
            rendered_metrics: None,
            served_score: None,
            rendered_score: None,
            seo_score: None,
            accessibility_score: None,
            pricing: None,
            performance_metrics: PerformanceMetrics::default(),
            accessibility_issues: Vec::new(),
            error: None,
        }
    }

    /// True when both scores are present and meet the thresholds
    pub fn meets_thresholds(&self, min_served: u32, min_rendered: u32) -> bool {
        matches!(
            (self.served_score, self.rendered_score),
            (Some(served), Some(rendered)) if served >= min_served && rendered >= min_rendered
        )
    }

    fn record_served(&mut self, response: &FetchedResponse) {
        let perf = &mut self.performance_metrics;
        perf.http_status = Some(response.status);
        perf.content_type = Some(response.content_type.clone()).filter(|ct| !ct.is_empty());
        perf.served_fetch_ms = Some(response.elapsed_ms);
        perf.served_bytes = response.body.len();
    }
}

/// Audits one URL: served fetch, rendered snapshot, metrics and scores
///
/// Never fails: fetch, lease and render problems are recorded on the
/// returned result. A leased browser is always handed back to the pool,
/// whatever the render outcome.
///
/// # Arguments
///
/// * `ctx` - Run context (fetcher, retry policy, weights, timeouts)
/// * `pool` - Browser pool to lease a renderer from
/// * `entry` - The URL to audit
pub async fn audit_page(ctx: &AuditContext, pool: &BrowserPool, entry: &UrlEntry) -> PageAuditResult {
    let url = entry.url.as_str();
    let mut result = PageAuditResult::new(url, entry.source);

    tracing::debug!("Auditing {}", url);

    let served = match ctx.fetcher.fetch_with_retry(&ctx.retry, &entry.url).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            result.status = if e.is_challenge() {
                PageStatus::Challenge
            } else {
                PageStatus::Failed
            };
            if let NetworkError::Http { status, .. } = e {
                result.performance_metrics.http_status = Some(status);
            }
            result.error = Some(e.to_string());
            return result;
        }
    };
    result.record_served(&served);

    if !served.is_html() {
        tracing::debug!("{} is not HTML ({}), skipping render", url, served.content_type);
        result.status = PageStatus::NonHtml;
        return result;
    }

    let inputs = PageInputs::new(url).with_headers(&served.headers);
    let served_metrics = collect_from_html(&served.body, &inputs);
    result.served_score = Some(served_score(&served_metrics, &ctx.weights));
    result.seo_score = Some(seo_score(&served_metrics, &ctx.weights));
    result.served_html = Some(served.body);

    let rendered_metrics = match pool.render_page(&ctx.retry, url, ctx.navigation_timeout()).await {
        Ok(page) => {
            result.performance_metrics.render_ms = Some(page.load_time_ms);
            result.performance_metrics.rendered_bytes = page.html.len();
            let bag = collect_from_html(&page.html, &inputs);
            let pricing = PricingExposure::compare(
                result.served_html.as_deref().unwrap_or_default(),
                &page.html,
            );
            if pricing.js_dependent {
                tracing::warn!("Pricing on {} only appears after scripts run", url);
            }
            result.rendered_score = Some(rendered_score_with_pricing(&bag, Some(&pricing), &ctx.weights));
            result.pricing = Some(pricing);
            result.rendered_html = Some(page.html);
            result.status = PageStatus::Audited;
            Some(bag)
        }
        Err(e) => {
            tracing::warn!("Failed to render {}: {}", url, e);
            result.status = if e.is_challenge() {
                PageStatus::Challenge
            } else {
                PageStatus::ServedOnly
            };
            result.error = Some(e.to_string());
            None
        }
    };

    let accessibility_bag = rendered_metrics.as_ref().unwrap_or(&served_metrics);
    result.accessibility_score = Some(accessibility_score(accessibility_bag, &ctx.weights));
    result.accessibility_issues = accessibility_issues(accessibility_bag);

    result.served_metrics = Some(served_metrics);
    result.rendered_metrics = rendered_metrics;

    tracing::info!(
        "Audited {} [{}] served={:?} rendered={:?}",
        url,
        result.status.as_str(),
        result.served_score,
        result.rendered_score
    );
    result
}
