use super::page::{audit_page, PageAuditResult};
use crate::browser::BrowserPool;
use crate::context::AuditContext;
use crate::discovery::{SitemapResolver, UrlEntry};
use crate::output::{write_markdown_summary, write_pages_csv, write_results_json, AuditResults};
use crate::patterns::{extract_patterns, PatternOptions, PatternReport};
use crate::wellknown::audit_site_files;
use crate::AuditError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

/// What a finished run produced
#[derive(Debug)]
pub struct AuditRun {
    pub results: AuditResults,
    /// `None` when pattern extraction itself failed (logged, not fatal)
    pub patterns: Option<PatternReport>,
    pub results_path: PathBuf,
    pub csv_path: Option<PathBuf>,
    pub summary_path: PathBuf,
}

/// Resolves the run's URL set from the configured target
///
/// # Arguments
///
/// * `ctx` - Run context
/// * `pool` - Browser pool for rendering a root that refuses plain HTTP;
///   `None` keeps discovery HTTP-only
///
/// # Returns
///
/// * `Ok(Vec<UrlEntry>)` - The deduplicated URL set
/// * `Err(AuditError)` - The target could not be resolved; the run cannot proceed
pub async fn discover_urls(
    ctx: &AuditContext,
    pool: Option<Arc<BrowserPool>>,
) -> Result<Vec<UrlEntry>, AuditError> {
    let audit = &ctx.config.audit;
    let mut resolver = SitemapResolver::new(ctx.fetcher.clone(), ctx.retry.clone())
        .include_all_languages(audit.include_all_languages)
        .max_urls(audit.max_urls);
    if let Some(pool) = pool {
        resolver = resolver.browser_fallback(pool, ctx.navigation_timeout());
    }
    resolver.resolve(&ctx.target, audit.sitemap_depth).await
}

/// Runs a complete audit
///
/// The pool is shut down when the run ends, whether it succeeded or not.
///
/// # Arguments
///
/// * `ctx` - Shared run context
/// * `pool` - Browser pool; initialized here if the caller has not done so
///
/// # Returns
///
/// * `Ok(AuditRun)` - Results assembled and written
/// * `Err(AuditError)` - Discovery, pool start-up or output writing failed
pub async fn run_audit(ctx: Arc<AuditContext>, pool: Arc<BrowserPool>) -> Result<AuditRun, AuditError> {
    let span = ctx.span().clone();
    let outcome = run(ctx, pool.clone()).instrument(span).await;
    pool.shutdown().await;
    outcome
}

async fn run(ctx: Arc<AuditContext>, pool: Arc<BrowserPool>) -> Result<AuditRun, AuditError> {
    tracing::info!("Starting audit of {}", ctx.target);

    let entries = discover_urls(&ctx, Some(pool.clone())).await?;
    if entries.is_empty() {
        tracing::warn!("No URLs discovered for {}", ctx.target);
    }

    let site_files = audit_site_files(&ctx.fetcher, &ctx.retry, &ctx.site_root()).await;

    pool.initialize().await?;
    let pages = audit_pages(&ctx, &pool, entries).await;

    let results = AuditResults::new(&ctx, pages, site_files);
    tracing::info!(
        "Audited {} pages ({} fully, {} served only, {} failed)",
        results.summary.total_pages,
        results.summary.audited,
        results.summary.served_only,
        results.summary.failed
    );

    let output_dir = ctx.output_dir();
    let results_path = write_results_json(&output_dir, &results).await?;
    let csv_path = if ctx.config.output.write_csv {
        Some(write_pages_csv(&output_dir, &results).await?)
    } else {
        None
    };
    let summary_path = write_markdown_summary(&output_dir, &results).await?;

    let options = PatternOptions::from(&ctx.config.patterns);
    let patterns = match extract_patterns(&results.pages, &output_dir, &ctx, &options).await {
        Ok(report) => {
            tracing::info!("{}", report.message);
            Some(report)
        }
        Err(e) => {
            tracing::warn!("Pattern extraction failed: {}", e);
            None
        }
    };

    Ok(AuditRun {
        results,
        patterns,
        results_path,
        csv_path,
        summary_path,
    })
}

/// Audits every entry, one task per URL, at most `ctx.concurrency()` in flight
///
/// Results come back in discovery order. A task that panics leaves a failed
/// result for its URL.
async fn audit_pages(
    ctx: &Arc<AuditContext>,
    pool: &Arc<BrowserPool>,
    entries: Vec<UrlEntry>,
) -> Vec<PageAuditResult> {
    let permits = ctx.concurrency();
    tracing::info!("Auditing {} URLs with {} concurrent pages", entries.len(), permits);

    let semaphore = Arc::new(Semaphore::new(permits));
    let mut results: Vec<PageAuditResult> = entries
        .iter()
        .map(|entry| {
            let mut placeholder = PageAuditResult::new(entry.url.as_str(), entry.source);
            placeholder.error = Some("Page audit task did not complete".to_string());
            placeholder
        })
        .collect();

    let mut tasks = JoinSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let ctx = ctx.clone();
        let pool = pool.clone();
        let semaphore = semaphore.clone();
        let span = tracing::debug_span!("page", url = %entry.url);

        tasks.spawn(
            async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let mut result = PageAuditResult::new(entry.url.as_str(), entry.source);
                        result.error = Some(e.to_string());
                        return (index, result);
                    }
                };
                (index, audit_page(&ctx, &pool, &entry).await)
            }
            .instrument(span),
        );
    }

    let total = results.len();
    let mut done = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                done += 1;
                tracing::debug!("Progress: {}/{}", done, total);
                results[index] = result;
            }
            Err(e) => tracing::error!("Page audit task failed: {}", e),
        }
    }

    results
}
