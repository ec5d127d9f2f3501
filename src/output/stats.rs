//! Run summary statistics
//!
//! This module aggregates per-page audit results into the summary recorded in
//! `results.json` and printed at the end of a run.

use crate::audit::{PageAuditResult, PageStatus};
use crate::wellknown::SiteFiles;
use serde::{Deserialize, Serialize};

/// Aggregate view of one audit run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_pages: usize,
    pub audited: usize,
    pub served_only: usize,
    pub non_html: usize,
    pub challenges: usize,
    pub failed: usize,

    pub average_served_score: Option<f64>,
    pub average_rendered_score: Option<f64>,
    pub average_seo_score: Option<f64>,
    pub average_accessibility_score: Option<f64>,

    /// Counters summed over served documents
    pub title_missing: u32,
    pub title_too_long: u32,
    pub title_too_short: u32,
    pub meta_description_missing: u32,
    pub meta_description_too_long: u32,
    pub meta_description_too_short: u32,
    pub headings_missing_h1: u32,
    pub headings_multiple_h1: u32,
    pub headings_too_long: u32,
    pub headings_non_sequential: u32,

    pub pages_with_schema_org: usize,
    pub pages_with_llms_txt_reference: usize,
    /// Pages whose price only appears in the rendered document
    pub js_dependent_pricing: usize,
    pub accessibility_issue_count: usize,

    pub site_files_passed: usize,
    pub site_files_checked: usize,
}

impl Summary {
    /// Aggregates page results and site file checks
    ///
    /// # Arguments
    ///
    /// * `pages` - Every page result of the run
    /// * `site_files` - Well-known file checks
    pub fn from_results(pages: &[PageAuditResult], site_files: &SiteFiles) -> Self {
        let mut summary = Summary {
            total_pages: pages.len(),
            site_files_passed: site_files.passed_count(),
            site_files_checked: site_files.checks.len(),
            ..Default::default()
        };

        for page in pages {
            match page.status {
                PageStatus::Audited => summary.audited += 1,
                PageStatus::ServedOnly => summary.served_only += 1,
                PageStatus::NonHtml => summary.non_html += 1,
                PageStatus::Challenge => summary.challenges += 1,
                PageStatus::Failed => summary.failed += 1,
            }
            summary.accessibility_issue_count += page.accessibility_issues.len();
            if page.pricing.is_some_and(|p| p.js_dependent) {
                summary.js_dependent_pricing += 1;
            }

            let Some(bag) = &page.served_metrics else {
                continue;
            };
            if let Some(title) = bag.title.get() {
                summary.title_missing += title.missing;
                summary.title_too_long += title.too_long;
                summary.title_too_short += title.too_short;
            }
            if let Some(meta) = bag.meta_description.get() {
                summary.meta_description_missing += meta.missing;
                summary.meta_description_too_long += meta.too_long;
                summary.meta_description_too_short += meta.too_short;
            }
            if let Some(headings) = bag.headings.get() {
                summary.headings_missing_h1 += headings.missing;
                summary.headings_multiple_h1 += headings.multiple;
                summary.headings_too_long += headings.too_long;
                summary.headings_non_sequential += headings.non_sequential;
            }
            if bag.structured_data.get().is_some_and(|sd| sd.has_schema_org) {
                summary.pages_with_schema_org += 1;
            }
            if bag
                .llms_txt
                .get()
                .is_some_and(|l| l.has_llms_txt_reference || l.has_llms_txt_meta)
            {
                summary.pages_with_llms_txt_reference += 1;
            }
        }

        summary.average_served_score = average(pages.iter().filter_map(|p| p.served_score));
        summary.average_rendered_score = average(pages.iter().filter_map(|p| p.rendered_score));
        summary.average_seo_score = average(pages.iter().filter_map(|p| p.seo_score));
        summary.average_accessibility_score = average(pages.iter().filter_map(|p| p.accessibility_score));

        summary
    }

    /// Share of pages audited in both document states, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            self.audited as f64 / self.total_pages as f64 * 100.0
        }
    }
}

/// Mean rounded to one decimal, `None` for no values
fn average(scores: impl Iterator<Item = u32>) -> Option<f64> {
    let (sum, count) = scores.fold((0u64, 0u64), |(sum, count), s| (sum + s as u64, count + 1));
    if count == 0 {
        None
    } else {
        Some((sum as f64 / count as f64 * 10.0).round() / 10.0)
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &Summary) {
    println!("=== Audit Summary ===\n");

    println!("Pages:");
    println!("  Total: {}", summary.total_pages);
    println!("  Audited (served + rendered): {}", summary.audited);
    println!("  Served only: {}", summary.served_only);
    println!("  Non-HTML: {}", summary.non_html);
    println!("  Challenges: {}", summary.challenges);
    println!("  Failed: {}", summary.failed);
    println!();

    println!("Average scores:");
    for (label, value) in [
        ("Served", summary.average_served_score),
        ("Rendered", summary.average_rendered_score),
        ("SEO", summary.average_seo_score),
        ("Accessibility", summary.average_accessibility_score),
    ] {
        match value {
            Some(v) => println!("  {}: {:.1}", label, v),
            None => println!("  {}: n/a", label),
        }
    }
    println!();

    if summary.js_dependent_pricing > 0 {
        println!(
            "Pages with script-only pricing: {}",
            summary.js_dependent_pricing
        );
    }
    println!(
        "Well-known files: {}/{} passed",
        summary.site_files_passed, summary.site_files_checked
    );
    println!("Success Rate: {:.1}%", summary.success_rate());
}
