//! Markdown summary generation
//!
//! This module renders a human-readable `summary.md` for a finished run:
//! run metadata, page counts, average scores, well-known file checks and the
//! lowest-scoring pages.

use super::AuditResults;

/// Pages listed in the "needs attention" table
const WORST_PAGES: usize = 20;

/// Formats audit results as markdown
///
/// # Arguments
///
/// * `results` - The complete run results
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(results: &AuditResults) -> String {
    let meta = &results.metadata;
    let summary = &results.summary;
    let mut md = String::new();

    md.push_str(&format!("# Agent Audit: {}\n\n", meta.domain));

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", meta.run_id));
    md.push_str(&format!("- **Target**: {}\n", meta.target));
    md.push_str(&format!("- **Finished**: {}\n", meta.timestamp.to_rfc3339()));
    md.push_str(&format!("- **Version**: {}\n", meta.version));
    md.push_str(&format!("- **Config Hash**: {}\n\n", meta.config_hash));

    md.push_str("## Pages\n\n");
    md.push_str("| Status | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Audited | {} |\n", summary.audited));
    md.push_str(&format!("| Served only | {} |\n", summary.served_only));
    md.push_str(&format!("| Non-HTML | {} |\n", summary.non_html));
    md.push_str(&format!("| Challenge | {} |\n", summary.challenges));
    md.push_str(&format!("| Failed | {} |\n", summary.failed));
    md.push_str(&format!("| **Total** | {} |\n\n", summary.total_pages));

    md.push_str("## Average Scores\n\n");
    md.push_str("| Score | Average |\n");
    md.push_str("|-------|---------|\n");
    for (label, value) in [
        ("Served", summary.average_served_score),
        ("Rendered", summary.average_rendered_score),
        ("SEO", summary.average_seo_score),
        ("Accessibility", summary.average_accessibility_score),
    ] {
        let shown = value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}", v));
        md.push_str(&format!("| {} | {} |\n", label, shown));
    }
    md.push('\n');

    let hidden_prices: Vec<&str> = results
        .pages
        .iter()
        .filter(|p| p.pricing.is_some_and(|pricing| pricing.js_dependent))
        .map(|p| p.url.as_str())
        .collect();
    if !hidden_prices.is_empty() {
        md.push_str("## Script-Only Pricing

");
        md.push_str("Prices on these pages appear only after scripts run:

");
        for url in hidden_prices {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    if !results.site_files.checks.is_empty() {
        md.push_str("## Well-Known Files\n\n");
        md.push_str("| File | Result | Detail |\n");
        md.push_str("|------|--------|--------|\n");
        for check in &results.site_files.checks {
            let result = if check.passed { "pass" } else { "fail" };
            let detail = check
                .error
                .clone()
                .or_else(|| check.status.map(|s| format!("HTTP {}", s)))
                .unwrap_or_default();
            md.push_str(&format!("| {} | {} | {} |\n", check.path, result, detail));
        }
        md.push('\n');

        if let Some(llms) = &results.site_files.llms_txt {
            md.push_str(&format!("llms.txt quality: {}/105\n\n", llms.score));
        }
        if let Some(robots) = &results.site_files.robots_txt {
            md.push_str(&format!(
                "robots.txt quality: {}/100 ({:?})\n\n",
                robots.score, robots.level
            ));
            if !robots.blocked_ai_agents.is_empty() {
                md.push_str(&format!(
                    "Blocked AI agents: {}\n\n",
                    robots.blocked_ai_agents.join(", ")
                ));
            }
        }
    }

    let mut scored: Vec<_> = results
        .pages
        .iter()
        .filter_map(|p| p.served_score.map(|s| (s, p)))
        .collect();
    if !scored.is_empty() {
        scored.sort_by_key(|(score, _)| *score);
        md.push_str("## Lowest Served Scores\n\n");
        md.push_str("| URL | Served | Rendered |\n");
        md.push_str("|-----|--------|----------|\n");
        for (served, page) in scored.iter().take(WORST_PAGES) {
            let rendered = page
                .rendered_score
                .map_or_else(|| "-".to_string(), |r| r.to_string());
            md.push_str(&format!("| {} | {} | {} |\n", page.url, served, rendered));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{PageAuditResult, PageStatus};
    use crate::context::AuditContext;
    use crate::discovery::UrlSource;
    use crate::wellknown::{FileCheck, SiteFiles};

    fn create_test_results() -> AuditResults {
        let ctx = AuditContext::from_toml(
            "[audit]\ntarget = \"https://example.com/\"\n[output]\ndirectory = \"out\"\n",
        )
        .unwrap();
        let mut low = PageAuditResult::new("https://example.com/low", UrlSource::Sitemap);
        low.status = PageStatus::Audited;
        low.served_score = Some(12);
        low.rendered_score = Some(30);
        let mut high = PageAuditResult::new("https://example.com/high", UrlSource::Sitemap);
        high.status = PageStatus::ServedOnly;
        high.served_score = Some(90);

        let site = SiteFiles {
            checks: vec![FileCheck {
                path: "/ai-agents.md".to_string(),
                url: "https://example.com/ai-agents.md".to_string(),
                passed: false,
                status: Some(404),
                error: Some("HTTP 404".to_string()),
            }],
            ..Default::default()
        };
        AuditResults::new(&ctx, vec![high, low], site)
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_results());
        assert!(markdown.contains("# Agent Audit: example.com"));
        assert!(markdown.contains("| Audited | 1 |"));
        assert!(markdown.contains("| Served | 51.0 |"));
        assert!(markdown.contains("| /ai-agents.md | fail | HTTP 404 |"));
    }

    #[test]
    fn test_lowest_scores_first() {
        let markdown = format_markdown_summary(&create_test_results());
        let low = markdown.find("https://example.com/low").unwrap();
        let high = markdown.find("https://example.com/high").unwrap();
        assert!(low < high);
        assert!(markdown.contains("| https://example.com/high | 90 | - |"));
    }

    #[test]
    fn test_script_only_pricing_listed() {
        let mut results = create_test_results();
        assert!(!format_markdown_summary(&results).contains("Script-Only Pricing"));

        results.pages[1].pricing = Some(crate::metrics::PricingExposure::compare(
            "<p>Plans</p>",
            "<p>Plans from $9.99</p>",
        ));
        let markdown = format_markdown_summary(&results);
        assert!(markdown.contains("## Script-Only Pricing"));
        assert!(markdown.contains("- https://example.com/low\n"));
    }
}
