//! Robots.txt analysis for AI agents
//!
//! Reports which known AI user agents a site addresses, which of them are
//! shut out of the site root, whether sensitive paths are protected and how
//! much guidance the file gives, rolled into a 0-100 quality score.

mod parser;

pub use parser::{ParsedRobots, RobotsRule};

use serde::{Deserialize, Serialize};

/// User agents of AI crawlers and assistants
pub const AI_USER_AGENTS: &[&str] = &[
    "GPTBot",
    "ClaudeBot",
    "Claude-Web",
    "GoogleBot-AI",
    "PerplexityBot",
    "Bingbot",
    "Anthropic-AI",
    "cohere-ai",
    "ChatGPT-User",
];

/// Paths agents should normally be kept out of
const SENSITIVE_PATHS: &[&str] = &[
    "/admin",
    "/account",
    "/cart",
    "/checkout",
    "/login",
    "/auth",
    "/api/private",
    "/user",
    "/profile",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => QualityLevel::Excellent,
            60..=79 => QualityLevel::Good,
            40..=59 => QualityLevel::Fair,
            _ => QualityLevel::Poor,
        }
    }
}

/// Points awarded per area
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsBreakdown {
    /// 30 for three or more AI agents declared, 15 for at least one
    pub ai_user_agents: u32,
    /// 20 when a sitemap is declared
    pub sitemap: u32,
    /// 25 for three or more protected sensitive paths, 15 for at least one
    pub path_protection: u32,
    /// 15 when a comment points at llms.txt
    pub llms_txt_reference: u32,
    /// 10 for three or more comments, 5 for at least one
    pub comments: u32,
}

impl RobotsBreakdown {
    pub fn total(&self) -> u32 {
        self.ai_user_agents + self.sitemap + self.path_protection + self.llms_txt_reference + self.comments
    }
}

/// What a site's robots.txt says to AI agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsReport {
    pub score: u32,
    pub level: QualityLevel,
    pub breakdown: RobotsBreakdown,
    /// Declared user agents that belong to known AI crawlers
    pub ai_agents_declared: Vec<String>,
    /// Known AI agents not allowed to fetch `/`
    pub blocked_ai_agents: Vec<String>,
    pub allowed_ai_agents: Vec<String>,
    pub sitemaps: Vec<String>,
    pub protected_paths: Vec<String>,
    pub has_llms_txt_reference: bool,
    pub comment_count: usize,
    /// Crawl delay for the `*` group, in seconds
    pub crawl_delay: Option<f64>,
    pub recommendations: Vec<String>,
}

/// Analyzes robots.txt content
///
/// # Arguments
///
/// * `content` - Raw robots.txt text; empty text scores zero
///
/// # Returns
///
/// A report with the score breakdown, AI-agent access and recommendations
pub fn analyze_robots(content: &str) -> RobotsReport {
    let parsed = ParsedRobots::parse(content);

    let ai_agents_declared: Vec<String> = parsed
        .user_agents
        .iter()
        .filter(|ua| {
            let ua = ua.to_lowercase();
            AI_USER_AGENTS.iter().any(|ai| ua.contains(&ai.to_lowercase()))
        })
        .cloned()
        .collect();

    let (allowed_ai_agents, blocked_ai_agents): (Vec<String>, Vec<String>) = AI_USER_AGENTS
        .iter()
        .map(|agent| agent.to_string())
        .partition(|agent| parsed.is_allowed("/", agent));

    let mut protected_paths: Vec<String> = Vec::new();
    for rule in parsed.rules.iter().filter(|r| !r.allow) {
        let path = rule.path.to_lowercase();
        let sensitive = SENSITIVE_PATHS.iter().any(|s| path.starts_with(s));
        if sensitive && !protected_paths.contains(&rule.path) {
            protected_paths.push(rule.path.clone());
        }
    }

    let has_llms_txt_reference = parsed.comments.iter().any(|c| {
        let c = c.to_lowercase();
        c.contains("llms.txt") || c.contains("llms-txt")
    });

    let breakdown = RobotsBreakdown {
        ai_user_agents: tiered(ai_agents_declared.len(), 30, 15),
        sitemap: if parsed.sitemaps.is_empty() { 0 } else { 20 },
        path_protection: tiered(protected_paths.len(), 25, 15),
        llms_txt_reference: if has_llms_txt_reference { 15 } else { 0 },
        comments: tiered(parsed.comments.len(), 10, 5),
    };
    let score = if content.trim().is_empty() {
        0
    } else {
        breakdown.total()
    };

    let mut recommendations = Vec::new();
    if content.trim().is_empty() {
        recommendations.push("Create a valid robots.txt file".to_string());
    } else if score < 40 {
        if parsed.sitemaps.is_empty() {
            recommendations.push("Add sitemap declaration".to_string());
        }
        if ai_agents_declared.is_empty() {
            recommendations.push("Add AI-specific user agents".to_string());
        }
    } else if score < 60 && protected_paths.len() < 3 {
        recommendations.push("Add protected paths".to_string());
    }

    if !blocked_ai_agents.is_empty() {
        tracing::info!("robots.txt blocks AI agents: {}", blocked_ai_agents.join(", "));
    }

    RobotsReport {
        score,
        level: QualityLevel::from_score(score),
        breakdown,
        ai_agents_declared,
        blocked_ai_agents,
        allowed_ai_agents,
        sitemaps: parsed.sitemaps.clone(),
        protected_paths,
        has_llms_txt_reference,
        comment_count: parsed.comments.len(),
        crawl_delay: parsed.crawl_delay("*"),
        recommendations,
    }
}

/// `high` for three or more, `low` for at least one
fn tiered(count: usize, high: u32, low: u32) -> u32 {
    match count {
        0 => 0,
        1 | 2 => low,
        _ => high,
    }
}
