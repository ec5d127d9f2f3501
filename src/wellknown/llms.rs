//! llms.txt quality analysis
//!
//! Scores out of 105: core elements 40, sections 30, content length 15,
//! external links 10, specificity 5, plus up to 5 bonus points.

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MAX_LLMS_TXT_SCORE: u32 = 105;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmsTxtBreakdown {
    pub title: u32,
    pub description: u32,
    pub contact: u32,
    pub last_updated: u32,
    pub sections: u32,
    pub content_length: u32,
    pub external_links: u32,
    pub specificity: u32,
}

impl LlmsTxtBreakdown {
    fn total(&self) -> u32 {
        self.title
            + self.description
            + self.contact
            + self.last_updated
            + self.sections
            + self.content_length
            + self.external_links
            + self.specificity
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmsTxtBonus {
    pub rate_limits: u32,
    pub api_docs: u32,
    pub attribution: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmsTxtQuality {
    pub score: u32,
    pub breakdown: LlmsTxtBreakdown,
    pub bonus: LlmsTxtBonus,
    /// Number of `## ` sections
    pub section_count: usize,
    pub content_length: usize,
    pub external_link_count: usize,
    pub has_title: bool,
    pub has_description: bool,
    pub has_contact: bool,
    pub has_last_updated: bool,
    pub has_detailed_policies: bool,
    pub recommendations: Vec<String>,
}

struct Heading<'a> {
    level: u8,
    title: &'a str,
}

fn headings(content: &str) -> Vec<Heading<'_>> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim_end();
            for (prefix, level) in [("### ", 3), ("## ", 2), ("# ", 1)] {
                if let Some(title) = line.strip_prefix(prefix) {
                    if !title.is_empty() {
                        return Some(Heading { level, title });
                    }
                }
            }
            None
        })
        .collect()
}

/// Case-insensitive regex test; an invalid pattern never matches
fn matches(pattern: &str, text: &str) -> bool {
    Regex::new(&format!("(?i){}", pattern))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

fn count_links(content: &str) -> usize {
    Regex::new(r"https?://[^\s)]+")
        .map(|re| re.find_iter(content).count())
        .unwrap_or(0)
}

/// Scores an llms.txt file for how well it guides AI agents
///
/// # Arguments
///
/// * `content` - Raw llms.txt text
///
/// # Returns
///
/// The score (0-105), its breakdown and recommendations
pub fn analyze_llms_txt(content: &str) -> LlmsTxtQuality {
    let headings = headings(content);
    let lower = content.to_lowercase();
    let content_length = content.chars().count();

    let has_title = headings.iter().any(|h| h.level == 1);
    let has_description = headings.iter().any(|h| {
        let title = h.title.to_lowercase();
        title.contains("overview") || title.contains("description")
    });
    let has_contact = lower.contains("contact") || lower.contains("email:") || lower.contains("support@");
    let has_last_updated = matches(r"last updated:|updated:", content) || matches(r"\d{4}-\d{2}-\d{2}", content);

    let section_count = headings.iter().filter(|h| h.level == 2).count();
    let external_link_count = count_links(content);

    let has_detailed_policies =
        matches(r"rate limit|req/sec|authentication|attribution", content) && content_length > 1000;
    let has_basic_policies = matches(r"rate limit|authentication|attribution", content);

    let breakdown = LlmsTxtBreakdown {
        title: if has_title { 10 } else { 0 },
        description: if has_description { 10 } else { 0 },
        contact: if has_contact { 10 } else { 0 },
        last_updated: if has_last_updated { 10 } else { 0 },
        sections: match section_count {
            0 => 0,
            1 | 2 => 10,
            3 | 4 => 20,
            _ => 30,
        },
        content_length: if content_length > 2000 {
            15
        } else if content_length >= 1000 {
            10
        } else {
            5
        },
        external_links: match external_link_count {
            0 => 0,
            1 | 2 => 5,
            _ => 10,
        },
        specificity: if has_detailed_policies {
            5
        } else if has_basic_policies {
            3
        } else {
            0
        },
    };

    let bonus = LlmsTxtBonus {
        rate_limits: if matches(r"rate limit", content) && matches(r"\d+\s*(req|request)", content) {
            2
        } else {
            0
        },
        api_docs: if matches(r"api|endpoint|base url", content) && matches(r"documentation", content) {
            2
        } else {
            0
        },
        attribution: if matches(r"attribution|cite|source:", content) { 1 } else { 0 },
    };

    let score = (breakdown.total() + bonus.rate_limits + bonus.api_docs + bonus.attribution)
        .min(MAX_LLMS_TXT_SCORE);

    let mut recommendations = Vec::new();
    if score < 40 {
        if !has_title {
            recommendations.push("Add title and overview".to_string());
        }
        if !has_description {
            recommendations.push("Add access guidelines".to_string());
        }
        if !has_contact {
            recommendations.push("Add contact information".to_string());
        }
    } else if score < 70 {
        if external_link_count < 3 {
            recommendations.push("Add API information and external links".to_string());
        }
        if section_count < 3 {
            recommendations.push("Add more sections".to_string());
        }
    } else if score < 90 {
        if !has_detailed_policies {
            recommendations.push("Increase detail and specificity".to_string());
        }
        if content_length < 2000 {
            recommendations.push("Expand content".to_string());
        }
    } else {
        recommendations.push("Maintain and update regularly".to_string());
    }

    LlmsTxtQuality {
        score,
        breakdown,
        bonus,
        section_count,
        content_length,
        external_link_count,
        has_title,
        has_description,
        has_contact,
        has_last_updated,
        has_detailed_policies,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file() {
        let quality = analyze_llms_txt("# Example Shop\n");
        assert!(quality.has_title);
        assert_eq!(quality.breakdown.title, 10);
        assert_eq!(quality.breakdown.content_length, 5);
        assert_eq!(quality.score, 15);
        assert!(quality
            .recommendations
            .contains(&"Add contact information".to_string()));
    }

    #[test]
    fn test_empty_file() {
        let quality = analyze_llms_txt("");
        assert!(!quality.has_title);
        assert_eq!(quality.section_count, 0);
        assert_eq!(quality.score, 5);
    }

    #[test]
    fn test_rich_file() {
        let mut content = String::from(
            "# Example Shop\n\
             > Outdoor gear retailer\n\n\
             ## Overview\nWe sell tents and boots.\n\n\
             ## Products\n- https://example.com/tents\n- https://example.com/boots\n\n\
             ## API\nBase URL https://api.example.com, see the API documentation.\n\n\
             ## Access\nRate limit: 10 requests per second. Authentication via API key.\n\n\
             ## Attribution\nPlease cite example.com as the source.\n\n\
             Contact: support@example.com\nLast updated: 2025-06-01\n",
        );
        content.push_str(&"Additional product guidance for agents. ".repeat(60));

        let quality = analyze_llms_txt(&content);
        assert_eq!(quality.section_count, 5);
        assert_eq!(quality.breakdown.sections, 30);
        assert_eq!(quality.external_link_count, 3);
        assert!(quality.has_description && quality.has_contact && quality.has_last_updated);
        assert!(quality.has_detailed_policies);
        assert_eq!(quality.bonus.rate_limits, 2);
        assert_eq!(quality.bonus.api_docs, 2);
        assert_eq!(quality.bonus.attribution, 1);
        assert_eq!(quality.score, MAX_LLMS_TXT_SCORE);
        assert_eq!(quality.recommendations, vec!["Maintain and update regularly"]);
    }

    #[test]
    fn test_heading_levels() {
        let found = headings("# A\n## B\n### C\n#### D\n#NoSpace\n");
        let levels: Vec<u8> = found.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }
}
