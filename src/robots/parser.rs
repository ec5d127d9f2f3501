//! Robots.txt parsing
//!
//! Allow/disallow decisions go through the robotstxt crate's matcher; the
//! structural pass here only collects what the quality report needs (declared
//! agents, rules, sitemap lines and comments).

use robotstxt::DefaultMatcher;

/// An `Allow` or `Disallow` line with the agent group it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsRule {
    pub user_agent: String,
    pub allow: bool,
    pub path: String,
}

/// Parsed robots.txt data
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    content: String,
    /// Declared user agents, in first-seen order
    pub user_agents: Vec<String>,
    pub rules: Vec<RobotsRule>,
    pub sitemaps: Vec<String>,
    /// Comment text with the leading `#` stripped
    pub comments: Vec<String>,
}

impl ParsedRobots {
    /// Parses raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    ///
    /// # Returns
    ///
    /// A ParsedRobots instance; unknown lines are ignored
    pub fn parse(content: &str) -> Self {
        let mut parsed = Self {
            content: content.to_string(),
            ..Default::default()
        };
        let mut current_agent: Option<String> = None;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(comment) = trimmed.strip_prefix('#') {
                parsed.comments.push(comment.trim().to_string());
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    if !parsed.user_agents.iter().any(|ua| ua == value) {
                        parsed.user_agents.push(value.to_string());
                    }
                    current_agent = Some(value.to_string());
                }
                "sitemap" => parsed.sitemaps.push(value.to_string()),
                directive @ ("allow" | "disallow") => parsed.rules.push(RobotsRule {
                    user_agent: current_agent.clone().unwrap_or_else(|| "*".to_string()),
                    allow: directive == "allow",
                    path: value.to_string(),
                }),
                _ => {}
            }
        }

        parsed
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a path is allowed for the given user agent
    ///
    /// Empty content allows everything.
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, path)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_group_body = false;
        let mut wildcard = None;
        let mut specific = None;

        for line in self.content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    if in_group_body {
                        group.clear();
                        in_group_body = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_group_body = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        specific = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard = Some(delay);
                    }
                }
                _ => in_group_body = true,
            }
        }

        specific.or(wildcard)
    }
}
