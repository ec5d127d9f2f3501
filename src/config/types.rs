use serde::Deserialize;

/// Main configuration structure for an audit run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub audit: AuditConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
    pub output: OutputConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,

    /// Optional path to a scoring-weight table; the built-in table is used when absent
    #[serde(default)]
    pub weights: Option<String>,
}

/// What to audit and how wide to go
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Domain root or sitemap URL
    pub target: String,

    /// Upper bound on page audits in flight at once
    #[serde(rename = "max-concurrent-pages", default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: u32,

    /// How many levels of nested sitemap indexes are followed
    #[serde(rename = "sitemap-depth", default = "default_sitemap_depth")]
    pub sitemap_depth: u32,

    /// Keep language-variant URLs (`/fr/...`, `/de/...`) found in sitemaps
    #[serde(rename = "include-all-languages", default)]
    pub include_all_languages: bool,

    /// Optional cap on the number of discovered URLs
    #[serde(rename = "max-urls", default)]
    pub max_urls: Option<usize>,

    /// Navigation timeout for rendered page loads (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,
}

/// Headless browser pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Number of browser processes kept in the pool
    #[serde(rename = "pool-size", default = "default_pool_size")]
    pub pool_size: u32,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Explicit browser executable; auto-detected when absent
    #[serde(default)]
    pub executable: Option<String>,

    /// Extra command-line arguments passed to every launched browser
    #[serde(default)]
    pub args: Vec<String>,

    /// Pages served by one instance before it is torn down and relaunched
    #[serde(rename = "restart-after-pages", default = "default_restart_after_pages")]
    pub restart_after_pages: u64,
}

/// Retry and backoff configuration for network and navigation operations
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(rename = "base-delay-ms", default = "default_base_delay")]
    pub base_delay_ms: u64,

    #[serde(rename = "max-delay-ms", default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Attempts allowed when a navigation keeps landing on a challenge page
    #[serde(rename = "challenge-max-attempts", default = "default_challenge_attempts")]
    pub challenge_max_attempts: u32,
}

/// Pattern extraction thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    #[serde(rename = "min-served-score", default = "default_min_score")]
    pub min_served_score: u32,

    #[serde(rename = "min-rendered-score", default = "default_min_score")]
    pub min_rendered_score: u32,

    #[serde(rename = "max-examples", default = "default_max_examples")]
    pub max_examples: usize,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving results.json, pages.csv and pattern_library.md
    pub directory: String,

    #[serde(rename = "write-csv", default = "default_true")]
    pub write_csv: bool,
}

/// User agent identification for served-HTML fetches
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    pub name: String,
    pub version: String,
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!("{}/{} (+{})", self.name, self.version, self.contact_url)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            headless: true,
            executable: None,
            args: Vec::new(),
            restart_after_pages: default_restart_after_pages(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            challenge_max_attempts: default_challenge_attempts(),
        }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_served_score: default_min_score(),
            min_rendered_score: default_min_score(),
            max_examples: default_max_examples(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "AgentAudit".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/agent-audit".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_pages() -> u32 {
    3
}

fn default_sitemap_depth() -> u32 {
    2
}

fn default_navigation_timeout() -> u64 {
    30_000
}

fn default_pool_size() -> u32 {
    3
}

fn default_restart_after_pages() -> u64 {
    50
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1_000
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_challenge_attempts() -> u32 {
    2
}

fn default_min_score() -> u32 {
    70
}

fn default_max_examples() -> usize {
    5
}
