//! agent-audit: agent-friendliness auditing for websites
//!
//! This crate audits a bounded set of pages for how well they expose content,
//! state and structure to automated agents that may only ever see the served
//! (pre-script) HTML. A run discovers the URL set, renders every page in a pooled
//! headless browser, extracts metrics from both document states, scores them and
//! finally mines the high-scoring pages for reusable markup patterns.

pub mod audit;
pub mod browser;
pub mod config;
pub mod context;
pub mod discovery;
pub mod metrics;
pub mod network;
pub mod output;
pub mod patterns;
pub mod robots;
pub mod scoring;
pub mod url;
pub mod wellknown;

use thiserror::Error;

/// Main error type for audit runs
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] network::NetworkError),

    #[error("Browser pool error: {0}")]
    Pool(#[from] browser::PoolError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL discovery failed for {url}: {message}")]
    Discovery { url: String, message: String },

    #[error("Anti-bot challenge served for {url}")]
    Challenge { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid scoring weights: {0}")]
    InvalidWeights(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use audit::{audit_page, run_audit, AuditRun, PageAuditResult, PageStatus};
pub use browser::{BrowserPool, PoolConfig, PoolError, PooledBrowser};
pub use config::Config;
pub use context::AuditContext;
pub use discovery::{SitemapResolver, UrlEntry, UrlSource};
pub use metrics::{collect_metrics, HtmlDocument, MetricsBag};
pub use patterns::{extract_patterns, PatternOptions, PatternReport};
pub use scoring::ScoringWeights;
pub use url::{dedup_key, normalize_url, same_origin};
