//! Per-run audit context
//!
//! Everything an audit operation needs is passed explicitly through an
//! [`AuditContext`]: configuration, the shared HTTP fetcher, retry policy,
//! scoring weights and the run's tracing span. There is no process-wide
//! logger or settings object.

use crate::config::{hash_content, Config};
use crate::network::{Fetcher, RetryPolicy};
use crate::scoring::ScoringWeights;
use crate::url::{extract_domain, site_root};
use crate::{AuditError, UrlError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Timeout for plain HTTP fetches (sitemaps, served HTML, well-known files)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state for one audit run
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub run_id: String,
    pub config: Config,
    /// SHA-256 of the configuration text
    pub config_hash: String,
    pub fetcher: Fetcher,
    pub retry: RetryPolicy,
    pub weights: ScoringWeights,
    /// Root or sitemap URL being audited
    pub target: Url,
    span: tracing::Span,
}

impl AuditContext {
    /// Builds a context from a validated configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The audit configuration
    /// * `config_hash` - Hash of the configuration text, recorded in results
    ///
    /// # Returns
    ///
    /// * `Ok(AuditContext)` - Ready to run
    /// * `Err(AuditError)` - Bad target URL, unreadable weight file or HTTP client failure
    pub fn new(config: Config, config_hash: String) -> Result<Self, AuditError> {
        let target = parse_target(&config.audit.target)?;

        let weights = match &config.weights {
            Some(path) => {
                tracing::info!("Loading scoring weights from {}", path);
                ScoringWeights::load(Path::new(path))?
            }
            None => ScoringWeights::builtin()?,
        };

        let fetcher = Fetcher::from_config(&config.user_agent, HTTP_TIMEOUT)?;
        let retry = RetryPolicy::from(&config.retry);

        let run_id = format!(
            "{}-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%SZ"),
            config_hash.get(..8).unwrap_or(&config_hash)
        );
        let span = run_span(&run_id, &target);

        Ok(Self {
            run_id,
            config,
            config_hash,
            fetcher,
            retry,
            weights,
            target,
            span,
        })
    }

    /// Builds a context from configuration text, hashing it on the way
    pub fn from_toml(content: &str) -> Result<Self, AuditError> {
        let config = crate::config::parse_config(content)?;
        Self::new(config, hash_content(content))
    }

    /// Replaces the audit target (CLI override); the run span follows the new domain
    pub fn with_target(mut self, target: &str) -> Result<Self, AuditError> {
        self.target = parse_target(target)?;
        self.config.audit.target = target.to_string();
        self.span = run_span(&self.run_id, &self.target);
        Ok(self)
    }

    /// The run's tracing span; enter it for every operation of the run
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Host of the audit target
    pub fn domain(&self) -> String {
        extract_domain(&self.target).unwrap_or_default()
    }

    /// Origin root of the audit target (`scheme://host[:port]/`)
    pub fn site_root(&self) -> Url {
        site_root(&self.target)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.output.directory)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.config.audit.navigation_timeout_ms)
    }

    /// Number of page audits allowed in flight: `min(pool size, max concurrent pages)`
    pub fn concurrency(&self) -> usize {
        let pool = self.config.browser.pool_size as usize;
        let pages = self.config.audit.max_concurrent_pages as usize;
        pool.min(pages).max(1)
    }
}

fn run_span(run_id: &str, target: &Url) -> tracing::Span {
    let domain = extract_domain(target).unwrap_or_default();
    tracing::info_span!("audit", run_id = %run_id, domain = %domain)
}

fn parse_target(target: &str) -> Result<Url, AuditError> {
    let url = Url::parse(target)?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string()).into()),
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain.into());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[audit]
target = "https://Shop.Example.com/sitemap.xml"
max-concurrent-pages = 8

[browser]
pool-size = 2

[output]
directory = "./out"
"#;

    #[test]
    fn test_context_from_toml() {
        let ctx = AuditContext::from_toml(CONFIG).unwrap();
        assert_eq!(ctx.domain(), "shop.example.com");
        assert_eq!(ctx.site_root().as_str(), "https://shop.example.com/");
        assert_eq!(ctx.concurrency(), 2);
        assert_eq!(ctx.config_hash.len(), 64);
        assert!(ctx.run_id.ends_with(&ctx.config_hash[..8]));
        assert_eq!(ctx.output_dir(), PathBuf::from("./out"));
        assert_eq!(ctx.weights, ScoringWeights::builtin().unwrap());
    }

    #[test]
    fn test_target_override() {
        let ctx = AuditContext::from_toml(CONFIG)
            .unwrap()
            .with_target("http://localhost:8080/")
            .unwrap();
        assert_eq!(ctx.domain(), "localhost");
        assert_eq!(ctx.config.audit.target, "http://localhost:8080/");
    }

    #[test]
    fn test_target_override_moves_span() {
        use std::sync::{Arc, Mutex};
        use tracing::field::{Field, Visit};
        use tracing::span::{Attributes, Id};
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        #[derive(Clone, Default)]
        struct SpanDomains(Arc<Mutex<Vec<String>>>);

        struct DomainField<'a>(&'a mut Vec<String>);

        impl Visit for DomainField<'_> {
            fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
                if field.name() == "domain" {
                    self.0.push(format!("{:?}", value));
                }
            }
        }

        impl<S: tracing::Subscriber> Layer<S> for SpanDomains {
            fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
                let mut domains = self.0.lock().unwrap();
                attrs.record(&mut DomainField(&mut domains));
            }
        }

        let domains = SpanDomains::default();
        let subscriber = tracing_subscriber::registry().with(domains.clone());
        tracing::subscriber::with_default(subscriber, || {
            AuditContext::from_toml(CONFIG)
                .unwrap()
                .with_target("http://localhost:8080/")
                .unwrap();
        });

        let recorded = domains.0.lock().unwrap().clone();
        assert_eq!(recorded, vec!["shop.example.com", "localhost"]);
    }

    #[test]
    fn test_rejects_non_http_target() {
        let err = AuditContext::from_toml(CONFIG)
            .unwrap()
            .with_target("ftp://example.com/")
            .unwrap_err();
        assert!(matches!(err, AuditError::UrlError(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_missing_weights_file() {
        let config = format!("weights = \"/nonexistent/weights.toml\"\n{}", CONFIG);
        let err = AuditContext::from_toml(&config).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }
}
