use crate::config::types::{
    AuditConfig, BrowserConfig, Config, OutputConfig, PatternConfig, RetryConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_audit_config(&config.audit)?;
    validate_browser_config(&config.browser)?;
    validate_retry_config(&config.retry)?;
    validate_pattern_config(&config.patterns)?;
    validate_output_config(&config.output)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates the audit target and crawl bounds
fn validate_audit_config(config: &AuditConfig) -> Result<(), ConfigError> {
    let target = Url::parse(&config.target)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target '{}': {}", config.target, e)))?;

    if target.scheme() != "http" && target.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "target must use http or https, got '{}'",
            target.scheme()
        )));
    }

    if target.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "target '{}' has no host",
            config.target
        )));
    }

    if config.max_concurrent_pages < 1 || config.max_concurrent_pages > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages must be between 1 and 64, got {}",
            config.max_concurrent_pages
        )));
    }

    if config.sitemap_depth > 10 {
        return Err(ConfigError::Validation(format!(
            "sitemap_depth must be <= 10, got {}",
            config.sitemap_depth
        )));
    }

    if config.max_urls == Some(0) {
        return Err(ConfigError::Validation(
            "max_urls must be >= 1 when set".to_string(),
        ));
    }

    if config.navigation_timeout_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_ms must be >= 1000ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    Ok(())
}

/// Validates browser pool sizing
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.pool_size < 1 || config.pool_size > 16 {
        return Err(ConfigError::Validation(format!(
            "pool_size must be between 1 and 16, got {}",
            config.pool_size
        )));
    }

    if config.restart_after_pages < 1 {
        return Err(ConfigError::Validation(
            "restart_after_pages must be >= 1".to_string(),
        ));
    }

    if let Some(path) = &config.executable {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "executable cannot be an empty path".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates retry and backoff bounds
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.challenge_max_attempts < 1 || config.challenge_max_attempts > config.max_attempts {
        return Err(ConfigError::Validation(format!(
            "challenge_max_attempts must be between 1 and max_attempts ({}), got {}",
            config.max_attempts, config.challenge_max_attempts
        )));
    }

    if config.max_delay_ms < config.base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms ({}) must be >= base_delay_ms ({})",
            config.max_delay_ms, config.base_delay_ms
        )));
    }

    Ok(())
}

/// Validates pattern thresholds
fn validate_pattern_config(config: &PatternConfig) -> Result<(), ConfigError> {
    if config.min_served_score > 100 || config.min_rendered_score > 100 {
        return Err(ConfigError::Validation(format!(
            "pattern score thresholds must be <= 100, got served={} rendered={}",
            config.min_served_score, config.min_rendered_score
        )));
    }

    if config.max_examples < 1 {
        return Err(ConfigError::Validation(
            "max_examples must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Name: non-empty, alphanumeric + hyphens only
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config.name.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}
