use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use agent_audit::config::load_config;
///
/// let config = load_config(Path::new("audit.toml")).unwrap();
/// println!("Pool size: {}", config.browser.pool_size);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is recorded in the run metadata so two result sets can be told
/// apart when they were produced under different settings.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

/// Hex-encoded SHA-256 of arbitrary configuration text
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[audit]
target = "https://example.com/sitemap.xml"
max-concurrent-pages = 4
sitemap-depth = 1
include-all-languages = true

[browser]
pool-size = 2
restart-after-pages = 25
args = ["--no-sandbox"]

[retry]
max-attempts = 4
base-delay-ms = 200
max-delay-ms = 2000
challenge-max-attempts = 2

[patterns]
min-served-score = 60
max-examples = 3

[output]
directory = "./results"

[user-agent]
name = "TestAuditor"
version = "1.0"
contact-url = "https://example.com/about"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.audit.max_concurrent_pages, 4);
        assert!(config.audit.include_all_languages);
        assert_eq!(config.browser.pool_size, 2);
        assert_eq!(config.browser.restart_after_pages, 25);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.patterns.min_served_score, 60);
        assert_eq!(config.patterns.min_rendered_score, 70);
        assert_eq!(config.patterns.max_examples, 3);
        assert_eq!(config.user_agent.name, "TestAuditor");
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(
            r#"
[audit]
target = "https://example.com/"

[output]
directory = "./out"
"#,
        )
        .unwrap();

        assert_eq!(config.browser.pool_size, 3);
        assert_eq!(config.browser.restart_after_pages, 50);
        assert_eq!(config.retry.challenge_max_attempts, 2);
        assert_eq!(config.patterns.max_examples, 5);
        assert!(config.output.write_csv);
        assert!(config.weights.is_none());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/audit.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let result = parse_config(
            r#"
[audit]
target = "https://example.com/"
max-concurrent-pages = 0

[output]
directory = "./out"
"#,
        );
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_config_hash_matches_content() {
        let file = create_temp_config(VALID_CONFIG);
        let (_, hash) = load_config_with_hash(file.path()).unwrap();

        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, hash_content("something else"));
    }
}
