//! Configuration module for audit runs
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use agent_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("audit.toml")).unwrap();
//! println!("Auditing: {}", config.audit.target);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AuditConfig, BrowserConfig, Config, OutputConfig, PatternConfig, RetryConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, hash_content, load_config, load_config_with_hash, parse_config};
