//! Network operation executor
//!
//! Every outbound request and browser navigation goes through this module:
//! - Classifying responses into transient, fatal and anti-bot challenge outcomes
//! - Retrying transient failures with exponential backoff
//! - Retrying challenge pages a few times during navigation before giving up
//! - A shared HTTP client for served-HTML and well-known file fetches

mod classify;
mod executor;
mod fetcher;

use thiserror::Error;

pub use classify::{classify_reqwest_error, classify_status, looks_like_challenge};
pub use executor::{execute_browser_operation, execute_network_operation, RetryPolicy};
pub use fetcher::{build_http_client, decode_body, FetchedResponse, Fetcher};

/// Errors produced by network operations and navigations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// Timeout, connection reset, 5xx or 429; safe to retry
    #[error("Transient network failure: {0}")]
    Transient(String),

    /// Non-retryable HTTP status
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Anti-automation interstitial served instead of content
    #[error("Anti-bot challenge detected at {url}")]
    Challenge { url: String },

    /// Anything else that will not improve with a retry
    #[error("Request failed: {0}")]
    Fatal(String),
}

impl NetworkError {
    /// Returns true if the error should be retried with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, NetworkError::Transient(_))
    }

    /// Returns true if the error is a challenge page
    pub fn is_challenge(&self) -> bool {
        matches!(self, NetworkError::Challenge { .. })
    }
}
