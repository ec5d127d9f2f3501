use super::NetworkError;
use crate::config::RetryConfig;
use std::future::Future;
use std::time::Duration;

/// Retry and backoff parameters shared by network fetches and navigations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts for transient failures (first try included)
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Total attempts when a navigation keeps landing on a challenge page
    pub challenge_max_attempts: u32,
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            challenge_max_attempts: config.challenge_max_attempts,
        }
    }
}

/// Runs a network operation, retrying transient failures with exponential backoff
///
/// Non-transient errors (4xx other than 429, challenges, fatal errors) are
/// returned immediately without another attempt.
///
/// # Arguments
///
/// * `policy` - Retry parameters
/// * `name` - Operation name used in log lines
/// * `operation` - Closure producing a fresh future for each attempt
pub async fn execute_network_operation<T, F, Fut>(
    policy: &RetryPolicy,
    name: &str,
    mut operation: F,
) -> Result<T, NetworkError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NetworkError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {}ms",
                    name,
                    attempt,
                    policy.max_attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::error!("{} failed after {} attempts: {}", name, attempt, e);
                }
                return Err(e);
            }
        }
    }
}

/// Runs a browser navigation with transient retries plus challenge retries
///
/// Challenge pages are retried up to `challenge_max_attempts` total attempts,
/// after which [`NetworkError::Challenge`] is surfaced to the caller. The two
/// budgets are counted separately.
pub async fn execute_browser_operation<T, F, Fut>(
    policy: &RetryPolicy,
    name: &str,
    mut operation: F,
) -> Result<T, NetworkError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NetworkError>>,
{
    let mut transient_attempt = 1;
    let mut challenge_attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_challenge() && challenge_attempt < policy.challenge_max_attempts => {
                let delay = policy.delay_for(challenge_attempt);
                tracing::warn!(
                    "{} hit a challenge page (attempt {}/{}); retrying in {}ms",
                    name,
                    challenge_attempt,
                    policy.challenge_max_attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                challenge_attempt += 1;
            }
            Err(e) if e.is_transient() && transient_attempt < policy.max_attempts => {
                let delay = policy.delay_for(transient_attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {}ms",
                    name,
                    transient_attempt,
                    policy.max_attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                transient_attempt += 1;
            }
            Err(e) => {
                if e.is_challenge() {
                    tracing::warn!("{}: challenge persisted, giving up", name);
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            challenge_max_attempts: 2,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
            challenge_max_attempts: 2,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(3000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(3000));
    }

    #[test]
    fn test_policy_from_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = execute_network_operation(&fast_policy(), "fetch", || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(NetworkError::Transient("reset".to_string()))
                } else {
                    Ok("body")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "body");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transient_exhausts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = execute_network_operation(&fast_policy(), "fetch", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(NetworkError::Transient("timeout".to_string()))
            }
        })
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = execute_network_operation(&fast_policy(), "fetch", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(NetworkError::Http {
                    status: 404,
                    url: "https://example.com/missing".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(NetworkError::Http { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_network_operation_surfaces_challenge_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = execute_network_operation(&fast_policy(), "fetch", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(NetworkError::Challenge {
                    url: "https://example.com/".to_string(),
                })
            }
        })
        .await;

        assert!(result.unwrap_err().is_challenge());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_browser_operation_retries_challenge_then_surfaces() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = execute_browser_operation(&fast_policy(), "navigate", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(NetworkError::Challenge {
                    url: "https://example.com/".to_string(),
                })
            }
        })
        .await;

        assert!(result.unwrap_err().is_challenge());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_browser_operation_challenge_clears() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = execute_browser_operation(&fast_policy(), "navigate", || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(NetworkError::Challenge {
                        url: "https://example.com/".to_string(),
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }
}
