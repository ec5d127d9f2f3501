use super::NetworkError;
use reqwest::header::HeaderMap;

/// Body fragments that identify a challenge interstitial
const CHALLENGE_MARKERS: &[&str] = &[
    "just a moment",
    "cf-chl",
    "challenge-platform",
    "attention required",
    "captcha",
    "checking your browser",
];

/// Classifies an HTTP status into success or a [`NetworkError`]
///
/// # Classification
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | 2xx / 3xx | `Ok(())` |
/// | 403, 429, 503 with Cloudflare headers or challenge markers | `Challenge` |
/// | 429 | `Transient` |
/// | 5xx | `Transient` |
/// | other 4xx | `Http` (fatal) |
///
/// # Arguments
///
/// * `url` - The URL that produced the response
/// * `status` - HTTP status code
/// * `headers` - Response headers
/// * `body` - Response body (may be empty when not yet read)
pub fn classify_status(
    url: &str,
    status: u16,
    headers: &HeaderMap,
    body: &str,
) -> Result<(), NetworkError> {
    if status < 400 {
        return Ok(());
    }

    if matches!(status, 403 | 429 | 503) && is_challenge_response(headers, body) {
        return Err(NetworkError::Challenge {
            url: url.to_string(),
        });
    }

    if status == 429 || status >= 500 {
        return Err(NetworkError::Transient(format!("HTTP {} for {}", status, url)));
    }

    Err(NetworkError::Http {
        status,
        url: url.to_string(),
    })
}

/// Maps a reqwest transport error to a [`NetworkError`]
pub fn classify_reqwest_error(error: &reqwest::Error) -> NetworkError {
    if error.is_timeout() {
        NetworkError::Transient(format!("Request timeout: {}", error))
    } else if error.is_connect() || error.is_request() || error.is_body() {
        NetworkError::Transient(format!("Connection error: {}", error))
    } else if let Some(status) = error.status() {
        let url = error.url().map(|u| u.to_string()).unwrap_or_default();
        NetworkError::Http {
            status: status.as_u16(),
            url,
        }
    } else {
        NetworkError::Fatal(error.to_string())
    }
}

/// Returns true if a document looks like an anti-bot interstitial
///
/// Used for rendered pages, where the browser reports no status code that
/// would reveal the challenge.
pub fn looks_like_challenge(html: &str) -> bool {
    let lower = html.to_lowercase();
    let title_hit = lower.contains("<title>just a moment")
        || lower.contains("<title>attention required");
    title_hit || (lower.contains("cloudflare") && contains_marker(&lower))
}

fn is_challenge_response(headers: &HeaderMap, body: &str) -> bool {
    if headers.contains_key("cf-mitigated") {
        return true;
    }
    let lower = body.to_lowercase();
    if headers.contains_key("cf-ray") && (lower.contains("cloudflare") || contains_marker(&lower)) {
        return true;
    }
    contains_marker(&lower)
}

fn contains_marker(lower_body: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|m| lower_body.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_success_statuses() {
        let headers = HeaderMap::new();
        assert!(classify_status("https://example.com/", 200, &headers, "").is_ok());
        assert!(classify_status("https://example.com/", 301, &headers, "").is_ok());
    }

    #[test]
    fn test_server_errors_are_transient() {
        let headers = HeaderMap::new();
        let err = classify_status("https://example.com/", 502, &headers, "bad gateway").unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_rate_limit_is_transient() {
        let headers = HeaderMap::new();
        let err = classify_status("https://example.com/", 429, &headers, "slow down").unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_not_found_is_fatal() {
        let headers = HeaderMap::new();
        let err = classify_status("https://example.com/x", 404, &headers, "").unwrap_err();
        assert_eq!(
            err,
            NetworkError::Http {
                status: 404,
                url: "https://example.com/x".to_string()
            }
        );
    }

    #[test]
    fn test_cloudflare_challenge() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-ray", HeaderValue::from_static("8a1b2c3d"));
        let body = "<html><title>Just a moment...</title>Cloudflare</html>";
        let err = classify_status("https://example.com/", 403, &headers, body).unwrap_err();
        assert!(err.is_challenge());
    }

    #[test]
    fn test_plain_forbidden_is_not_challenge() {
        let headers = HeaderMap::new();
        let err = classify_status("https://example.com/", 403, &headers, "Forbidden").unwrap_err();
        assert!(!err.is_challenge());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_looks_like_challenge() {
        assert!(looks_like_challenge(
            "<html><head><title>Just a moment...</title></head></html>"
        ));
        assert!(!looks_like_challenge(
            "<html><head><title>Shop</title></head><body>Products</body></html>"
        ));
    }
}
