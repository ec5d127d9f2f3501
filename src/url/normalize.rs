use crate::{UrlError, UrlResult};
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Normalizes a URL for auditing
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS (the scheme itself is kept)
/// 3. Lowercase the host
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and repeated slashes
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters
/// 7. Sort remaining query parameters alphabetically
/// 8. Re-encode the remaining pairs (`%26` stays an escaped `&`)
/// 9. Remove empty query string (trailing ?)
///
/// The result identifies a page; the URL that gets fetched is the one the
/// site listed. Scheme-insensitive comparison goes through [`dedup_key`].
///
/// # Examples
///
/// ```
/// use agent_audit::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/page/#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str() {
        let normalized_host = host.to_lowercase();
        url.set_host(Some(&normalized_host))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    } else {
        return Err(UrlError::MissingDomain);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let filtered_params = filter_and_sort_query_params(&url);

        if filtered_params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(filtered_params.iter());
        }
    }

    Ok(url)
}

/// Builds the deduplication key for a normalized URL
///
/// The key drops the scheme, so `http://` and `https://` variants of the same
/// page collapse into a single entry. Trailing slashes are already gone after
/// [`normalize_url`].
///
/// ```
/// use agent_audit::url::{dedup_key, normalize_url};
///
/// let a = normalize_url("http://example.com/docs/").unwrap();
/// let b = normalize_url("https://example.com/docs").unwrap();
/// assert_eq!(dedup_key(&a), dedup_key(&b));
/// ```
pub fn dedup_key(url: &Url) -> String {
    let mut key = url.host_str().unwrap_or_default().to_lowercase();
    if let Some(port) = url.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }
    key.push_str(url.path());
    if let Some(query) = url.query() {
        key.push('?');
        key.push_str(query);
    }
    key
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_preserved() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/page/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_tracking_params() {
        let result = normalize_url("https://example.com/page?utm_source=twitter").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_sort_query_params() {
        let result = normalize_url("https://example.com/page?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?a=1&b=2");
    }

    #[test]
    fn test_escaped_query_values_survive() {
        let result = normalize_url("https://example.com/search?q=a%26b").unwrap();
        assert_eq!(result.as_str(), "https://example.com/search?q=a%26b");
        assert_eq!(result.query_pairs().count(), 1);

        let result = normalize_url("https://example.com/search?q=red+shoes").unwrap();
        assert_eq!(result.as_str(), "https://example.com/search?q=red+shoes");
    }

    #[test]
    fn test_content_params_are_not_tracking() {
        let result = normalize_url("https://example.com/list?source=catalog&id=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/list?id=1&source=catalog");

        let a = normalize_url("https://example.com/list?source=catalog").unwrap();
        let b = normalize_url("https://example.com/list?source=archive").unwrap();
        assert_ne!(dedup_key(&a), dedup_key(&b));
    }

    #[test]
    fn test_normalize_path_with_dots() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_lowercase_domain() {
        let result = normalize_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_multiple_slashes() {
        let result = normalize_url("https://example.com///path//to///page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/path/to/page");
    }

    #[test]
    fn test_dedup_key_ignores_scheme_and_trailing_slash() {
        let a = normalize_url("http://Example.com/docs/").unwrap();
        let b = normalize_url("https://example.com/docs").unwrap();
        assert_eq!(dedup_key(&a), "example.com/docs");
        assert_eq!(dedup_key(&a), dedup_key(&b));
    }

    #[test]
    fn test_dedup_key_keeps_port_and_query() {
        let url = normalize_url("http://127.0.0.1:8080/search?q=shoes&utm_medium=x").unwrap();
        assert_eq!(dedup_key(&url), "127.0.0.1:8080/search?q=shoes");
    }
}
