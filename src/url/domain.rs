use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use agent_audit::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when both URLs point at the same site
///
/// Hosts are compared case-insensitively together with any explicit port.
/// The scheme is ignored so an `http://` link on an `https://` page still
/// counts as internal.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(host_a), Some(host_b)) => host_a == host_b && a.port() == b.port(),
        _ => false,
    }
}

/// Root URL (`scheme://host[:port]/`) of the site a URL belongs to
pub fn site_root(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}
