//! Same-origin link extraction for the HTML fallback crawl

use crate::url::same_origin;
use scraper::{Html, Selector};
use url::Url;

/// Extracts absolute same-origin `<a href>` targets from an HTML page
///
/// **Excluded:**
/// - fragment-only links (`#section`)
/// - `javascript:`, `mailto:`, `tel:` and `data:` hrefs
/// - links with the `download` attribute
/// - anything that resolves to another host or a non-HTTP(S) scheme
pub fn extract_same_origin_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        match resolve_link(href, base_url) {
            Some(url) if same_origin(&url, base_url) => links.push(url),
            Some(url) => tracing::trace!("Skipping external link {}", url),
            None => {}
        }
    }
    links
}

fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let url = base_url.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_internal_links_only() {
        let html = r##"
            <a href="/about">About</a>
            <a href="products/shoes">Shoes</a>
            <a href="https://example.com/contact#form">Contact</a>
            <a href="https://other.com/page">External</a>
            <a href="#top">Top</a>
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:hi@example.com">Mail</a>
            <a href="tel:+441234">Call</a>
            <a href="/brochure.pdf" download>Brochure</a>
        "##;
        let base = Url::parse("https://example.com/shop/").unwrap();

        let links: Vec<String> = extract_same_origin_links(html, &base)
            .into_iter()
            .map(|u| u.to_string())
            .collect();

        assert_eq!(
            links,
            vec![
                "https://example.com/about",
                "https://example.com/shop/products/shoes",
                "https://example.com/contact#form",
            ]
        );
    }

    #[test]
    fn test_empty_document() {
        let base = Url::parse("https://example.com/").unwrap();
        assert!(extract_same_origin_links("", &base).is_empty());
    }
}
