//! Served-versus-rendered price exposure
//!
//! Agents that never run scripts only see the served document. A price that
//! shows up only after rendering is invisible to them.

use regex::RegexSet;
use serde::{Deserialize, Serialize};

/// Markup and text shapes that indicate a price is on the page
const PRICE_PATTERNS: &[&str] = &[
    r"\$\s*\d+(?:[.,]\d{2})?",
    r"£\s*\d+(?:[.,]\d{2})?",
    r"€\s*\d+(?:[.,]\d{2})?",
    r"(?i)\d+(?:[.,]\d{2})?\s*(?:USD|GBP|EUR)\b",
    r#"(?i)<[^>]*class="[^"]*price[^"]*""#,
    r#"(?i)<[^>]*itemprop="price""#,
    r#"(?i)"price"\s*:\s*"?\d+"#,
    r#"(?i)data-price=""#,
];

/// Where a page exposes pricing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingExposure {
    pub in_served_html: bool,
    pub in_rendered_html: bool,
    /// Price present only once scripts have run
    pub js_dependent: bool,
}

impl PricingExposure {
    /// Compares the served and rendered documents of one page
    pub fn compare(served_html: &str, rendered_html: &str) -> Self {
        let in_served_html = mentions_price(served_html);
        let in_rendered_html = mentions_price(rendered_html);
        Self {
            in_served_html,
            in_rendered_html,
            js_dependent: in_rendered_html && !in_served_html,
        }
    }
}

/// Returns true when the HTML shows a price, a price class or price markup
pub fn mentions_price(html: &str) -> bool {
    RegexSet::new(PRICE_PATTERNS)
        .map(|set| set.is_match(html))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_shapes() {
        assert!(mentions_price("<p>Only $49.99 today</p>"));
        assert!(mentions_price("<p>£ 12</p>"));
        assert!(mentions_price("<p>Ab 19,90 EUR</p>"));
        assert!(mentions_price(r#"<span class="product-price">call us</span>"#));
        assert!(mentions_price(r#"<meta itemprop="price" content="10">"#));
        assert!(mentions_price(r#"{"@type":"Offer","price":"129.00"}"#));
        assert!(mentions_price(r#"<div data-price="">"#));
        assert!(!mentions_price("<p>Free shipping on every order</p>"));
    }

    #[test]
    fn test_price_only_after_render() {
        let served = r#"<main><div id="price"></div></main>"#;
        let rendered = r#"<main><div id="price"><span>$89.00</span></div></main>"#;

        let exposure = PricingExposure::compare(served, rendered);
        assert!(!exposure.in_served_html);
        assert!(exposure.in_rendered_html);
        assert!(exposure.js_dependent);

        let both = PricingExposure::compare(rendered, rendered);
        assert!(both.in_served_html);
        assert!(!both.js_dependent);

        assert_eq!(PricingExposure::compare(served, served), PricingExposure::default());
    }
}
