//! Read-only document access for extractors

use super::ExtractError;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// A matched element, detached from the underlying document
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Lowercase tag name
    pub tag: String,
    /// Concatenated text content
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    /// Index of the element in document order (pre-order, `<html>` is 0)
    pub position: usize,
    pub outer_html: String,
}

impl Node {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// Query-by-selector capability handed to extractors
///
/// Implementations never mutate the document. Results are always returned in
/// document order with true document positions, so comparisons such as
/// "first `h2` before first `h1`" do not depend on a particular query engine.
pub trait DocumentAccess {
    fn select(&self, selector: &str) -> Result<Vec<Node>, ExtractError>;

    fn count(&self, selector: &str) -> Result<usize, ExtractError> {
        Ok(self.select(selector)?.len())
    }

    fn exists(&self, selector: &str) -> Result<bool, ExtractError> {
        Ok(self.count(selector)? > 0)
    }

    fn first(&self, selector: &str) -> Result<Option<Node>, ExtractError> {
        Ok(self.select(selector)?.into_iter().next())
    }
}

/// [`DocumentAccess`] over a parsed HTML document
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }
}

impl DocumentAccess for HtmlDocument {
    fn select(&self, selector: &str) -> Result<Vec<Node>, ExtractError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| ExtractError::InvalidSelector(format!("{}: {:?}", selector, e)))?;

        let nodes = self
            .html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .enumerate()
            .filter(|(_, element)| parsed.matches(element))
            .map(|(position, element)| to_node(element, position))
            .collect();
        Ok(nodes)
    }
}

fn to_node(element: ElementRef<'_>, position: usize) -> Node {
    let value = element.value();
    Node {
        tag: value.name().to_lowercase(),
        text: element.text().collect::<String>(),
        attributes: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        position,
        outer_html: element.html(),
    }
}

/// Non-document inputs available to extractors
#[derive(Debug, Clone, Default)]
pub struct PageInputs {
    pub url: String,
    /// Response headers with lowercase names; empty when unknown
    pub headers: Vec<(String, String)>,
}

impl PageInputs {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: &reqwest::header::HeaderMap) -> Self {
        self.headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_returns_document_order() {
        let doc = HtmlDocument::parse(
            "<html><body><h2>Intro</h2><div><h1>Title</h1></div><h2>More</h2></body></html>",
        );
        let h1 = doc.first("h1").unwrap().unwrap();
        let h2s = doc.select("h2").unwrap();
        assert_eq!(h2s.len(), 2);
        assert!(h2s[0].position < h1.position);
        assert!(h2s[1].position > h1.position);
    }

    #[test]
    fn test_node_attributes_and_text() {
        let doc = HtmlDocument::parse(r#"<input id="email" name="email" autocomplete="email">"#);
        let input = doc.first("input").unwrap().unwrap();
        assert_eq!(input.tag, "input");
        assert_eq!(input.attr("autocomplete"), Some("email"));
        assert!(input.has_attr("id"));
        assert!(input.outer_html.starts_with("<input"));
    }

    #[test]
    fn test_invalid_selector() {
        let doc = HtmlDocument::parse("<p>x</p>");
        assert!(matches!(
            doc.select("p[[").unwrap_err(),
            ExtractError::InvalidSelector(_)
        ));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let inputs = PageInputs {
            url: "https://example.com/".to_string(),
            headers: vec![("strict-transport-security".to_string(), "max-age=1".to_string())],
        };
        assert_eq!(inputs.header("Strict-Transport-Security"), Some("max-age=1"));
        assert_eq!(inputs.header("content-security-policy"), None);
    }
}
