//! Title, meta description and heading metrics

use super::document::{DocumentAccess, PageInputs};
use super::{ExtractError, MetricsBag};
use serde::{Deserialize, Serialize};

pub const TITLE_MIN_LENGTH: usize = 30;
pub const TITLE_MAX_LENGTH: usize = 60;
pub const META_DESC_MIN_LENGTH: usize = 70;
pub const META_DESC_MAX_LENGTH: usize = 155;
pub const HEADING_MAX_LENGTH: usize = 70;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleMetrics {
    pub missing: u32,
    pub length: usize,
    pub too_long: u32,
    pub too_short: u32,
    pub pixel_width: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDescriptionMetrics {
    pub missing: u32,
    pub length: usize,
    pub too_long: u32,
    pub too_short: u32,
    /// Running total across every description seen
    pub pixel_width: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingMetrics {
    pub h1_count: usize,
    pub h2_count: usize,
    pub missing: u32,
    pub multiple: u32,
    pub too_long: u32,
    pub non_sequential: u32,
}

/// Estimates rendered width in a typical search-result font
///
/// Narrow glyphs 4px, spaces 4px, wide glyphs 11px, other uppercase 10px,
/// everything else 8px.
pub fn estimate_pixel_width(text: &str) -> u32 {
    text.chars()
        .map(|c| match c {
            ' ' => 4,
            'i' | 'j' | 'l' | 't' | 'f' | 'r' | 'I' | '.' | ',' | ';' | ':' | '!' | '|' | '\''
            | '(' | ')' | '[' | ']' => 4,
            'm' | 'w' | 'M' | 'W' | '@' | '%' => 11,
            c if c.is_uppercase() => 10,
            _ => 8,
        })
        .sum()
}

pub(super) fn extract_title(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let title = doc
        .first("title")?
        .map(|node| node.text.trim().to_string())
        .unwrap_or_default();

    let metrics = if title.is_empty() {
        TitleMetrics {
            missing: 1,
            ..Default::default()
        }
    } else {
        let length = title.chars().count();
        TitleMetrics {
            missing: 0,
            length,
            too_long: u32::from(length > TITLE_MAX_LENGTH),
            too_short: u32::from(length < TITLE_MIN_LENGTH),
            pixel_width: estimate_pixel_width(&title),
        }
    };

    bag.title.set(metrics);
    Ok(())
}

pub(super) fn extract_meta_description(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let description = doc
        .first(r#"meta[name="description"]"#)?
        .and_then(|node| node.attr("content").map(str::to_string))
        .unwrap_or_default();

    let mut metrics = bag.meta_description.metrics.take().unwrap_or_default();
    if description.is_empty() {
        metrics.missing += 1;
    } else {
        let length = description.chars().count();
        metrics.length = length;
        if length > META_DESC_MAX_LENGTH {
            metrics.too_long += 1;
        }
        if length < META_DESC_MIN_LENGTH {
            metrics.too_short += 1;
        }
        metrics.pixel_width += estimate_pixel_width(&description);
    }

    bag.meta_description.set(metrics);
    Ok(())
}

pub(super) fn extract_headings(
    doc: &dyn DocumentAccess,
    _inputs: &PageInputs,
    bag: &mut MetricsBag,
) -> Result<(), ExtractError> {
    let h1s = doc.select("h1")?;
    let h2s = doc.select("h2")?;

    let mut metrics = HeadingMetrics {
        h1_count: h1s.len(),
        h2_count: h2s.len(),
        ..Default::default()
    };

    if h1s.is_empty() {
        metrics.missing += 1;
    }
    if h1s.len() > 1 {
        metrics.multiple += 1;
    }

    // Raw text content, surrounding whitespace included
    for heading in h1s.iter().chain(h2s.iter()) {
        if heading.text.chars().count() > HEADING_MAX_LENGTH {
            metrics.too_long += 1;
        }
    }

    if let (Some(first_h1), Some(first_h2)) = (h1s.first(), h2s.first()) {
        if first_h2.position < first_h1.position {
            metrics.non_sequential += 1;
        }
    }

    bag.headings.set(metrics);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::HtmlDocument;

    fn run(
        html: &str,
        extractor: fn(&dyn DocumentAccess, &PageInputs, &mut MetricsBag) -> Result<(), ExtractError>,
    ) -> MetricsBag {
        let doc = HtmlDocument::parse(html);
        let mut bag = MetricsBag::default();
        extractor(&doc, &PageInputs::new("https://example.com/"), &mut bag).unwrap();
        bag
    }

    fn title_of_len(n: usize) -> String {
        format!("<html><head><title>{}</title></head></html>", "a".repeat(n))
    }

    #[test]
    fn test_missing_title() {
        let bag = run("<html><head></head></html>", extract_title);
        let title = bag.title.metrics.unwrap();
        assert_eq!(title.missing, 1);
        assert_eq!(title.length, 0);
    }

    #[test]
    fn test_long_title() {
        let title = run(&title_of_len(65), extract_title).title.metrics.unwrap();
        assert_eq!(title.too_long, 1);
        assert_eq!(title.too_short, 0);
        assert_eq!(title.length, 65);
    }

    #[test]
    fn test_short_title() {
        let title = run(&title_of_len(20), extract_title).title.metrics.unwrap();
        assert_eq!(title.too_short, 1);
        assert_eq!(title.too_long, 0);
    }

    #[test]
    fn test_title_boundaries() {
        let at_min = run(&title_of_len(30), extract_title).title.metrics.unwrap();
        let at_max = run(&title_of_len(60), extract_title).title.metrics.unwrap();
        assert_eq!((at_min.too_short, at_min.too_long), (0, 0));
        assert_eq!((at_max.too_short, at_max.too_long), (0, 0));
    }

    #[test]
    fn test_meta_description_counts() {
        let long = format!(r#"<meta name="description" content="{}">"#, "x".repeat(160));
        let meta = run(&long, extract_meta_description).meta_description.metrics.unwrap();
        assert_eq!(meta.too_long, 1);
        assert_eq!(meta.pixel_width, 160 * 8);

        let missing = run("<p>none</p>", extract_meta_description)
            .meta_description
            .metrics
            .unwrap();
        assert_eq!(missing.missing, 1);
    }

    #[test]
    fn test_meta_description_accumulates() {
        let doc = HtmlDocument::parse(r#"<meta name="description" content="short">"#);
        let inputs = PageInputs::new("https://example.com/");
        let mut bag = MetricsBag::default();
        extract_meta_description(&doc, &inputs, &mut bag).unwrap();
        extract_meta_description(&doc, &inputs, &mut bag).unwrap();
        let meta = bag.meta_description.metrics.unwrap();
        assert_eq!(meta.too_short, 2);
        assert_eq!(meta.pixel_width, 2 * estimate_pixel_width("short"));
    }

    #[test]
    fn test_headings_missing_and_multiple() {
        let none = run("<h2>Sub</h2>", extract_headings).headings.metrics.unwrap();
        assert_eq!(none.missing, 1);
        assert_eq!(none.non_sequential, 0);

        let many = run("<h1>A</h1><h1>B</h1>", extract_headings).headings.metrics.unwrap();
        assert_eq!(many.multiple, 1);
    }

    #[test]
    fn test_heading_too_long() {
        let html = format!("<h1>{}</h1><h2>{}</h2><h2>ok</h2>", "a".repeat(71), "b".repeat(80));
        let headings = run(&html, extract_headings).headings.metrics.unwrap();
        assert_eq!(headings.too_long, 2);
    }

    #[test]
    fn test_heading_length_counts_whitespace() {
        let padded = format!("<h1>\n    {}\n</h1>", "a".repeat(65));
        let headings = run(&padded, extract_headings).headings.metrics.unwrap();
        assert_eq!(headings.too_long, 1);

        let exact = format!("<h1>{}</h1>", "a".repeat(70));
        let headings = run(&exact, extract_headings).headings.metrics.unwrap();
        assert_eq!(headings.too_long, 0);
    }

    #[test]
    fn test_h2_before_h1_uses_document_order() {
        let html = "<body><header><h2>Promo</h2></header><main><section><h1>Title</h1></section></main></body>";
        let headings = run(html, extract_headings).headings.metrics.unwrap();
        assert_eq!(headings.non_sequential, 1);

        let ordered = run("<h1>Title</h1><div><h2>Next</h2></div>", extract_headings)
            .headings
            .metrics
            .unwrap();
        assert_eq!(ordered.non_sequential, 0);
    }

    #[test]
    fn test_pixel_width_table() {
        assert_eq!(estimate_pixel_width(""), 0);
        assert_eq!(estimate_pixel_width("il"), 8);
        assert_eq!(estimate_pixel_width("mW"), 22);
        assert_eq!(estimate_pixel_width("A b"), 10 + 4 + 8);
    }
}
