//! sitemaps.org XML parsing

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

/// One `<url>` entry of a urlset
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
}

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapDocument {
    /// `<urlset>`: page entries
    UrlSet(Vec<SitemapEntry>),
    /// `<sitemapindex>`: locations of nested sitemaps
    Index(Vec<String>),
}

/// Parses a sitemap or sitemap index
///
/// Returns an error for malformed XML or when the root element is neither
/// `urlset` nor `sitemapindex`.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut root: Option<String> = None;
    let mut entries = Vec::new();
    let mut children = Vec::new();

    let mut in_url = false;
    let mut in_sitemap = false;
    let mut current_tag = String::new();
    let mut current_loc = String::new();
    let mut current_lastmod = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if root.is_none() {
                    root = Some(name.clone());
                }
                match name.as_str() {
                    "url" => {
                        in_url = true;
                        current_loc.clear();
                        current_lastmod.clear();
                    }
                    "sitemap" => {
                        in_sitemap = true;
                        current_loc.clear();
                    }
                    _ => current_tag = name,
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "url" if in_url => {
                        if !current_loc.is_empty() {
                            entries.push(SitemapEntry {
                                loc: current_loc.clone(),
                                lastmod: parse_lastmod(&current_lastmod),
                            });
                        }
                        in_url = false;
                    }
                    "sitemap" if in_sitemap => {
                        if !current_loc.is_empty() {
                            children.push(current_loc.clone());
                        }
                        in_sitemap = false;
                    }
                    _ => {}
                }
                current_tag.clear();
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().trim().to_string();
                if (in_url || in_sitemap) && current_tag == "loc" {
                    current_loc = text;
                } else if in_url && current_tag == "lastmod" {
                    current_lastmod = text;
                }
            }
            Ok(Event::CData(e)) => {
                if (in_url || in_sitemap) && current_tag == "loc" {
                    current_loc = String::from_utf8_lossy(&e).trim().to_string();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
        buf.clear();
    }

    match root.as_deref() {
        Some("urlset") => Ok(SitemapDocument::UrlSet(entries)),
        Some("sitemapindex") => Ok(SitemapDocument::Index(children)),
        Some(other) => Err(format!("Unexpected sitemap root element <{}>", other)),
        None => Err("Empty sitemap document".to_string()),
    }
}

fn parse_lastmod(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>https://example.com/</loc></url>
          <url>
            <loc>https://example.com/about</loc>
            <lastmod>2024-01-15</lastmod>
          </url>
          <url>
            <loc>https://example.com/blog?a=1&amp;b=2</loc>
            <lastmod>2024-03-01T10:00:00+01:00</lastmod>
          </url>
        </urlset>"#;

        let SitemapDocument::UrlSet(entries) = parse_sitemap(xml).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].loc, "https://example.com/");
        assert!(entries[0].lastmod.is_none());
        assert!(entries[1].lastmod.is_some());
        assert_eq!(entries[2].loc, "https://example.com/blog?a=1&b=2");
        assert!(entries[2].lastmod.is_some());
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap><loc>https://example.com/sitemap-products.xml</loc></sitemap>
          <sitemap><loc>https://example.com/sitemap-blog.xml</loc></sitemap>
        </sitemapindex>"#;

        assert_eq!(
            parse_sitemap(xml).unwrap(),
            SitemapDocument::Index(vec![
                "https://example.com/sitemap-products.xml".to_string(),
                "https://example.com/sitemap-blog.xml".to_string(),
            ])
        );
    }

    #[test]
    fn test_unknown_root_rejected() {
        assert!(parse_sitemap("<html><body></body></html>").is_err());
        assert!(parse_sitemap("").is_err());
    }

    #[test]
    fn test_parser_never_panics() {
        let inputs = [
            "not xml at all",
            "<",
            "<url><loc>",
            "<<<>>>",
            "<urlset><url></url></urlset>",
            "<urlset><url><loc>http://x</loc><lastmod>not-a-date</lastmod></url></urlset>",
            "\x00\x01\x02\x03",
        ];
        for input in &inputs {
            let _ = parse_sitemap(input);
        }
    }
}
