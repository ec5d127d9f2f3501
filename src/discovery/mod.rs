//! URL discovery
//!
//! Builds the deduplicated set of URLs to audit from an XML sitemap (following
//! nested sitemap indexes up to a depth limit) or, when the root is an HTML
//! page, from its same-origin links. A root that refuses plain HTTP, or whose
//! served HTML has no links, can be rendered in a pooled browser instead.

mod links;
mod sitemap;

use crate::browser::BrowserPool;
use crate::network::{Fetcher, NetworkError, RetryPolicy};
use crate::url::{dedup_key, normalize_url, same_origin, site_root};
use crate::{AuditError, UrlError, UrlResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub use links::extract_same_origin_links;
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapEntry};

/// Language codes that are audited even without `include-all-languages`
const DEFAULT_LANGUAGE_SEGMENTS: &[&str] = &["en", "us"];

/// How a URL entered the audit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlSource {
    Sitemap,
    Crawl,
    /// Added by the auditor itself (`/llms.txt`)
    Implicit,
}

/// A URL scheduled for auditing
#[derive(Debug, Clone, PartialEq)]
pub struct UrlEntry {
    /// URL as the site listed it (fragment removed); this is what gets fetched
    pub url: Url,
    /// Scheme- and trailing-slash-insensitive identity of the normalized URL
    pub key: String,
    pub source: UrlSource,
    pub lastmod: Option<DateTime<Utc>>,
}

impl UrlEntry {
    /// Builds an entry from a listed URL, rejecting anything that does not normalize
    pub fn listed(raw: &str, source: UrlSource, lastmod: Option<DateTime<Utc>>) -> UrlResult<Self> {
        let normalized = normalize_url(raw)?;
        let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        url.set_fragment(None);
        Ok(Self {
            url,
            key: dedup_key(&normalized),
            source,
            lastmod,
        })
    }
}

/// Dedup key of an arbitrary URL, normalized first when possible
fn key_for(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|normalized| dedup_key(&normalized))
        .unwrap_or_else(|_| dedup_key(url))
}

/// Insertion-ordered set of entries keyed by [`dedup_key`]
#[derive(Default)]
struct EntrySet {
    entries: Vec<UrlEntry>,
    seen: HashSet<String>,
}

impl EntrySet {
    fn insert(&mut self, entry: UrlEntry) -> bool {
        if self.seen.insert(entry.key.clone()) {
            self.entries.push(entry);
            true
        } else {
            false
        }
    }

    fn contains(&self, url: &Url) -> bool {
        self.seen.contains(&key_for(url))
    }
}

/// Browser used when plain HTTP discovery is refused or finds nothing
#[derive(Debug, Clone)]
struct BrowserFallback {
    pool: Arc<BrowserPool>,
    timeout: Duration,
}

/// Resolves a root URL into the audit URL set
#[derive(Debug, Clone)]
pub struct SitemapResolver {
    fetcher: Fetcher,
    policy: RetryPolicy,
    include_all_languages: bool,
    max_urls: Option<usize>,
    browser: Option<BrowserFallback>,
}

impl SitemapResolver {
    pub fn new(fetcher: Fetcher, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            policy,
            include_all_languages: false,
            max_urls: None,
            browser: None,
        }
    }

    /// Keep `/fr/...`-style language variants found in sitemaps
    pub fn include_all_languages(mut self, include: bool) -> Self {
        self.include_all_languages = include;
        self
    }

    /// Cap the number of discovered URLs (the implicit `/llms.txt` is extra)
    pub fn max_urls(mut self, max: Option<usize>) -> Self {
        self.max_urls = max;
        self
    }

    /// Render an HTML root in a pooled browser and take its links when the
    /// HTTP fetch is refused (403 or challenge) or finds no links
    ///
    /// The pool is initialized on first use.
    pub fn browser_fallback(mut self, pool: Arc<BrowserPool>, timeout: Duration) -> Self {
        self.browser = Some(BrowserFallback { pool, timeout });
        self
    }

    /// Resolves the URL set for `root`
    ///
    /// # Arguments
    ///
    /// * `root` - Domain root or sitemap URL
    /// * `depth_limit` - Levels of nested sitemap indexes to follow (0 = none)
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<UrlEntry>)` - Deduplicated entries, ending with `/llms.txt`
    ///   when the site did not list it
    /// * `Err(AuditError::Challenge)` - The root answered with a challenge page
    ///   and no browser fallback could get past it
    /// * `Err(AuditError::Discovery)` - The root could not be fetched or parsed
    pub async fn resolve(&self, root: &Url, depth_limit: u32) -> Result<Vec<UrlEntry>, AuditError> {
        tracing::info!("Resolving URL set from {}", root);

        let response = match self.fetcher.fetch_with_retry(&self.policy, root).await {
            Ok(response) => response,
            Err(e) => {
                let refused = matches!(
                    e,
                    NetworkError::Challenge { .. } | NetworkError::Http { status: 403, .. }
                );
                let cause = root_error(root, e);
                if !refused || is_sitemap_url(root) || self.browser.is_none() {
                    return Err(cause);
                }
                tracing::info!("{} refused the HTTP fetch; falling back to the browser", root);
                return match self.rendered_links(root).await {
                    Ok(set) => Ok(self.finish(root, set)),
                    Err(message) => {
                        tracing::warn!("Browser link extraction failed for {}: {}", root, message);
                        Err(cause)
                    }
                };
            }
        };

        let mut set = EntrySet::default();

        if response.is_xml() || looks_like_sitemap(&response.body) {
            let document = parse_sitemap(&response.body).map_err(|message| AuditError::Discovery {
                url: root.to_string(),
                message,
            })?;
            self.collect_sitemap(root, document, depth_limit, &mut set).await;
        } else {
            let base = Url::parse(&response.final_url).unwrap_or_else(|_| root.clone());
            let links = extract_same_origin_links(&response.body, &base);
            tracing::info!("Root is HTML; found {} same-origin links", links.len());
            if links.is_empty() && self.browser.is_some() {
                tracing::info!("No links in the served HTML of {}; trying the browser", root);
                match self.rendered_links(root).await {
                    Ok(rendered) => set = rendered,
                    Err(message) => {
                        tracing::warn!("Browser link extraction failed for {}: {}", root, message);
                        set = crawl_set(root, links);
                    }
                }
            } else {
                set = crawl_set(root, links);
            }
        }

        Ok(self.finish(root, set))
    }

    /// Renders the root in a pooled browser and collects its same-origin links
    async fn rendered_links(&self, root: &Url) -> Result<EntrySet, String> {
        let Some(browser) = &self.browser else {
            return Err("no browser configured".to_string());
        };
        browser.pool.initialize().await.map_err(|e| e.to_string())?;
        let page = browser
            .pool
            .render_page(&self.policy, root.as_str(), browser.timeout)
            .await
            .map_err(|e| e.to_string())?;

        let base = Url::parse(&page.final_url).unwrap_or_else(|_| root.clone());
        let links = extract_same_origin_links(&page.html, &base);
        tracing::info!("Rendered root has {} same-origin links", links.len());
        Ok(crawl_set(root, links))
    }

    /// Applies `max_urls` and appends `/llms.txt` when it is missing
    fn finish(&self, root: &Url, set: EntrySet) -> Vec<UrlEntry> {
        let mut entries = set.entries;
        if let Some(max) = self.max_urls {
            if entries.len() > max {
                tracing::info!("Capping URL set at {} of {} entries", max, entries.len());
                entries.truncate(max);
            }
        }

        let mut set = EntrySet::default();
        for entry in entries {
            set.insert(entry);
        }
        if let Ok(llms) = site_root(root).join("llms.txt") {
            if !set.contains(&llms) {
                tracing::info!("Adding {} to the audit set", llms);
                if let Ok(entry) = UrlEntry::listed(llms.as_str(), UrlSource::Implicit, None) {
                    set.insert(entry);
                }
            }
        }

        tracing::info!("Discovered {} URLs", set.entries.len());
        set.entries
    }

    /// Walks a sitemap and its nested indexes breadth-first
    async fn collect_sitemap(
        &self,
        root: &Url,
        document: SitemapDocument,
        depth_limit: u32,
        set: &mut EntrySet,
    ) {
        let mut queue: VecDeque<(SitemapDocument, u32)> = VecDeque::new();
        queue.push_back((document, 0));
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(key_for(root));

        while let Some((document, depth)) = queue.pop_front() {
            match document {
                SitemapDocument::UrlSet(entries) => {
                    for entry in entries {
                        self.add_sitemap_entry(root, entry, set);
                    }
                }
                SitemapDocument::Index(children) => {
                    if depth >= depth_limit {
                        tracing::warn!(
                            "Sitemap depth limit {} reached; skipping {} nested sitemap(s)",
                            depth_limit,
                            children.len()
                        );
                        continue;
                    }
                    for child in children {
                        let Ok(child_url) = Url::parse(&child) else {
                            tracing::warn!("Skipping malformed nested sitemap URL {}", child);
                            continue;
                        };
                        if !visited.insert(key_for(&child_url)) {
                            continue;
                        }
                        if let Some(nested) = self.fetch_nested(&child_url).await {
                            queue.push_back((nested, depth + 1));
                        }
                    }
                }
            }
        }
    }

    async fn fetch_nested(&self, url: &Url) -> Option<SitemapDocument> {
        tracing::debug!("Fetching nested sitemap {}", url);
        let response = match self.fetcher.fetch_with_retry(&self.policy, url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Skipping nested sitemap {}: {}", url, e);
                return None;
            }
        };
        match parse_sitemap(&response.body) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!("Skipping unparseable nested sitemap {}: {}", url, e);
                None
            }
        }
    }

    fn add_sitemap_entry(&self, root: &Url, entry: SitemapEntry, set: &mut EntrySet) {
        let entry = match UrlEntry::listed(&entry.loc, UrlSource::Sitemap, entry.lastmod) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping sitemap entry {}: {}", entry.loc, e);
                return;
            }
        };
        if !same_origin(&entry.url, root) {
            tracing::debug!("Skipping off-site sitemap entry {}", entry.url);
            return;
        }
        if !self.include_all_languages && is_language_variant(&entry.url) {
            tracing::debug!("Skipping URL with language variant: {}", entry.url);
            return;
        }
        set.insert(entry);
    }
}

/// The root page followed by its links, all sourced from the crawl
fn crawl_set(root: &Url, links: Vec<Url>) -> EntrySet {
    let mut set = EntrySet::default();
    for url in std::iter::once(root.clone()).chain(links) {
        if let Ok(entry) = UrlEntry::listed(url.as_str(), UrlSource::Crawl, None) {
            set.insert(entry);
        }
    }
    set
}

fn root_error(root: &Url, error: NetworkError) -> AuditError {
    match error {
        NetworkError::Challenge { url } => AuditError::Challenge { url },
        other => AuditError::Discovery {
            url: root.to_string(),
            message: other.to_string(),
        },
    }
}

/// True for `.xml` and `.xml.gz` roots, which are never rendered
fn is_sitemap_url(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    path.ends_with(".xml") || path.ends_with(".xml.gz")
}

/// Returns true when the first path segment is a two-letter code other than `en`/`us`
pub fn is_language_variant(url: &Url) -> bool {
    let first = url
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()));
    match first {
        Some(segment) => {
            segment.chars().count() == 2
                && !DEFAULT_LANGUAGE_SEGMENTS.contains(&segment.to_lowercase().as_str())
        }
        None => false,
    }
}

fn looks_like_sitemap(body: &str) -> bool {
    let head: String = body.chars().take(512).collect();
    head.contains("<urlset") || head.contains("<sitemapindex")
}
