use super::{classify_reqwest_error, classify_status, execute_network_operation, NetworkError, RetryPolicy};
use crate::config::UserAgentConfig;
use flate2::read::GzDecoder;
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client};
use std::io::Read;
use std::time::{Duration, Instant};
use url::Url;

/// Magic bytes at the start of every gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A successfully fetched response with its body read
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Final URL after redirects
    pub final_url: String,
    pub status: u16,
    /// Content-Type header value (empty when absent)
    pub content_type: String,
    pub headers: HeaderMap,
    pub body: String,
    /// Wall time from request start until the body was read
    pub elapsed_ms: u64,
}

impl FetchedResponse {
    /// Returns true if the response declares an HTML body
    pub fn is_html(&self) -> bool {
        let ct = self.content_type.to_lowercase();
        ct.contains("text/html") || ct.contains("application/xhtml")
    }

    /// Returns true if the response declares or looks like an XML body
    pub fn is_xml(&self) -> bool {
        let ct = self.content_type.to_lowercase();
        ct.contains("xml") || self.body.trim_start().starts_with("<?xml")
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use agent_audit::config::UserAgentConfig;
/// use agent_audit::network::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP fetcher used for served HTML, sitemaps and well-known files
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the user agent configuration
    pub fn from_config(config: &UserAgentConfig, timeout: Duration) -> Result<Self, NetworkError> {
        build_http_client(config, timeout)
            .map(Self::new)
            .map_err(|e| NetworkError::Fatal(format!("Failed to build HTTP client: {}", e)))
    }

    /// Performs a single GET and classifies the outcome
    pub async fn fetch(&self, url: &Url) -> Result<FetchedResponse, NetworkError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let bytes = response.bytes().await.map_err(|e| classify_reqwest_error(&e))?;
        let body = decode_body(&content_type, &bytes)?;

        classify_status(&final_url, status, &headers, &body)?;

        Ok(FetchedResponse {
            final_url,
            status,
            content_type,
            headers,
            body,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Performs a GET through [`execute_network_operation`]
    pub async fn fetch_with_retry(
        &self,
        policy: &RetryPolicy,
        url: &Url,
    ) -> Result<FetchedResponse, NetworkError> {
        let name = format!("GET {}", url);
        execute_network_operation(policy, &name, move || self.fetch(url)).await
    }
}

/// Turns a response body into text, gunzipping `.gz` payloads
///
/// Transfer-level `Content-Encoding: gzip` is already undone by reqwest; this
/// handles files that are themselves gzip archives (`sitemap.xml.gz`), served
/// as `application/gzip` or `application/x-gzip`.
pub fn decode_body(content_type: &str, bytes: &[u8]) -> Result<String, NetworkError> {
    let declared = content_type.to_lowercase().contains("gzip");
    if !declared && !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    let mut decoded = Vec::new();
    match GzDecoder::new(bytes).read_to_end(&mut decoded) {
        Ok(_) => Ok(String::from_utf8_lossy(&decoded).into_owned()),
        Err(e) if declared => Err(NetworkError::Fatal(format!("Failed to gunzip body: {}", e))),
        Err(_) => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}
