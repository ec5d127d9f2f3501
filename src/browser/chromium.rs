//! Chromium engine adapter built on chromiumoxide

use super::{BrowserInstance, BrowserLauncher, RenderedPage};
use crate::config::BrowserConfig;
use crate::network::{looks_like_challenge, NetworkError};
use anyhow::Context;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Flags applied to every launched instance
const DEFAULT_ARGS: &[&str] = &[
    "--disable-gpu",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-blink-features=AutomationControlled",
    "--window-size=1920,1080",
];

/// Launches headless Chromium processes for the pool
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    executable: Option<PathBuf>,
    args: Vec<String>,
}

impl ChromiumLauncher {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            executable: config.executable.as_ref().map(PathBuf::from),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> anyhow::Result<Box<dyn BrowserInstance>> {
        let mut builder = ChromeConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        for arg in DEFAULT_ARGS {
            builder = builder.arg(*arg);
        }
        for arg in &self.args {
            builder = builder.arg(arg.as_str());
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {}", e);
                }
            }
        });

        tracing::debug!("Launched Chromium instance");

        Ok(Box::new(ChromiumInstance {
            browser: Mutex::new(browser),
            handler_task,
        }))
    }
}

struct ChromiumInstance {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserInstance for ChromiumInstance {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, NetworkError> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| NetworkError::Transient(format!("Failed to open page: {e}")))?
        };

        let started = Instant::now();
        let navigation = tokio::time::timeout(timeout, page.goto(url)).await;

        let outcome = match navigation {
            Err(_) => Err(NetworkError::Transient(format!(
                "Navigation to {} timed out after {}ms",
                url,
                timeout.as_millis()
            ))),
            Ok(Err(e)) => Err(NetworkError::Transient(format!(
                "Navigation to {} failed: {e}",
                url
            ))),
            Ok(Ok(_)) => snapshot(&page, url, started).await,
        };

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        outcome
    }

    async fn close(&self) -> anyhow::Result<()> {
        let mut browser = self.browser.lock().await;
        for page in browser.pages().await.unwrap_or_default() {
            if let Err(e) = page.close().await {
                tracing::debug!("Failed to close page during shutdown: {}", e);
            }
        }
        browser.close().await.context("failed to close browser")?;
        let _ = browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

async fn snapshot(
    page: &chromiumoxide::Page,
    url: &str,
    started: Instant,
) -> Result<RenderedPage, NetworkError> {
    let html: String = page
        .evaluate("document.documentElement.outerHTML")
        .await
        .map_err(|e| NetworkError::Transient(format!("Failed to read DOM of {}: {e}", url)))?
        .into_value()
        .map_err(|e| NetworkError::Fatal(format!("Unexpected DOM snapshot for {}: {e}", url)))?;

    if looks_like_challenge(&html) {
        return Err(NetworkError::Challenge {
            url: url.to_string(),
        });
    }

    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .map(|u| u.to_string())
        .unwrap_or_else(|| url.to_string());

    Ok(RenderedPage {
        final_url,
        html,
        load_time_ms: started.elapsed().as_millis() as u64,
    })
}
