//! Headless browser pool
//!
//! The pool leases a fixed set of browser instances to page-audit tasks. The
//! engine itself sits behind [`BrowserLauncher`] and [`BrowserInstance`] so the
//! pool logic can be exercised without a real browser.

mod chromium;
mod pool;

use crate::network::NetworkError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use chromium::ChromiumLauncher;
pub use pool::{BrowserPool, PoolConfig, PoolStats, PooledBrowser};

/// Errors returned by pool operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("Browser pool is shutting down")]
    ShuttingDown,

    #[error("No browsers available in the pool")]
    NoBrowsers,

    #[error("Failed to launch browser: {0}")]
    Launch(String),
}

/// Why [`BrowserPool::render_page`] produced no snapshot
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Browser unavailable: {0}")]
    Lease(#[from] PoolError),

    #[error("Render failed: {0}")]
    Network(#[from] NetworkError),
}

impl RenderError {
    pub fn is_challenge(&self) -> bool {
        matches!(self, RenderError::Network(e) if e.is_challenge())
    }
}

/// DOM snapshot taken after a page finished loading
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub final_url: String,
    pub html: String,
    pub load_time_ms: u64,
}

/// One running browser process
#[async_trait]
pub trait BrowserInstance: Send + Sync {
    /// Opens a page, navigates to `url`, snapshots the DOM and closes the page
    ///
    /// Timeouts and navigation failures are reported as
    /// [`NetworkError::Transient`]; interstitials as [`NetworkError::Challenge`].
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, NetworkError>;

    /// Closes every open page and then the browser process
    async fn close(&self) -> anyhow::Result<()>;
}

/// Starts new browser instances for the pool
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> anyhow::Result<Box<dyn BrowserInstance>>;
}
