use super::{BrowserInstance, BrowserLauncher, PoolError, RenderError, RenderedPage};
use crate::config::BrowserConfig;
use crate::network::{execute_browser_operation, NetworkError, RetryPolicy};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

type Waiter = oneshot::Sender<Result<PooledBrowser, PoolError>>;

/// Pool sizing and recycling parameters
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of instances launched by [`BrowserPool::initialize`]
    pub size: usize,
    /// Pages served by one instance before it is relaunched
    pub restart_after_pages: u64,
}

impl From<&BrowserConfig> for PoolConfig {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            size: config.pool_size as usize,
            restart_after_pages: config.restart_after_pages,
        }
    }
}

/// A browser instance leased from the pool
///
/// Leases are held by value: whoever owns the `PooledBrowser` is the only
/// user of the instance until it is handed back through [`BrowserPool::release`].
pub struct PooledBrowser {
    id: usize,
    instance: Box<dyn BrowserInstance>,
    in_use: bool,
    pages_created: u64,
}

impl PooledBrowser {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// Pages rendered by this instance since it was (re)launched
    pub fn pages_created(&self) -> u64 {
        self.pages_created
    }

    /// Renders a page on the leased instance
    pub async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, NetworkError> {
        self.instance.render(url, timeout).await
    }
}

impl std::fmt::Debug for PooledBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBrowser")
            .field("id", &self.id)
            .field("in_use", &self.in_use)
            .field("pages_created", &self.pages_created)
            .finish()
    }
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Current capacity (shrinks only when a relaunch fails)
    pub size: usize,
    pub available: usize,
    pub in_use: usize,
    pub waiting: usize,
}

#[derive(Default)]
struct PoolState {
    available: VecDeque<PooledBrowser>,
    waiters: VecDeque<Waiter>,
    in_use: usize,
    capacity: usize,
    initialized: bool,
    shutting_down: bool,
}

/// Bounded pool of browser instances with FIFO waiting
///
/// State lives behind a synchronous mutex that is never held across an
/// `.await`, so every transition completes before the task can suspend.
pub struct BrowserPool {
    launcher: Arc<dyn BrowserLauncher>,
    config: PoolConfig,
    state: Mutex<PoolState>,
}

impl BrowserPool {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: PoolConfig) -> Self {
        Self {
            launcher,
            config,
            state: Mutex::new(PoolState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Launches the configured number of instances
    ///
    /// Individual launch failures are logged; the pool starts with whatever
    /// launched. Fails only when no instance could be started. Calling this
    /// again after a successful initialization does nothing.
    pub async fn initialize(&self) -> Result<(), PoolError> {
        if self.lock().initialized {
            return Ok(());
        }

        let mut launched = Vec::with_capacity(self.config.size);
        let mut last_error = None;
        for id in 0..self.config.size {
            match self.launcher.launch().await {
                Ok(instance) => launched.push(PooledBrowser {
                    id,
                    instance,
                    in_use: false,
                    pages_created: 0,
                }),
                Err(e) => {
                    tracing::error!("Failed to launch browser {}: {:#}", id, e);
                    last_error = Some(e.to_string());
                }
            }
        }

        if launched.is_empty() {
            return Err(PoolError::Launch(
                last_error.unwrap_or_else(|| "pool size is zero".to_string()),
            ));
        }

        let mut state = self.lock();
        state.capacity = launched.len();
        state.available.extend(launched);
        state.initialized = true;
        tracing::info!("Browser pool ready with {} instance(s)", state.capacity);
        Ok(())
    }

    /// Leases a browser, waiting in FIFO order if all are in use
    ///
    /// # Errors
    ///
    /// * `PoolError::ShuttingDown` - shutdown started before or while waiting
    /// * `PoolError::NoBrowsers` - pool not initialized or every relaunch failed
    pub async fn acquire(&self) -> Result<PooledBrowser, PoolError> {
        let rx = {
            let mut state = self.lock();
            if state.shutting_down {
                return Err(PoolError::ShuttingDown);
            }
            if !state.initialized || state.capacity == 0 {
                return Err(PoolError::NoBrowsers);
            }
            if let Some(mut browser) = state.available.pop_front() {
                browser.in_use = true;
                state.in_use += 1;
                return Ok(browser);
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            tracing::debug!("All browsers busy, {} waiter(s) queued", state.waiters.len());
            rx
        };

        let mut pending = PendingLease { pool: self, rx };
        match (&mut pending.rx).await {
            Ok(result) => result,
            Err(_) => Err(PoolError::ShuttingDown),
        }
    }

    /// Returns a leased browser to the pool
    ///
    /// `None` is a no-op. During shutdown the instance is closed and pool
    /// state is left untouched. Otherwise the page counter is bumped, the
    /// instance is relaunched once it crosses the restart threshold, and it is
    /// handed straight to the longest-waiting caller if there is one. Never
    /// fails: close and relaunch errors are logged.
    pub async fn release(&self, browser: Option<PooledBrowser>) {
        let Some(mut browser) = browser else {
            return;
        };

        if self.lock().shutting_down {
            close_quietly(browser).await;
            return;
        }

        browser.pages_created += 1;

        if browser.pages_created >= self.config.restart_after_pages {
            match self.relaunch(browser).await {
                Some(fresh) => browser = fresh,
                None => return,
            }
        }

        if let Some(leftover) = self.hand_off(browser) {
            close_quietly(leftover).await;
        }
    }

    /// Rejects waiters and closes every idle instance
    ///
    /// Instances still leased are closed when their holders release them.
    pub async fn shutdown(&self) {
        let idle: Vec<PooledBrowser> = {
            let mut state = self.lock();
            if state.shutting_down {
                return;
            }
            state.shutting_down = true;
            for waiter in state.waiters.drain(..) {
                let _ = waiter.send(Err(PoolError::ShuttingDown));
            }
            state.available.drain(..).collect()
        };

        tracing::info!("Shutting down browser pool ({} idle instance(s))", idle.len());
        for browser in idle {
            close_quietly(browser).await;
        }
    }

    /// Leases a browser, renders `url` through the challenge-aware executor
    /// and hands the browser back
    ///
    /// The lease is released whatever the render outcome.
    pub async fn render_page(
        &self,
        policy: &RetryPolicy,
        url: &str,
        timeout: Duration,
    ) -> Result<RenderedPage, RenderError> {
        let browser = self.acquire().await?;
        let name = format!("render {}", url);

        let lease = &browser;
        let outcome = execute_browser_operation(policy, &name, move || lease.render(url, timeout)).await;

        self.release(Some(browser)).await;
        Ok(outcome?)
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            size: state.capacity,
            available: state.available.len(),
            in_use: state.in_use,
            waiting: state.waiters.len(),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }

    /// Tears an instance down and launches its replacement under the same id
    ///
    /// Returns `None` when the replacement failed; the pool then shrinks by one.
    async fn relaunch(&self, browser: PooledBrowser) -> Option<PooledBrowser> {
        let id = browser.id;
        tracing::info!(
            "Restarting browser {} after {} pages",
            id,
            browser.pages_created
        );
        close_quietly(browser).await;

        match self.launcher.launch().await {
            Ok(instance) => Some(PooledBrowser {
                id,
                instance,
                in_use: true,
                pages_created: 0,
            }),
            Err(e) => {
                tracing::error!("Failed to relaunch browser {}: {:#}", id, e);
                let mut state = self.lock();
                state.in_use = state.in_use.saturating_sub(1);
                state.capacity = state.capacity.saturating_sub(1);
                if state.capacity == 0 {
                    tracing::error!("Browser pool has no instances left");
                    for waiter in state.waiters.drain(..) {
                        let _ = waiter.send(Err(PoolError::NoBrowsers));
                    }
                }
                None
            }
        }
    }

    /// Gives a leased browser to the next live waiter or lists it as available
    ///
    /// Returns the browser back if the pool started shutting down meanwhile.
    fn hand_off(&self, browser: PooledBrowser) -> Option<PooledBrowser> {
        let mut state = self.lock();
        if state.shutting_down {
            return Some(browser);
        }

        let mut candidate = browser;
        while let Some(waiter) = state.waiters.pop_front() {
            candidate.in_use = true;
            match waiter.send(Ok(candidate)) {
                Ok(()) => return None,
                Err(Ok(returned)) => candidate = returned,
                Err(Err(_)) => return None,
            }
        }

        candidate.in_use = false;
        state.in_use = state.in_use.saturating_sub(1);
        state.available.push_back(candidate);
        None
    }
}

impl std::fmt::Debug for BrowserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Queued acquire request; a lease delivered after the caller stopped waiting
/// goes back to the pool instead of being dropped.
struct PendingLease<'a> {
    pool: &'a BrowserPool,
    rx: oneshot::Receiver<Result<PooledBrowser, PoolError>>,
}

impl Drop for PendingLease<'_> {
    fn drop(&mut self) {
        self.rx.close();
        if let Ok(Ok(browser)) = self.rx.try_recv() {
            if let Some(leftover) = self.pool.hand_off(browser) {
                tokio::spawn(close_quietly(leftover));
            }
        }
    }
}

async fn close_quietly(browser: PooledBrowser) {
    if let Err(e) = browser.instance.close().await {
        tracing::warn!("Failed to close browser {}: {:#}", browser.id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeInstance {
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BrowserInstance for FakeInstance {
        async fn render(&self, url: &str, _timeout: Duration) -> Result<RenderedPage, NetworkError> {
            Ok(RenderedPage {
                final_url: url.to_string(),
                html: "<html></html>".to_string(),
                load_time_ms: 1,
            })
        }

        async fn close(&self) -> anyhow::Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeLauncher {
        launched: AtomicUsize,
        closed: Arc<AtomicUsize>,
        fail_after: Option<usize>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl BrowserLauncher for FakeLauncher {
        async fn launch(&self) -> anyhow::Result<Box<dyn BrowserInstance>> {
            let n = self.launched.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) || self.fail_after.is_some_and(|limit| n >= limit) {
                anyhow::bail!("launch refused");
            }
            Ok(Box::new(FakeInstance {
                closed: self.closed.clone(),
            }))
        }
    }

    async fn pool_with(size: usize, restart: u64, launcher: Arc<FakeLauncher>) -> BrowserPool {
        let pool = BrowserPool::new(
            launcher,
            PoolConfig {
                size,
                restart_after_pages: restart,
            },
        );
        pool.initialize().await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_acquire_before_initialize() {
        let pool = BrowserPool::new(
            Arc::new(FakeLauncher::default()),
            PoolConfig {
                size: 2,
                restart_after_pages: 10,
            },
        );
        assert_eq!(pool.acquire().await.unwrap_err(), PoolError::NoBrowsers);
    }

    #[tokio::test]
    async fn test_acquire_marks_in_use() {
        let pool = pool_with(2, 10, Arc::new(FakeLauncher::default())).await;

        let a = pool.acquire().await.unwrap();
        assert!(a.in_use());
        let stats = pool.stats();
        assert_eq!(stats.in_use, 1);
        assert_eq!(stats.available + stats.in_use, 2);

        pool.release(Some(a)).await;
        let stats = pool.stats();
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.available, 2);
    }

    #[tokio::test]
    async fn test_release_none_is_noop() {
        let pool = pool_with(1, 10, Arc::new(FakeLauncher::default())).await;
        let before = pool.stats();
        pool.release(None).await;
        assert_eq!(pool.stats(), before);
    }

    #[tokio::test]
    async fn test_release_increments_pages_created() {
        let pool = pool_with(1, 10, Arc::new(FakeLauncher::default())).await;
        let browser = pool.acquire().await.unwrap();
        pool.release(Some(browser)).await;
        let browser = pool.acquire().await.unwrap();
        assert_eq!(browser.pages_created(), 1);
    }

    #[tokio::test]
    async fn test_waiter_receives_released_browser() {
        let pool = Arc::new(pool_with(1, 10, Arc::new(FakeLauncher::default())).await);
        let held = pool.acquire().await.unwrap();
        let held_id = held.id();

        let waiter_pool = pool.clone();
        let waiter = tokio::spawn(async move { waiter_pool.acquire().await });
        while pool.stats().waiting == 0 {
            tokio::task::yield_now().await;
        }

        pool.release(Some(held)).await;
        let handed = waiter.await.unwrap().unwrap();
        assert_eq!(handed.id(), held_id);
        assert_eq!(pool.stats().in_use, 1);
        assert_eq!(pool.stats().available, 0);
    }

    #[tokio::test]
    async fn test_waiters_served_in_queue_order() {
        let pool = Arc::new(pool_with(1, 10, Arc::new(FakeLauncher::default())).await);
        let held = pool.acquire().await.unwrap();
        let (served_tx, mut served_rx) = tokio::sync::mpsc::unbounded_channel();

        let mut waiters = Vec::new();
        for name in ["A", "B"] {
            let waiter_pool = pool.clone();
            let served_tx = served_tx.clone();
            let queued_before = pool.stats().waiting;
            waiters.push(tokio::spawn(async move {
                let browser = waiter_pool.acquire().await.unwrap();
                served_tx.send(name).unwrap();
                waiter_pool.release(Some(browser)).await;
            }));
            while pool.stats().waiting == queued_before {
                tokio::task::yield_now().await;
            }
        }
        assert_eq!(pool.stats().waiting, 2);

        pool.release(Some(held)).await;
        for waiter in waiters {
            waiter.await.unwrap();
        }

        assert_eq!(served_rx.recv().await, Some("A"));
        assert_eq!(served_rx.recv().await, Some("B"));
        let stats = pool.stats();
        assert_eq!(stats.waiting, 0);
        assert_eq!(stats.available + stats.in_use, stats.size);
        assert_eq!(stats.available, 1);
    }

    #[tokio::test]
    async fn test_render_page_releases_lease() {
        let pool = pool_with(1, 10, Arc::new(FakeLauncher::default())).await;
        let page = pool
            .render_page(&RetryPolicy::default(), "https://example.com/", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(page.final_url, "https://example.com/");
        let stats = pool.stats();
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.available, 1);
    }

    #[tokio::test]
    async fn test_restart_after_threshold() {
        let launcher = Arc::new(FakeLauncher::default());
        let pool = pool_with(1, 2, launcher.clone()).await;

        for _ in 0..2 {
            let browser = pool.acquire().await.unwrap();
            pool.release(Some(browser)).await;
        }

        assert_eq!(launcher.launched.load(Ordering::SeqCst), 2);
        assert_eq!(launcher.closed.load(Ordering::SeqCst), 1);
        let browser = pool.acquire().await.unwrap();
        assert_eq!(browser.pages_created(), 0);
        assert_eq!(browser.id(), 0);
    }

    #[tokio::test]
    async fn test_failed_relaunch_shrinks_pool() {
        let launcher = Arc::new(FakeLauncher::default());
        let pool = pool_with(2, 1, launcher.clone()).await;
        launcher.failing.store(true, Ordering::SeqCst);

        let browser = pool.acquire().await.unwrap();
        pool.release(Some(browser)).await;

        let stats = pool.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.available + stats.in_use, 1);
    }

    #[tokio::test]
    async fn test_partial_launch_failure() {
        let launcher = Arc::new(FakeLauncher {
            fail_after: Some(1),
            ..Default::default()
        });
        let pool = pool_with(3, 10, launcher).await;
        assert_eq!(pool.stats().size, 1);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_waiters_and_new_acquires() {
        let launcher = Arc::new(FakeLauncher::default());
        let pool = Arc::new(pool_with(1, 10, launcher.clone()).await);
        let held = pool.acquire().await.unwrap();

        let waiter_pool = pool.clone();
        let waiter = tokio::spawn(async move { waiter_pool.acquire().await });
        while pool.stats().waiting == 0 {
            tokio::task::yield_now().await;
        }

        pool.shutdown().await;
        assert_eq!(waiter.await.unwrap().unwrap_err(), PoolError::ShuttingDown);
        assert_eq!(pool.acquire().await.unwrap_err(), PoolError::ShuttingDown);

        let before = pool.stats();
        pool.release(Some(held)).await;
        assert_eq!(pool.stats(), before);
        assert_eq!(launcher.closed.load(Ordering::SeqCst), 1);
    }
}
