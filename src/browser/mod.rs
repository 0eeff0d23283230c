//! Chrome launch and per-tab session management.
//!
//! This module owns the lifetime of the driven Chrome instance. A [`Chrome`]
//! handle launches the process, pumps the DevTools websocket in a background
//! task, and hands out one [`SessionGuard`] per navigation/fetch unit. Every
//! session is an isolated tab; closing the browser closes all of them, which
//! is what gives the rest of the crate its cancellation tree.

mod error;

pub use error::BrowserError;

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// How often a selector wait re-queries the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Options controlling how Chrome is launched.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Extra arguments appended to the Chrome command line.
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            extra_args: Vec::new(),
        }
    }
}

/// Handle to a running Chrome instance.
///
/// The handle owns both the browser process and the background task that
/// drains the DevTools websocket. Sessions derived from it stay valid until
/// [`Chrome::close`] is called or the handle is dropped.
pub struct Chrome {
    browser: Mutex<Browser>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Chrome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chrome").finish_non_exhaustive()
    }
}

impl Chrome {
    /// Launches a Chrome instance and starts pumping its event loop.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Config`] if the launch configuration is
    /// rejected and [`BrowserError::Launch`] if the process or its DevTools
    /// endpoint fails to come up.
    pub async fn launch(options: &LaunchOptions) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder();
        if !options.headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-background-networking")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        for arg in &options.extra_args {
            builder = builder.arg(arg);
        }

        let config = builder.build().map_err(BrowserError::config)?;

        debug!(headless = options.headless, "launching browser");
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(BrowserError::launch)?;

        // The websocket handler must be polled for the browser to make any
        // progress at all; it ends when the connection drops.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            trace!("browser event loop ended");
        });

        Ok(Self {
            browser: Mutex::new(browser),
            handler_task: Mutex::new(Some(handler_task)),
        })
    }

    /// Opens a fresh tab session starting at `about:blank`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Session`] if the tab cannot be created.
    pub async fn new_session(&self) -> Result<SessionGuard, BrowserError> {
        let browser = self.browser.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(BrowserError::session)?;
        trace!("opened tab session");
        Ok(SessionGuard::new(page))
    }

    /// Shuts the browser down, tearing down all derived sessions with it.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Session`] if the close command fails; the
    /// process is still reaped on a best-effort basis.
    pub async fn close(&self) -> Result<(), BrowserError> {
        let mut browser = self.browser.lock().await;
        let close_result = browser.close().await.map(|_| ()).map_err(BrowserError::session);
        let _ = browser.wait().await;
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        debug!("browser closed");
        close_result
    }
}

/// Owned tab session with guaranteed release.
///
/// chromiumoxide pages have no `Drop` of their own and leak browser-side
/// targets unless closed explicitly. The guard offers an explicit async
/// [`SessionGuard::close`] for the happy path and falls back to spawning the
/// close on the runtime captured at construction time when dropped early.
pub struct SessionGuard {
    page: Page,
    runtime: tokio::runtime::Handle,
    closed: bool,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    fn new(page: Page) -> Self {
        Self {
            page,
            runtime: tokio::runtime::Handle::current(),
            closed: false,
        }
    }

    /// Returns the underlying page for navigation and DOM queries.
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Closes the tab, consuming the guard.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Session`] if the close command fails; the
    /// browser still reclaims the target eventually.
    pub async fn close(mut self) -> Result<(), BrowserError> {
        self.closed = true;
        self.page
            .clone()
            .close()
            .await
            .map_err(BrowserError::session)
    }

    /// Polls `selector` until it matches at least one element or `timeout`
    /// elapses.
    ///
    /// Listing pages render their galleries from script, so a single query
    /// right after navigation races the page's own rendering.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::SelectorTimeout`] if nothing matched in time.
    pub async fn wait_for_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Element>, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.page.find_elements(selector).await {
                Ok(elements) if !elements.is_empty() => return Ok(elements),
                Ok(_) => {}
                Err(error) => trace!(selector, %error, "selector query failed, retrying"),
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::selector_timeout(selector, timeout));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        self.runtime.spawn(async move {
            if let Err(error) = page.close().await {
                warn!(%error, "failed to close abandoned tab session");
            }
        });
    }
}
