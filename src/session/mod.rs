//! Browser sessions used to render the listing and detail pages.
//!
//! A [`RendererSession`] is an explicit handle to one live browser page. Crawl
//! code never reaches for a global browser; it is handed a session by a
//! [`SessionProvider`] and must close it on every exit path.

pub mod webdriver;

#[cfg(test)]
pub(crate) mod scripted;

use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

pub use webdriver::{WebDriverProvider, WebDriverSession};

/// Scrolls the window to the bottom of the document
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Scrolls the window back to the top of the document
pub const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0);";

/// Identifies one element on the live page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTarget {
    /// XPath expression selecting exactly this element
    pub xpath: String,

    /// 1-based position among the elements matched by the base expression
    pub position: usize,
}

impl ElementTarget {
    /// Targets the `position`-th match of `base_xpath`
    pub fn nth(base_xpath: &str, position: usize) -> Self {
        Self {
            xpath: format!("({})[{}]", base_xpath, position),
            position,
        }
    }
}

/// Live handle to a rendered page
#[async_trait]
pub trait RendererSession: Send {
    /// Navigate to a URL. Readiness is established separately with [`wait_for_markup`].
    async fn load(&mut self, url: &str) -> Result<()>;

    /// Rendered markup at the time of the call
    async fn current_markup(&mut self) -> Result<String>;

    /// Execute script in the page and return its JSON result
    async fn run_script(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Whether the element is currently rendered on screen
    async fn is_displayed(&mut self, target: &ElementTarget) -> Result<bool>;

    /// Scroll an element into the middle of the viewport
    async fn scroll_into_view(&mut self, target: &ElementTarget) -> Result<()>;

    /// Deliver a regular user click
    async fn click(&mut self, target: &ElementTarget) -> Result<()>;

    /// Deliver a click from script, bypassing overlays that intercept regular clicks
    async fn force_click(&mut self, target: &ElementTarget) -> Result<()>;

    /// Release the underlying browser
    async fn close(&mut self) -> Result<()>;
}

/// Opens fresh sessions
#[async_trait]
pub trait SessionProvider: Sync {
    type Session: RendererSession;

    async fn open(&self) -> Result<Self::Session>;
}

/// Bounds for polling a condition
#[derive(Debug, Clone, Copy)]
pub struct WaitSpec {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitSpec {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
}

/// Polls the rendered markup until `condition` holds or the timeout elapses.
///
/// The condition is always checked at least once. Errors while reading the
/// markup count as "not yet" so a page that is still navigating does not abort
/// the wait.
pub async fn wait_for_markup<S, F>(
    session: &mut S,
    spec: WaitSpec,
    mut condition: F,
) -> WaitOutcome
where
    S: RendererSession + ?Sized,
    F: FnMut(&str) -> bool + Send,
{
    let deadline = Instant::now() + spec.timeout;

    loop {
        match session.current_markup().await {
            Ok(markup) if condition(&markup) => return WaitOutcome::Satisfied,
            Ok(_) => {}
            Err(e) => ::log::debug!("Markup unavailable while waiting: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return WaitOutcome::TimedOut;
        }
        tokio::time::sleep(spec.poll_interval.min(deadline - now)).await;
    }
}

/// Loads `url` and waits for `ready` to hold, failing with `RenderTimeout` otherwise
pub async fn load_until_ready<S, F>(
    session: &mut S,
    url: &str,
    spec: WaitSpec,
    ready: F,
) -> Result<()>
where
    S: RendererSession + ?Sized,
    F: FnMut(&str) -> bool + Send,
{
    session.load(url).await?;

    match wait_for_markup(session, spec, ready).await {
        WaitOutcome::Satisfied => Ok(()),
        WaitOutcome::TimedOut => Err(ScrapeError::RenderTimeout {
            url: url.to_string(),
            waited: spec.timeout,
        }),
    }
}

/// Scrolls to the bottom and back to the top so lazily rendered content appears
pub async fn scroll_cycle<S>(
    session: &mut S,
    bottom_pause: Duration,
    top_pause: Duration,
) -> Result<()>
where
    S: RendererSession + ?Sized,
{
    session.run_script(SCROLL_TO_BOTTOM).await?;
    tokio::time::sleep(bottom_pause).await;
    session.run_script(SCROLL_TO_TOP).await?;
    tokio::time::sleep(top_pause).await;
    Ok(())
}
