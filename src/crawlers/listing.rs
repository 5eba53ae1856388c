//! Walks the paginated scheme listing and collects every scheme once.

use crate::config::ScraperConfig;
use crate::crawlers::navigator::{NavigationOutcome, Navigator};
use crate::error::{Result, ScrapeError};
use crate::filter::UrlFilter;
use crate::parsers::listing::{extract_items, has_listing_marker};
use crate::results::ListingItem;
use crate::session::{RendererSession, SessionProvider, WaitSpec, load_until_ready, scroll_cycle};
use futures::FutureExt;
use serde::Serialize;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use url::Url;

/// Ordered, duplicate-free collection of discovered schemes
#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: HashSet<String>,
    items: Vec<ListingItem>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the items whose URL has not been seen yet; returns how many were new
    pub fn merge(&mut self, items: Vec<ListingItem>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.seen.insert(item.url.clone()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ListingItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ListingItem> {
        self.items
    }
}

/// Position of the crawl within the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub current_page: u32,
    pub consecutive_empty_pages: u32,
    pub pages_visited: u32,
}

impl PageCursor {
    pub fn start() -> Self {
        Self {
            current_page: 1,
            consecutive_empty_pages: 0,
            pages_visited: 0,
        }
    }

    /// Records a visited page that contributed `new_items` schemes
    pub fn record_visit(&mut self, new_items: usize) {
        self.pages_visited += 1;
        if new_items == 0 {
            self.consecutive_empty_pages += 1;
        } else {
            self.consecutive_empty_pages = 0;
        }
    }

    /// Records a failed attempt to leave the current page. It counts towards
    /// the empty-page threshold but is not a visit.
    pub fn record_failed_advance(&mut self) {
        self.consecutive_empty_pages += 1;
    }
}

/// Why the listing crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The caller's page limit was reached
    PageLimit,
    /// Too many pages in a row added nothing
    EmptyPages,
    /// No strategy could advance past the current page
    NoMorePages,
    /// The hard page ceiling was passed
    SafetyCeiling,
    /// Leaving the current page kept failing until the empty-page threshold
    NavigationFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrawlState {
    Initializing,
    Paging,
    Terminated(StopReason),
}

/// Everything the listing crawl found
#[derive(Debug, Clone)]
pub struct ListingCrawl {
    pub items: Vec<ListingItem>,
    pub pages_visited: u32,
    pub last_page: u32,
    pub stop_reason: StopReason,
}

/// Crawls the whole listing with a single session.
///
/// Fails only when no session can be opened. Errors on individual pages count
/// as pages without schemes, so items already collected are never lost. The
/// session is closed once the crawl ends, whatever ended it, including a panic
/// inside the crawl, which is resumed after the close.
pub async fn scrape_listing<P>(
    provider: &P,
    config: &ScraperConfig,
    max_pages: Option<u32>,
) -> Result<ListingCrawl>
where
    P: SessionProvider + ?Sized,
{
    let mut crawler = ListingCrawler::new(config, max_pages.or(config.crawl.max_pages))?;

    ::log::info!("Starting listing crawl at {}", config.listing_url);
    let mut session = provider.open().await?;

    let run = AssertUnwindSafe(crawler.run(&mut session)).catch_unwind().await;

    if let Err(e) = session.close().await {
        ::log::warn!("Failed to close listing session: {}", e);
    }
    let stop_reason = run.unwrap_or_else(|payload| std::panic::resume_unwind(payload));

    let crawl = crawler.finish(stop_reason);
    ::log::info!(
        "Listing crawl finished after {} pages ({:?}): {} unique schemes",
        crawl.pages_visited,
        crawl.stop_reason,
        crawl.items.len()
    );
    Ok(crawl)
}

struct ListingCrawler<'a> {
    config: &'a ScraperConfig,
    max_pages: Option<u32>,
    base_url: Url,
    filter: UrlFilter,
    navigator: Navigator,
    cursor: PageCursor,
    ledger: DedupLedger,
}

impl<'a> ListingCrawler<'a> {
    fn new(config: &'a ScraperConfig, max_pages: Option<u32>) -> Result<Self> {
        Ok(Self {
            config,
            max_pages,
            base_url: Url::parse(&config.base_url)?,
            filter: UrlFilter::for_site(&config.site_marker),
            navigator: Navigator::new(&config.timing, &config.crawl),
            cursor: PageCursor::start(),
            ledger: DedupLedger::new(),
        })
    }

    async fn run<S>(&mut self, session: &mut S) -> StopReason
    where
        S: RendererSession + ?Sized,
    {
        let mut state = CrawlState::Initializing;
        loop {
            state = match state {
                CrawlState::Initializing => {
                    self.initialize(session).await;
                    CrawlState::Paging
                }
                CrawlState::Paging => self.page(session).await,
                CrawlState::Terminated(reason) => return reason,
            };
        }
    }

    /// Loads the listing and waits for it to render. A slow first render is
    /// tolerated with one extended wait; nothing here ends the crawl.
    async fn initialize<S>(&mut self, session: &mut S)
    where
        S: RendererSession + ?Sized,
    {
        let timing = &self.config.timing;
        let spec = WaitSpec::new(timing.ready_timeout(), timing.poll_interval());

        match load_until_ready(session, &self.config.listing_url, spec, has_listing_marker).await {
            Ok(()) => ::log::debug!("Listing rendered"),
            Err(ScrapeError::RenderTimeout { waited, .. }) => {
                ::log::warn!(
                    "No schemes rendered within {:?}, waiting another {:?}",
                    waited,
                    timing.extended_wait()
                );
                tokio::time::sleep(timing.extended_wait()).await;
            }
            Err(e) => ::log::error!("Failed to load {}: {}", self.config.listing_url, e),
        }

        tokio::time::sleep(timing.initial_settle()).await;
    }

    /// Visits the current page, then decides whether and where to go next
    async fn page<S>(&mut self, session: &mut S) -> CrawlState
    where
        S: RendererSession + ?Sized,
    {
        let page = self.cursor.current_page;
        if self.page_limit_reached() {
            return CrawlState::Terminated(StopReason::PageLimit);
        }
        tokio::time::sleep(self.config.timing.page_settle()).await;

        let added = match self.visit(session).await {
            Ok(items) => {
                let found = items.len();
                let added = self.ledger.merge(items);
                ::log::info!(
                    "Page {}: {} schemes, {} new, {} total",
                    page,
                    found,
                    added,
                    self.ledger.len()
                );
                added
            }
            Err(e) => {
                ::log::warn!("Page {} could not be read: {}", page, e);
                0
            }
        };
        self.cursor.record_visit(added);

        if self.page_limit_reached() {
            return CrawlState::Terminated(StopReason::PageLimit);
        }

        if self.empty_threshold_reached() {
            ::log::info!(
                "{} consecutive pages without new schemes",
                self.cursor.consecutive_empty_pages
            );
            return CrawlState::Terminated(StopReason::EmptyPages);
        }

        match self.navigator.advance(session, page).await {
            Ok(NavigationOutcome::Advanced(next)) => {
                self.cursor.current_page = next;
                if next > self.config.crawl.safety_page_ceiling {
                    ::log::warn!(
                        "Page {} is past the ceiling of {}, stopping",
                        next,
                        self.config.crawl.safety_page_ceiling
                    );
                    CrawlState::Terminated(StopReason::SafetyCeiling)
                } else {
                    CrawlState::Paging
                }
            }
            Ok(NavigationOutcome::NoMorePages) => {
                ::log::info!("No page after {}", page);
                CrawlState::Terminated(StopReason::NoMorePages)
            }
            Err(e) => {
                self.cursor.record_failed_advance();
                if self.empty_threshold_reached() {
                    ::log::warn!("Pagination failed on page {}, giving up: {}", page, e);
                    CrawlState::Terminated(StopReason::NavigationFailed)
                } else {
                    ::log::warn!("Pagination failed on page {}, retrying: {}", page, e);
                    CrawlState::Paging
                }
            }
        }
    }

    fn page_limit_reached(&self) -> bool {
        self.max_pages.is_some_and(|max| self.cursor.pages_visited >= max)
    }

    fn empty_threshold_reached(&self) -> bool {
        self.cursor.consecutive_empty_pages >= self.config.crawl.empty_page_threshold
    }

    async fn visit<S>(&self, session: &mut S) -> Result<Vec<ListingItem>>
    where
        S: RendererSession + ?Sized,
    {
        let timing = &self.config.timing;
        scroll_cycle(session, timing.scroll_pause(), timing.scroll_top_pause()).await?;
        let markup = session.current_markup().await?;
        Ok(extract_items(&markup, &self.base_url, &self.filter))
    }

    fn finish(self, stop_reason: StopReason) -> ListingCrawl {
        ListingCrawl {
            items: self.ledger.into_items(),
            pages_visited: self.cursor.pages_visited,
            last_page: self.cursor.current_page,
            stop_reason,
        }
    }
}
