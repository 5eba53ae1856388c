use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the scheme scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Base URL that relative scheme links are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Paginated search page listing all schemes
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Marker used to recognise links back to the source site
    #[serde(default = "default_site_marker")]
    pub site_marker: String,

    /// Browser session settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Wait and settle timings
    #[serde(default)]
    pub timing: TimingConfig,

    /// Listing crawl limits
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Detail batch settings
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Configuration for the WebDriver-backed browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a visible window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// User agent presented to the site
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Timings in milliseconds for bounded waits and settle delays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Bound on waiting for the listing readiness marker
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Poll interval for bounded waits
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Settle delay after the listing page first loads
    #[serde(default = "default_initial_settle_ms")]
    pub initial_settle_ms: u64,

    /// Extra wait when the readiness marker never shows up
    #[serde(default = "default_extended_wait_ms")]
    pub extended_wait_ms: u64,

    /// Settle delay at the top of each listing page
    #[serde(default = "default_page_settle_ms")]
    pub page_settle_ms: u64,

    /// Pause after scrolling to the bottom of the page
    #[serde(default = "default_scroll_pause_ms")]
    pub scroll_pause_ms: u64,

    /// Pause after scrolling back to the top of the page
    #[serde(default = "default_scroll_top_pause_ms")]
    pub scroll_top_pause_ms: u64,

    /// Pause after scrolling a pagination control into view
    #[serde(default = "default_scroll_into_view_pause_ms")]
    pub scroll_into_view_pause_ms: u64,

    /// Settle delay after a pagination click
    #[serde(default = "default_click_settle_ms")]
    pub click_settle_ms: u64,

    /// Bound on waiting for a detail page body
    #[serde(default = "default_detail_ready_timeout_ms")]
    pub detail_ready_timeout_ms: u64,

    /// Settle delay after a detail page is ready
    #[serde(default = "default_detail_settle_ms")]
    pub detail_settle_ms: u64,
}

/// Limits for the listing crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Optional ceiling on the number of listing pages visited
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Consecutive pages without new items before the crawl stops
    #[serde(default = "default_empty_page_threshold")]
    pub empty_page_threshold: u32,

    /// Hard ceiling on the page number reached
    #[serde(default = "default_safety_page_ceiling")]
    pub safety_page_ceiling: u32,

    /// Re-extract the listing after each advance and reject unchanged pages
    #[serde(default)]
    pub verify_advance: bool,
}

/// Settings for sequential detail scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Optional ceiling on the number of detail pages scraped
    #[serde(default)]
    pub max_items: Option<usize>,

    /// Delay between consecutive detail requests
    #[serde(default = "default_inter_request_delay_ms")]
    pub inter_request_delay_ms: u64,

    /// Emit an intermediate snapshot every this many items (0 disables)
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: usize,
}

fn default_base_url() -> String {
    "https://www.myscheme.gov.in".to_string()
}

fn default_listing_url() -> String {
    "https://www.myscheme.gov.in/search".to_string()
}

fn default_site_marker() -> String {
    "myscheme".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_ready_timeout_ms() -> u64 {
    20_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_initial_settle_ms() -> u64 {
    5_000
}

fn default_extended_wait_ms() -> u64 {
    5_000
}

fn default_page_settle_ms() -> u64 {
    4_000
}

fn default_scroll_pause_ms() -> u64 {
    2_000
}

fn default_scroll_top_pause_ms() -> u64 {
    1_000
}

fn default_scroll_into_view_pause_ms() -> u64 {
    1_000
}

fn default_click_settle_ms() -> u64 {
    5_000
}

fn default_detail_ready_timeout_ms() -> u64 {
    15_000
}

fn default_detail_settle_ms() -> u64 {
    3_000
}

fn default_empty_page_threshold() -> u32 {
    3
}

fn default_safety_page_ceiling() -> u32 {
    500
}

fn default_inter_request_delay_ms() -> u64 {
    2_000
}

fn default_snapshot_every() -> usize {
    10
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: true,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: default_ready_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            initial_settle_ms: default_initial_settle_ms(),
            extended_wait_ms: default_extended_wait_ms(),
            page_settle_ms: default_page_settle_ms(),
            scroll_pause_ms: default_scroll_pause_ms(),
            scroll_top_pause_ms: default_scroll_top_pause_ms(),
            scroll_into_view_pause_ms: default_scroll_into_view_pause_ms(),
            click_settle_ms: default_click_settle_ms(),
            detail_ready_timeout_ms: default_detail_ready_timeout_ms(),
            detail_settle_ms: default_detail_settle_ms(),
        }
    }
}

impl TimingConfig {
    /// Timings with every wait and delay set to zero, for scripted sessions
    pub fn immediate() -> Self {
        Self {
            ready_timeout_ms: 0,
            poll_interval_ms: 0,
            initial_settle_ms: 0,
            extended_wait_ms: 0,
            page_settle_ms: 0,
            scroll_pause_ms: 0,
            scroll_top_pause_ms: 0,
            scroll_into_view_pause_ms: 0,
            click_settle_ms: 0,
            detail_ready_timeout_ms: 0,
            detail_settle_ms: 0,
        }
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn extended_wait(&self) -> Duration {
        Duration::from_millis(self.extended_wait_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn scroll_top_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_top_pause_ms)
    }

    pub fn scroll_into_view_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_into_view_pause_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn detail_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_ready_timeout_ms)
    }

    pub fn detail_settle(&self) -> Duration {
        Duration::from_millis(self.detail_settle_ms)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            empty_page_threshold: default_empty_page_threshold(),
            safety_page_ceiling: default_safety_page_ceiling(),
            verify_advance: false,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_items: None,
            inter_request_delay_ms: default_inter_request_delay_ms(),
            snapshot_every: default_snapshot_every(),
        }
    }
}

impl BatchConfig {
    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_url: default_listing_url(),
            site_marker: default_site_marker(),
            browser: BrowserConfig::default(),
            timing: TimingConfig::default(),
            crawl: CrawlConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }
}
