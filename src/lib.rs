// Re-export modules
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod output;
pub mod parsers;
pub mod results;
pub mod session;
pub mod utils;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types for convenience
pub use config::ScraperConfig;
pub use crawlers::{BatchReport, ListingCrawl, StopReason};
pub use error::{Result, ScrapeError};
pub use results::{DetailOutcome, DetailRecord, ListingItem};

use session::WebDriverProvider;
use std::path::Path;

/// Environment variable that overrides the configured WebDriver URL
pub const WEBDRIVER_URL_ENV: &str = "WEBDRIVER_URL";

/// Main builder for running scheme crawls against a WebDriver browser
pub struct Scraper {
    config: ScraperConfig,
    webdriver_url: Option<String>,
}

impl Default for Scraper {
    fn default() -> Self {
        Self::new()
    }
}

impl Scraper {
    /// Create a scraper with the default configuration
    pub fn new() -> Self {
        Self {
            config: ScraperConfig::default(),
            webdriver_url: None,
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ScraperConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let config = ScraperConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a JSON string
    pub fn with_config_str(self, json: &str) -> Result<Self> {
        let config = ScraperConfig::from_json(json)?;
        Ok(self.with_config(config))
    }

    /// Use this WebDriver URL regardless of configuration or environment
    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = Some(url.into());
        self
    }

    /// Stop the listing crawl after this many pages
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.config.crawl.max_pages = Some(max_pages);
        self
    }

    /// Scrape at most this many detail pages
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.config.batch.max_items = Some(max_items);
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Provider for browser sessions; the WebDriver URL comes from the
    /// builder, then `WEBDRIVER_URL`, then the configuration
    pub fn provider(&self) -> WebDriverProvider {
        let mut browser = self.config.browser.clone();
        browser.webdriver_url = resolve_webdriver_url(
            self.webdriver_url.as_deref(),
            std::env::var(WEBDRIVER_URL_ENV).ok(),
            &browser.webdriver_url,
        );
        WebDriverProvider::new(browser)
    }

    /// Crawl the whole listing
    pub async fn listing(&self) -> Result<ListingCrawl> {
        crawlers::scrape_listing(&self.provider(), &self.config, None).await
    }

    /// Scrape a single detail page
    pub async fn detail(&self, url: &str) -> DetailOutcome {
        crawlers::scrape_detail(&self.provider(), &self.config, url).await
    }

    /// Scrape the detail pages of `items`, reporting snapshots along the way
    pub async fn details<F>(&self, items: &[ListingItem], on_snapshot: F) -> BatchReport
    where
        F: FnMut(&[DetailRecord], usize),
    {
        crawlers::scrape_details(&self.provider(), &self.config, items, None, on_snapshot).await
    }
}

fn resolve_webdriver_url(explicit: Option<&str>, env: Option<String>, configured: &str) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }
    match env {
        Some(url) if !url.is_empty() => url,
        _ => configured.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webdriver_url_precedence() {
        let configured = "http://localhost:4444";
        assert_eq!(
            resolve_webdriver_url(
                Some("http://grid:4444"),
                Some("http://env:4444".into()),
                configured,
            ),
            "http://grid:4444"
        );
        assert_eq!(
            resolve_webdriver_url(None, Some("http://env:4444".into()), configured),
            "http://env:4444"
        );
        assert_eq!(resolve_webdriver_url(None, Some(String::new()), configured), configured);
        assert_eq!(resolve_webdriver_url(None, None, configured), configured);
    }

    #[test]
    fn test_builder_limits() {
        let scraper = Scraper::new()
            .with_config_str(r#"{"crawl": {"empty_page_threshold": 5}}"#)
            .unwrap()
            .with_max_pages(7)
            .with_max_items(20);

        assert_eq!(scraper.config().crawl.empty_page_threshold, 5);
        assert_eq!(scraper.config().crawl.max_pages, Some(7));
        assert_eq!(scraper.config().batch.max_items, Some(20));
    }
}
