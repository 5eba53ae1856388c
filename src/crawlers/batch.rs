use crate::config::ScraperConfig;
use crate::crawlers::detail::scrape_detail;
use crate::results::{DetailOutcome, DetailRecord, ListingItem};
use crate::session::SessionProvider;
use serde::{Deserialize, Serialize};

/// A listing item whose detail page could not be scraped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub name: String,
    pub url: String,
    pub error: String,
}

/// Outcome of scraping a batch of detail pages
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Items attempted
    pub total: usize,
    pub successes: Vec<DetailRecord>,
    pub failures: Vec<FailedItem>,
}

impl BatchReport {
    /// Percentage of attempted items that were scraped
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.successes.len() as f64 / self.total as f64 * 100.0
    }
}

/// Scrapes the detail page of each item, one after another.
///
/// At most `max_items` items are attempted (falling back to the configured
/// limit). Every `snapshot_every` items, `on_snapshot` receives the records
/// scraped so far and the number of items processed.
pub async fn scrape_details<P, F>(
    provider: &P,
    config: &ScraperConfig,
    items: &[ListingItem],
    max_items: Option<usize>,
    mut on_snapshot: F,
) -> BatchReport
where
    P: SessionProvider + ?Sized,
    F: FnMut(&[DetailRecord], usize),
{
    let limit = max_items
        .or(config.batch.max_items)
        .map_or(items.len(), |max| max.min(items.len()));
    let selected = &items[..limit];

    let mut report = BatchReport {
        total: selected.len(),
        ..BatchReport::default()
    };
    ::log::info!("Scraping {} scheme pages", report.total);

    for (index, item) in selected.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(config.batch.inter_request_delay()).await;
        }
        ::log::info!("[{}/{}] {}", index + 1, report.total, item.name);

        match scrape_detail(provider, config, &item.url).await {
            DetailOutcome::Scraped(record) => report.successes.push(*record),
            DetailOutcome::Failed(failure) => report.failures.push(FailedItem {
                name: item.name.clone(),
                url: item.url.clone(),
                error: failure.error,
            }),
        }

        let processed = index + 1;
        let every = config.batch.snapshot_every;
        if every > 0 && processed % every == 0 {
            ::log::debug!("Snapshot after {} items", processed);
            on_snapshot(&report.successes, processed);
        }
    }

    ::log::info!(
        "Scraped {} of {} scheme pages ({:.1}%)",
        report.successes.len(),
        report.total,
        report.success_rate()
    );
    report
}
