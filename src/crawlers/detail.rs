use crate::config::ScraperConfig;
use crate::error::Result;
use crate::filter::UrlFilter;
use crate::parsers::detail::{extract_detail, has_page_body};
use crate::results::{DetailFailure, DetailOutcome, DetailRecord};
use crate::session::{RendererSession, SessionProvider, WaitSpec, load_until_ready};
use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Scrapes one scheme page in a fresh session.
///
/// Never fails: any error is returned as [`DetailOutcome::Failed`] carrying the
/// URL and the time of the attempt.
pub async fn scrape_detail<P>(provider: &P, config: &ScraperConfig, url: &str) -> DetailOutcome
where
    P: SessionProvider + ?Sized,
{
    match fetch(provider, config, url).await {
        Ok(record) => DetailOutcome::Scraped(Box::new(record)),
        Err(e) => {
            ::log::warn!("Failed to scrape {}: {}", url, e);
            DetailOutcome::Failed(DetailFailure {
                error: e.to_string(),
                source_url: url.to_string(),
                scraped_at: Utc::now(),
            })
        }
    }
}

async fn fetch<P>(provider: &P, config: &ScraperConfig, url: &str) -> Result<DetailRecord>
where
    P: SessionProvider + ?Sized,
{
    let mut session = provider.open().await?;
    let rendered = AssertUnwindSafe(render(&mut session, config, url))
        .catch_unwind()
        .await;

    if let Err(e) = session.close().await {
        ::log::warn!("Failed to close session for {}: {}", url, e);
    }

    let markup = rendered.unwrap_or_else(|payload| std::panic::resume_unwind(payload))?;
    let filter = UrlFilter::for_site(&config.site_marker);
    Ok(extract_detail(&markup, url, Utc::now(), &filter))
}

async fn render<S>(session: &mut S, config: &ScraperConfig, url: &str) -> Result<String>
where
    S: RendererSession + ?Sized,
{
    let timing = &config.timing;
    let spec = WaitSpec::new(timing.detail_ready_timeout(), timing.poll_interval());

    ::log::debug!("Loading {}", url);
    load_until_ready(session, url, spec, has_page_body).await?;
    tokio::time::sleep(timing.detail_settle()).await;

    session.current_markup().await
}
