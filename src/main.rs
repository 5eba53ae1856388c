use chrono::Utc;
use clap::Parser;
use scheme_crawl::output::OutputWriter;
use scheme_crawl::{Result, Scraper};

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    println!("Note: scraping requires a WebDriver server (e.g., ChromeDriver).");
    println!("Set WEBDRIVER_URL or pass --webdriver-url if not using http://localhost:4444");

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut scraper = Scraper::new();
    if let Some(path) = &args.config {
        scraper = scraper.with_config_file(path)?;
    }
    if let Some(url) = args.webdriver_url {
        scraper = scraper.with_webdriver_url(url);
    }

    match args.command {
        Command::Listing { max_pages, out } => {
            if let Some(max_pages) = max_pages {
                scraper = scraper.with_max_pages(max_pages);
            }
            let writer = OutputWriter::new(&out, Utc::now())?;

            let crawl = scraper.listing().await?;
            writer.write_listing(&crawl.items)?;
            println!(
                "Found {} schemes on {} pages ({:?}), saved to {}",
                crawl.items.len(),
                crawl.pages_visited,
                crawl.stop_reason,
                writer.dir().display()
            );
        }
        Command::Detail { url } => {
            let outcome = scraper.detail(&url).await;
            if !outcome.is_scraped() {
                ::log::warn!("Could not scrape {}", outcome.source_url());
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Run {
            max_pages,
            max_items,
            out,
        } => {
            if let Some(max_pages) = max_pages {
                scraper = scraper.with_max_pages(max_pages);
            }
            if let Some(max_items) = max_items {
                scraper = scraper.with_max_items(max_items);
            }
            let start_time = std::time::Instant::now();
            let writer = OutputWriter::new(&out, Utc::now())?;

            ::log::info!("Phase 1: collecting scheme URLs");
            let crawl = scraper.listing().await?;
            writer.write_listing(&crawl.items)?;

            ::log::info!("Phase 2: scraping {} scheme pages", crawl.items.len());
            let report = scraper
                .details(&crawl.items, |records, processed| {
                    if let Err(e) = writer.write_snapshot(records, processed) {
                        ::log::warn!("Failed to write snapshot after {} items: {}", processed, e);
                    }
                })
                .await;
            writer.write_report(&report)?;

            println!("Total schemes found: {}", crawl.items.len());
            println!("Successfully scraped: {}", report.successes.len());
            println!("Failed: {}", report.failures.len());
            println!("Success rate: {:.1}%", report.success_rate());
            ::log::info!(
                "Run complete in {:.2} seconds, outputs in {}",
                start_time.elapsed().as_secs_f64(),
                writer.dir().display()
            );
        }
    }

    Ok(())
}
