use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scheme-crawl")]
#[command(about = "Collects government schemes from the myScheme listing and scrapes their pages")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint, overriding WEBDRIVER_URL and the configuration
    #[arg(long, global = true)]
    pub webdriver_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect every scheme name and URL from the paginated listing
    Listing {
        /// Stop after visiting this many listing pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// Directory for the output files
        #[arg(short, long, default_value = "output")]
        out: PathBuf,
    },

    /// Scrape one scheme page and print the record as JSON
    Detail {
        /// Scheme page URL
        url: String,
    },

    /// Collect the listing, then scrape every scheme page
    Run {
        /// Stop after visiting this many listing pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// Scrape at most this many scheme pages
        #[arg(long)]
        max_items: Option<usize>,

        /// Directory for the output files
        #[arg(short, long, default_value = "output")]
        out: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_limits() {
        let args = Args::parse_from([
            "scheme-crawl",
            "run",
            "--max-pages",
            "3",
            "--max-items",
            "25",
            "--webdriver-url",
            "http://localhost:9515",
        ]);
        assert_eq!(args.webdriver_url.as_deref(), Some("http://localhost:9515"));
        match args.command {
            Command::Run {
                max_pages,
                max_items,
                out,
            } => {
                assert_eq!(max_pages, Some(3));
                assert_eq!(max_items, Some(25));
                assert_eq!(out, PathBuf::from("output"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_detail_requires_url() {
        assert!(Args::try_parse_from(["scheme-crawl", "detail"]).is_err());
        let args = Args::try_parse_from([
            "scheme-crawl",
            "--config",
            "scraper.json",
            "detail",
            "https://x",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("scraper.json")));
    }
}
