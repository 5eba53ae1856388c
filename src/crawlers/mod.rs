//! Browser-driven crawls built on a [`RendererSession`](crate::session::RendererSession).

pub mod batch;
pub mod detail;
pub mod listing;
pub mod navigator;

pub use batch::{BatchReport, FailedItem, scrape_details};
pub use detail::scrape_detail;
pub use listing::{ListingCrawl, StopReason, scrape_listing};
pub use navigator::{NavigationOutcome, Navigator};
