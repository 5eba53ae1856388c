use crate::filter::UrlFilter;
use crate::parsers::{element_text, selector};
use crate::results::ListingItem;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static SCHEME_HEADERS: LazyLock<Selector> = LazyLock::new(|| selector("h2[id]"));
static READY_MARKER: LazyLock<Selector> = LazyLock::new(|| selector(r#"h2[id*="scheme-name"]"#));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static SCHEME_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^scheme-name-\d+$").expect("valid scheme id pattern"));

/// True once at least one scheme header has rendered
pub fn has_listing_marker(markup: &str) -> bool {
    let doc = Html::parse_document(markup);
    doc.select(&READY_MARKER).next().is_some()
}

/// Raw hrefs of the scheme headers, used to tell whether the listing changed
pub fn listing_fingerprint(markup: &str) -> Vec<String> {
    let doc = Html::parse_document(markup);
    doc.select(&READY_MARKER)
        .filter_map(|h2| h2.select(&LINKS).next())
        .filter_map(|link| link.value().attr("href").map(str::to_string))
        .collect()
}

/// Extracts the schemes visible on one listing page, in page order.
///
/// Scheme headers are `h2` elements with ids `scheme-name-<n>`; the first link
/// inside each header supplies the name and the URL. Headers without a link are
/// skipped. No headers at all yields an empty list.
pub fn extract_items(markup: &str, base_url: &Url, filter: &UrlFilter) -> Vec<ListingItem> {
    let doc = Html::parse_document(markup);

    let items: Vec<ListingItem> = doc
        .select(&SCHEME_HEADERS)
        .filter(|h2| h2.value().id().is_some_and(|id| SCHEME_ID.is_match(id)))
        .filter_map(|h2| {
            let link = h2.select(&LINKS).next()?;
            let href = link.value().attr("href")?;
            let url = filter.resolve(base_url, href)?;
            Some(ListingItem::new(element_text(&link), url))
        })
        .collect();

    ::log::debug!("Listing extractor found {} schemes", items.len());
    items
}
