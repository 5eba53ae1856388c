use crate::filter::UrlFilter;
use crate::results::ContactInfo;
use crate::utils::dedup_preserving_order;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

/// Websites reported per page
pub const MAX_WEBSITES: usize = 5;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email pattern")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+91|91)?[-.\s]?\d{10}|\d{3}[-.\s]?\d{3}[-.\s]?\d{4}")
        .expect("valid phone pattern")
});

static WEBSITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("valid url pattern")
});

const NON_CONTENT_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Text a reader would see, with script and style contents left out
pub fn visible_text(doc: &Html) -> String {
    doc.root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            if NON_CONTENT_TAGS.contains(&parent.value().name()) {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Emails, phone numbers and external websites mentioned in the page text
pub fn extract_contact_info(doc: &Html, filter: &UrlFilter) -> ContactInfo {
    let text = visible_text(doc);

    let emails = EMAIL
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();

    let phones = PHONE
        .find_iter(&text)
        .map(|m| m.as_str().trim().to_string())
        .collect();

    let websites = WEBSITE
        .find_iter(&text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', ')']).to_string())
        .filter(|url| filter.is_external_website(url))
        .collect();

    let mut websites = dedup_preserving_order(websites);
    websites.truncate(MAX_WEBSITES);

    ContactInfo {
        emails: dedup_preserving_order(emails),
        phones: dedup_preserving_order(phones),
        websites,
    }
}
