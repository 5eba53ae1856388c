//! Heading-driven section extraction for scheme detail pages.

use crate::parsers::{element_text, selector};
use crate::utils::char_len;
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

pub const ELIGIBILITY_KEYWORDS: &[&str] =
    &["eligibility", "eligible", "who can apply", "beneficiary"];

pub const BENEFIT_KEYWORDS: &[&str] = &[
    "benefit",
    "benefits",
    "assistance",
    "financial support",
    "amount",
];

pub const APPLICATION_KEYWORDS: &[&str] = &[
    "application",
    "how to apply",
    "process",
    "procedure",
    "registration",
    "apply",
];

pub const DOCUMENT_KEYWORDS: &[&str] = &[
    "document",
    "documents required",
    "papers",
    "required documents",
];

static HEADING_LIKE: LazyLock<Selector> =
    LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6, strong, b"));
static SECTION_HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5"));
static LIST_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| selector("p"));

const BLOCK_CONTAINERS: [&str; 3] = ["div", "section", "article"];
const SECTION_HEADING_TAGS: [&str; 5] = ["h1", "h2", "h3", "h4", "h5"];

/// Collects the content under the first heading that mentions one of `keywords`.
///
/// Keywords are tried in order and, for each keyword, headings in document
/// order. A heading contributes the list items of its nearest enclosing
/// `div`/`section`/`article`, or that container's paragraphs longer than 10
/// characters when it has no list items. The first heading that contributes
/// anything wins.
pub fn keyword_section(doc: &Html, keywords: &[&str]) -> Vec<String> {
    let headings: Vec<(ElementRef, String)> = doc
        .select(&HEADING_LIKE)
        .map(|heading| {
            let text = element_text(&heading).to_lowercase();
            (heading, text)
        })
        .collect();

    keywords
        .iter()
        .find_map(|keyword| {
            let keyword = keyword.to_lowercase();
            headings
                .iter()
                .filter(|(_, text)| text.contains(&keyword))
                .find_map(|(heading, _)| container_content(heading))
        })
        .unwrap_or_default()
}

fn container_content(heading: &ElementRef) -> Option<Vec<String>> {
    let container = heading
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| BLOCK_CONTAINERS.contains(&el.value().name()))?;

    let items: Vec<String> = container
        .select(&LIST_ITEMS)
        .map(|li| element_text(&li))
        .filter(|text| !text.is_empty())
        .collect();
    if !items.is_empty() {
        return Some(items);
    }

    let paragraphs: Vec<String> = container
        .select(&PARAGRAPHS)
        .map(|p| element_text(&p))
        .filter(|text| char_len(text) > 10)
        .collect();
    (!paragraphs.is_empty()).then_some(paragraphs)
}

/// Pairs every heading with the content that follows it up to the next heading.
///
/// Headings shorter than 3 characters are ignored, as are headings with no
/// content. A repeated heading keeps its first position but takes the content
/// of its last occurrence.
pub fn all_sections(doc: &Html) -> IndexMap<String, Vec<String>> {
    let mut sections = IndexMap::new();

    for heading in doc.select(&SECTION_HEADINGS) {
        let title = element_text(&heading);
        if char_len(&title) < 3 {
            continue;
        }

        let mut content = Vec::new();
        for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
            if SECTION_HEADING_TAGS.contains(&sibling.value().name()) {
                break;
            }

            let text = element_text(&sibling);
            if char_len(&text) > 10 {
                content.push(text);
            }

            content.extend(
                sibling
                    .select(&LIST_ITEMS)
                    .map(|li| element_text(&li))
                    .filter(|text| char_len(text) > 5),
            );
        }

        if !content.is_empty() {
            sections.insert(title, content);
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_keyword_wins_over_later_keyword() {
        let html = r#"
            <div><h3>Beneficiary details</h3><ul><li>Farmers</li></ul></div>
            <div><h3>Eligibility</h3><ul><li>Resident of India</li></ul></div>
        "#;
        let doc = Html::parse_document(html);
        assert_eq!(
            keyword_section(&doc, ELIGIBILITY_KEYWORDS),
            vec!["Resident of India"]
        );
    }

    #[test]
    fn test_paragraph_fallback_skips_short_text() {
        let html = r#"
            <section>
                <strong>Benefits</strong>
                <p>Short.</p>
                <p>Financial assistance of Rs. 6000 per year.</p>
            </section>
        "#;
        let doc = Html::parse_document(html);
        assert_eq!(
            keyword_section(&doc, BENEFIT_KEYWORDS),
            vec!["Financial assistance of Rs. 6000 per year."]
        );
    }

    #[test]
    fn test_heading_without_container_content_falls_through() {
        let html = r#"
            <div><h2>Documents</h2></div>
            <article><h4>Required documents</h4><ol><li>Aadhaar card</li><li>Bank passbook</li></ol></article>
        "#;
        let doc = Html::parse_document(html);
        assert_eq!(
            keyword_section(&doc, DOCUMENT_KEYWORDS),
            vec!["Aadhaar card", "Bank passbook"]
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        let doc = Html::parse_document("<div><h2>Overview</h2><p>Nothing relevant here.</p></div>");
        assert!(keyword_section(&doc, APPLICATION_KEYWORDS).is_empty());
    }

    #[test]
    fn test_all_sections_stop_at_next_heading() {
        let html = r#"
            <body>
                <h2>Details</h2>
                <p>The scheme supports small farmers.</p>
                <ul><li>Income support</li><li>Tiny</li></ul>
                <h2>Contact</h2>
                <p>Call the district agriculture office.</p>
                <h3>FAQ</h3>
            </body>
        "#;
        let doc = Html::parse_document(html);
        let sections = all_sections(&doc);
        let titles: Vec<&String> = sections.keys().collect();
        assert_eq!(titles, vec!["Details", "Contact"]);
        assert_eq!(
            sections["Details"],
            vec![
                "The scheme supports small farmers.",
                "Income support Tiny",
                "Income support",
            ]
        );
        assert_eq!(
            sections["Contact"],
            vec!["Call the district agriculture office."]
        );
    }
}
