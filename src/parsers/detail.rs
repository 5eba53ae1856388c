//! Builds a [`DetailRecord`] from a rendered scheme page.
//!
//! Each field comes from an independent pass over the parsed document, so the
//! passes can run in any order:
//!
//! - **name**: the first text longer than 3 characters among `h1`, `h2`,
//!   `.scheme-title`, `.heading` and `title`.
//! - **keyworded sections**: see [`sections::keyword_section`].
//! - **generic sections**: see [`sections::all_sections`].
//! - **description**: a descriptive `div` of reasonable size, falling back to the
//!   first five paragraphs.
//! - **contact info**: regexes over the visible text, see [`contact`].

use crate::filter::UrlFilter;
use crate::parsers::sections::{
    self, APPLICATION_KEYWORDS, BENEFIT_KEYWORDS, DOCUMENT_KEYWORDS, ELIGIBILITY_KEYWORDS,
};
use crate::parsers::{Heuristic, contact, element_text, first_success, selector};
use crate::results::DetailRecord;
use crate::utils::char_len;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Name used when no heading qualifies
pub const UNKNOWN_SCHEME: &str = "Unknown Scheme";

/// Paragraphs joined for the fallback description
const FALLBACK_PARAGRAPHS: usize = 5;

const DESCRIPTION_CLASS_WORDS: [&str; 4] = ["content", "description", "about", "overview"];

static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static H2: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static SCHEME_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".scheme-title"));
static HEADING_CLASS: LazyLock<Selector> = LazyLock::new(|| selector(".heading"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"]"#));
static CLASSED_DIVS: LazyLock<Selector> = LazyLock::new(|| selector("div[class]"));
static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static TABLES: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELLS: LazyLock<Selector> = LazyLock::new(|| selector("td, th"));

const NAME_HEURISTICS: [Heuristic<String>; 5] = [
    Heuristic {
        name: "h1",
        run: |doc| first_named(doc, &H1),
    },
    Heuristic {
        name: "h2",
        run: |doc| first_named(doc, &H2),
    },
    Heuristic {
        name: "scheme-title",
        run: |doc| first_named(doc, &SCHEME_TITLE),
    },
    Heuristic {
        name: "heading",
        run: |doc| first_named(doc, &HEADING_CLASS),
    },
    Heuristic {
        name: "title",
        run: |doc| first_named(doc, &TITLE),
    },
];

const DESCRIPTION_HEURISTICS: [Heuristic<String>; 2] = [
    Heuristic {
        name: "description-container",
        run: description_container,
    },
    Heuristic {
        name: "leading-paragraphs",
        run: leading_paragraphs,
    },
];

/// True once the page has a document body to read
pub fn has_page_body(markup: &str) -> bool {
    markup.to_ascii_lowercase().contains("<body")
}

/// Extracts every field of a scheme detail page
pub fn extract_detail(
    markup: &str,
    source_url: &str,
    scraped_at: DateTime<Utc>,
    filter: &UrlFilter,
) -> DetailRecord {
    let doc = Html::parse_document(markup);

    let record = DetailRecord {
        scheme_name: scheme_name(&doc),
        description: description(&doc),
        meta_description: meta_description(&doc),
        eligibility: sections::keyword_section(&doc, ELIGIBILITY_KEYWORDS),
        benefits: sections::keyword_section(&doc, BENEFIT_KEYWORDS),
        application_steps: sections::keyword_section(&doc, APPLICATION_KEYWORDS),
        documents_required: sections::keyword_section(&doc, DOCUMENT_KEYWORDS),
        contact_info: contact::extract_contact_info(&doc, filter),
        sections: sections::all_sections(&doc),
        tables: tables(&doc),
        source_url: source_url.to_string(),
        scraped_at,
    };

    ::log::debug!(
        "Extracted '{}': {} eligibility, {} benefits, {} steps, {} documents, {} sections",
        record.scheme_name,
        record.eligibility.len(),
        record.benefits.len(),
        record.application_steps.len(),
        record.documents_required.len(),
        record.sections.len()
    );

    record
}

/// Scheme name, or [`UNKNOWN_SCHEME`] when no candidate qualifies
pub fn scheme_name(doc: &Html) -> String {
    first_success(doc, &NAME_HEURISTICS).unwrap_or_else(|| UNKNOWN_SCHEME.to_string())
}

/// Only the first element matching each selector is considered
fn first_named(doc: &Html, selector: &Selector) -> Option<String> {
    let text = element_text(&doc.select(selector).next()?);
    (char_len(&text) > 3).then_some(text)
}

pub fn description(doc: &Html) -> Option<String> {
    first_success(doc, &DESCRIPTION_HEURISTICS)
}

fn description_container(doc: &Html) -> Option<String> {
    doc.select(&CLASSED_DIVS)
        .filter(|div| {
            let class = div.value().attr("class").unwrap_or_default().to_lowercase();
            DESCRIPTION_CLASS_WORDS.iter().any(|word| class.contains(word))
        })
        .map(|div| element_text(&div))
        .find(|text| {
            let len = char_len(text);
            len > 100 && len < 5000
        })
}

fn leading_paragraphs(doc: &Html) -> Option<String> {
    let combined = doc
        .select(&PARAGRAPHS)
        .take(FALLBACK_PARAGRAPHS)
        .map(|p| element_text(&p))
        .collect::<Vec<_>>()
        .join(" ");
    (char_len(&combined) > 50).then_some(combined)
}

pub fn meta_description(doc: &Html) -> Option<String> {
    doc.select(&META_DESCRIPTION)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

/// Rows with at least two cells from every table; tables without such rows are dropped
pub fn tables(doc: &Html) -> Vec<Vec<Vec<String>>> {
    doc.select(&TABLES)
        .map(|table| {
            table
                .select(&ROWS)
                .map(|row| row.select(&CELLS).map(|cell| element_text(&cell)).collect::<Vec<_>>())
                .filter(|cells| cells.len() >= 2)
                .collect::<Vec<_>>()
        })
        .filter(|rows| !rows.is_empty())
        .collect()
}
