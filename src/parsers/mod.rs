//! Pure extraction over rendered markup.
//!
//! Nothing in here touches a browser: every function takes the markup (or a
//! parsed [`Html`] document) and returns plain values, so each heuristic can be
//! tested against fixture pages.

pub mod contact;
pub mod detail;
pub mod listing;
pub mod pagination;
pub mod sections;


use crate::utils::normalize_whitespace;
use scraper::{ElementRef, Html, Selector};

/// A named extraction heuristic over a parsed document
pub struct Heuristic<T> {
    pub name: &'static str,
    pub run: fn(&Html) -> Option<T>,
}

/// Runs heuristics in priority order and returns the first result
pub fn first_success<T>(doc: &Html, heuristics: &[Heuristic<T>]) -> Option<T> {
    heuristics.iter().find_map(|heuristic| {
        let result = (heuristic.run)(doc);
        if result.is_some() {
            ::log::trace!("Heuristic '{}' matched", heuristic.name);
        }
        result
    })
}

/// Visible text of an element with whitespace normalized
pub fn element_text(element: &ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Parses a selector known at compile time
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {:?}: {:?}", css, e))
}

/// True if the element's `class` attribute contains `needle`
pub(crate) fn class_contains(element: &ElementRef, needle: &str) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| class.contains(needle))
}
