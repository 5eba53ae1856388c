use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Collapses every run of whitespace into a single space and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length in characters rather than bytes
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Removes repeated entries, keeping the first occurrence of each
pub fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Timestamp fragment used in output file names, e.g. `20250301_142233`
pub fn timestamp_slug(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}
