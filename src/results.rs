use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scheme discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingItem {
    /// Display name of the scheme
    pub name: String,

    /// Normalized absolute URL of the scheme detail page
    pub url: String,
}

impl ListingItem {
    pub fn new(name: String, url: String) -> Self {
        Self { name, url }
    }
}

/// Contact details found anywhere on a detail page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub websites: Vec<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty() && self.websites.is_empty()
    }
}

/// Structured content extracted from one scheme detail page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailRecord {
    pub scheme_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,

    pub eligibility: Vec<String>,
    pub benefits: Vec<String>,
    pub application_steps: Vec<String>,
    pub documents_required: Vec<String>,
    pub contact_info: ContactInfo,

    /// Every heading on the page paired with the content that follows it
    pub sections: IndexMap<String, Vec<String>>,

    /// Tables as rows of cell texts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Vec<Vec<String>>>,

    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
}

/// A detail page that could not be scraped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailFailure {
    pub error: String,
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
}

/// Result of scraping a single detail page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailOutcome {
    Scraped(Box<DetailRecord>),
    Failed(DetailFailure),
}

impl DetailOutcome {
    pub fn source_url(&self) -> &str {
        match self {
            DetailOutcome::Scraped(record) => &record.source_url,
            DetailOutcome::Failed(failure) => &failure.source_url,
        }
    }

    pub fn is_scraped(&self) -> bool {
        matches!(self, DetailOutcome::Scraped(_))
    }
}
