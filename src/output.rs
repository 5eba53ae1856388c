//! Files written by the command-line runs.
//!
//! Every file name carries the timestamp of the run so repeated runs never
//! overwrite each other. Scraped schemes are stored as knowledge-base entries,
//! the shape the downstream retrieval index loads. Listing, summary and failure
//! tables are also written as CSV.

use crate::crawlers::batch::{BatchReport, FailedItem};
use crate::error::Result;
use crate::results::{ContactInfo, DetailRecord, ListingItem};
use crate::utils::timestamp_slug;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Per-scheme counts written to the summary files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemeSummary {
    pub scheme_name: String,
    pub eligibility_count: usize,
    pub benefits_count: usize,
    pub documents_count: usize,
    pub application_steps_count: usize,
    pub has_contact_info: bool,
    pub source_url: String,
}

impl From<&DetailRecord> for SchemeSummary {
    fn from(record: &DetailRecord) -> Self {
        Self {
            scheme_name: record.scheme_name.clone(),
            eligibility_count: record.eligibility.len(),
            benefits_count: record.benefits.len(),
            documents_count: record.documents_required.len(),
            application_steps_count: record.application_steps.len(),
            has_contact_info: !record.contact_info.is_empty(),
            source_url: record.source_url.clone(),
        }
    }
}

/// One scheme as stored in the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeBaseEntry {
    pub scheme: String,
    /// Page description, else the meta description, else empty
    pub summary: String,
    pub key_information: KeyInformation,
    pub additional_details: AdditionalDetails,
    pub all_extracted_sections: IndexMap<String, Vec<String>>,
    pub contact: ContactInfo,
    pub last_updated: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInformation {
    pub eligibility_criteria: Vec<String>,
    pub benefits: Vec<String>,
    pub required_documents: Vec<String>,
    pub application_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdditionalDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Vec<Vec<String>>>,
}

impl From<&DetailRecord> for KnowledgeBaseEntry {
    fn from(record: &DetailRecord) -> Self {
        let summary = record
            .description
            .as_ref()
            .or(record.meta_description.as_ref())
            .cloned()
            .unwrap_or_default();

        Self {
            scheme: record.scheme_name.clone(),
            summary,
            key_information: KeyInformation {
                eligibility_criteria: record.eligibility.clone(),
                benefits: record.benefits.clone(),
                required_documents: record.documents_required.clone(),
                application_steps: record.application_steps.clone(),
            },
            additional_details: AdditionalDetails {
                description: record.description.clone(),
                meta_description: record.meta_description.clone(),
                tables: record.tables.clone(),
            },
            all_extracted_sections: record.sections.clone(),
            contact: record.contact_info.clone(),
            last_updated: record.scraped_at,
            source: record.source_url.clone(),
        }
    }
}

/// Envelope the knowledge-base loader expects around each entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeBaseRecord {
    pub knowledge_base_entry: KnowledgeBaseEntry,
}

impl From<&DetailRecord> for KnowledgeBaseRecord {
    fn from(record: &DetailRecord) -> Self {
        Self {
            knowledge_base_entry: KnowledgeBaseEntry::from(record),
        }
    }
}

fn knowledge_base(records: &[DetailRecord]) -> Vec<KnowledgeBaseRecord> {
    records.iter().map(KnowledgeBaseRecord::from).collect()
}

#[derive(Serialize)]
struct RawOutput<'a> {
    total_schemes: usize,
    successfully_scraped: usize,
    failed: usize,
    success_rate: f64,
    scraping_date: DateTime<Utc>,
    schemes: &'a [DetailRecord],
}

/// Writes the outputs of one run into a directory
pub struct OutputWriter {
    dir: PathBuf,
    slug: String,
}

impl OutputWriter {
    /// Creates `dir` if needed; `started_at` stamps every file name
    pub fn new(dir: impl AsRef<Path>, started_at: DateTime<Utc>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            slug: timestamp_slug(started_at),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `scheme_urls_<ts>.json` and `scheme_urls_<ts>.csv`
    pub fn write_listing(&self, items: &[ListingItem]) -> Result<Vec<PathBuf>> {
        let json = self.write_json(&format!("scheme_urls_{}.json", self.slug), &items)?;
        let rows = items.iter().enumerate().map(|(index, item)| {
            vec![(index + 1).to_string(), item.name.clone(), item.url.clone()]
        });
        let csv = self.write_csv(
            &format!("scheme_urls_{}.csv", self.slug),
            &["Index", "Scheme Name", "Scheme URL"],
            rows,
        )?;
        Ok(vec![json, csv])
    }

    /// `schemes_backup_<ts>_<processed>.json`, in knowledge-base form
    pub fn write_snapshot(&self, records: &[DetailRecord], processed: usize) -> Result<PathBuf> {
        self.write_json(
            &format!("schemes_backup_{}_{}.json", self.slug, processed),
            &knowledge_base(records),
        )
    }

    /// Writes the complete, raw and summary files, plus the failed files when
    /// anything failed. Returns the paths written.
    pub fn write_report(&self, report: &BatchReport) -> Result<Vec<PathBuf>> {
        let mut written = vec![
            self.write_json(
                &format!("all_schemes_complete_{}.json", self.slug),
                &knowledge_base(&report.successes),
            )?,
            self.write_json(
                &format!("all_schemes_raw_{}.json", self.slug),
                &RawOutput {
                    total_schemes: report.total,
                    successfully_scraped: report.successes.len(),
                    failed: report.failures.len(),
                    success_rate: report.success_rate(),
                    scraping_date: Utc::now(),
                    schemes: &report.successes,
                },
            )?,
        ];

        let summary: Vec<SchemeSummary> =
            report.successes.iter().map(SchemeSummary::from).collect();
        written.push(self.write_json(&format!("schemes_summary_{}.json", self.slug), &summary)?);
        written.push(self.write_summary_csv(&summary)?);

        if !report.failures.is_empty() {
            written.extend(self.write_failures(&report.failures)?);
        }
        Ok(written)
    }

    fn write_summary_csv(&self, summary: &[SchemeSummary]) -> Result<PathBuf> {
        let rows = summary.iter().map(|s| {
            vec![
                s.scheme_name.clone(),
                s.eligibility_count.to_string(),
                s.benefits_count.to_string(),
                s.documents_count.to_string(),
                s.application_steps_count.to_string(),
                if s.has_contact_info { "Yes" } else { "No" }.to_string(),
                s.source_url.clone(),
            ]
        });
        self.write_csv(
            &format!("schemes_summary_{}.csv", self.slug),
            &[
                "Scheme Name",
                "Eligibility Count",
                "Benefits Count",
                "Documents Count",
                "Application Steps Count",
                "Has Contact Info",
                "Source URL",
            ],
            rows,
        )
    }

    fn write_failures(&self, failures: &[FailedItem]) -> Result<Vec<PathBuf>> {
        let json = self.write_json(&format!("failed_schemes_{}.json", self.slug), &failures)?;
        let rows = failures
            .iter()
            .map(|f| vec![f.name.clone(), f.url.clone(), f.error.clone()]);
        let csv = self.write_csv(
            &format!("failed_schemes_{}.csv", self.slug),
            &["Scheme Name", "URL", "Error"],
            rows,
        )?;
        Ok(vec![json, csv])
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        ::log::info!("Wrote {}", path.display());
        Ok(path)
    }

    fn write_csv<I>(&self, name: &str, headers: &[&str], rows: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let path = self.dir.join(name);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        ::log::info!("Wrote {}", path.display());
        Ok(path)
    }
}
