//! Run summary computed from the final record collections

use crate::store::{AuditRecords, ErrorKind, PageType};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Counts reported at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub seed_url: String,
    pub config_hash: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Non-duplicate inventory entries
    pub pages: usize,
    pub articles: usize,
    pub listings: usize,
    /// Pages classified as plain `page`
    pub static_pages: usize,
    pub duplicates: usize,
    pub forms: usize,
    pub media: usize,
    pub redirects: usize,
    pub errors: usize,
    pub api_endpoints: usize,
    pub skipped_out_of_scope: u64,

    /// Inventory entries per depth, duplicates included
    pub depth_breakdown: BTreeMap<u32, usize>,

    /// Error entries per failure class
    pub error_breakdown: BTreeMap<ErrorKind, usize>,
}

impl CrawlSummary {
    pub fn from_records(
        records: &AuditRecords,
        seed_url: impl Into<String>,
        config_hash: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let mut depth_breakdown = BTreeMap::new();
        for entry in &records.inventory {
            *depth_breakdown.entry(entry.depth).or_insert(0) += 1;
        }

        let mut error_breakdown = BTreeMap::new();
        for error in &records.errors {
            *error_breakdown.entry(error.kind).or_insert(0) += 1;
        }

        Self {
            seed_url: seed_url.into(),
            config_hash: config_hash.into(),
            started_at,
            finished_at,
            pages: records.unique_pages().count(),
            articles: records.count_pages_of_type(PageType::Article),
            listings: records.count_pages_of_type(PageType::Listing),
            static_pages: records.count_pages_of_type(PageType::Page),
            duplicates: records.count_pages_of_type(PageType::Duplicate),
            forms: records.forms.len(),
            media: records.media.len(),
            redirects: records.redirects.len(),
            errors: records.errors.len(),
            api_endpoints: records.api_endpoints.len(),
            skipped_out_of_scope: records.skipped_out_of_scope,
            depth_breakdown,
            error_breakdown,
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Share of fetched URLs that produced a page, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages + self.duplicates + self.errors;
        if attempted == 0 {
            return 0.0;
        }
        ((self.pages + self.duplicates) as f64 / attempted as f64) * 100.0
    }
}

/// The one-line `DONE ...` report
impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DONE pages={} articles={} listings={} static={} forms={} media={} redirects={} errors={} apis={}",
            self.pages,
            self.articles,
            self.listings,
            self.static_pages,
            self.forms,
            self.media,
            self.redirects,
            self.errors,
            self.api_endpoints
        )
    }
}
