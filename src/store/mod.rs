//! Aggregation store for audit records
//!
//! This module owns every record produced during a run:
//! - Typed record definitions, one per audit concern
//! - The run-wide collections handed to the output sink at the end
//! - Thread-safe appends from concurrently completing page tasks

mod records;

pub use records::{
    AntiSpam, ApiEndpointEntry, BodyBlock, ContentEntry, ErrorEntry, ErrorKind, FormEntry,
    FormField, FormValidation, HreflangEntry, IntegrationEntry, InventoryEntry, MediaEntry,
    MediaKind, PageRecord, PageType, RecordError, RedirectEntry, SeoEntry, StructuredDataEntry,
};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// The final contents of every record collection
///
/// `sitemaps` and `hreflang_map` are reserved and stay empty.
#[derive(Debug, Clone, Default)]
pub struct AuditRecords {
    pub inventory: Vec<InventoryEntry>,
    pub seo: Vec<SeoEntry>,
    pub structured_data: Vec<StructuredDataEntry>,
    pub content: Vec<ContentEntry>,
    pub media: Vec<MediaEntry>,
    pub forms: Vec<FormEntry>,
    pub integrations: Vec<IntegrationEntry>,
    pub api_endpoints: Vec<ApiEndpointEntry>,
    pub redirects: Vec<RedirectEntry>,
    pub errors: Vec<ErrorEntry>,
    pub sitemaps: Vec<String>,
    pub hreflang_map: Vec<HreflangEntry>,
    /// URLs rejected by the scope rules at fetch time
    pub skipped_out_of_scope: u64,
}

impl AuditRecords {
    /// Routes an extractor record into its collection
    pub fn push_record(&mut self, record: PageRecord) {
        match record {
            PageRecord::StructuredData(r) => self.structured_data.push(r),
            PageRecord::Seo(r) => self.seo.push(r),
            PageRecord::Content(r) => self.content.push(r),
            PageRecord::Media(r) => self.media.push(r),
            PageRecord::Form(r) => self.forms.push(r),
            PageRecord::Integration(r) => self.integrations.push(r),
            PageRecord::ApiEndpoint(r) => self.api_endpoints.push(r),
        }
    }

    /// Inventory entries that are not duplicates
    pub fn unique_pages(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.inventory.iter().filter(|e| !e.is_duplicate())
    }

    pub fn count_pages_of_type(&self, page_type: PageType) -> usize {
        self.inventory
            .iter()
            .filter(|e| e.page_type == page_type)
            .count()
    }
}

/// Process-wide accumulation of records
///
/// Page tasks run concurrently on the runtime's worker threads, so every
/// append goes through a mutex. Locks are never held across an await.
#[derive(Debug, Default)]
pub struct AggregationStore {
    records: Mutex<AuditRecords>,
    skipped: AtomicU64,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AuditRecords> {
        // a panicking appender cannot leave a half-pushed Vec behind
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Appends one page's inventory entry and extractor output together
    ///
    /// An invalid inventory entry drops the whole page; invalid extractor
    /// records are dropped one by one.
    pub fn append_page(&self, inventory: InventoryEntry, records: Vec<PageRecord>) {
        if let Err(e) = inventory.validate() {
            tracing::warn!("Dropping page {:?}: {}", inventory.url, e);
            return;
        }
        let mut guard = self.lock();
        guard.inventory.push(inventory);
        for record in records {
            match record.validate() {
                Ok(()) => guard.push_record(record),
                Err(e) => tracing::warn!("Dropping record: {}", e),
            }
        }
    }

    pub fn record_inventory(&self, entry: InventoryEntry) {
        if let Err(e) = entry.validate() {
            tracing::warn!("Dropping inventory entry {:?}: {}", entry.url, e);
            return;
        }
        self.lock().inventory.push(entry);
    }

    pub fn record_redirect(&self, entry: RedirectEntry) {
        if let Err(e) = entry.validate() {
            tracing::warn!("Dropping redirect {:?} -> {:?}: {}", entry.from, entry.to, e);
            return;
        }
        self.lock().redirects.push(entry);
    }

    pub fn record_error(&self, entry: ErrorEntry) {
        if let Err(e) = entry.validate() {
            tracing::warn!("Dropping error entry: {}", e);
            return;
        }
        tracing::debug!(
            "Recording {} error for {}: {}",
            entry.kind,
            entry.url,
            entry.notes
        );
        self.lock().errors.push(entry);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn error_len(&self) -> usize {
        self.lock().errors.len()
    }

    /// Takes the collections out of the store for the final flush
    pub fn finish(&self) -> AuditRecords {
        let mut records = std::mem::take(&mut *self.lock());
        records.skipped_out_of_scope = self.skipped.swap(0, Ordering::Relaxed);
        records
    }
}
