//! Output sink trait and error types
//!
//! A sink receives the final record collections once, at the end of a run.

use crate::output::stats::CrawlSummary;
use crate::store::AuditRecords;
use thiserror::Error;

/// Errors that can occur while flushing records
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for the records of a finished run
///
/// Implementations decide the file format. Every collection is written,
/// including empty ones, so downstream tooling always finds the same set
/// of outputs.
pub trait RecordSink {
    /// Short name for log messages
    fn name(&self) -> &'static str;

    /// Writes every collection in `records`
    fn write(&self, records: &AuditRecords, summary: &CrawlSummary) -> OutputResult<()>;
}
