//! Output module for flushing audit records and run reports
//!
//! This module handles:
//! - The `RecordSink` interface consumed at the end of a run
//! - JSON-lines and SQLite sink implementations
//! - Run summary counts and the markdown report

mod jsonl;
mod markdown;
mod sqlite_output;
pub mod stats;
mod traits;

pub use jsonl::JsonlSink;
pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use sqlite_output::SqliteSink;
pub use stats::CrawlSummary;
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::config::{OutputConfig, OutputFormat};
use crate::store::AuditRecords;
use std::path::{Path, PathBuf};

/// File name of the SQLite database inside the output directory
pub const SQLITE_FILE: &str = "audit.db";

/// Builds the sink selected by the output configuration
pub fn create_sink(config: &OutputConfig) -> Box<dyn RecordSink> {
    let directory = Path::new(&config.directory);
    match config.format {
        OutputFormat::Jsonl => Box::new(JsonlSink::new(directory)),
        OutputFormat::Sqlite => Box::new(SqliteSink::new(directory.join(SQLITE_FILE))),
    }
}

/// Flushes the records through the configured sink and writes the markdown
/// summary next to them
///
/// Returns the path of the markdown summary.
pub fn write_outputs(
    config: &OutputConfig,
    records: &AuditRecords,
    summary: &CrawlSummary,
) -> OutputResult<PathBuf> {
    let sink = create_sink(config);
    tracing::debug!("Flushing records with the {} sink", sink.name());
    sink.write(records, summary)?;

    let directory = Path::new(&config.directory);
    std::fs::create_dir_all(directory)?;
    let summary_path = directory.join(&config.summary_file);
    write_markdown_summary(summary, &summary_path)?;

    Ok(summary_path)
}
