//! JSON-lines output sink
//!
//! One file per record collection, one JSON object per line.

use crate::output::stats::CrawlSummary;
use crate::output::traits::{OutputResult, RecordSink};
use crate::store::AuditRecords;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes each collection to `<directory>/<collection>.jsonl`
pub struct JsonlSink {
    directory: PathBuf,
}

impl JsonlSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl RecordSink for JsonlSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn write(&self, records: &AuditRecords, _summary: &CrawlSummary) -> OutputResult<()> {
        fs::create_dir_all(&self.directory)?;
        let dir = &self.directory;

        write_jsonl(&dir.join("urls.jsonl"), &records.inventory)?;
        write_jsonl(&dir.join("seo.jsonl"), &records.seo)?;
        write_jsonl(&dir.join("structured_data.jsonl"), &records.structured_data)?;
        write_jsonl(&dir.join("content.jsonl"), &records.content)?;
        write_jsonl(&dir.join("media.jsonl"), &records.media)?;
        write_jsonl(&dir.join("forms.jsonl"), &records.forms)?;
        write_jsonl(&dir.join("integrations.jsonl"), &records.integrations)?;
        write_jsonl(&dir.join("api_endpoints.jsonl"), &records.api_endpoints)?;
        write_jsonl(&dir.join("redirects.jsonl"), &records.redirects)?;
        write_jsonl(&dir.join("errors.jsonl"), &records.errors)?;
        write_jsonl(&dir.join("hreflang_map.jsonl"), &records.hreflang_map)?;
        write_lines(&dir.join("sitemaps.txt"), &records.sitemaps)?;

        tracing::info!(
            "Wrote {} inventory entries to {}",
            records.inventory.len(),
            dir.display()
        );
        Ok(())
    }
}

fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn write_lines(path: &Path, lines: &[String]) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}
