//! SQLite output sink
//!
//! Inventory, redirects and errors get their own tables. Every other record
//! kind is stored as a JSON payload in `page_records`, keyed by kind and
//! page URL. Each flush is tagged with a row in `runs`, so one database can
//! hold several audits of the same site.

use crate::output::stats::CrawlSummary;
use crate::output::traits::{OutputResult, RecordSink};
use crate::store::AuditRecords;
use rusqlite::{params, Connection, Transaction};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    seed_url TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    pages INTEGER NOT NULL,
    errors INTEGER NOT NULL,
    skipped_out_of_scope INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    type TEXT NOT NULL,
    template TEXT NOT NULL,
    depth INTEGER NOT NULL,
    status INTEGER NOT NULL,
    redirected_from TEXT,
    canonical TEXT,
    hreflang TEXT NOT NULL,
    paginated INTEGER NOT NULL,
    discovered_from TEXT NOT NULL,
    duplicate_of TEXT
);

CREATE INDEX IF NOT EXISTS idx_inventory_url ON inventory(url);
CREATE INDEX IF NOT EXISTS idx_inventory_type ON inventory(type);

CREATE TABLE IF NOT EXISTS redirects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    from_url TEXT NOT NULL,
    to_url TEXT NOT NULL,
    http_status INTEGER NOT NULL,
    via TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS errors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    kind TEXT NOT NULL,
    status INTEGER,
    referrer TEXT NOT NULL,
    notes TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS page_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    kind TEXT NOT NULL,
    page_url TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_page_records_kind ON page_records(kind);
CREATE INDEX IF NOT EXISTS idx_page_records_page ON page_records(page_url);
"#;

/// Writes all collections into one SQLite database file
pub struct SqliteSink {
    path: PathBuf,
}

impl SqliteSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> OutputResult<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(conn)
    }
}

impl RecordSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn write(&self, records: &AuditRecords, summary: &CrawlSummary) -> OutputResult<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO runs (seed_url, config_hash, started_at, finished_at, pages, errors, skipped_out_of_scope)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                summary.seed_url,
                summary.config_hash,
                summary.started_at.to_rfc3339(),
                summary.finished_at.to_rfc3339(),
                summary.pages as i64,
                summary.errors as i64,
                summary.skipped_out_of_scope as i64,
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        insert_inventory(&tx, run_id, records)?;

        for redirect in &records.redirects {
            tx.execute(
                "INSERT INTO redirects (run_id, from_url, to_url, http_status, via)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    run_id,
                    redirect.from,
                    redirect.to,
                    redirect.http_status,
                    redirect.via
                ],
            )?;
        }

        for error in &records.errors {
            tx.execute(
                "INSERT INTO errors (run_id, url, kind, status, referrer, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    run_id,
                    error.url,
                    error.kind.as_str(),
                    error.status,
                    error.referrer,
                    error.notes
                ],
            )?;
        }

        insert_payloads(&tx, run_id, "seo", &records.seo, |r| &r.url)?;
        insert_payloads(&tx, run_id, "structured_data", &records.structured_data, |r| &r.url)?;
        insert_payloads(&tx, run_id, "content", &records.content, |r| &r.url)?;
        insert_payloads(&tx, run_id, "media", &records.media, |r| &r.page_url)?;
        insert_payloads(&tx, run_id, "forms", &records.forms, |r| &r.page_url)?;
        insert_payloads(&tx, run_id, "integrations", &records.integrations, |r| &r.page_url)?;
        insert_payloads(&tx, run_id, "api_endpoints", &records.api_endpoints, |r| &r.page_url)?;
        insert_payloads(&tx, run_id, "hreflang_map", &records.hreflang_map, |r| &r.url)?;

        tx.commit()?;

        tracing::info!("Wrote run {} to {}", run_id, self.path.display());
        Ok(())
    }
}

fn insert_inventory(tx: &Transaction<'_>, run_id: i64, records: &AuditRecords) -> OutputResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO inventory (run_id, url, type, template, depth, status, redirected_from,
                                canonical, hreflang, paginated, discovered_from, duplicate_of)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;

    for entry in &records.inventory {
        stmt.execute(params![
            run_id,
            entry.url,
            entry.page_type.as_str(),
            entry.template,
            entry.depth,
            entry.status,
            entry.redirected_from,
            entry.canonical,
            serde_json::to_string(&entry.hreflang)?,
            entry.paginated,
            entry.discovered_from,
            entry.duplicate_of,
        ])?;
    }
    Ok(())
}

fn insert_payloads<T, F>(
    tx: &Transaction<'_>,
    run_id: i64,
    kind: &str,
    items: &[T],
    page_url: F,
) -> OutputResult<()>
where
    T: Serialize,
    F: Fn(&T) -> &String,
{
    let mut stmt = tx.prepare(
        "INSERT INTO page_records (run_id, kind, page_url, payload) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for item in items {
        stmt.execute(params![
            run_id,
            kind,
            page_url(item),
            serde_json::to_string(item)?
        ])?;
    }
    Ok(())
}
