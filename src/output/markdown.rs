//! Markdown run summary
//!
//! A human-readable report written next to the record files, with the
//! headline counts, the per-depth page counts and the error breakdown.

use crate::output::stats::CrawlSummary;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary to `output_path`
pub fn write_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Site Audit Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed_url));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    let duration = summary.duration_seconds();
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    md.push_str("## Record Counts\n\n");
    md.push_str("| Record | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages | {} |\n", summary.pages));
    md.push_str(&format!("| Articles | {} |\n", summary.articles));
    md.push_str(&format!("| Listings | {} |\n", summary.listings));
    md.push_str(&format!("| Static pages | {} |\n", summary.static_pages));
    md.push_str(&format!("| Duplicates | {} |\n", summary.duplicates));
    md.push_str(&format!("| Forms | {} |\n", summary.forms));
    md.push_str(&format!("| Media | {} |\n", summary.media));
    md.push_str(&format!("| Redirects | {} |\n", summary.redirects));
    md.push_str(&format!("| Errors | {} |\n", summary.errors));
    md.push_str(&format!("| API endpoints | {} |\n", summary.api_endpoints));
    md.push_str(&format!(
        "| Skipped out of scope | {} |\n\n",
        summary.skipped_out_of_scope
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    if !summary.depth_breakdown.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &summary.depth_breakdown {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    if !summary.error_breakdown.is_empty() {
        md.push_str("## Errors by Kind\n\n");
        md.push_str("| Kind | Count |\n");
        md.push_str("|------|-------|\n");
        for (kind, count) in &summary.error_breakdown {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str(&format!("`{}`\n", summary));

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AuditRecords, ErrorEntry, ErrorKind, InventoryEntry, PageType};
    use chrono::{TimeZone, Utc};

    fn create_test_summary() -> CrawlSummary {
        let mut records = AuditRecords::default();
        records.inventory.push(InventoryEntry {
            page_type: PageType::Home,
            ..InventoryEntry::duplicate("https://example.edu/en/", 0, 200, "", "")
        });
        records.inventory.push(InventoryEntry {
            page_type: PageType::Page,
            ..InventoryEntry::duplicate("https://example.edu/en/about", 1, 200, "", "")
        });
        records.errors.push(ErrorEntry {
            url: "https://example.edu/en/slow".to_string(),
            kind: ErrorKind::Timeout,
            status: None,
            referrer: "https://example.edu/en/".to_string(),
            notes: "Request timed out".to_string(),
        });

        let started = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let finished = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 30).unwrap();
        CrawlSummary::from_records(&records, "https://example.edu/en/", "abc123", started, finished)
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("# Site Audit Summary"));
        assert!(markdown.contains("- **Config Hash**: abc123"));
        assert!(markdown.contains("- **Duration**: 90 seconds (1.50 minutes)"));
        assert!(markdown.contains("| Static pages | 1 |"));
    }

    #[test]
    fn test_markdown_breakdowns() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("## Depth Breakdown"));
        assert!(markdown.contains("| 0 | 1 |"));
        assert!(markdown.contains("| 1 | 1 |"));
        assert!(markdown.contains("| timeout | 1 |"));
        assert!(markdown.contains("`DONE pages=2 "));
    }

    #[test]
    fn test_write_markdown_summary() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("audit_summary.md");
        write_markdown_summary(&create_test_summary(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Site Audit Summary"));
    }
}
