use super::{selector, ExtractResult, Extractor, PageInput};
use crate::store::{PageRecord, StructuredDataEntry};
use scraper::{Html, Selector};

/// Collects embedded JSON-LD blocks
pub struct StructuredDataExtractor {
    scripts: Selector,
}

impl StructuredDataExtractor {
    pub fn new() -> ExtractResult<Self> {
        Ok(Self {
            scripts: json_ld_selector()?,
        })
    }
}

impl Extractor for StructuredDataExtractor {
    fn name(&self) -> &'static str {
        "structured_data"
    }

    fn extract(&self, page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
        Ok(json_ld_blocks(page.document, &self.scripts)
            .into_iter()
            .map(|schema| {
                PageRecord::StructuredData(StructuredDataEntry {
                    url: page.url.to_string(),
                    schema,
                })
            })
            .collect())
    }
}

pub(super) fn json_ld_selector() -> ExtractResult<Selector> {
    selector(r#"script[type="application/ld+json"]"#)
}

/// Parses every JSON-LD script; blocks that are not valid JSON are skipped
pub(super) fn json_ld_blocks(document: &Html, scripts: &Selector) -> Vec<serde_json::Value> {
    document
        .select(scripts)
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            match serde_json::from_str(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Skipping invalid JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect()
}
