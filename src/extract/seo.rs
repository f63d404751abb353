use super::structured::{json_ld_blocks, json_ld_selector};
use super::{element_text, selector, ExtractResult, Extractor, PageInput};
use crate::store::{PageRecord, SeoEntry};
use scraper::{Html, Selector};
use serde_json::Value;

/// Title, meta description, robots directive, social preview tags and
/// the list of JSON-LD schema types
pub struct SeoExtractor {
    title: Selector,
    description: Selector,
    robots: Selector,
    og_title: Selector,
    og_description: Selector,
    og_image: Selector,
    twitter_card: Selector,
    json_ld: Selector,
}

impl SeoExtractor {
    pub fn new() -> ExtractResult<Self> {
        Ok(Self {
            title: selector("title")?,
            description: selector(r#"meta[name="description"]"#)?,
            robots: selector(r#"meta[name="robots"]"#)?,
            og_title: selector(r#"meta[property="og:title"]"#)?,
            og_description: selector(r#"meta[property="og:description"]"#)?,
            og_image: selector(r#"meta[property="og:image"]"#)?,
            twitter_card: selector(r#"meta[name="twitter:card"]"#)?,
            json_ld: json_ld_selector()?,
        })
    }
}

impl Extractor for SeoExtractor {
    fn name(&self) -> &'static str {
        "seo"
    }

    fn extract(&self, page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
        let doc = page.document;

        let title = doc
            .select(&self.title)
            .next()
            .map(|t| element_text(&t))
            .unwrap_or_default();

        let jsonld_types = json_ld_blocks(doc, &self.json_ld)
            .iter()
            .flat_map(schema_types)
            .collect();

        Ok(vec![PageRecord::Seo(SeoEntry {
            url: page.url.to_string(),
            title,
            meta_description: meta_content(doc, &self.description),
            robots_meta: meta_content(doc, &self.robots),
            og_title: meta_content(doc, &self.og_title),
            og_description: meta_content(doc, &self.og_description),
            og_image: meta_content(doc, &self.og_image),
            twitter_card: meta_content(doc, &self.twitter_card),
            jsonld_types,
        })])
    }
}

/// `content` attribute of the first matching meta tag
fn meta_content(doc: &Html, sel: &Selector) -> String {
    doc.select(sel)
        .find_map(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

/// `@type` values of a JSON-LD block: top-level object, array items, or `@graph` items
fn schema_types(block: &Value) -> Vec<String> {
    match block {
        Value::Array(items) => items.iter().flat_map(schema_types).collect(),
        Value::Object(map) => {
            let mut types = match map.get("@type") {
                Some(Value::String(t)) => vec![t.clone()],
                Some(Value::Array(ts)) => ts
                    .iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            if let Some(Value::Array(graph)) = map.get("@graph") {
                types.extend(graph.iter().flat_map(schema_types));
            }
            types
        }
        _ => Vec::new(),
    }
}
