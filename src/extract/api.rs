use super::{resolve, selector, ExtractResult, Extractor, PageInput};
use crate::store::{ApiEndpointEntry, PageRecord};
use regex::Regex;
use scraper::Selector;

/// Heuristic discovery of endpoints mentioned in inline scripts
///
/// Picks up absolute URLs that look like APIs or JSON documents, plus the
/// targets of `fetch(...)` and `axios.<method>(...)` calls. Relative targets
/// are resolved against the page. Each (method, url) pair is reported once
/// per page.
pub struct ApiEndpointsExtractor {
    inline_scripts: Selector,
    absolute_api: Regex,
    absolute_json: Regex,
    fetch_call: Regex,
    axios_call: Regex,
}

impl ApiEndpointsExtractor {
    pub fn new() -> ExtractResult<Self> {
        Ok(Self {
            inline_scripts: selector("script:not([src])")?,
            absolute_api: Regex::new(r#"https?://[^'"\s]*api[^'"\s]*"#)?,
            absolute_json: Regex::new(r#"https?://[^'"\s]*\.json"#)?,
            fetch_call: Regex::new(r#"fetch\(\s*['"]([^'"]+)['"]"#)?,
            axios_call: Regex::new(r#"axios\.(get|post|put|patch|delete)\(\s*['"]([^'"]+)['"]"#)?,
        })
    }

    fn scan(&self, script: &str, found: &mut Vec<(String, String)>) {
        let mut push = |method: &str, url: String| {
            if !found.iter().any(|(m, u)| m == method && *u == url) {
                found.push((method.to_string(), url));
            }
        };

        for m in self.absolute_api.find_iter(script) {
            push("GET", m.as_str().to_string());
        }
        for m in self.absolute_json.find_iter(script) {
            push("GET", m.as_str().to_string());
        }
        for caps in self.fetch_call.captures_iter(script) {
            push("GET", caps[1].to_string());
        }
        for caps in self.axios_call.captures_iter(script) {
            push(&caps[1].to_uppercase(), caps[2].to_string());
        }
    }
}

impl Extractor for ApiEndpointsExtractor {
    fn name(&self) -> &'static str {
        "api_endpoints"
    }

    fn extract(&self, page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
        let mut found = Vec::new();
        for script in page.document.select(&self.inline_scripts) {
            let body = script.text().collect::<String>();
            self.scan(&body, &mut found);
        }

        let page_url = page.url.to_string();
        let mut records: Vec<PageRecord> = Vec::new();
        for (method, target) in found {
            let url = resolve(page.url, &target);
            let entry = ApiEndpointEntry {
                page_url: page_url.clone(),
                method,
                url,
            };
            // relative and absolute spellings can resolve to the same target
            if !records
                .iter()
                .any(|r| matches!(r, PageRecord::ApiEndpoint(e) if *e == entry))
            {
                records.push(PageRecord::ApiEndpoint(entry));
            }
        }
        Ok(records)
    }
}
