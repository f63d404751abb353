use super::{ExtractResult, Extractor, PageInput};
use crate::store::{IntegrationEntry, PageRecord};
use regex::Regex;

const DETECTED: &str = "detected";

/// Fixed-signature detection of third-party analytics, marketing and chat
/// snippets, run over the raw page source
pub struct IntegrationsExtractor {
    ga4: Regex,
    gtm: Regex,
    pixel_init: Regex,
    pixel_track: Regex,
    hotjar_id: Regex,
}

impl IntegrationsExtractor {
    pub fn new() -> ExtractResult<Self> {
        Ok(Self {
            ga4: Regex::new(r#"gtag\([^)]*['"](G-[A-Z0-9]+)['"]"#)?,
            gtm: Regex::new(r"GTM-[A-Z0-9]+")?,
            pixel_init: Regex::new(r#"fbq\(\s*['"]init['"]\s*,\s*['"](\d+)['"]"#)?,
            pixel_track: Regex::new(r#"fbq\(\s*['"]track"#)?,
            hotjar_id: Regex::new(r"hjid\s*:\s*(\d+)")?,
        })
    }
}

impl Extractor for IntegrationsExtractor {
    fn name(&self) -> &'static str {
        "integrations"
    }

    fn extract(&self, page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
        let html = page.html;
        let lower = html.to_lowercase();
        let mut found = Found::new(page.url.as_str());

        for caps in self.ga4.captures_iter(html) {
            found.push("GA4", &caps[1], "https://www.googletagmanager.com/gtag/js");
        }

        for m in self.gtm.find_iter(html) {
            found.push("GTM", m.as_str(), "https://www.googletagmanager.com");
        }

        if let Some(caps) = self.pixel_init.captures(html) {
            found.push("Meta Pixel", &caps[1], "https://connect.facebook.net");
        } else if self.pixel_track.is_match(html) {
            found.push("Meta Pixel", DETECTED, "https://connect.facebook.net");
        }

        if let Some(caps) = self.hotjar_id.captures(html) {
            found.push("Hotjar", &caps[1], "https://static.hotjar.com");
        } else if lower.contains("static.hotjar.com") {
            found.push("Hotjar", DETECTED, "https://static.hotjar.com");
        }

        if lower.contains("intercom") {
            found.push("Intercom", DETECTED, "https://widget.intercom.io");
        }

        if html.contains("maps.googleapis.com") {
            found.push("Google Maps", DETECTED, "https://maps.googleapis.com");
        }

        if lower.contains("recaptcha") {
            found.push("reCAPTCHA", DETECTED, "https://www.google.com/recaptcha");
        }

        Ok(found
            .entries
            .into_iter()
            .map(PageRecord::Integration)
            .collect())
    }
}

/// Integration entries for one page, unique per (tool, id)
struct Found<'a> {
    page_url: &'a str,
    entries: Vec<IntegrationEntry>,
}

impl<'a> Found<'a> {
    fn new(page_url: &'a str) -> Self {
        Self {
            page_url,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, tool: &str, id: &str, loaded_from: &str) {
        if self.entries.iter().any(|e| e.tool == tool && e.id == id) {
            return;
        }
        self.entries.push(IntegrationEntry {
            page_url: self.page_url.to_string(),
            tool: tool.to_string(),
            id: id.to_string(),
            loaded_from: loaded_from.to_string(),
        });
    }
}
