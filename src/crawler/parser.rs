//! HTML link discovery
//!
//! This module handles parsing a fetched page for:
//! - Links to follow (from `<a href>` tags)
//! - Pagination links, kept apart so they can be capped per page
//! - The canonical URL and hreflang alternates for the inventory

use crate::extract::{selector, ExtractResult};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Link information extracted from one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// Non-pagination links, absolute, in document order
    pub links: Vec<String>,

    /// Pagination links, absolute, already capped
    pub pagination_links: Vec<String>,

    /// `<link rel="canonical">` target, absolute
    pub canonical: Option<String>,

    /// `hreflang` codes of `<link rel="alternate">` tags
    pub hreflang: Vec<String>,
}

/// Reusable link parser with compiled selectors
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that does not resolve to http(s)
pub struct LinkParser {
    anchors: Selector,
    canonical: Selector,
    alternates: Selector,
    pagination: Regex,
    max_pagination_links: usize,
}

impl LinkParser {
    pub fn new(max_pagination_links: usize) -> ExtractResult<Self> {
        Ok(Self {
            anchors: selector("a[href]")?,
            canonical: selector(r#"link[rel="canonical"][href]"#)?,
            alternates: selector(r#"link[rel="alternate"][hreflang]"#)?,
            pagination: Regex::new(r"(\?|&)page=\d+|/page/\d+")?,
            max_pagination_links,
        })
    }

    /// Parses an already parsed document fetched from `base_url`
    pub fn parse(&self, document: &Html, base_url: &Url) -> ParsedPage {
        let mut parsed = ParsedPage::default();

        for element in document.select(&self.anchors) {
            let Some(absolute) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            else {
                continue;
            };

            if self.pagination.is_match(&absolute) {
                if parsed.pagination_links.len() < self.max_pagination_links {
                    parsed.pagination_links.push(absolute);
                }
            } else {
                parsed.links.push(absolute);
            }
        }

        parsed.canonical = document
            .select(&self.canonical)
            .find_map(|el| el.value().attr("href"))
            .and_then(|href| resolve_link(href, base_url));

        parsed.hreflang = document
            .select(&self.alternates)
            .filter_map(|el| el.value().attr("hreflang"))
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect();

        parsed
    }

    /// Returns true if the URL itself is a page of a paginated listing
    pub fn is_paginated(&self, url: &Url) -> bool {
        self.pagination.is_match(url.as_str())
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
