//! Page extraction for audit records
//!
//! Each audit concern is handled by an independent [`Extractor`]. The
//! [`Dispatcher`] parses the page once, runs every extractor against it and
//! collects whatever they produce. An extractor that errors or panics is
//! logged and skipped; the other extractors still run for that page.

mod api;
mod content;
mod forms;
mod integrations;
mod media;
mod page_type;
mod seo;
mod structured;

pub use api::ApiEndpointsExtractor;
pub use content::ContentExtractor;
pub use forms::FormsExtractor;
pub use integrations::IntegrationsExtractor;
pub use media::MediaExtractor;
pub use page_type::classify_page;
pub use seo::SeoExtractor;
pub use structured::StructuredDataExtractor;

use crate::store::{PageRecord, PageType};
use scraper::{ElementRef, Html, Selector};
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use url::Url;

/// Errors raised by individual extractors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Malformed content: {0}")]
    Malformed(String),
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Everything an extractor may look at for one page
pub struct PageInput<'a> {
    /// Normalized page URL
    pub url: &'a Url,
    /// Raw HTML as fetched
    pub html: &'a str,
    /// The HTML parsed once for all extractors
    pub document: &'a Html,
}

/// A pluggable, stateless producer of records for one audit concern
pub trait Extractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Produces zero or more records for the page
    fn extract(&self, page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>>;
}

/// An extractor that failed on a page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorFailure {
    pub extractor: &'static str,
    pub message: String,
}

/// Output of running every extractor over a page
#[derive(Debug, Clone)]
pub struct PageRecordBundle {
    pub page_type: PageType,
    pub records: Vec<PageRecord>,
    pub failures: Vec<ExtractorFailure>,
}

/// Runs the configured extractors over fetched pages
pub struct Dispatcher {
    extractors: Vec<Box<dyn Extractor>>,
    language_prefix: String,
}

impl Dispatcher {
    /// Creates a dispatcher with the standard extractor set
    pub fn standard(language_prefix: &str) -> ExtractResult<Self> {
        let extractors: Vec<Box<dyn Extractor>> = vec![
            Box::new(StructuredDataExtractor::new()?),
            Box::new(SeoExtractor::new()?),
            Box::new(ContentExtractor::new()?),
            Box::new(MediaExtractor::new()?),
            Box::new(FormsExtractor::new()?),
            Box::new(IntegrationsExtractor::new()?),
            Box::new(ApiEndpointsExtractor::new()?),
        ];
        Ok(Self::with_extractors(language_prefix, extractors))
    }

    /// Creates a dispatcher with a caller-supplied extractor set
    pub fn with_extractors(language_prefix: &str, extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self {
            extractors,
            language_prefix: language_prefix.to_string(),
        }
    }

    /// Names of the registered extractors, in run order
    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Parses `html` and runs every extractor over it
    pub fn extract(&self, url: &Url, html: &str) -> PageRecordBundle {
        let document = Html::parse_document(html);
        self.extract_document(url, html, &document)
    }

    /// Runs every extractor over an already parsed document
    pub fn extract_document(&self, url: &Url, html: &str, document: &Html) -> PageRecordBundle {
        let input = PageInput {
            url,
            html,
            document,
        };

        let mut records = Vec::new();
        let mut failures = Vec::new();

        for extractor in &self.extractors {
            let outcome = catch_unwind(AssertUnwindSafe(|| extractor.extract(&input)));
            let message = match outcome {
                Ok(Ok(mut produced)) => {
                    records.append(&mut produced);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };

            tracing::warn!(
                "Extractor {} failed for {}: {}",
                extractor.name(),
                url,
                message
            );
            failures.push(ExtractorFailure {
                extractor: extractor.name(),
                message,
            });
        }

        PageRecordBundle {
            page_type: classify_page(url, html, &self.language_prefix),
            records,
            failures,
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Parses a CSS selector, mapping the error into [`ExtractError`]
pub(crate) fn selector(css: &str) -> ExtractResult<Selector> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Element text with whitespace runs collapsed to single spaces
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Attribute value or an empty string
pub(crate) fn attr_or_empty(element: &ElementRef<'_>, name: &str) -> String {
    element.value().attr(name).unwrap_or("").trim().to_string()
}

/// Resolves `href` against the page URL, keeping it verbatim if that fails
pub(crate) fn resolve(page: &Url, href: &str) -> String {
    page.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SeoEntry;

    struct FailingExtractor;

    impl Extractor for FailingExtractor {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn extract(&self, _page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
            Err(ExtractError::Malformed("unbalanced form".to_string()))
        }
    }

    struct PanickingExtractor;

    impl Extractor for PanickingExtractor {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn extract(&self, _page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
            panic!("unexpected markup");
        }
    }

    struct TitleOnly;

    impl Extractor for TitleOnly {
        fn name(&self) -> &'static str {
            "title"
        }

        fn extract(&self, page: &PageInput<'_>) -> ExtractResult<Vec<PageRecord>> {
            Ok(vec![PageRecord::Seo(SeoEntry {
                url: page.url.to_string(),
                title: "t".to_string(),
                ..SeoEntry::default()
            })])
        }
    }

    fn url() -> Url {
        Url::parse("https://example.edu/en/about").unwrap()
    }

    #[test]
    fn test_standard_dispatcher_order() {
        let dispatcher = Dispatcher::standard("/en/").unwrap();
        assert_eq!(
            dispatcher.extractor_names(),
            vec![
                "structured_data",
                "seo",
                "content",
                "media",
                "forms",
                "integrations",
                "api_endpoints"
            ]
        );
    }

    #[test]
    fn test_failing_extractor_does_not_block_others() {
        let dispatcher = Dispatcher::with_extractors(
            "/en/",
            vec![
                Box::new(FailingExtractor),
                Box::new(PanickingExtractor),
                Box::new(TitleOnly),
            ],
        );

        let bundle = dispatcher.extract(&url(), "<html><title>x</title></html>");
        assert_eq!(bundle.records.len(), 1);
        assert_eq!(bundle.failures.len(), 2);
        assert_eq!(bundle.failures[0].extractor, "failing");
        assert!(bundle.failures[1].message.contains("unexpected markup"));
        assert_eq!(bundle.page_type, PageType::Page);
    }

    #[test]
    fn test_standard_extractors_on_malformed_html() {
        let dispatcher = Dispatcher::standard("/en/").unwrap();
        let html = r#"<html><head><title>About</title><script type="application/ld+json">{broken</script>
            <body><h1>About <b>us</h1><form action="/en/send"><input name="email" required><p>Text"#;

        let bundle = dispatcher.extract(&url(), html);
        assert!(bundle.failures.is_empty());
        assert!(bundle.records.iter().any(|r| matches!(r, PageRecord::Seo(_))));
        assert!(bundle.records.iter().any(|r| matches!(r, PageRecord::Content(_))));
        assert!(bundle.records.iter().any(|r| matches!(r, PageRecord::Form(_))));
        assert!(!bundle
            .records
            .iter()
            .any(|r| matches!(r, PageRecord::StructuredData(_))));
    }

    #[test]
    fn test_element_text_collapses_whitespace() {
        let doc = Html::parse_fragment("<p>  Hello \n  <b>big</b>   world </p>");
        let sel = selector("p").unwrap();
        let p = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(&p), "Hello big world");
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(
            selector("p[").unwrap_err(),
            ExtractError::Selector { .. }
        ));
    }
}
