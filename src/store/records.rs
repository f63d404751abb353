//! Typed audit record definitions
//!
//! One record kind per audit concern. Every record is keyed by the
//! normalized URL of the page that produced it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A record missing a field every consumer relies on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{record} record has an empty `{field}`")]
    EmptyField {
        record: &'static str,
        field: &'static str,
    },

    #[error("{record} record has out-of-range status {status}")]
    InvalidStatus { record: &'static str, status: u16 },
}

fn require(record: &'static str, field: &'static str, value: &str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::EmptyField { record, field });
    }
    Ok(())
}

fn require_status(
    record: &'static str,
    status: u16,
    range: std::ops::RangeInclusive<u16>,
) -> Result<(), RecordError> {
    if !range.contains(&status) {
        return Err(RecordError::InvalidStatus { record, status });
    }
    Ok(())
}

/// Page classification used in the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Home,
    Listing,
    Event,
    Faculty,
    Department,
    Contact,
    Page,
    Article,
    Duplicate,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Listing => "listing",
            Self::Event => "event",
            Self::Faculty => "faculty",
            Self::Department => "department",
            Self::Contact => "contact",
            Self::Page => "page",
            Self::Article => "article",
            Self::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry per fetched page (or duplicate of one)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub url: String,
    #[serde(rename = "type")]
    pub page_type: PageType,
    /// Reserved for template fingerprinting
    pub template: String,
    pub depth: u32,
    pub status: u16,
    pub redirected_from: Option<String>,
    pub canonical: Option<String>,
    pub hreflang: Vec<String>,
    pub paginated: bool,
    pub discovered_from: String,
    pub duplicate_of: Option<String>,
}

impl InventoryEntry {
    /// Checked constructor for a fetched, non-duplicate page
    ///
    /// Optional fields start empty and can be filled with struct update
    /// syntax.
    pub fn new(
        url: impl Into<String>,
        page_type: PageType,
        depth: u32,
        status: u16,
        discovered_from: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let entry = Self {
            url: url.into(),
            page_type,
            template: String::new(),
            depth,
            status,
            redirected_from: None,
            canonical: None,
            hreflang: Vec::new(),
            paginated: false,
            discovered_from: discovered_from.into(),
            duplicate_of: None,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Non-empty `url`, an HTTP status, and an original for duplicates
    pub fn validate(&self) -> Result<(), RecordError> {
        require("inventory", "url", &self.url)?;
        require_status("inventory", self.status, 100..=599)?;
        if self.is_duplicate() {
            require(
                "inventory",
                "duplicate_of",
                self.duplicate_of.as_deref().unwrap_or(""),
            )?;
        }
        Ok(())
    }

    /// Entry for a page whose body matched an earlier page
    pub fn duplicate(
        url: impl Into<String>,
        depth: u32,
        status: u16,
        discovered_from: impl Into<String>,
        duplicate_of: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            page_type: PageType::Duplicate,
            template: String::new(),
            depth,
            status,
            redirected_from: None,
            canonical: None,
            hreflang: Vec::new(),
            paginated: false,
            discovered_from: discovered_from.into(),
            duplicate_of: Some(duplicate_of.into()),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.page_type == PageType::Duplicate
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeoEntry {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub robots_meta: String,
    #[serde(rename = "og:title")]
    pub og_title: String,
    #[serde(rename = "og:description")]
    pub og_description: String,
    #[serde(rename = "og:image")]
    pub og_image: String,
    #[serde(rename = "twitter:card")]
    pub twitter_card: String,
    pub jsonld_types: Vec<String>,
}

/// An embedded JSON-LD block, kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDataEntry {
    pub url: String,
    pub schema: serde_json::Value,
}

/// A piece of page body content, in document order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyBlock {
    Paragraph { text: String },
    Heading { level: u8, text: String },
    Image { src: String, alt: String },
    List { ordered: bool, items: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentEntry {
    pub url: String,
    pub h1: String,
    pub breadcrumbs: Vec<String>,
    pub date_published: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub summary: String,
    pub body_blocks: Vec<BodyBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub url: String,
    pub page_url: String,
    pub alt: String,
    pub width: String,
    pub height: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub loading_attr: String,
    pub srcset_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minlength: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AntiSpam {
    pub recaptcha: bool,
    pub honeypot_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormValidation {
    pub client: Vec<String>,
    pub server: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormEntry {
    pub page_url: String,
    pub form_name: String,
    /// `METHOD absolute-action`, or just the method when there is no action
    pub action: String,
    pub method: String,
    pub has_recaptcha: bool,
    pub fields_count: usize,
    pub fields: Vec<FormField>,
    pub antispam: AntiSpam,
    pub validation: FormValidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationEntry {
    pub page_url: String,
    pub tool: String,
    pub id: String,
    pub loaded_from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEndpointEntry {
    pub page_url: String,
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectEntry {
    pub from: String,
    pub to: String,
    pub http_status: u16,
    pub via: String,
}

impl RedirectEntry {
    pub fn validate(&self) -> Result<(), RecordError> {
        require("redirect", "from", &self.from)?;
        require("redirect", "to", &self.to)?;
        require_status("redirect", self.http_status, 300..=399)
    }
}

/// Failure classes recorded in the error log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// HTTP status >= 400
    HttpStatus,
    Timeout,
    /// DNS, connection or body read failure
    Transport,
    /// Still redirecting when the depth ceiling was reached
    RedirectLimit,
    /// A page task failed inside the crawler itself
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpStatus => "http_status",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::RedirectLimit => "redirect_limit",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub url: String,
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub referrer: String,
    pub notes: String,
}

impl ErrorEntry {
    pub fn validate(&self) -> Result<(), RecordError> {
        require("error", "url", &self.url)
    }
}

/// Reserved: hreflang alternates per page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HreflangEntry {
    pub url: String,
    pub hreflang: String,
    pub href: String,
}

/// A record produced by a page extractor
#[derive(Debug, Clone, PartialEq)]
pub enum PageRecord {
    StructuredData(StructuredDataEntry),
    Seo(SeoEntry),
    Content(ContentEntry),
    Media(MediaEntry),
    Form(FormEntry),
    Integration(IntegrationEntry),
    ApiEndpoint(ApiEndpointEntry),
}

impl PageRecord {
    /// Short collection name, also used as the SQLite `kind` column
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StructuredData(_) => "structured_data",
            Self::Seo(_) => "seo",
            Self::Content(_) => "content",
            Self::Media(_) => "media",
            Self::Form(_) => "forms",
            Self::Integration(_) => "integrations",
            Self::ApiEndpoint(_) => "api_endpoints",
        }
    }

    /// Every record must name the page it came from
    pub fn validate(&self) -> Result<(), RecordError> {
        let kind = self.kind();
        match self {
            Self::StructuredData(r) => require(kind, "url", &r.url),
            Self::Seo(r) => require(kind, "url", &r.url),
            Self::Content(r) => require(kind, "url", &r.url),
            Self::Media(r) => {
                require(kind, "page_url", &r.page_url)?;
                require(kind, "url", &r.url)
            }
            Self::Form(r) => require(kind, "page_url", &r.page_url),
            Self::Integration(r) => {
                require(kind, "page_url", &r.page_url)?;
                require(kind, "tool", &r.tool)
            }
            Self::ApiEndpoint(r) => {
                require(kind, "page_url", &r.page_url)?;
                require(kind, "url", &r.url)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_type_strings() {
        assert_eq!(PageType::Home.as_str(), "home");
        assert_eq!(PageType::Duplicate.to_string(), "duplicate");
        assert_eq!(
            serde_json::to_string(&PageType::Listing).unwrap(),
            "\"listing\""
        );
    }

    #[test]
    fn test_duplicate_inventory_entry() {
        let entry = InventoryEntry::duplicate(
            "https://example.edu/en/news/",
            2,
            200,
            "https://example.edu/en/",
            "https://example.edu/en/news",
        );
        assert!(entry.is_duplicate());
        assert_eq!(
            entry.duplicate_of.as_deref(),
            Some("https://example.edu/en/news")
        );
    }

    #[test]
    fn test_checked_inventory_constructor() {
        let entry = InventoryEntry::new(
            "https://example.edu/en/about",
            PageType::Page,
            1,
            200,
            "https://example.edu/en/",
        )
        .unwrap();
        assert!(!entry.is_duplicate());
        assert!(entry.canonical.is_none());

        assert_eq!(
            InventoryEntry::new("", PageType::Page, 1, 200, "").unwrap_err(),
            RecordError::EmptyField {
                record: "inventory",
                field: "url"
            }
        );
        assert_eq!(
            InventoryEntry::new("https://example.edu/en/", PageType::Home, 0, 0, "").unwrap_err(),
            RecordError::InvalidStatus {
                record: "inventory",
                status: 0
            }
        );
    }

    #[test]
    fn test_duplicate_needs_original() {
        let mut entry = InventoryEntry::duplicate("https://example.edu/en/b", 1, 200, "", "https://example.edu/en/a");
        assert!(entry.validate().is_ok());
        entry.duplicate_of = None;
        assert!(entry.validate().is_err());
    }

    #[test]
    fn test_redirect_and_error_validation() {
        let redirect = RedirectEntry {
            from: "https://example.edu/en/old".to_string(),
            to: "https://example.edu/en/new".to_string(),
            http_status: 301,
            via: "header".to_string(),
        };
        assert!(redirect.validate().is_ok());
        assert!(RedirectEntry { http_status: 200, ..redirect.clone() }.validate().is_err());
        assert!(RedirectEntry { to: " ".to_string(), ..redirect }.validate().is_err());

        let error = ErrorEntry {
            url: String::new(),
            kind: ErrorKind::Timeout,
            status: None,
            referrer: String::new(),
            notes: String::new(),
        };
        assert!(error.validate().is_err());
    }

    #[test]
    fn test_page_record_requires_page_url() {
        let seo = PageRecord::Seo(SeoEntry::default());
        assert_eq!(
            seo.validate().unwrap_err().to_string(),
            "seo record has an empty `url`"
        );
        let api = PageRecord::ApiEndpoint(ApiEndpointEntry {
            page_url: "https://example.edu/en/".to_string(),
            method: "GET".to_string(),
            url: "https://example.edu/api/v1/news".to_string(),
        });
        assert!(api.validate().is_ok());
    }

    #[test]
    fn test_inventory_serializes_type_field() {
        let entry = InventoryEntry::duplicate("a", 0, 200, "", "b");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "duplicate");
        assert_eq!(json["duplicate_of"], "b");
    }

    #[test]
    fn test_body_block_tagging() {
        let block = BodyBlock::Heading {
            level: 2,
            text: "Programs".to_string(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 2);
    }

    #[test]
    fn test_seo_uses_social_field_names() {
        let entry = SeoEntry {
            og_title: "T".to_string(),
            ..SeoEntry::default()
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["og:title"], "T");
        assert!(json.get("twitter:card").is_some());
    }

    #[test]
    fn test_error_kind_strings() {
        assert_eq!(ErrorKind::RedirectLimit.to_string(), "redirect_limit");
        assert_eq!(
            serde_json::to_string(&ErrorKind::HttpStatus).unwrap(),
            "\"http_status\""
        );
    }
}
