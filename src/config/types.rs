use serde::{Deserialize, Serialize};

/// Main configuration structure for Site-Auditor
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub params: ParamsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Traversal and fetch behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// The URL the traversal starts from (depth 0)
    pub seed_url: String,

    /// Depth ceiling, inclusive
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Page budget: maximum number of URLs admitted to the visited set
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum pagination links followed per page
    #[serde(default = "default_max_pagination_links")]
    pub max_pagination_links: usize,

    /// Maximum number of HTTP requests in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Delay observed inside each fetch slot before the request (milliseconds)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Per-request deadline (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of frontier URLs dispatched together
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// User agent identification
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    pub crawler_name: String,
    pub crawler_version: String,
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteAuditor".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/site-auditor".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Path-based scope rules
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScopeConfig {
    /// Every in-scope path must start with this prefix
    #[serde(default = "default_language_prefix")]
    pub language_prefix: String,

    /// Only follow URLs on the seed host
    #[serde(default = "default_true")]
    pub same_host_only: bool,

    /// Regexes matched against the path; any match accepts
    #[serde(default = "default_allow_rules")]
    pub allow: Vec<String>,

    /// Regexes matched against the full URL and the path; any match rejects
    #[serde(default = "default_deny_rules")]
    pub deny: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            language_prefix: default_language_prefix(),
            same_host_only: true,
            allow: default_allow_rules(),
            deny: default_deny_rules(),
        }
    }
}

/// Query parameter handling during normalization
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParamsConfig {
    /// Parameter name patterns to drop; a trailing `*` matches any suffix
    #[serde(default = "default_tracking_params")]
    pub tracking: Vec<String>,

    /// Parameter names that are always kept
    #[serde(default = "default_stable_params")]
    pub stable: Vec<String>,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            tracking: default_tracking_params(),
            stable: default_stable_params(),
        }
    }
}

/// Output format for the final record flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jsonl,
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving the record files
    #[serde(default = "default_output_directory")]
    pub directory: String,

    #[serde(default = "default_output_format")]
    pub format: OutputFormat,

    /// Markdown summary file name, relative to `directory`
    #[serde(default = "default_summary_file")]
    pub summary_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            format: default_output_format(),
            summary_file: default_summary_file(),
        }
    }
}

fn default_max_depth() -> u32 {
    5
}

fn default_max_pages() -> usize {
    1200
}

fn default_max_pagination_links() -> usize {
    10
}

fn default_concurrency() -> usize {
    3
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    45
}

fn default_batch_size() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_language_prefix() -> String {
    "/en/".to_string()
}

pub(crate) fn default_allow_rules() -> Vec<String> {
    [
        r"^/en/?$",
        r"^/en/about",
        r"^/en/academics",
        r"^/en/admissions",
        r"^/en/research",
        r"^/en/news",
        r"^/en/events",
        r"^/en/faculties",
        r"^/en/schools",
        r"^/en/departments",
        r"^/en/contacts",
        r"^/en/career",
        r"^/en/centers",
        r"^/en/library",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub(crate) fn default_deny_rules() -> Vec<String> {
    [
        r"^/(ru|kk)(/|$)",
        // lang=<anything but en>
        r"[?&]lang=(?:[^e&]|e[^n&]|e(?:&|$)|en[^&])",
        r"/login",
        r"/admin",
        r"/user",
        r"/basket",
        r"/cart",
        r"^/en/search",
        r"[?&]s=",
        r"[?&]search=",
        r"(?i)\.(pdf|docx?|xlsx?|pptx?|zip|rar|7z|mp4|avi|webm|mov)$",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_tracking_params() -> Vec<String> {
    ["utm_*", "fbclid", "gclid", "mc_cid", "mc_eid"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_stable_params() -> Vec<String> {
    ["page", "q", "category", "tag", "date"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_output_directory() -> String {
    "./site_audit".to_string()
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Jsonl
}

fn default_summary_file() -> String {
    "audit_summary.md".to_string()
}
