use crate::config::ScopeConfig;
use crate::ConfigError;
use regex::Regex;
use std::fmt;
use url::Url;

/// Outcome of evaluating a URL against the scope rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    /// Accepted by an allow rule and no deny rule
    InScope,
    /// Host differs from the seed host
    ForeignHost,
    /// Path does not start with the language prefix
    WrongLanguage,
    /// Matched the deny rule with this pattern
    Denied(String),
    /// No allow rule matched
    NotAllowed,
}

impl ScopeDecision {
    pub fn is_in_scope(&self) -> bool {
        matches!(self, Self::InScope)
    }
}

impl fmt::Display for ScopeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InScope => write!(f, "in_scope"),
            Self::ForeignHost => write!(f, "foreign_host"),
            Self::WrongLanguage => write!(f, "wrong_language"),
            Self::Denied(pattern) => write!(f, "denied by {}", pattern),
            Self::NotAllowed => write!(f, "no allow rule matched"),
        }
    }
}

/// Classifies normalized URLs as in-scope or out-of-scope
///
/// Rules are evaluated in this order:
/// 1. Host (only when restricted to the seed host)
/// 2. Language prefix on the path
/// 3. Deny rules against the full URL and the path (any match rejects)
/// 4. Allow rules against the path (any match accepts; no match rejects)
///
/// Deny always wins over allow.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    language_prefix: String,
    allowed_host: Option<String>,
    allow: Vec<Regex>,
    deny: Vec<Regex>,
}

impl UrlFilter {
    /// Compiles the scope rules; `seed` pins the host when `same_host_only` is set
    pub fn new(scope: &ScopeConfig, seed: &Url) -> Result<Self, ConfigError> {
        Ok(Self {
            language_prefix: scope.language_prefix.clone(),
            allowed_host: if scope.same_host_only {
                seed.host_str().map(|h| h.to_lowercase())
            } else {
                None
            },
            allow: compile_rules(&scope.allow)?,
            deny: compile_rules(&scope.deny)?,
        })
    }

    /// Evaluates the full rule chain and reports why a URL was rejected
    pub fn classify(&self, url: &Url) -> ScopeDecision {
        if let Some(allowed) = &self.allowed_host {
            let host = url.host_str().map(|h| h.to_lowercase());
            if host.as_deref() != Some(allowed.as_str()) {
                return ScopeDecision::ForeignHost;
            }
        }

        let path = url.path();
        if !path.starts_with(&self.language_prefix) {
            return ScopeDecision::WrongLanguage;
        }

        let full = url.as_str();
        if let Some(rule) = self
            .deny
            .iter()
            .find(|rule| rule.is_match(full) || rule.is_match(path))
        {
            return ScopeDecision::Denied(rule.as_str().to_string());
        }

        if self.allow.iter().any(|rule| rule.is_match(path)) {
            ScopeDecision::InScope
        } else {
            ScopeDecision::NotAllowed
        }
    }

    /// Returns true if the URL should be crawled
    pub fn is_in_scope(&self, url: &Url) -> bool {
        self.classify(url).is_in_scope()
    }
}

fn compile_rules(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", p, e)))
        })
        .collect()
}
