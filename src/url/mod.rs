//! URL handling module for Site-Auditor
//!
//! This module provides URL canonicalization (tracking parameter removal,
//! deterministic query ordering) and path-based scope filtering.

mod filter;
mod matcher;
mod normalize;

// Re-export main types and functions
pub use filter::{ScopeDecision, UrlFilter};
pub use matcher::matches_wildcard;
pub use normalize::{normalize_url, UrlNormalizer};
