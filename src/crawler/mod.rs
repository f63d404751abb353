//! Crawler module for bounded single-site traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and response classification
//! - Concurrency limiting, politeness delay and redirect following
//! - Link discovery and content deduplication
//! - Level-by-level traversal coordination

mod context;
mod coordinator;
mod dedup;
mod fetcher;
mod frontier;
mod parser;
mod scheduler;

pub use context::RunContext;
pub use coordinator::{run_audit, Crawler};
pub use dedup::{fingerprint, ContentDeduplicator};
pub use fetcher::{build_http_client, fetch_once, FetchOutcome};
pub use frontier::{Admission, Frontier, FrontierEntry, VisitedSet};
pub use parser::{LinkParser, ParsedPage};
pub use scheduler::{FetchScheduler, FetchedPage};
