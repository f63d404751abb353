//! Run-scoped shared state
//!
//! One `RunContext` exists per audit run. It owns the visited set, the
//! content fingerprints and the aggregation store, and is passed by
//! reference to every page task. Nothing here is global.

use crate::crawler::dedup::ContentDeduplicator;
use crate::crawler::frontier::{Admission, VisitedSet};
use crate::store::AggregationStore;
use crate::url::{ScopeDecision, UrlFilter, UrlNormalizer};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

pub struct RunContext {
    pub normalizer: UrlNormalizer,
    pub filter: UrlFilter,
    pub store: AggregationStore,
    visited: Mutex<VisitedSet>,
    fingerprints: Mutex<ContentDeduplicator>,
    out_of_scope: Mutex<HashSet<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RunContext {
    pub fn new(normalizer: UrlNormalizer, filter: UrlFilter, max_pages: usize) -> Self {
        Self {
            normalizer,
            filter,
            store: AggregationStore::new(),
            visited: Mutex::new(VisitedSet::new(max_pages)),
            fingerprints: Mutex::new(ContentDeduplicator::new()),
            out_of_scope: Mutex::new(HashSet::new()),
        }
    }

    /// Marks a URL as visited ahead of its fetch
    pub fn admit(&self, url: &Url) -> Admission {
        lock(&self.visited).admit(url)
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        lock(&self.visited).contains(url)
    }

    pub fn budget_exhausted(&self) -> bool {
        lock(&self.visited).is_exhausted()
    }

    pub fn visited_count(&self) -> usize {
        lock(&self.visited).len()
    }

    /// See [`ContentDeduplicator::check_duplicate`]
    pub fn check_duplicate(&self, body: &[u8], url: &Url) -> Option<String> {
        lock(&self.fingerprints).check_duplicate(body, url.as_str())
    }

    /// Logs and counts a URL rejected by the scope rules, once per URL
    pub fn skip_out_of_scope(&self, url: &Url, decision: &ScopeDecision, referrer: &str) {
        if !lock(&self.out_of_scope).insert(url.to_string()) {
            return;
        }
        tracing::info!(
            "SkippedOutOfScope: {} ({}), linked from {}",
            url,
            decision,
            referrer
        );
        self.store.record_skipped();
    }
}
