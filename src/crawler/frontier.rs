//! Visited set and per-level frontier

use std::collections::HashSet;
use url::Url;

/// Result of asking the visited set to admit a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First sighting; the URL now counts against the budget
    Admitted,
    AlreadyVisited,
    BudgetExhausted,
}

/// Every URL the crawl has committed to fetching
///
/// Admission happens before the fetch starts, so a URL is never fetched
/// twice even if it is discovered by several pages of the same batch.
/// Failed fetches keep their slot in the budget.
#[derive(Debug)]
pub struct VisitedSet {
    urls: HashSet<String>,
    budget: usize,
}

impl VisitedSet {
    pub fn new(budget: usize) -> Self {
        Self {
            urls: HashSet::new(),
            budget,
        }
    }

    pub fn admit(&mut self, url: &Url) -> Admission {
        if self.urls.contains(url.as_str()) {
            return Admission::AlreadyVisited;
        }
        if self.is_exhausted() {
            return Admission::BudgetExhausted;
        }
        self.urls.insert(url.to_string());
        Admission::Admitted
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.contains(url.as_str())
    }

    pub fn is_exhausted(&self) -> bool {
        self.urls.len() >= self.budget
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// A URL waiting to be fetched, with the page that linked to it
#[derive(Debug, Clone, PartialEq)]
pub struct FrontierEntry {
    pub url: Url,
    pub referrer: String,
}

/// Deduplicated, insertion-ordered URLs for one depth level
#[derive(Debug, Default)]
pub struct Frontier {
    entries: Vec<FrontierEntry>,
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL unless it is already queued; returns whether it was added
    pub fn push(&mut self, url: Url, referrer: impl Into<String>) -> bool {
        if !self.seen.insert(url.to_string()) {
            return false;
        }
        self.entries.push(FrontierEntry {
            url,
            referrer: referrer.into(),
        });
        true
    }

    /// Keeps only the entries for which `keep` returns true
    pub fn retain(&mut self, keep: impl FnMut(&FrontierEntry) -> bool) {
        self.entries.retain(keep);
    }

    /// Splits the frontier into consecutive batches of at most `size`
    pub fn into_batches(self, size: usize) -> Vec<Vec<FrontierEntry>> {
        let size = size.max(1);
        let mut batches = Vec::new();
        let mut entries = self.entries.into_iter().peekable();
        while entries.peek().is_some() {
            batches.push(entries.by_ref().take(size).collect());
        }
        batches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
