//! Fetch scheduler: concurrency gate, politeness delay and redirect following
//!
//! This module handles:
//! - A process-wide semaphore so at most `concurrency` requests are in flight
//! - The fixed inter-request delay, observed inside each fetch slot
//! - Following redirects as an explicit loop bounded by the depth ceiling
//! - Turning every failed fetch into an `ErrorEntry`

use crate::crawler::context::RunContext;
use crate::crawler::fetcher::{fetch_once, FetchOutcome};
use crate::crawler::frontier::Admission;
use crate::store::{ErrorEntry, ErrorKind, RedirectEntry};
use reqwest::Client;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// An HTML page ready for deduplication and extraction
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL, after any redirects
    pub url: Url,
    /// Depth the page is recorded at (redirect hops included)
    pub depth: u32,
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
    /// Page that linked to `url`; for redirect targets, the redirecting URL
    pub referrer: String,
    /// First URL of the redirect chain, when there was one
    pub redirected_from: Option<String>,
}

impl FetchedPage {
    /// Body decoded for parsing; invalid UTF-8 sequences become U+FFFD
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Scheduler that owns the HTTP client and the concurrency gate
pub struct FetchScheduler {
    client: Client,
    semaphore: Arc<Semaphore>,
    delay: Duration,
    max_depth: u32,
}

impl FetchScheduler {
    pub fn new(client: Client, concurrency: usize, delay: Duration, max_depth: u32) -> Self {
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            delay,
            max_depth,
        }
    }

    /// Number of fetch slots currently free
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// One rate-limited GET
    async fn fetch_slot(&self, url: &Url) -> FetchOutcome {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return FetchOutcome::TransportError {
                    detail: "fetch scheduler closed".to_string(),
                }
            }
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        tracing::debug!("GET {}", url);
        fetch_once(&self.client, url.as_str()).await
    }

    /// Fetches an admitted URL, following redirects
    ///
    /// Returns the final HTML page, or `None` when the fetch ended in a
    /// recorded error, a non-HTML response, or a redirect that could not be
    /// followed. Each redirect hop is recorded and counts as one extra depth
    /// level; a redirect is only followed while the current depth is below
    /// the ceiling.
    pub async fn fetch(
        &self,
        ctx: &RunContext,
        url: Url,
        depth: u32,
        referrer: String,
    ) -> Option<FetchedPage> {
        let mut current = url;
        let mut depth = depth;
        let mut referrer = referrer;
        let mut redirected_from: Option<String> = None;

        loop {
            match self.fetch_slot(&current).await {
                FetchOutcome::Success { status, body, .. } => {
                    return Some(FetchedPage {
                        url: current,
                        depth,
                        status,
                        body,
                        referrer,
                        redirected_from,
                    });
                }

                FetchOutcome::Redirect { status, location } => {
                    let target = match ctx.normalizer.normalize(&location, &current) {
                        Ok(target) => target,
                        Err(e) => {
                            ctx.store.record_error(ErrorEntry {
                                url: current.to_string(),
                                kind: ErrorKind::HttpStatus,
                                status: Some(status),
                                referrer,
                                notes: format!("Unusable redirect location '{}': {}", location, e),
                            });
                            return None;
                        }
                    };

                    ctx.store.record_redirect(RedirectEntry {
                        from: current.to_string(),
                        to: target.to_string(),
                        http_status: status,
                        via: "header".to_string(),
                    });

                    if depth >= self.max_depth {
                        tracing::warn!(
                            "Redirect from {} to {} not followed at depth {}",
                            current,
                            target,
                            depth
                        );
                        ctx.store.record_error(ErrorEntry {
                            url: current.to_string(),
                            kind: ErrorKind::RedirectLimit,
                            status: Some(status),
                            referrer,
                            notes: format!("Depth ceiling reached while redirecting to {}", target),
                        });
                        return None;
                    }

                    let decision = ctx.filter.classify(&target);
                    if !decision.is_in_scope() {
                        ctx.skip_out_of_scope(&target, &decision, current.as_str());
                        return None;
                    }

                    match ctx.admit(&target) {
                        Admission::Admitted => {}
                        Admission::AlreadyVisited => {
                            tracing::debug!("Redirect target {} already visited", target);
                            return None;
                        }
                        Admission::BudgetExhausted => {
                            tracing::debug!("Budget exhausted before redirect target {}", target);
                            return None;
                        }
                    }

                    tracing::debug!("Following {} redirect {} -> {}", status, current, target);
                    if redirected_from.is_none() {
                        redirected_from = Some(current.to_string());
                    }
                    referrer = current.to_string();
                    current = target;
                    depth += 1;
                }

                FetchOutcome::HttpError { status } => {
                    ctx.store.record_error(ErrorEntry {
                        url: current.to_string(),
                        kind: ErrorKind::HttpStatus,
                        status: Some(status),
                        referrer,
                        notes: format!("HTTP {}", status),
                    });
                    return None;
                }

                FetchOutcome::Timeout => {
                    ctx.store.record_error(ErrorEntry {
                        url: current.to_string(),
                        kind: ErrorKind::Timeout,
                        status: None,
                        referrer,
                        notes: "Request timed out".to_string(),
                    });
                    return None;
                }

                FetchOutcome::TransportError { detail } => {
                    ctx.store.record_error(ErrorEntry {
                        url: current.to_string(),
                        kind: ErrorKind::Transport,
                        status: None,
                        referrer,
                        notes: detail,
                    });
                    return None;
                }

                FetchOutcome::Skipped { reason, .. } => {
                    tracing::debug!("Skipping {}: {}", current, reason);
                    return None;
                }
            }
        }
    }
}
