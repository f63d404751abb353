//! Crawler coordinator - level-by-level traversal
//!
//! This module contains the traversal controller that drives a run:
//! - Seeding the frontier with the normalized seed URL
//! - Processing each depth level in batches through the fetch scheduler
//! - Deduplicating bodies, dispatching extractors and recording inventory
//! - Collecting in-scope links into the next level's frontier
//! - Stopping on an empty frontier, an exhausted budget or the depth ceiling

use crate::config::Config;
use crate::crawler::context::RunContext;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::frontier::{Admission, Frontier, FrontierEntry};
use crate::crawler::parser::LinkParser;
use crate::crawler::scheduler::{FetchScheduler, FetchedPage};
use crate::extract::Dispatcher;
use crate::state::{DoneReason, TraversalState};
use crate::store::{AuditRecords, ErrorEntry, ErrorKind, InventoryEntry};
use crate::url::{ScopeDecision, UrlFilter, UrlNormalizer};
use crate::AuditError;
use futures::future::join_all;
use futures::FutureExt;
use scraper::Html;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use url::Url;

/// Links a page task hands back to the controller
#[derive(Debug, Default)]
struct PageLinks {
    /// Depth of the page that produced the links
    depth: u32,
    source: String,
    in_scope: Vec<Url>,
    out_of_scope: Vec<(Url, ScopeDecision)>,
}

/// Main crawler structure
pub struct Crawler {
    config: Config,
    seed: Url,
    ctx: RunContext,
    scheduler: FetchScheduler,
    dispatcher: Dispatcher,
    links: LinkParser,
}

impl Crawler {
    /// Creates a crawler for a validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(AuditError)` - Seed URL, scope rules or HTTP client setup failed
    pub fn new(config: Config) -> Result<Self, AuditError> {
        let normalizer = UrlNormalizer::new(&config.params);
        let seed_base = Url::parse(&config.crawler.seed_url)?;
        let seed = normalizer.normalize(&config.crawler.seed_url, &seed_base)?;
        let filter = UrlFilter::new(&config.scope, &seed)?;

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout_secs)?;
        let scheduler = FetchScheduler::new(
            client,
            config.crawler.concurrency,
            Duration::from_millis(config.crawler.request_delay_ms),
            config.crawler.max_depth,
        );

        let dispatcher = Dispatcher::standard(&config.scope.language_prefix)?;
        let links = LinkParser::new(config.crawler.max_pagination_links)?;
        let ctx = RunContext::new(normalizer, filter, config.crawler.max_pages);

        Ok(Self {
            config,
            seed,
            ctx,
            scheduler,
            dispatcher,
            links,
        })
    }

    /// The normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Runs the traversal to completion and hands back every record
    ///
    /// Per-page failures never abort the run; they end up in
    /// `AuditRecords::errors`. An `Err` means the controller itself broke an
    /// invariant.
    pub async fn run(self) -> Result<AuditRecords, AuditError> {
        let reason = self.traverse().await?;
        tracing::info!(
            "Traversal finished ({}): {} URLs visited",
            reason,
            self.ctx.visited_count()
        );
        Ok(self.ctx.store.finish())
    }

    async fn traverse(&self) -> Result<DoneReason, AuditError> {
        let max_depth = self.config.crawler.max_depth;
        let batch_size = self.config.crawler.batch_size;

        let mut levels: BTreeMap<u32, Frontier> = BTreeMap::new();
        let decision = self.ctx.filter.classify(&self.seed);
        if decision.is_in_scope() {
            let mut seed_level = Frontier::new();
            seed_level.push(self.seed.clone(), "");
            levels.insert(0, seed_level);
        } else {
            tracing::warn!("Seed URL {} is out of scope ({})", self.seed, decision);
            self.ctx.skip_out_of_scope(&self.seed, &decision, "");
        }

        let mut depth = 0;
        let mut frontier = levels.remove(&0).unwrap_or_default();
        let mut state = TraversalState::Pending {
            depth,
            frontier: frontier.len(),
        };

        let reason = loop {
            if frontier.is_empty() {
                break DoneReason::FrontierExhausted;
            }
            if self.ctx.budget_exhausted() {
                break DoneReason::BudgetExhausted;
            }

            tracing::info!(
                "Depth {}: {} URLs to crawl, {} visited so far",
                depth,
                frontier.len(),
                self.ctx.visited_count()
            );

            let mut budget_hit = false;
            for batch in frontier.into_batches(batch_size) {
                state = state.transition(TraversalState::Fetching {
                    depth,
                    in_flight: batch.len(),
                })?;

                for links in self.run_batch(batch, depth).await {
                    self.collect_links(links, &mut levels);
                }

                if self.ctx.budget_exhausted() {
                    budget_hit = true;
                    break;
                }
            }

            if budget_hit {
                break DoneReason::BudgetExhausted;
            }
            if depth >= max_depth {
                break DoneReason::DepthCeiling;
            }

            let Some((next_depth, next)) = self.next_level(&mut levels) else {
                break DoneReason::FrontierExhausted;
            };

            state = state.transition(TraversalState::Advancing {
                depth: next_depth,
                collected: next.len(),
            })?;
            depth = next_depth;
            frontier = next;
            state = state.transition(TraversalState::Pending {
                depth,
                frontier: frontier.len(),
            })?;
        };

        let state = state.transition(TraversalState::Done(reason))?;
        tracing::debug!("Traversal {}", state);
        Ok(reason)
    }

    /// Shallowest queued level that still has unvisited URLs
    ///
    /// Levels can be skipped when redirect targets queued their links deeper
    /// than the level that is finishing.
    fn next_level(&self, levels: &mut BTreeMap<u32, Frontier>) -> Option<(u32, Frontier)> {
        while let Some((depth, mut frontier)) = levels.pop_first() {
            frontier.retain(|entry| !self.ctx.is_visited(&entry.url));
            if !frontier.is_empty() {
                return Some((depth, frontier));
            }
        }
        None
    }

    /// Admits and fetches one batch concurrently; panics in a page task are
    /// contained and recorded as internal errors
    async fn run_batch(&self, batch: Vec<FrontierEntry>, depth: u32) -> Vec<PageLinks> {
        let mut tasks = Vec::with_capacity(batch.len());

        for entry in batch {
            match self.ctx.admit(&entry.url) {
                Admission::Admitted => {}
                Admission::AlreadyVisited => continue,
                Admission::BudgetExhausted => {
                    tracing::debug!("Budget exhausted, not fetching {}", entry.url);
                    continue;
                }
            }

            let url = entry.url.to_string();
            let referrer = entry.referrer.clone();
            let task = AssertUnwindSafe(self.visit(entry, depth)).catch_unwind();
            tasks.push(async move {
                match task.await {
                    Ok(links) => links,
                    Err(panic) => {
                        let message = panic
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "page task panicked".to_string());
                        let err = AuditError::TaskAborted {
                            url: url.clone(),
                            message,
                        };
                        tracing::error!("{}", err);
                        self.ctx.store.record_error(ErrorEntry {
                            url,
                            kind: ErrorKind::Internal,
                            status: None,
                            referrer,
                            notes: err.to_string(),
                        });
                        None
                    }
                }
            });
        }

        join_all(tasks).await.into_iter().flatten().collect()
    }

    async fn visit(&self, entry: FrontierEntry, depth: u32) -> Option<PageLinks> {
        let page = self
            .scheduler
            .fetch(&self.ctx, entry.url, depth, entry.referrer)
            .await?;
        Some(self.process_page(page))
    }

    /// Deduplicates, extracts and records one fetched page
    fn process_page(&self, page: FetchedPage) -> PageLinks {
        let mut links = PageLinks {
            depth: page.depth,
            source: page.url.to_string(),
            ..PageLinks::default()
        };

        if let Some(original) = self.ctx.check_duplicate(&page.body, &page.url) {
            tracing::info!("Duplicate content: {} matches {}", page.url, original);
            self.ctx.store.record_inventory(InventoryEntry::duplicate(
                page.url.as_str(),
                page.depth,
                page.status,
                page.referrer,
                original,
            ));
            return links;
        }

        let (bundle, parsed) = {
            let html = page.text();
            let document = Html::parse_document(&html);
            (
                self.dispatcher.extract_document(&page.url, &html, &document),
                self.links.parse(&document, &page.url),
            )
        };

        let entry = InventoryEntry::new(
            page.url.as_str(),
            bundle.page_type,
            page.depth,
            page.status,
            page.referrer,
        );
        let inventory = match entry {
            Ok(entry) => InventoryEntry {
                redirected_from: page.redirected_from,
                canonical: parsed.canonical,
                hreflang: parsed.hreflang,
                paginated: self.links.is_paginated(&page.url),
                ..entry
            },
            Err(e) => {
                tracing::warn!("Not recording {}: {}", page.url, e);
                return links;
            }
        };
        tracing::debug!(
            "Recorded {} ({}) at depth {} with {} records",
            inventory.url,
            inventory.page_type,
            inventory.depth,
            bundle.records.len()
        );
        self.ctx.store.append_page(inventory, bundle.records);

        if page.depth >= self.config.crawler.max_depth {
            return links;
        }

        for href in parsed.links.iter().chain(parsed.pagination_links.iter()) {
            let url = match self.ctx.normalizer.normalize(href, &page.url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Failed to normalize {}: {}", href, e);
                    continue;
                }
            };
            match self.ctx.filter.classify(&url) {
                ScopeDecision::InScope => links.in_scope.push(url),
                decision => links.out_of_scope.push((url, decision)),
            }
        }

        links
    }

    /// Queues a page's in-scope links one level below the page
    fn collect_links(&self, links: PageLinks, levels: &mut BTreeMap<u32, Frontier>) {
        for (url, decision) in &links.out_of_scope {
            self.ctx.skip_out_of_scope(url, decision, &links.source);
        }

        if links.in_scope.is_empty() {
            return;
        }

        let level = levels.entry(links.depth + 1).or_default();
        for url in links.in_scope {
            if !self.ctx.is_visited(&url) {
                level.push(url, links.source.as_str());
            }
        }
    }
}

/// Runs a complete audit for a validated configuration
///
/// # Example
///
/// ```no_run
/// use site_auditor::config::load_config;
/// use site_auditor::crawler::run_audit;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("audit.toml"))?;
/// let records = run_audit(config).await?;
/// println!("{} pages", records.inventory.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_audit(config: Config) -> Result<AuditRecords, AuditError> {
    let crawler = Crawler::new(config)?;
    tracing::info!("Starting audit at {}", crawler.seed());
    crawler.run().await
}
