//! Site-Auditor main entry point
//!
//! This is the command-line interface for the Site-Auditor crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use site_auditor::config::{load_config_with_hash, validate, Config};
use site_auditor::output::{write_outputs, CrawlSummary};
use site_auditor::run_audit;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Auditor: a bounded single-site crawler
///
/// Site-Auditor crawls one language section of a website breadth-first,
/// within a page budget and a depth ceiling, and writes typed audit records
/// (inventory, SEO, content, media, forms, integrations, API endpoints,
/// redirects and errors) for offline analysis.
#[derive(Parser, Debug)]
#[command(name = "site-auditor")]
#[command(version = "1.0.0")]
#[command(about = "A bounded single-site crawler for site audits", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the output directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Override the page budget
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Override the depth ceiling
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli).context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_audit(config, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_auditor=info,warn"),
            1 => EnvFilter::new("site_auditor=debug,info"),
            2 => EnvFilter::new("site_auditor=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies `--output-dir`, `--max-pages` and `--max-depth`, then revalidates
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), site_auditor::ConfigError> {
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    validate(config)
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Site-Auditor Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!(
        "  Max pagination links per page: {}",
        config.crawler.max_pagination_links
    );
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Batch size: {}", config.crawler.batch_size);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nScope:");
    println!("  Language prefix: {}", config.scope.language_prefix);
    println!("  Same host only: {}", config.scope.same_host_only);
    println!("  Allow rules ({}):", config.scope.allow.len());
    for rule in &config.scope.allow {
        println!("    + {}", rule);
    }
    println!("  Deny rules ({}):", config.scope.deny.len());
    for rule in &config.scope.deny {
        println!("    - {}", rule);
    }

    println!("\nQuery Parameters:");
    println!("  Tracking (dropped): {}", config.params.tracking.join(", "));
    println!("  Stable (kept): {}", config.params.stable.join(", "));

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Format: {:?}", config.output.format);
    println!("  Summary: {}", config.output.summary_file);

    println!("\n✓ Configuration is valid");
}

/// Handles the main audit run
async fn handle_audit(config: Config, config_hash: String) -> anyhow::Result<()> {
    let started_at = Utc::now();
    let seed_url = config.crawler.seed_url.clone();
    let output = config.output.clone();

    tracing::info!(
        "Starting audit of {} (max depth {}, max pages {})",
        seed_url,
        config.crawler.max_depth,
        config.crawler.max_pages
    );

    let records = run_audit(config).await.context("Audit run failed")?;

    let summary = CrawlSummary::from_records(&records, seed_url, config_hash, started_at, Utc::now());

    let summary_path = write_outputs(&output, &records, &summary)
        .with_context(|| format!("Failed to write audit output to {}", output.directory))?;
    tracing::info!("Summary written to {}", summary_path.display());

    println!("{}", summary);
    Ok(())
}
