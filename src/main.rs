//! gsc-indexer main entry point
//!
//! This is the command-line interface for bulk Search Console indexing.

use anyhow::Context;
use clap::Parser;
use gsc_indexer::api::{convert_to_site_url, site_url_variants, StaticTokenProvider};
use gsc_indexer::config::{load_config_with_hash, split_url_list, Config, RunOptions};
use gsc_indexer::output::{load_statistics, print_report, print_statistics};
use gsc_indexer::pipeline::index_site;
use gsc_indexer::{IndexerError, StatusCache};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// gsc-indexer: request indexing for every page of a Search Console site
///
/// Discovers the site's URLs from its sitemaps (or an explicit list), checks
/// their indexing status, caches the results and submits the pages Google
/// hasn't indexed yet.
#[derive(Parser, Debug)]
#[command(name = "gsc-indexer")]
#[command(version)]
#[command(about = "Bulk request indexing for Google Search Console", long_about = None)]
struct Cli {
    /// Domain (example.com) or site URL (https://example.com/)
    #[arg(value_name = "SITE")]
    site: Option<String>,

    /// Path to TOML policy file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Service account client email
    #[arg(long)]
    client_email: Option<String>,

    /// Service account private key
    #[arg(long)]
    private_key: Option<String>,

    /// Path to a service account JSON key file
    #[arg(long, value_name = "FILE")]
    path: Option<PathBuf>,

    /// OAuth bearer token with Search Console and Indexing API scopes
    #[arg(long)]
    access_token: Option<String>,

    /// Comma-separated URLs to process instead of the sitemaps
    #[arg(long, value_name = "URLS")]
    urls: Option<String>,

    /// Wait and retry when the Indexing API quota is exceeded
    #[arg(long)]
    rpm_retry: bool,

    /// Check and cache statuses, list what would be submitted, submit nothing
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show cached statuses for the site and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// The flag layer of the run options
    fn run_options(&self) -> RunOptions {
        RunOptions {
            client_email: self.client_email.clone(),
            private_key: self.private_key.clone(),
            path: self.path.clone(),
            access_token: self.access_token.clone(),
            urls: self.urls.as_deref().map(split_url_list),
            // An absent switch leaves the environment in charge
            rpm_retry: self.rpm_retry.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    let site = cli
        .site
        .as_deref()
        .filter(|site| !site.trim().is_empty())
        .ok_or(IndexerError::MissingSite)?;

    if cli.stats {
        return handle_stats(&config, site);
    }

    let options = RunOptions::resolve(
        RunOptions::default(),
        cli.run_options(),
        RunOptions::from_env(|key| std::env::var(key).ok()),
    );

    let report = index_site(config, &StaticTokenProvider, site, options, cli.dry_run)
        .await
        .with_context(|| format!("Indexing run for {} failed", site))?;

    print_report(&report);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gsc_indexer=info,warn"),
            1 => EnvFilter::new("gsc_indexer=debug,info"),
            2 => EnvFilter::new("gsc_indexer=trace,debug"),
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

/// Loads the policy file, or the defaults when none is given
fn load_configuration(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No config file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Handles the --stats mode: shows cached statuses without network access
fn handle_stats(config: &Config, site: &str) -> anyhow::Result<()> {
    let cache = StatusCache::new(config.cache.directory.clone());
    let candidate = convert_to_site_url(site);

    // The cache is keyed by the form Search Console lists, which may differ
    // from the form given on the command line
    let site_url = site_url_variants(&candidate)
        .into_iter()
        .find(|variant| cache.path_for(variant).exists())
        .unwrap_or(candidate);

    println!("Cache: {}\n", cache.path_for(&site_url).display());

    let entries = cache.load(&site_url)?;
    print_statistics(&site_url, &load_statistics(&entries));

    Ok(())
}
