//! gsc-indexer: bulk "request indexing" for Google Search Console sites
//!
//! This crate discovers a site's URLs, checks their indexing status with bounded
//! concurrency, keeps a per-site status cache so repeated runs are incremental,
//! and submits the URLs that are not yet indexed while respecting the API's
//! rate limits.

pub mod api;
pub mod cache;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod state;

use thiserror::Error;

/// Main error type for gsc-indexer operations
///
/// Every variant here is fatal for a run. Per-URL failures never surface as an
/// `IndexerError`; they are folded into the run report instead.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("No site given: pass a domain or a site URL")]
    MissingSite,

    #[error("No credentials: provide an access token or a service account")]
    MissingCredentials,

    #[error("This account doesn't have access to {site_url}")]
    SiteAccessDenied { site_url: String },

    #[error("No sitemaps found for {site_url}, add them to Search Console and try again")]
    NoSitemaps { site_url: String },

    #[error("No URLs found for {site_url}")]
    NoUrls { site_url: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for gsc-indexer operations
pub type Result<T> = std::result::Result<T, IndexerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{CacheEntry, SiteCache, StalenessPolicy, StatusCache};
pub use config::Config;
pub use pipeline::{Pipeline, RunReport, SubmissionOutcome};
pub use state::{classify, IndexableSet, IndexingStatus, PageStatus};
