//! External collaborators of the indexing pipeline
//!
//! This module contains:
//! - The `IndexingService` seam over the Search Console, URL Inspection and
//!   Indexing APIs, and its reqwest-backed implementation `GoogleClient`
//! - The `AuthProvider` seam for obtaining a bearer token
//! - Site URL resolution and custom URL list validation
//! - Sitemap `<loc>` extraction

mod auth;
mod google;
mod site;
mod sitemap;

pub use auth::{AuthProvider, Credentials, StaticTokenProvider};
pub use google::{build_http_client, GoogleClient};
pub use site::{check_custom_urls, check_site_url, convert_to_site_url, site_url_variants};
pub use sitemap::{parse_sitemap, SitemapDocument};

use crate::state::IndexingStatus;
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by the external APIs
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Sitemap parse error for {url}: {message}")]
    Sitemap { url: String, message: String },
}

impl ApiError {
    /// Returns the HTTP status code, if the error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Network operations the pipeline needs from Google
///
/// `GoogleClient` is the production implementation; tests substitute an
/// in-memory one.
#[async_trait]
pub trait IndexingService: Send + Sync {
    /// Lists the site URLs the authenticated account can access
    async fn list_sites(&self, token: &str) -> ApiResult<Vec<String>>;

    /// Lists the sitemap URLs registered for a site
    async fn list_sitemaps(&self, token: &str, site_url: &str) -> ApiResult<Vec<String>>;

    /// Fetches one sitemap and returns its page URLs, following sitemap indexes
    async fn sitemap_urls(&self, sitemap_url: &str) -> ApiResult<Vec<String>>;

    /// Inspects a URL's indexing status
    ///
    /// Never fails: request failures come back as `RateLimited`, `Forbidden`
    /// or `Error`.
    async fn page_indexing_status(&self, token: &str, site_url: &str, url: &str)
        -> IndexingStatus;

    /// Queries the Indexing API notification metadata for a URL, once
    ///
    /// Returns the HTTP status code: 404 means nothing has been submitted,
    /// anything below 400 means a submission exists.
    async fn publish_metadata(&self, token: &str, url: &str) -> ApiResult<u16>;

    /// Asks Google to (re)index a URL
    async fn request_indexing(&self, token: &str, url: &str) -> ApiResult<()>;
}
