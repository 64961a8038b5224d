//! Google API client
//!
//! This module talks to three APIs with one bearer token:
//! - Search Console (sites and sitemaps)
//! - URL Inspection (coverage state of a URL)
//! - Indexing (notification metadata and publish requests)
//!
//! Status checks never fail outright. Their HTTP outcome is folded into an
//! `IndexingStatus` so one bad URL can't stop a batch:
//!
//! | Condition | Status |
//! |-----------|--------|
//! | HTTP 429 | `RateLimited` |
//! | HTTP 403 | `Forbidden` |
//! | Other non-2xx, network error, bad body | `Error` |
//! | Unknown coverage label | `Error` |

use crate::api::{parse_sitemap, ApiError, ApiResult, IndexingService};
use crate::config::ApiConfig;
use crate::state::IndexingStatus;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Maximum nesting of sitemap index files.
const MAX_INDEX_DEPTH: u8 = 2;

/// Maximum number of child sitemaps followed from one index.
const MAX_CHILD_SITEMAPS: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SitesResponse {
    #[serde(default)]
    site_entry: Vec<SiteEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteEntry {
    site_url: String,
}

#[derive(Debug, Deserialize)]
struct SitemapsResponse {
    #[serde(default)]
    sitemap: Vec<RegisteredSitemap>,
}

#[derive(Debug, Deserialize)]
struct RegisteredSitemap {
    path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectRequest<'a> {
    inspection_url: &'a str,
    site_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectResponse {
    inspection_result: Option<InspectionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectionResult {
    index_status_result: Option<IndexStatusResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStatusResult {
    coverage_state: Option<String>,
}

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    url: &'a str,
    #[serde(rename = "type")]
    notification_type: &'a str,
}

/// Builds an HTTP client for the Google APIs
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("gsc-indexer/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `IndexingService` backed by the real Google endpoints
#[derive(Debug, Clone)]
pub struct GoogleClient {
    client: Client,
    endpoints: ApiConfig,
}

impl GoogleClient {
    /// Creates a client for the endpoints in `config`
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = build_http_client(config).map_err(|source| ApiError::Http {
            url: config.indexing_endpoint.clone(),
            source,
        })?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a client reusing an existing `reqwest::Client`
    pub fn with_client(client: Client, config: &ApiConfig) -> Self {
        Self {
            client,
            endpoints: config.clone(),
        }
    }

    fn endpoint(base: &str, path: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }

    /// Turns a non-success response into `ApiError::Status`
    async fn expect_success(url: &str, response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> ApiResult<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| ApiError::Http {
                url: url.to_string(),
                source,
            })?;

        let response = Self::expect_success(url, response).await?;
        response.json::<T>().await.map_err(|e| ApiError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetches a sitemap, descending into sitemap indexes
    fn fetch_sitemap<'a>(
        &'a self,
        url: String,
        depth: u8,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Vec<String>>> + Send + 'a>> {
        Box::pin(async move {
            tracing::debug!(url = %url, depth, "Fetching sitemap");

            let response =
                self.client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|source| ApiError::Http {
                        url: url.clone(),
                        source,
                    })?;
            let response = Self::expect_success(&url, response).await?;
            let xml = response.text().await.map_err(|source| ApiError::Http {
                url: url.clone(),
                source,
            })?;

            let doc = parse_sitemap(&xml).map_err(|message| ApiError::Sitemap {
                url: url.clone(),
                message,
            })?;

            let mut urls = doc.page_urls;
            if doc.child_sitemaps.is_empty() {
                return Ok(urls);
            }

            if depth >= MAX_INDEX_DEPTH {
                tracing::warn!("Sitemap index {} nested too deep, skipping children", url);
                return Ok(urls);
            }

            for child in doc.child_sitemaps.into_iter().take(MAX_CHILD_SITEMAPS) {
                match self.fetch_sitemap(child.clone(), depth + 1).await {
                    Ok(child_urls) => urls.extend(child_urls),
                    Err(e) => tracing::warn!("Failed to fetch child sitemap {}: {}", child, e),
                }
            }

            Ok(urls)
        })
    }
}

#[async_trait]
impl IndexingService for GoogleClient {
    async fn list_sites(&self, token: &str) -> ApiResult<Vec<String>> {
        let url = Self::endpoint(&self.endpoints.webmasters_endpoint, "sites");
        let sites: SitesResponse = self.get_json(&url, token).await?;
        Ok(sites.site_entry.into_iter().map(|s| s.site_url).collect())
    }

    async fn list_sitemaps(&self, token: &str, site_url: &str) -> ApiResult<Vec<String>> {
        let encoded: String = url::form_urlencoded::byte_serialize(site_url.as_bytes()).collect();
        let url = Self::endpoint(
            &self.endpoints.webmasters_endpoint,
            &format!("sites/{}/sitemaps", encoded),
        );
        let sitemaps: SitemapsResponse = self.get_json(&url, token).await?;
        Ok(sitemaps.sitemap.into_iter().map(|s| s.path).collect())
    }

    async fn sitemap_urls(&self, sitemap_url: &str) -> ApiResult<Vec<String>> {
        self.fetch_sitemap(sitemap_url.to_string(), 0).await
    }

    async fn page_indexing_status(
        &self,
        token: &str,
        site_url: &str,
        url: &str,
    ) -> IndexingStatus {
        let endpoint = Self::endpoint(
            &self.endpoints.inspection_endpoint,
            "urlInspection/index:inspect",
        );

        let response = match self
            .client
            .post(&endpoint)
            .bearer_auth(token)
            .json(&InspectRequest {
                inspection_url: url,
                site_url,
            })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Inspection request for {} failed: {}", url, e);
                return IndexingStatus::Error;
            }
        };

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return IndexingStatus::RateLimited,
            StatusCode::FORBIDDEN => return IndexingStatus::Forbidden,
            status if !status.is_success() => {
                tracing::warn!("Inspection of {} returned HTTP {}", url, status.as_u16());
                return IndexingStatus::Error;
            }
            _ => {}
        }

        let coverage = match response.json::<InspectResponse>().await {
            Ok(body) => body
                .inspection_result
                .and_then(|r| r.index_status_result)
                .and_then(|r| r.coverage_state),
            Err(e) => {
                tracing::warn!("Unreadable inspection result for {}: {}", url, e);
                return IndexingStatus::Error;
            }
        };

        match coverage.as_deref().and_then(IndexingStatus::from_label) {
            Some(status) => status,
            None => {
                tracing::warn!(
                    "Unknown coverage state for {}: {}",
                    url,
                    coverage.as_deref().unwrap_or("<missing>")
                );
                IndexingStatus::Error
            }
        }
    }

    async fn publish_metadata(&self, token: &str, url: &str) -> ApiResult<u16> {
        let endpoint = Self::endpoint(
            &self.endpoints.indexing_endpoint,
            "urlNotifications/metadata",
        );

        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(token)
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|source| ApiError::Http {
                url: url.to_string(),
                source,
            })?;

        Ok(response.status().as_u16())
    }

    async fn request_indexing(&self, token: &str, url: &str) -> ApiResult<()> {
        let endpoint = Self::endpoint(
            &self.endpoints.indexing_endpoint,
            "urlNotifications:publish",
        );

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(token)
            .json(&PublishRequest {
                url,
                notification_type: "URL_UPDATED",
            })
            .send()
            .await
            .map_err(|source| ApiError::Http {
                url: url.to_string(),
                source,
            })?;

        Self::expect_success(url, response).await?;
        Ok(())
    }
}
