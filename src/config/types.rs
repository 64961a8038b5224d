use crate::cache::StalenessPolicy;
use crate::state::{IndexableSet, IndexingStatus};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for gsc-indexer
///
/// Every section is optional in the TOML file; missing sections take the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Status-check policy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Number of status checks in flight at once
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Maximum age of a cached status before it may be re-verified (days)
    #[serde(rename = "freshness-days")]
    pub freshness_days: u32,

    /// Which cached entries get re-verified
    pub staleness: StalenessPolicy,

    /// Statuses that make a URL eligible for submission
    ///
    /// When unset, the default set follows `staleness`: `indexable-and-age`
    /// adds `RateLimited`, since that policy only rechecks indexable entries.
    #[serde(rename = "indexable-statuses")]
    pub indexable_statuses: Option<Vec<IndexingStatus>>,
}

impl PolicyConfig {
    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.freshness_days))
    }

    pub fn indexable_set(&self) -> IndexableSet {
        match (&self.indexable_statuses, self.staleness) {
            (Some(statuses), _) => IndexableSet::new(statuses.iter().copied()),
            (None, StalenessPolicy::FailureOrAge) => IndexableSet::default(),
            (None, StalenessPolicy::IndexableAndAge) => IndexableSet::with_rate_limited(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            freshness_days: 14,
            staleness: StalenessPolicy::default(),
            indexable_statuses: None,
        }
    }
}

/// Rate-limit handling for publish-metadata queries
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Extra attempts after a rate-limited reply, when retrying is enabled
    #[serde(rename = "retries-on-rate-limit")]
    pub retries_on_rate_limit: u32,

    /// Wait between rate-limited attempts (seconds)
    #[serde(rename = "backoff-secs")]
    pub backoff_secs: u64,
}

impl QuotaConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            retries_on_rate_limit: 3,
            backoff_secs: 60,
        }
    }
}

/// Status cache location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one cache file per site
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".cache"),
        }
    }
}

/// Google API endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Search Console sites and sitemaps API
    #[serde(rename = "webmasters-endpoint")]
    pub webmasters_endpoint: String,

    /// URL Inspection API
    #[serde(rename = "inspection-endpoint")]
    pub inspection_endpoint: String,

    /// Indexing API
    #[serde(rename = "indexing-endpoint")]
    pub indexing_endpoint: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            webmasters_endpoint: "https://www.googleapis.com/webmasters/v3".to_string(),
            inspection_endpoint: "https://searchconsole.googleapis.com/v1".to_string(),
            indexing_endpoint: "https://indexing.googleapis.com/v3".to_string(),
            timeout_secs: 30,
        }
    }
}
